//! Editions and their editorial workflow.
//!
//! An edition is a single version of a publishable document. It moves
//! through its lifecycle (drafting, review, publication, and possibly
//! withdrawal) through the operations defined here.
//!
//! Every mutating operation takes the lock version its caller last saw and
//! applies its change with a compare-and-swap: the update only matches the
//! edition row if the stored lock version is still the one supplied, and
//! increments it as part of the same statement. A caller working from an
//! outdated copy gets [`WorkflowError::Stale`] and no change is made.

use chrono::{NaiveDateTime, Utc};
use diesel::{
    Connection as _Connection,
    dsl::{exists, now},
    prelude::*,
    result::Error as DbError,
};
use failure::Fail;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    ApiError,
    audit::{self, Actor},
    db::{
        Connection,
        models as db,
        schema::{edition_authors, editions, users},
        types::{EditionKind, EditionState},
    },
    events::notification_recipients,
    permissions::{PermissionBits, RequirePermissionsError},
};
use super::{
    unpublishing::{self, Unpublishing},
    user::User,
};

#[derive(Clone, Debug)]
pub struct Edition {
    data: db::Edition,
}

/// A subset of an edition's data that can safely be publicly exposed.
#[derive(Debug, Serialize)]
pub struct PublicData {
    pub id: i32,
    pub document: Uuid,
    pub kind: EditionKind,
    pub title: String,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub state: EditionState,
    pub lock_version: i32,
    pub created_by: i32,
    pub published_by: Option<i32>,
    pub scheduled_publication: Option<NaiveDateTime>,
    pub force_published: bool,
    pub force_publish_reason: Option<String>,
    pub access_limited: bool,
}

/// Changes to an edition's content.
#[derive(Debug, Default, Deserialize)]
pub struct ContentUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub scheduled_publication: Option<NaiveDateTime>,
}

impl Edition {
    /// Construct `Edition` from its database counterpart.
    pub(super) fn from_db(data: db::Edition) -> Edition {
        Edition { data }
    }

    /// Get all editions, optionally only those in a given state.
    pub fn all(dbcon: &Connection, state: Option<EditionState>)
    -> Result<Vec<Edition>, DbError> {
        let editions = match state {
            Some(state) => editions::table
                .filter(editions::state.eq(state))
                .order(editions::updated_at.desc())
                .get_results::<db::Edition>(dbcon)?,
            None => editions::table
                .order(editions::updated_at.desc())
                .get_results::<db::Edition>(dbcon)?,
        };

        Ok(editions.into_iter().map(Edition::from_db).collect())
    }

    /// Find an edition by ID.
    pub fn by_id(dbcon: &Connection, id: i32)
    -> Result<Edition, FindEditionError> {
        editions::table
            .filter(editions::id.eq(id))
            .get_result::<db::Edition>(dbcon)
            .optional()?
            .ok_or(FindEditionError::NotFound)
            .map(Edition::from_db)
    }

    /// Create a new edition.
    ///
    /// The creating user becomes its first author. Editions brought in from
    /// a legacy system start out as `imported` and have to be converted into
    /// drafts before they can enter the normal workflow.
    pub fn create(
        dbcon: &Connection,
        actor: &User,
        kind: EditionKind,
        title: &str,
        summary: Option<&str>,
        body: Option<&str>,
        access_limited: bool,
        imported: bool,
    ) -> Result<Edition, DbError> {
        dbcon.transaction(|| {
            let data = diesel::insert_into(editions::table)
                .values(&db::NewEdition {
                    document: Uuid::new_v4(),
                    kind,
                    title,
                    summary,
                    body,
                    state: if imported {
                        EditionState::Imported
                    } else {
                        EditionState::Draft
                    },
                    created_by: actor.id,
                    scheduled_publication: None,
                    access_limited,
                })
                .get_result::<db::Edition>(dbcon)?;

            diesel::insert_into(edition_authors::table)
                .values(&db::EditionAuthor {
                    edition: data.id,
                    user: actor.id,
                })
                .execute(dbcon)?;

            audit::log_db(dbcon, actor.id, "edition", data.id, "created", ())?;

            Ok(Edition { data })
        })
    }

    pub fn into_db(self) -> db::Edition {
        self.data
    }

    /// Get the public portion of this edition's data.
    pub fn get_public(&self) -> PublicData {
        let db::Edition {
            id,
            document,
            kind,
            ref title,
            ref summary,
            ref body,
            state,
            lock_version,
            created_by,
            published_by,
            scheduled_publication,
            force_published,
            ref force_publish_reason,
            access_limited,
            ..
        } = self.data;

        PublicData {
            id,
            document,
            kind,
            title: title.clone(),
            summary: summary.clone(),
            body: body.clone(),
            state,
            lock_version,
            created_by,
            published_by,
            scheduled_publication,
            force_published,
            force_publish_reason: force_publish_reason.clone(),
            access_limited,
        }
    }

    /// Can `user` see (and thus act on) this edition?
    pub fn check_access(&self, dbcon: &Connection, user: &User)
    -> Result<bool, DbError> {
        if !self.data.access_limited {
            return Ok(true);
        }

        if user.permissions().contains(PermissionBits::VIEW_RESTRICTED) {
            return Ok(true);
        }

        diesel::select(exists(edition_authors::table
            .filter(edition_authors::edition.eq(self.data.id)
                .and(edition_authors::user.eq(user.id)))))
            .get_result(dbcon)
    }

    /// Get all users who have worked on this edition.
    pub fn get_authors(&self, dbcon: &Connection) -> Result<Vec<User>, DbError> {
        Ok(edition_authors::table
            .filter(edition_authors::edition.eq(self.data.id))
            .inner_join(users::table)
            .select(users::all_columns)
            .get_results::<db::User>(dbcon)?
            .into_iter()
            .map(User::from_db)
            .collect())
    }

    /// Compute the set of authors who should be notified about something that
    /// happened to this edition.
    ///
    /// Authors without an email address and those listed in `exclude` (which
    /// callers should populate with at least the acting user) are skipped;
    /// every remaining author appears exactly once.
    pub fn notification_recipients(&self, dbcon: &Connection, exclude: &[i32])
    -> Result<Vec<User>, DbError> {
        let authors = edition_authors::table
            .filter(edition_authors::edition.eq(self.data.id))
            .inner_join(users::table)
            .select(users::all_columns)
            .get_results::<db::User>(dbcon)?;

        Ok(notification_recipients(authors, exclude)
            .into_iter()
            .map(User::from_db)
            .collect())
    }

    /// Change this edition's content, recording the acting user as an author.
    pub fn set_content(
        &mut self,
        dbcon: &Connection,
        actor: &User,
        lock_version: Option<i32>,
        update: &ContentUpdate,
    ) -> Result<(), UpdateEditionError> {
        let version = self.guard(dbcon, actor, lock_version)?;

        match self.data.state {
            EditionState::Draft
            | EditionState::Submitted
            | EditionState::Rejected => (),
            state => return Err(UpdateEditionError::NotEditable(state)),
        }

        let data = dbcon.transaction::<_, UpdateEditionError, _>(|| {
            let data = diesel::update(editions::table
                    .filter(editions::id.eq(self.data.id)
                        .and(editions::lock_version.eq(version))))
                .set((
                    editions::title.eq(update.title.as_ref()
                        .map(String::as_str)
                        .unwrap_or(&self.data.title)),
                    editions::summary.eq(update.summary.as_ref()
                        .map(String::as_str)
                        .or_else(|| self.data.summary.as_ref()
                            .map(String::as_str))),
                    editions::body.eq(update.body.as_ref()
                        .map(String::as_str)
                        .or_else(|| self.data.body.as_ref()
                            .map(String::as_str))),
                    editions::scheduled_publication.eq(
                        update.scheduled_publication
                            .or(self.data.scheduled_publication)),
                    editions::lock_version.eq(version + 1),
                    editions::updated_at.eq(now),
                ))
                .get_result::<db::Edition>(dbcon)
                .optional()?
                .ok_or(WorkflowError::Stale)?;

            diesel::insert_into(edition_authors::table)
                .values(&db::EditionAuthor {
                    edition: data.id,
                    user: actor.id,
                })
                .on_conflict((edition_authors::edition, edition_authors::user))
                .do_nothing()
                .execute(dbcon)?;

            audit::log_db(dbcon, actor.id, "edition", data.id, "edited", ())?;

            Ok(data)
        })?;

        self.data = data;

        Ok(())
    }

    /// Submit this edition for review by a second pair of eyes.
    pub fn submit(
        &mut self,
        dbcon: &Connection,
        actor: &User,
        lock_version: Option<i32>,
    ) -> Result<(), SubmitError> {
        let version = self.guard(dbcon, actor, lock_version)?;

        match self.data.state {
            EditionState::Draft => (),
            state => return Err(WorkflowError::InvalidTransition(state).into()),
        }

        let missing = missing_fields(&self.data);
        if !missing.is_empty() {
            return Err(SubmitError::Invalid(missing.join(", ")));
        }

        let data = dbcon.transaction::<_, SubmitError, _>(|| {
            let data = diesel::update(editions::table
                    .filter(editions::id.eq(self.data.id)
                        .and(editions::lock_version.eq(version))))
                .set((
                    editions::state.eq(EditionState::Submitted),
                    editions::lock_version.eq(version + 1),
                    editions::updated_at.eq(now),
                ))
                .get_result::<db::Edition>(dbcon)
                .optional()?
                .ok_or(WorkflowError::Stale)?;

            audit::log_db(dbcon, actor.id, "edition", data.id, "submitted", ())?;

            Ok(data)
        })?;

        self.data = data;

        Ok(())
    }

    /// Publish this edition on behalf of `actor`.
    pub fn publish(
        &mut self,
        dbcon: &Connection,
        actor: &User,
        lock_version: Option<i32>,
    ) -> Result<(), PublishError> {
        let version = self.guard(dbcon, actor, lock_version)?;

        check_publishable(self.data.state)?;

        let data = dbcon.transaction::<_, PublishError, _>(|| {
            let data = diesel::update(editions::table
                    .filter(editions::id.eq(self.data.id)
                        .and(editions::lock_version.eq(version))))
                .set((
                    editions::state.eq(EditionState::Published),
                    editions::published_by.eq(actor.id),
                    editions::lock_version.eq(version + 1),
                    editions::updated_at.eq(now),
                ))
                .get_result::<db::Edition>(dbcon)
                .optional()?
                .ok_or(WorkflowError::Stale)?;

            audit::log_db(dbcon, actor.id, "edition", data.id, "published", ())?;

            Ok(data)
        })?;

        self.data = data;

        Ok(())
    }

    /// Publish this edition without the usual second-reviewer step.
    ///
    /// A justification has to be recorded; the edition stays marked as
    /// force-published until a reviewer approves it retrospectively.
    pub fn force_publish(
        &mut self,
        dbcon: &Connection,
        actor: &User,
        lock_version: Option<i32>,
        reason: Option<&str>,
    ) -> Result<(), ForcePublishError> {
        let version = self.guard(dbcon, actor, lock_version)?;

        let reason = match reason.map(str::trim) {
            Some(reason) if !reason.is_empty() => reason,
            _ => return Err(ForcePublishError::MissingReason),
        };

        check_publishable(self.data.state)?;

        let data = dbcon.transaction::<_, ForcePublishError, _>(|| {
            let data = diesel::update(editions::table
                    .filter(editions::id.eq(self.data.id)
                        .and(editions::lock_version.eq(version))))
                .set((
                    editions::state.eq(EditionState::Published),
                    editions::published_by.eq(actor.id),
                    editions::force_published.eq(true),
                    editions::force_publish_reason.eq(reason),
                    editions::lock_version.eq(version + 1),
                    editions::updated_at.eq(now),
                ))
                .get_result::<db::Edition>(dbcon)
                .optional()?
                .ok_or(WorkflowError::Stale)?;

            audit::log_db(
                dbcon, actor.id, "edition", data.id, "force-published", reason)?;

            Ok(data)
        })?;

        self.data = data;

        Ok(())
    }

    /// Put this edition in the queue for publication at its scheduled date.
    ///
    /// With `force` the eventual publication is marked force-published, just
    /// as if [`Edition::force_publish`] had been called at that date.
    pub fn schedule(
        &mut self,
        dbcon: &Connection,
        actor: &User,
        lock_version: Option<i32>,
        force: bool,
    ) -> Result<(), ScheduleError> {
        let version = self.guard(dbcon, actor, lock_version)?;

        match self.data.state {
            EditionState::Submitted => (),
            state => return Err(WorkflowError::InvalidTransition(state).into()),
        }

        if !has_future_schedule(
                self.data.scheduled_publication, Utc::now().naive_utc()) {
            return Err(ScheduleError::NoScheduledDate);
        }

        let force_published = self.data.force_published || force;

        let data = dbcon.transaction::<_, ScheduleError, _>(|| {
            let data = diesel::update(editions::table
                    .filter(editions::id.eq(self.data.id)
                        .and(editions::lock_version.eq(version))))
                .set((
                    editions::state.eq(EditionState::Scheduled),
                    editions::force_published.eq(force_published),
                    editions::lock_version.eq(version + 1),
                    editions::updated_at.eq(now),
                ))
                .get_result::<db::Edition>(dbcon)
                .optional()?
                .ok_or(WorkflowError::Stale)?;

            audit::log_db(dbcon, actor.id, "edition", data.id, "scheduled",
                data.scheduled_publication)?;

            Ok(data)
        })?;

        self.data = data;

        Ok(())
    }

    /// Take this edition back out of the publication queue.
    pub fn unschedule(
        &mut self,
        dbcon: &Connection,
        actor: &User,
        lock_version: Option<i32>,
    ) -> Result<(), UnscheduleError> {
        let version = self.guard(dbcon, actor, lock_version)?;

        match self.data.state {
            EditionState::Scheduled => (),
            _ => return Err(UnscheduleError::NotScheduled),
        }

        let data = dbcon.transaction::<_, UnscheduleError, _>(|| {
            let data = diesel::update(editions::table
                    .filter(editions::id.eq(self.data.id)
                        .and(editions::lock_version.eq(version))))
                .set((
                    editions::state.eq(EditionState::Submitted),
                    editions::lock_version.eq(version + 1),
                    editions::updated_at.eq(now),
                ))
                .get_result::<db::Edition>(dbcon)
                .optional()?
                .ok_or(WorkflowError::Stale)?;

            audit::log_db(
                dbcon, actor.id, "edition", data.id, "unscheduled", ())?;

            Ok(data)
        })?;

        self.data = data;

        Ok(())
    }

    /// Send this edition back to its authors.
    pub fn reject(
        &mut self,
        dbcon: &Connection,
        actor: &User,
        lock_version: Option<i32>,
    ) -> Result<(), WorkflowError> {
        let version = self.guard(dbcon, actor, lock_version)?;

        match self.data.state {
            EditionState::Submitted => (),
            state => return Err(WorkflowError::InvalidTransition(state)),
        }

        let data = dbcon.transaction::<_, WorkflowError, _>(|| {
            let data = diesel::update(editions::table
                    .filter(editions::id.eq(self.data.id)
                        .and(editions::lock_version.eq(version))))
                .set((
                    editions::state.eq(EditionState::Rejected),
                    editions::lock_version.eq(version + 1),
                    editions::updated_at.eq(now),
                ))
                .get_result::<db::Edition>(dbcon)
                .optional()?
                .ok_or(WorkflowError::Stale)?;

            audit::log_db(dbcon, actor.id, "edition", data.id, "rejected", ())?;

            Ok(data)
        })?;

        self.data = data;

        Ok(())
    }

    /// Withdraw this published edition from the public site.
    ///
    /// Requires [`PermissionBits::MANAGE_UNPUBLISHING`]. The reasons for the
    /// withdrawal are recorded in an [`Unpublishing`], created in the same
    /// transaction as the state change.
    pub fn unpublish(
        &mut self,
        dbcon: &Connection,
        actor: &User,
        lock_version: Option<i32>,
        params: &unpublishing::Params,
    ) -> Result<Unpublishing, UnpublishError> {
        if !self.check_access(dbcon, actor)
                .map_err(WorkflowError::Database)? {
            return Err(WorkflowError::Forbidden.into());
        }

        actor.permissions().require(PermissionBits::MANAGE_UNPUBLISHING)?;

        let version = lock_version.ok_or(WorkflowError::MissingLockVersion)?;

        match self.data.state {
            EditionState::Published => (),
            state => return Err(WorkflowError::InvalidTransition(state).into()),
        }

        params.validate()?;

        let (data, unpublishing) = dbcon
            .transaction::<_, UnpublishError, _>(|| {
                let data = diesel::update(editions::table
                        .filter(editions::id.eq(self.data.id)
                            .and(editions::lock_version.eq(version))))
                    .set((
                        editions::state.eq(EditionState::Unpublished),
                        editions::lock_version.eq(version + 1),
                        editions::updated_at.eq(now),
                    ))
                    .get_result::<db::Edition>(dbcon)
                    .optional()?
                    .ok_or(WorkflowError::Stale)?;

                let unpublishing = Unpublishing::create(dbcon, &data, params)?;

                audit::log_db(dbcon, actor.id, "edition", data.id,
                    "unpublished", params)?;

                Ok((data, unpublishing))
            })?;

        self.data = data;

        Ok(unpublishing)
    }

    /// Turn this imported edition into a draft, making it editable.
    pub fn convert_to_draft(
        &mut self,
        dbcon: &Connection,
        actor: &User,
        lock_version: Option<i32>,
    ) -> Result<(), WorkflowError> {
        let version = self.guard(dbcon, actor, lock_version)?;

        match self.data.state {
            EditionState::Imported => (),
            state => return Err(WorkflowError::InvalidTransition(state)),
        }

        let data = dbcon.transaction::<_, WorkflowError, _>(|| {
            let data = diesel::update(editions::table
                    .filter(editions::id.eq(self.data.id)
                        .and(editions::lock_version.eq(version))))
                .set((
                    editions::state.eq(EditionState::Draft),
                    editions::lock_version.eq(version + 1),
                    editions::updated_at.eq(now),
                ))
                .get_result::<db::Edition>(dbcon)
                .optional()?
                .ok_or(WorkflowError::Stale)?;

            audit::log_db(dbcon, actor.id, "edition", data.id,
                "converted-to-draft", ())?;

            Ok(data)
        })?;

        self.data = data;

        Ok(())
    }

    /// Record that a reviewer has looked at this force-published edition
    /// after the fact.
    ///
    /// Clears the force-published mark; the edition's state is not changed.
    pub fn approve_retrospectively(
        &mut self,
        dbcon: &Connection,
        actor: &User,
        lock_version: Option<i32>,
    ) -> Result<(), ApproveRetrospectivelyError> {
        let version = self.guard(dbcon, actor, lock_version)?;

        if !self.data.force_published {
            return Err(ApproveRetrospectivelyError::NotForcePublished);
        }

        let data = dbcon.transaction::<_, ApproveRetrospectivelyError, _>(|| {
            let data = diesel::update(editions::table
                    .filter(editions::id.eq(self.data.id)
                        .and(editions::lock_version.eq(version))))
                .set((
                    editions::force_published.eq(false),
                    editions::lock_version.eq(version + 1),
                    editions::updated_at.eq(now),
                ))
                .get_result::<db::Edition>(dbcon)
                .optional()?
                .ok_or(WorkflowError::Stale)?;

            audit::log_db(dbcon, actor.id, "edition", data.id,
                "approved-retrospectively", ())?;

            Ok(data)
        })?;

        self.data = data;

        Ok(())
    }

    /// Publish this edition because its scheduled date has arrived.
    ///
    /// Only the scheduled-publication processor calls this; there is no
    /// acting user and no caller-supplied lock version, the row's current one
    /// is used instead.
    pub(crate) fn publish_from_schedule(&mut self, dbcon: &Connection)
    -> Result<(), WorkflowError> {
        match self.data.state {
            EditionState::Scheduled => (),
            state => return Err(WorkflowError::InvalidTransition(state)),
        }

        let version = self.data.lock_version;

        let data = dbcon.transaction::<_, WorkflowError, _>(|| {
            let data = diesel::update(editions::table
                    .filter(editions::id.eq(self.data.id)
                        .and(editions::lock_version.eq(version))))
                .set((
                    editions::state.eq(EditionState::Published),
                    editions::lock_version.eq(version + 1),
                    editions::updated_at.eq(now),
                ))
                .get_result::<db::Edition>(dbcon)
                .optional()?
                .ok_or(WorkflowError::Stale)?;

            audit::log_db(dbcon, Actor::System, "edition", data.id,
                "published", ())?;

            Ok(data)
        })?;

        self.data = data;

        Ok(())
    }

    /// Common preconditions of every workflow operation: the actor must be
    /// able to see this edition and must have supplied a lock version.
    fn guard(&self, dbcon: &Connection, actor: &User, lock_version: Option<i32>)
    -> Result<i32, WorkflowError> {
        if !self.check_access(dbcon, actor)? {
            return Err(WorkflowError::Forbidden);
        }

        lock_version.ok_or(WorkflowError::MissingLockVersion)
    }

}

impl std::ops::Deref for Edition {
    type Target = db::Edition;

    fn deref(&self) -> &db::Edition {
        &self.data
    }
}

/// List the required fields this edition is missing, phrased for inclusion
/// in an error message.
fn missing_fields(data: &db::Edition) -> Vec<&'static str> {
    let mut missing = Vec::new();

    if data.title.trim().is_empty() {
        missing.push("Title can't be blank");
    }

    match data.summary {
        Some(ref summary) if !summary.trim().is_empty() => (),
        _ => missing.push("Summary can't be blank"),
    }

    match data.body {
        Some(ref body) if !body.trim().is_empty() => (),
        _ => missing.push("Body can't be blank"),
    }

    missing
}

/// Is this state one from which an edition can be published?
fn check_publishable(state: EditionState) -> Result<(), PublishError> {
    match state {
        EditionState::Submitted => Ok(()),
        EditionState::Published => Err(PublishError::AlreadyPublished),
        state => Err(WorkflowError::InvalidTransition(state).into()),
    }
}

/// Does this edition have a publication date that is still ahead of us?
fn has_future_schedule(scheduled: Option<NaiveDateTime>, as_of: NaiveDateTime)
-> bool {
    match scheduled {
        Some(when) => when > as_of,
        None => false,
    }
}

#[derive(ApiError, Debug, Fail)]
pub enum FindEditionError {
    /// Database error.
    #[api(internal)]
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// No edition found matching given criteria.
    #[api(code = "edition:not-found", status = "NOT_FOUND")]
    #[fail(display = "No such edition")]
    NotFound,
}

impl_from! { for FindEditionError ;
    DbError => |e| FindEditionError::Database(e),
}

/// Failures shared by every workflow operation.
#[derive(ApiError, Debug, Fail)]
pub enum WorkflowError {
    /// Database error.
    #[api(internal)]
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// The caller did not say which version of the edition it was looking at.
    #[api(code = "edition:lock-version-required",
        status = "UNPROCESSABLE_ENTITY")]
    #[fail(display = "All workflow actions require a lock version")]
    MissingLockVersion,
    /// The edition has changed since the caller last saw it.
    #[api(code = "edition:stale", status = "CONFLICT")]
    #[fail(display = "This document has been edited since you viewed it; \
        you are now viewing the latest version")]
    Stale,
    /// The requested operation cannot start from the edition's current state.
    #[api(code = "edition:invalid-transition", status = "BAD_REQUEST")]
    #[fail(display = "This action is not available for a {} edition", _0)]
    InvalidTransition(EditionState),
    /// The actor cannot see this edition.
    #[api(code = "edition:access-denied", status = "FORBIDDEN")]
    #[fail(display = "You do not have permission to perform this action \
        on this edition")]
    Forbidden,
}

impl_from! { for WorkflowError ;
    DbError => |e| WorkflowError::Database(e),
}

#[derive(ApiError, Debug, Fail)]
pub enum SubmitError {
    /// Required fields are missing.
    #[api(code = "edition:submit:invalid", status = "BAD_REQUEST")]
    #[fail(display = "Unable to submit this edition because it is invalid \
        ({}). Please edit it and try again.", _0)]
    Invalid(String),
    #[fail(display = "{}", _0)]
    Workflow(#[cause] WorkflowError),
}

impl_from! { for SubmitError ;
    WorkflowError => |e| SubmitError::Workflow(e),
    DbError => |e| SubmitError::Workflow(WorkflowError::Database(e)),
}

#[derive(ApiError, Debug, Fail)]
pub enum PublishError {
    /// Publishing something already published is reported separately from
    /// other invalid transitions.
    #[api(code = "edition:already-published", status = "BAD_REQUEST")]
    #[fail(display = "This edition has already been published")]
    AlreadyPublished,
    #[fail(display = "{}", _0)]
    Workflow(#[cause] WorkflowError),
}

impl_from! { for PublishError ;
    WorkflowError => |e| PublishError::Workflow(e),
    DbError => |e| PublishError::Workflow(WorkflowError::Database(e)),
}

#[derive(ApiError, Debug, Fail)]
pub enum ForcePublishError {
    /// No justification supplied.
    #[api(code = "edition:force-publish:missing-reason",
        status = "BAD_REQUEST")]
    #[fail(display = "You cannot force publish a document without a reason")]
    MissingReason,
    #[fail(display = "{}", _0)]
    Publish(#[cause] PublishError),
}

impl_from! { for ForcePublishError ;
    PublishError => |e| ForcePublishError::Publish(e),
    WorkflowError => |e| ForcePublishError::Publish(PublishError::Workflow(e)),
    DbError => |e| ForcePublishError::Publish(
        PublishError::Workflow(WorkflowError::Database(e))),
}

#[derive(ApiError, Debug, Fail)]
pub enum ScheduleError {
    /// The edition has no (future) scheduled publication date.
    #[api(code = "edition:schedule:no-date", status = "BAD_REQUEST")]
    #[fail(display = "This edition does not have a scheduled publication \
        date set")]
    NoScheduledDate,
    #[fail(display = "{}", _0)]
    Workflow(#[cause] WorkflowError),
}

impl_from! { for ScheduleError ;
    WorkflowError => |e| ScheduleError::Workflow(e),
    DbError => |e| ScheduleError::Workflow(WorkflowError::Database(e)),
}

#[derive(ApiError, Debug, Fail)]
pub enum UnscheduleError {
    /// The edition is not waiting for publication.
    #[api(code = "edition:unschedule:not-scheduled", status = "BAD_REQUEST")]
    #[fail(display = "This edition is not scheduled for publication")]
    NotScheduled,
    #[fail(display = "{}", _0)]
    Workflow(#[cause] WorkflowError),
}

impl_from! { for UnscheduleError ;
    WorkflowError => |e| UnscheduleError::Workflow(e),
    DbError => |e| UnscheduleError::Workflow(WorkflowError::Database(e)),
}

#[derive(ApiError, Debug, Fail)]
pub enum UnpublishError {
    #[fail(display = "{}", _0)]
    Permissions(#[cause] RequirePermissionsError),
    #[fail(display = "{}", _0)]
    InvalidParams(#[cause] unpublishing::ValidateParamsError),
    #[fail(display = "{}", _0)]
    Workflow(#[cause] WorkflowError),
}

impl_from! { for UnpublishError ;
    RequirePermissionsError => |e| UnpublishError::Permissions(e),
    unpublishing::ValidateParamsError => |e| UnpublishError::InvalidParams(e),
    WorkflowError => |e| UnpublishError::Workflow(e),
    DbError => |e| UnpublishError::Workflow(WorkflowError::Database(e)),
}

#[derive(ApiError, Debug, Fail)]
pub enum ApproveRetrospectivelyError {
    /// The edition was not force-published (any more).
    #[api(code = "edition:approve-retrospectively:not-force-published",
        status = "BAD_REQUEST")]
    #[fail(display = "This document has not been force-published")]
    NotForcePublished,
    #[fail(display = "{}", _0)]
    Workflow(#[cause] WorkflowError),
}

impl_from! { for ApproveRetrospectivelyError ;
    WorkflowError => |e| ApproveRetrospectivelyError::Workflow(e),
    DbError => |e| ApproveRetrospectivelyError::Workflow(
        WorkflowError::Database(e)),
}

#[derive(ApiError, Debug, Fail)]
pub enum UpdateEditionError {
    /// The edition is past the point where its content can change.
    #[api(code = "edition:not-editable", status = "BAD_REQUEST")]
    #[fail(display = "A {} edition can no longer be edited", _0)]
    NotEditable(EditionState),
    #[fail(display = "{}", _0)]
    Workflow(#[cause] WorkflowError),
}

impl_from! { for UpdateEditionError ;
    WorkflowError => |e| UpdateEditionError::Workflow(e),
    DbError => |e| UpdateEditionError::Workflow(WorkflowError::Database(e)),
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use uuid::Uuid;

    use crate::db::{
        models as db,
        types::{EditionKind, EditionState},
    };
    use super::{
        PublishError,
        WorkflowError,
        check_publishable,
        has_future_schedule,
        missing_fields,
    };

    fn edition(state: EditionState) -> db::Edition {
        let epoch = NaiveDateTime::from_timestamp(0, 0);

        db::Edition {
            id: 1,
            document: Uuid::nil(),
            kind: EditionKind::Policy,
            title: "Tax transparency".into(),
            summary: Some("A summary".into()),
            body: Some("A body".into()),
            state,
            lock_version: 0,
            created_by: 1,
            published_by: None,
            scheduled_publication: None,
            force_published: false,
            force_publish_reason: None,
            access_limited: false,
            created_at: epoch,
            updated_at: epoch,
        }
    }

    #[test]
    fn only_submitted_editions_are_publishable() {
        assert!(check_publishable(EditionState::Submitted).is_ok());

        match check_publishable(EditionState::Published) {
            Err(PublishError::AlreadyPublished) => (),
            r => panic!("expected AlreadyPublished, got {:?}", r),
        }

        for &state in &[
            EditionState::Draft,
            EditionState::Rejected,
            EditionState::Scheduled,
            EditionState::Unpublished,
            EditionState::Imported,
        ] {
            match check_publishable(state) {
                Err(PublishError::Workflow(
                    WorkflowError::InvalidTransition(s))) => assert_eq!(s, state),
                r => panic!("expected InvalidTransition, got {:?}", r),
            }
        }
    }

    #[test]
    fn complete_editions_have_no_missing_fields() {
        assert!(missing_fields(&edition(EditionState::Draft)).is_empty());
    }

    #[test]
    fn blank_fields_are_reported_by_name() {
        let mut data = edition(EditionState::Draft);
        data.summary = None;

        assert_eq!(missing_fields(&data), ["Summary can't be blank"]);

        data.title = "  ".into();
        data.body = Some(String::new());

        assert_eq!(missing_fields(&data), [
            "Title can't be blank",
            "Summary can't be blank",
            "Body can't be blank",
        ]);
    }

    #[test]
    fn scheduling_requires_a_future_date() {
        let now = NaiveDateTime::from_timestamp(1_000_000, 0);

        assert!(!has_future_schedule(None, now));
        assert!(!has_future_schedule(
            Some(NaiveDateTime::from_timestamp(999_999, 0)), now));
        assert!(!has_future_schedule(Some(now), now));
        assert!(has_future_schedule(
            Some(NaiveDateTime::from_timestamp(1_000_001, 0)), now));
    }
}
