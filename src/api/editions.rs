use actix_web::{
    App,
    Json,
    Path,
    Query,
    http::Method,
};
use chrono::NaiveDateTime;

use crate::{
    db::types::{EditionKind, EditionState},
    events::{EventManager, Published, Rejected, Unpublished},
    models::{
        Edition,
        Unpublishing,
        User,
        edition::{ContentUpdate, FindEditionError, PublicData as EditionData},
        unpublishing::{self, PublicData as UnpublishingData},
        user::PublicData as UserData,
    },
    permissions::{EditEdition, PublishEdition},
};
use super::{
    Error,
    RouteExt,
    RouterExt,
    State,
    session::Session,
    util::FormOrJson,
};

/// Configure routes.
pub fn routes(app: App<State>) -> App<State> {
    app
        .api_route("/editions", Method::GET, list_editions)
        .api_route("/editions", Method::POST, create_edition)
        .resource("/editions/{id}", |r| {
            r.get().api_with(get_edition);
            r.put().api_with(update_edition);
        })
        .api_route("/editions/{id}/submit", Method::POST, submit_edition)
        .api_route("/editions/{id}/publish", Method::POST, publish_edition)
        .api_route("/editions/{id}/force-publish", Method::POST,
            force_publish_edition)
        .api_route("/editions/{id}/schedule", Method::POST, schedule_edition)
        .api_route("/editions/{id}/unschedule", Method::POST,
            unschedule_edition)
        .api_route("/editions/{id}/reject", Method::POST, reject_edition)
        .api_route("/editions/{id}/unpublish", Method::POST,
            unpublish_edition)
        .api_route("/editions/{id}/convert-to-draft", Method::POST,
            convert_edition_to_draft)
        .api_route("/editions/{id}/approve-retrospectively", Method::POST,
            approve_edition_retrospectively)
        .api_route("/editions/{id}/unpublishing", Method::GET,
            get_unpublishing)
        .api_route("/editions/{id}/authors", Method::GET, list_authors)
}

type Result<T, E=Error> = std::result::Result<T, E>;

/// Result of a workflow action: the message to show the user, and the
/// edition as the action left it (including its new lock version).
#[derive(Debug, Serialize)]
pub struct WorkflowResult {
    pub notice: String,
    pub edition: EditionData,
}

/// Fields shared by every workflow action request.
#[derive(Debug, Deserialize)]
pub struct WorkflowData {
    lock_version: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    state: Option<EditionState>,
}

/// List editions, most recently touched first.
///
/// ## Method
///
/// ```text
/// GET /editions
/// ```
pub fn list_editions(
    state: actix_web::State<State>,
    session: Session,
    query: Query<ListQuery>,
) -> Result<Json<Vec<EditionData>>> {
    let db = state.db.get()?;
    let user = session.user(&*db)?;

    let mut visible = Vec::new();
    for edition in Edition::all(&*db, query.state)? {
        if edition.check_access(&*db, &user)? {
            visible.push(edition.get_public());
        }
    }

    Ok(Json(visible))
}

#[derive(Debug, Deserialize)]
pub struct NewEditionData {
    kind: EditionKind,
    title: String,
    summary: Option<String>,
    body: Option<String>,
    #[serde(default)]
    access_limited: bool,
    #[serde(default)]
    imported: bool,
}

/// Create a new edition.
///
/// ## Method
///
/// ```text
/// POST /editions
/// ```
pub fn create_edition(
    state: actix_web::State<State>,
    session: Session<EditEdition>,
    data: Json<NewEditionData>,
) -> Result<Json<EditionData>> {
    let db = state.db.get()?;
    let user = session.user(&*db)?;

    let edition = Edition::create(
        &*db,
        &user,
        data.kind,
        &data.title,
        data.summary.as_ref().map(String::as_str),
        data.body.as_ref().map(String::as_str),
        data.access_limited,
        data.imported,
    )?;

    Ok(Json(edition.get_public()))
}

/// Get an edition by ID.
///
/// ## Method
///
/// ```text
/// GET /editions/:id
/// ```
pub fn get_edition(
    state: actix_web::State<State>,
    session: Session,
    id: Path<i32>,
) -> Result<Json<EditionData>> {
    let db = state.db.get()?;
    let edition = Edition::by_id(&*db, *id)?;
    let user = session.user(&*db)?;

    if !edition.check_access(&*db, &user)? {
        return Err(FindEditionError::NotFound.into());
    }

    Ok(Json(edition.get_public()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateData {
    lock_version: Option<i32>,
    title: Option<String>,
    summary: Option<String>,
    body: Option<String>,
    scheduled_publication: Option<NaiveDateTime>,
}

/// Update an edition's content.
///
/// ## Method
///
/// ```text
/// PUT /editions/:id
/// ```
pub fn update_edition(
    state: actix_web::State<State>,
    session: Session<EditEdition>,
    id: Path<i32>,
    form: FormOrJson<UpdateData>,
) -> Result<Json<EditionData>> {
    let db = state.db.get()?;
    let UpdateData {
        lock_version,
        title,
        summary,
        body,
        scheduled_publication,
    } = form.into_inner();
    let user = session.user(&*db)?;
    let mut edition = Edition::by_id(&*db, *id)?;

    edition.set_content(&*db, &user, lock_version, &ContentUpdate {
        title,
        summary,
        body,
        scheduled_publication,
    })?;

    Ok(Json(edition.get_public()))
}

/// Submit an edition for review.
///
/// ## Method
///
/// ```text
/// POST /editions/:id/submit
/// ```
pub fn submit_edition(
    state: actix_web::State<State>,
    session: Session<EditEdition>,
    id: Path<i32>,
    form: FormOrJson<WorkflowData>,
) -> Result<Json<WorkflowResult>> {
    let db = state.db.get()?;
    let user = session.user(&*db)?;
    let mut edition = Edition::by_id(&*db, *id)?;

    edition.submit(&*db, &user, form.lock_version)?;

    Ok(Json(WorkflowResult {
        notice: "Your document has been submitted for review by a second \
            pair of eyes".to_string(),
        edition: edition.get_public(),
    }))
}

/// Publish an edition on behalf of the current user.
///
/// ## Method
///
/// ```text
/// POST /editions/:id/publish
/// ```
pub fn publish_edition(
    state: actix_web::State<State>,
    session: Session<PublishEdition>,
    id: Path<i32>,
    form: FormOrJson<WorkflowData>,
) -> Result<Json<WorkflowResult>> {
    let db = state.db.get()?;
    let user = session.user(&*db)?;
    let mut edition = Edition::by_id(&*db, *id)?;

    edition.publish(&*db, &user, form.lock_version)?;

    for author in edition.notification_recipients(&*db, &[user.id])? {
        EventManager::notify(&author, Published {
            who: Some(user.id),
            edition: *id,
        });
    }

    Ok(Json(WorkflowResult {
        notice: format!("The document {} has been published", edition.title),
        edition: edition.get_public(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ForcePublishData {
    lock_version: Option<i32>,
    reason: Option<String>,
}

/// Publish an edition skipping the second-reviewer step.
///
/// ## Method
///
/// ```text
/// POST /editions/:id/force-publish
/// ```
pub fn force_publish_edition(
    state: actix_web::State<State>,
    session: Session<PublishEdition>,
    id: Path<i32>,
    form: FormOrJson<ForcePublishData>,
) -> Result<Json<WorkflowResult>> {
    let db = state.db.get()?;
    let form = form.into_inner();
    let user = session.user(&*db)?;
    let mut edition = Edition::by_id(&*db, *id)?;

    edition.force_publish(
        &*db,
        &user,
        form.lock_version,
        form.reason.as_ref().map(String::as_str),
    )?;

    for author in edition.notification_recipients(&*db, &[user.id])? {
        EventManager::notify(&author, Published {
            who: Some(user.id),
            edition: *id,
        });
    }

    Ok(Json(WorkflowResult {
        notice: format!("The document {} has been published", edition.title),
        edition: edition.get_public(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ScheduleData {
    lock_version: Option<i32>,
    #[serde(default)]
    force: bool,
}

/// Queue an edition for publication at its scheduled date.
///
/// ## Method
///
/// ```text
/// POST /editions/:id/schedule
/// ```
pub fn schedule_edition(
    state: actix_web::State<State>,
    session: Session<PublishEdition>,
    id: Path<i32>,
    form: FormOrJson<ScheduleData>,
) -> Result<Json<WorkflowResult>> {
    let db = state.db.get()?;
    let form = form.into_inner();
    let user = session.user(&*db)?;
    let mut edition = Edition::by_id(&*db, *id)?;

    edition.schedule(&*db, &user, form.lock_version, form.force)?;

    Ok(Json(WorkflowResult {
        notice: format!("The document {} has been scheduled for publication",
            edition.title),
        edition: edition.get_public(),
    }))
}

/// Take an edition back out of the publication queue.
///
/// ## Method
///
/// ```text
/// POST /editions/:id/unschedule
/// ```
pub fn unschedule_edition(
    state: actix_web::State<State>,
    session: Session<PublishEdition>,
    id: Path<i32>,
    form: FormOrJson<WorkflowData>,
) -> Result<Json<WorkflowResult>> {
    let db = state.db.get()?;
    let user = session.user(&*db)?;
    let mut edition = Edition::by_id(&*db, *id)?;

    edition.unschedule(&*db, &user, form.lock_version)?;

    Ok(Json(WorkflowResult {
        notice: format!("The document {} is no longer scheduled for \
            publication", edition.title),
        edition: edition.get_public(),
    }))
}

/// Reject an edition, sending it back to its authors.
///
/// ## Method
///
/// ```text
/// POST /editions/:id/reject
/// ```
pub fn reject_edition(
    state: actix_web::State<State>,
    session: Session<PublishEdition>,
    id: Path<i32>,
    form: FormOrJson<WorkflowData>,
) -> Result<Json<WorkflowResult>> {
    let db = state.db.get()?;
    let user = session.user(&*db)?;
    let mut edition = Edition::by_id(&*db, *id)?;

    edition.reject(&*db, &user, form.lock_version)?;

    for author in edition.notification_recipients(&*db, &[user.id])? {
        EventManager::notify(&author, Rejected {
            who: user.id,
            edition: *id,
        });
    }

    Ok(Json(WorkflowResult {
        notice: format!("The document {} has been rejected", edition.title),
        edition: edition.get_public(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct UnpublishData {
    lock_version: Option<i32>,
    unpublishing: unpublishing::Params,
}

/// Withdraw a published edition from the public site.
///
/// ## Method
///
/// ```text
/// POST /editions/:id/unpublish
/// ```
pub fn unpublish_edition(
    state: actix_web::State<State>,
    session: Session,
    id: Path<i32>,
    form: FormOrJson<UnpublishData>,
) -> Result<Json<WorkflowResult>> {
    let db = state.db.get()?;
    let form = form.into_inner();
    let user = session.user(&*db)?;
    let mut edition = Edition::by_id(&*db, *id)?;

    edition.unpublish(&*db, &user, form.lock_version, &form.unpublishing)?;

    for author in edition.notification_recipients(&*db, &[user.id])? {
        EventManager::notify(&author, Unpublished {
            who: user.id,
            edition: *id,
        });
    }

    Ok(Json(WorkflowResult {
        notice: "This document has been unpublished and will no longer \
            appear on the public website".to_string(),
        edition: edition.get_public(),
    }))
}

/// Turn an imported edition into a draft.
///
/// ## Method
///
/// ```text
/// POST /editions/:id/convert-to-draft
/// ```
pub fn convert_edition_to_draft(
    state: actix_web::State<State>,
    session: Session<EditEdition>,
    id: Path<i32>,
    form: FormOrJson<WorkflowData>,
) -> Result<Json<WorkflowResult>> {
    let db = state.db.get()?;
    let user = session.user(&*db)?;
    let mut edition = Edition::by_id(&*db, *id)?;

    edition.convert_to_draft(&*db, &user, form.lock_version)?;

    Ok(Json(WorkflowResult {
        notice: format!("The imported document {} has been converted into \
            a draft", edition.title),
        edition: edition.get_public(),
    }))
}

/// Clear the force-published mark after a retrospective review.
///
/// ## Method
///
/// ```text
/// POST /editions/:id/approve-retrospectively
/// ```
pub fn approve_edition_retrospectively(
    state: actix_web::State<State>,
    session: Session<PublishEdition>,
    id: Path<i32>,
    form: FormOrJson<WorkflowData>,
) -> Result<Json<WorkflowResult>> {
    let db = state.db.get()?;
    let user = session.user(&*db)?;
    let mut edition = Edition::by_id(&*db, *id)?;

    edition.approve_retrospectively(&*db, &user, form.lock_version)?;

    Ok(Json(WorkflowResult {
        notice: "Thanks for reviewing; this document is no longer marked \
            as force-published".to_string(),
        edition: edition.get_public(),
    }))
}

/// Get the record of an edition's withdrawal.
///
/// ## Method
///
/// ```text
/// GET /editions/:id/unpublishing
/// ```
pub fn get_unpublishing(
    state: actix_web::State<State>,
    session: Session,
    id: Path<i32>,
) -> Result<Json<UnpublishingData>> {
    let db = state.db.get()?;
    let edition = Edition::by_id(&*db, *id)?;
    let user = session.user(&*db)?;

    if !edition.check_access(&*db, &user)? {
        return Err(FindEditionError::NotFound.into());
    }

    let unpublishing = Unpublishing::by_edition(&*db, *id)?;

    Ok(Json(unpublishing.get_public()))
}

/// List the users who have worked on an edition.
///
/// ## Method
///
/// ```text
/// GET /editions/:id/authors
/// ```
pub fn list_authors(
    state: actix_web::State<State>,
    session: Session,
    id: Path<i32>,
) -> Result<Json<Vec<UserData>>> {
    let db = state.db.get()?;
    let edition = Edition::by_id(&*db, *id)?;
    let user = session.user(&*db)?;

    if !edition.check_access(&*db, &user)? {
        return Err(FindEditionError::NotFound.into());
    }

    let authors = edition.get_authors(&*db)?;

    Ok(Json(authors.iter().map(User::get_public).collect()))
}
