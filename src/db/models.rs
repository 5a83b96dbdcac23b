use chrono::NaiveDateTime;
use uuid::Uuid;

use super::schema::*;
use super::types::{
    EditionKind,
    EditionState,
    ScanStatus,
    UnpublishingReason,
};

#[derive(Associations, Clone, Debug, Identifiable, Queryable)]
pub struct User {
    pub id: i32,
    /// User's email address, used for logging into the system and for
    /// notifications. Accounts created for attribution only (e.g. migrated
    /// from a legacy system) may not have one.
    pub email: Option<String>,
    /// User's display name. This is visible to other users.
    pub name: String,
    /// Hash of password, currently Argon2.
    pub password: Vec<u8>,
    /// Salt used for hashing password.
    pub salt: Vec<u8>,
    /// Bit-flags describing what this user can do
    /// (see [`crate::permissions::PermissionBits`]).
    pub permissions: i32,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "users"]
pub struct NewUser<'a> {
    pub email: Option<&'a str>,
    pub name: &'a str,
    pub password: &'a [u8],
    pub salt: &'a [u8],
    pub permissions: i32,
}

#[derive(AsChangeset, Clone, Copy, Debug)]
#[table_name = "users"]
pub struct PasswordChange<'a> {
    pub password: &'a [u8],
    pub salt: &'a [u8],
}

#[derive(Associations, Clone, Copy, Debug, Identifiable, Queryable)]
#[belongs_to(User, foreign_key = "user")]
pub struct Session {
    /// ID of this session.
    pub id: i32,
    /// ID of the user owning this session.
    pub user: i32,
    /// Maximum age for the session, after which it must not be used.
    pub expires: NaiveDateTime,
    /// Date of the last use of a session. Sessions which were not used for
    /// some time should expire, even if they are still valid according to
    /// `expires`.
    pub last_used: NaiveDateTime,
    /// Permissions this session's user had when it was created.
    pub permissions: i32,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "sessions"]
pub struct NewSession {
    pub user: i32,
    pub expires: NaiveDateTime,
    pub last_used: NaiveDateTime,
    pub permissions: i32,
}

#[derive(Associations, Clone, Debug, Identifiable, Queryable)]
pub struct Edition {
    /// ID of this edition.
    pub id: i32,
    /// ID of the document this edition is a version of. Successive editions
    /// of the same document share this ID.
    pub document: Uuid,
    /// What kind of document this is.
    pub kind: EditionKind,
    /// Title shown on the public site.
    pub title: String,
    /// Short summary shown in listings. Required for submission.
    pub summary: Option<String>,
    /// Body of the document. Required for submission.
    pub body: Option<String>,
    /// Where in its lifecycle this edition currently is.
    pub state: EditionState,
    /// Counter incremented by every successful mutation. Mutating operations
    /// carry the counter value their caller last saw, and fail when it no
    /// longer matches this field.
    pub lock_version: i32,
    /// User who created this edition.
    pub created_by: i32,
    /// User who published this edition, if it was published by hand.
    pub published_by: Option<i32>,
    /// When this edition should go live, for scheduled publication.
    pub scheduled_publication: Option<NaiveDateTime>,
    /// Was this edition published without the usual second-reviewer step?
    pub force_published: bool,
    /// Justification recorded when force-publishing.
    pub force_publish_reason: Option<String>,
    /// When set, only authors and holders of the restricted-view permission
    /// can see or act on this edition.
    pub access_limited: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "editions"]
pub struct NewEdition<'a> {
    pub document: Uuid,
    pub kind: EditionKind,
    pub title: &'a str,
    pub summary: Option<&'a str>,
    pub body: Option<&'a str>,
    pub state: EditionState,
    pub created_by: i32,
    pub scheduled_publication: Option<NaiveDateTime>,
    pub access_limited: bool,
}

#[derive(Associations, Clone, Copy, Debug, Identifiable, Insertable, Queryable)]
#[belongs_to(Edition, foreign_key = "edition")]
#[primary_key(edition, user)]
#[table_name = "edition_authors"]
pub struct EditionAuthor {
    /// Edition this user worked on.
    pub edition: i32,
    /// The author.
    pub user: i32,
}

#[derive(Associations, Clone, Debug, Identifiable, Queryable)]
#[belongs_to(Edition, foreign_key = "edition")]
#[table_name = "unpublishings"]
pub struct Unpublishing {
    /// ID of this unpublishing.
    pub id: i32,
    /// Edition which was withdrawn.
    pub edition: i32,
    /// Why it was withdrawn.
    pub reason: UnpublishingReason,
    /// Free-form explanation shown on the public site.
    pub explanation: Option<String>,
    /// Where readers should be sent instead, if anywhere.
    pub alternative_url: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "unpublishings"]
pub struct NewUnpublishing<'a> {
    pub edition: i32,
    pub reason: UnpublishingReason,
    pub explanation: Option<&'a str>,
    pub alternative_url: Option<&'a str>,
}

#[derive(Clone, Debug, Identifiable, Queryable)]
#[table_name = "attachments"]
pub struct Attachment {
    /// ID of this attachment.
    pub id: i32,
    /// Name the file was uploaded under.
    pub file_name: String,
    /// Mime type of this attachment.
    pub mime: String,
    /// Size of the file in bytes.
    pub size: i64,
    /// BLAKE2b digest of the file's contents.
    pub content_hash: Vec<u8>,
    /// Virus-scan outcome recorded for this attachment.
    pub scan_status: ScanStatus,
    /// Newer attachment superseding this one, if any.
    pub replaced_by: Option<i32>,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "attachments"]
pub struct NewAttachment<'a> {
    pub file_name: &'a str,
    pub mime: &'a str,
    pub size: i64,
    pub content_hash: &'a [u8],
    pub scan_status: ScanStatus,
}

#[derive(Associations, Clone, Copy, Debug, Identifiable, Insertable, Queryable)]
#[belongs_to(Attachment, foreign_key = "attachment")]
#[primary_key(attachment, user)]
#[table_name = "attachment_authorizations"]
pub struct AttachmentAuthorization {
    /// Attachment to which access is limited.
    pub attachment: i32,
    /// User allowed to see it.
    pub user: i32,
}

#[derive(Associations, Clone, Debug, Identifiable, Queryable)]
#[belongs_to(User, foreign_key = "user")]
pub struct Event {
    /// ID of this event.
    pub id: i32,
    /// ID of the user for which this event was generated.
    pub user: i32,
    /// Time at which this event was generated.
    pub timestamp: NaiveDateTime,
    /// Short string describing what kind of event is this.
    pub kind: String,
    /// True if the user has not yet reviewed this event.
    pub is_unread: bool,
    /// Actual data for the event, serialized as MessagePack.
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "events"]
pub struct NewEvent<'a> {
    pub user: i32,
    pub kind: &'a str,
    pub data: &'a [u8],
}

#[derive(Clone, Debug, Identifiable, Queryable)]
#[table_name = "audit_log"]
pub struct AuditEntry {
    /// ID of this entry.
    pub id: i32,
    /// When the action happened.
    pub timestamp: NaiveDateTime,
    /// User who performed the action, or `None` for the system itself.
    pub actor: Option<i32>,
    /// What kind of object was acted upon (e.g. "edition").
    pub context: String,
    /// ID of the object acted upon.
    pub context_id: i32,
    /// What was done.
    pub kind: String,
    /// Details of the action, serialized as MessagePack.
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "audit_log"]
pub struct NewAuditEntry<'a> {
    pub actor: Option<i32>,
    pub context: &'a str,
    pub context_id: i32,
    pub kind: &'a str,
    pub data: &'a [u8],
}
