use actix_web::{
    App,
    HttpResponse,
    Json,
    Path,
    http::{Method, header::LOCATION},
};
use failure::Fail;

use crate::{
    ApiError,
    db::types::ScanStatus,
    models::{
        AttachmentData,
        attachment::{FindAttachmentError, PublicData, Visibility},
    },
    permissions::ManageAttachments,
};
use super::{
    Error,
    RouterExt,
    State,
    session::Session,
};

/// Configure routes.
pub fn routes(app: App<State>) -> App<State> {
    app
        .api_route("/attachments", Method::POST, create_attachment)
        .api_route("/attachments/{id}", Method::GET, get_attachment)
        .api_route("/attachments/{id}/scan-status", Method::PUT,
            set_scan_status)
        .api_route("/attachments/{id}/replacement", Method::PUT,
            set_replacement)
}

type Result<T, E=Error> = std::result::Result<T, E>;

#[derive(Debug, Deserialize)]
pub struct NewAttachmentData {
    file_name: String,
    mime: String,
    /// File contents, base64-encoded. Only the digest and size are kept.
    content: String,
    #[serde(default)]
    limited_to: Vec<i32>,
}

/// Register a new attachment.
///
/// ## Method
///
/// ```text
/// POST /attachments
/// ```
pub fn create_attachment(
    state: actix_web::State<State>,
    _session: Session<ManageAttachments>,
    data: Json<NewAttachmentData>,
) -> Result<Json<PublicData>> {
    let db = state.db.get()?;

    let content = base64::decode(&data.content)
        .map_err(|_| InvalidAttachmentContent)?;

    let attachment = AttachmentData::create(
        &*db,
        &data.file_name,
        &data.mime,
        &content,
        &data.limited_to,
    )?;

    Ok(Json(attachment.get_public()))
}

/// What is reported about an attachment that exists but cannot be shown yet.
#[derive(Debug, Serialize)]
struct PendingData {
    id: i32,
    status: &'static str,
}

/// Get an attachment's metadata.
///
/// Infected attachments, and restricted attachments the current user is not
/// authorized for, are indistinguishable from attachments that don't exist.
/// A superseded attachment redirects to its newest replacement.
///
/// ## Method
///
/// ```text
/// GET /attachments/:id
/// ```
pub fn get_attachment(
    state: actix_web::State<State>,
    session: Session,
    id: Path<i32>,
) -> Result<HttpResponse> {
    let db = state.db.get()?;
    let attachment = AttachmentData::by_id(&*db, *id)?;
    let user = session.user(&*db)?;

    match attachment.visibility(&*db, Some(&user))? {
        Visibility::Visible => {
            if let Some(replacement) = attachment.resolve_replacement(&*db)? {
                return Ok(redirect_to(replacement.id));
            }

            Ok(HttpResponse::Ok().json(attachment.get_public()))
        }
        Visibility::Pending => Ok(HttpResponse::Ok().json(PendingData {
            id: *id,
            status: "unscanned",
        })),
        Visibility::Hidden => {
            if let Some(replacement) = attachment.resolve_replacement(&*db)? {
                return Ok(redirect_to(replacement.id));
            }

            Err(FindAttachmentError::NotFound.into())
        }
    }
}

fn redirect_to(id: i32) -> HttpResponse {
    HttpResponse::MovedPermanently()
        .header(LOCATION, format!("/api/v1/attachments/{}", id))
        .finish()
}

#[derive(Debug, Deserialize)]
pub struct ScanStatusUpdate {
    scan_status: ScanStatus,
}

/// Record the scanning pipeline's verdict on an attachment.
///
/// ## Method
///
/// ```text
/// PUT /attachments/:id/scan-status
/// ```
pub fn set_scan_status(
    state: actix_web::State<State>,
    _session: Session<ManageAttachments>,
    id: Path<i32>,
    update: Json<ScanStatusUpdate>,
) -> Result<Json<PublicData>> {
    let db = state.db.get()?;
    let mut attachment = AttachmentData::by_id(&*db, *id)?;

    attachment.set_scan_status(&*db, update.scan_status)?;

    Ok(Json(attachment.get_public()))
}

/// Mark an attachment as superseded by another one.
///
/// ## Method
///
/// ```text
/// PUT /attachments/:id/replacement
/// ```
pub fn set_replacement(
    state: actix_web::State<State>,
    _session: Session<ManageAttachments>,
    id: Path<i32>,
    replacement: Json<i32>,
) -> Result<Json<PublicData>> {
    let db = state.db.get()?;
    let mut attachment = AttachmentData::by_id(&*db, *id)?;
    let replacement = AttachmentData::by_id(&*db, *replacement)?;

    attachment.replace_with(&*db, &replacement)?;

    Ok(Json(attachment.get_public()))
}

#[derive(ApiError, Debug, Fail)]
#[api(code = "attachment:new:invalid-content", status = "BAD_REQUEST")]
#[fail(display = "Attachment content is not valid base64")]
struct InvalidAttachmentContent;
