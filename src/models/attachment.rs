use blake2::blake2b::blake2b;
use diesel::{
    Connection as _Connection,
    prelude::*,
    result::Error as DbError,
};
use failure::Fail;

use crate::{
    ApiError,
    db::{
        Connection,
        models as db,
        schema::{attachment_authorizations, attachments},
        types::ScanStatus,
    },
    permissions::PermissionBits,
};
use super::user::User;

/// Length of the content digest stored for each attachment.
const HASH_LENGTH: usize = 32;

/// How many replacement pointers we are willing to follow. Replacement
/// chains are expected to be short; a longer one indicates a reference
/// cycle.
const MAX_REPLACEMENT_CHAIN: usize = 32;

/// Metadata of an uploaded file.
///
/// Contents are identified by a BLAKE2b digest and live in an external
/// object store together with the scanning pipeline; only the metadata and
/// the visibility rules are modelled here.
#[derive(Clone, Debug)]
pub struct AttachmentData {
    data: db::Attachment,
}

/// A subset of an attachment's data that can safely be publicly exposed.
#[derive(Debug, Serialize)]
pub struct PublicData {
    pub id: i32,
    pub file_name: String,
    pub mime: String,
    pub size: i64,
    pub content_hash: String,
    pub scan_status: ScanStatus,
    pub replaced_by: Option<i32>,
}

/// What a given viewer may learn about an attachment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Visibility {
    /// Full metadata can be shown.
    Visible,
    /// The file exists but has not been scanned yet; only a placeholder
    /// should be shown.
    Pending,
    /// The viewer must not learn anything about this attachment.
    Hidden,
}

impl AttachmentData {
    /// Construct `AttachmentData` from its database counterpart.
    pub(super) fn from_db(data: db::Attachment) -> AttachmentData {
        AttachmentData { data }
    }

    /// Find an attachment by ID.
    pub fn by_id(dbcon: &Connection, id: i32)
    -> Result<AttachmentData, FindAttachmentError> {
        attachments::table
            .filter(attachments::id.eq(id))
            .get_result::<db::Attachment>(dbcon)
            .optional()?
            .ok_or(FindAttachmentError::NotFound)
            .map(AttachmentData::from_db)
    }

    /// Register a new attachment.
    ///
    /// The digest is computed here, from the bytes as they were uploaded;
    /// the scanning pipeline reports its verdict later through
    /// [`AttachmentData::set_scan_status`]. When `limited_to` is not empty
    /// only the listed users (and holders of the restricted-view permission)
    /// can see the attachment.
    pub fn create(
        dbcon: &Connection,
        file_name: &str,
        mime: &str,
        content: &[u8],
        limited_to: &[i32],
    ) -> Result<AttachmentData, DbError> {
        let hash = blake2b(HASH_LENGTH, &[], content);

        dbcon.transaction(|| {
            let data = diesel::insert_into(attachments::table)
                .values(&db::NewAttachment {
                    file_name,
                    mime,
                    size: content.len() as i64,
                    content_hash: hash.as_bytes(),
                    scan_status: ScanStatus::Unscanned,
                })
                .get_result::<db::Attachment>(dbcon)?;

            for user in limited_to {
                diesel::insert_into(attachment_authorizations::table)
                    .values(&db::AttachmentAuthorization {
                        attachment: data.id,
                        user: *user,
                    })
                    .execute(dbcon)?;
            }

            Ok(AttachmentData { data })
        })
    }

    /// Get the public portion of this attachment's data.
    pub fn get_public(&self) -> PublicData {
        let db::Attachment {
            id,
            ref file_name,
            ref mime,
            size,
            ref content_hash,
            scan_status,
            replaced_by,
        } = self.data;

        PublicData {
            id,
            file_name: file_name.clone(),
            mime: mime.clone(),
            size,
            content_hash: base64::encode(content_hash),
            scan_status,
            replaced_by,
        }
    }

    /// Users this attachment is limited to. An empty list means the
    /// attachment is not restricted.
    pub fn authorized_users(&self, dbcon: &Connection)
    -> Result<Vec<i32>, DbError> {
        attachment_authorizations::table
            .filter(attachment_authorizations::attachment.eq(self.data.id))
            .select(attachment_authorizations::user)
            .get_results(dbcon)
    }

    /// Record the scanning pipeline's verdict on this attachment.
    pub fn set_scan_status(&mut self, dbcon: &Connection, status: ScanStatus)
    -> Result<(), DbError> {
        self.data = diesel::update(&self.data)
            .set(attachments::scan_status.eq(status))
            .get_result(dbcon)?;
        Ok(())
    }

    /// Mark this attachment as superseded by another one.
    pub fn replace_with(&mut self, dbcon: &Connection, replacement: &AttachmentData)
    -> Result<(), DbError> {
        self.data = diesel::update(&self.data)
            .set(attachments::replaced_by.eq(replacement.data.id))
            .get_result(dbcon)?;
        Ok(())
    }

    /// Follow this attachment's replacement chain to its newest member.
    ///
    /// Returns `None` if the attachment has not been replaced.
    pub fn resolve_replacement(&self, dbcon: &Connection)
    -> Result<Option<AttachmentData>, DbError> {
        let mut current = match self.data.replaced_by {
            Some(id) => id,
            None => return Ok(None),
        };

        for _ in 0..MAX_REPLACEMENT_CHAIN {
            let data = attachments::table
                .filter(attachments::id.eq(current))
                .get_result::<db::Attachment>(dbcon)?;

            match data.replaced_by {
                Some(next) if next != data.id => current = next,
                _ => return Ok(Some(AttachmentData { data })),
            }
        }

        warn!("attachment {} has a replacement chain longer than {}",
            self.data.id, MAX_REPLACEMENT_CHAIN);

        Ok(None)
    }

    /// What may `viewer` learn about this attachment?
    pub fn visibility(&self, dbcon: &Connection, viewer: Option<&User>)
    -> Result<Visibility, DbError> {
        let authorized = self.authorized_users(dbcon)?;

        Ok(assess(
            self.data.scan_status,
            &authorized,
            viewer.map(|user| (user.id, user.permissions())),
        ))
    }

    pub fn into_db(self) -> db::Attachment {
        self.data
    }
}

impl std::ops::Deref for AttachmentData {
    type Target = db::Attachment;

    fn deref(&self) -> &db::Attachment {
        &self.data
    }
}

/// Decide what a viewer may learn about an attachment.
fn assess(
    scan_status: ScanStatus,
    authorized: &[i32],
    viewer: Option<(i32, PermissionBits)>,
) -> Visibility {
    // Infected files are gone for everyone, including their uploader.
    if scan_status == ScanStatus::Infected {
        return Visibility::Hidden;
    }

    if !authorized.is_empty() {
        let allowed = match viewer {
            Some((id, permissions)) =>
                authorized.contains(&id)
                    || permissions.contains(PermissionBits::VIEW_RESTRICTED),
            None => false,
        };

        if !allowed {
            return Visibility::Hidden;
        }
    }

    match scan_status {
        ScanStatus::Clean => Visibility::Visible,
        ScanStatus::Unscanned => Visibility::Pending,
        ScanStatus::Infected => Visibility::Hidden,
    }
}

#[derive(ApiError, Debug, Fail)]
pub enum FindAttachmentError {
    /// Database error.
    #[api(internal)]
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    /// No attachment found matching given criteria.
    #[api(code = "attachment:not-found", status = "NOT_FOUND")]
    #[fail(display = "No such attachment")]
    NotFound,
}

impl_from! { for FindAttachmentError ;
    DbError => |e| FindAttachmentError::Database(e),
}

#[cfg(test)]
mod tests {
    use crate::{db::types::ScanStatus, permissions::PermissionBits};
    use super::{Visibility, assess};

    #[test]
    fn infected_attachments_are_hidden_from_everyone() {
        assert_eq!(
            assess(ScanStatus::Infected, &[],
                Some((1, PermissionBits::all()))),
            Visibility::Hidden,
        );
    }

    #[test]
    fn unscanned_attachments_are_only_pending() {
        assert_eq!(assess(ScanStatus::Unscanned, &[], None),
            Visibility::Pending);
    }

    #[test]
    fn restricted_attachments_require_authorization() {
        let authorized = [7, 9];

        assert_eq!(
            assess(ScanStatus::Clean, &authorized, None),
            Visibility::Hidden,
        );
        assert_eq!(
            assess(ScanStatus::Clean, &authorized,
                Some((3, PermissionBits::empty()))),
            Visibility::Hidden,
        );
        assert_eq!(
            assess(ScanStatus::Clean, &authorized,
                Some((7, PermissionBits::empty()))),
            Visibility::Visible,
        );
        assert_eq!(
            assess(ScanStatus::Clean, &authorized,
                Some((3, PermissionBits::VIEW_RESTRICTED))),
            Visibility::Visible,
        );
    }

    #[test]
    fn unrestricted_clean_attachments_are_public() {
        assert_eq!(assess(ScanStatus::Clean, &[], None), Visibility::Visible);
    }
}
