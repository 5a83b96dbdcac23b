use failure::Fail;

use crate::ApiError;

bitflags! {
    /// Permissions allow for a fine-grained control over what actions a given
    /// user can take.
    pub struct PermissionBits: i32 {
        /// All bits allocated for content management permissions.
        const MANAGE_CONTENT_BITS = 0x0000000f;
        /// Permission holder can create and edit editions.
        const EDIT_EDITION = 0x00000001;
        /// Permission holder can publish, schedule, and reject editions
        /// submitted for review.
        const PUBLISH_EDITION = 0x00000002;
        /// Permission holder can withdraw published editions from the public
        /// site.
        const MANAGE_UNPUBLISHING = 0x00000004;
        /// Permission holder can register attachments and record their scan
        /// outcomes.
        const MANAGE_ATTACHMENTS = 0x00000008;
        /// All bits allocated for user management permissions.
        const MANAGE_USERS_BITS = 0x000000f0;
        /// Permission holder can manage other users and their permissions.
        const MANAGE_USERS = 0x00000010;
        /// All bits allocated for visibility permissions.
        const VISIBILITY_BITS = 0x00000f00;
        /// Permission holder can see access-limited editions and restricted
        /// attachments they are not an author of.
        const VIEW_RESTRICTED = 0x00000100;
    }
}

impl PermissionBits {
    /// Verify that all required permissions are present.
    ///
    /// This is the same check as `self.contains(permissions)`, but returns an
    /// [`ApiError`].
    pub fn require(&self, permissions: PermissionBits)
    -> Result<(), RequirePermissionsError> {
        if self.contains(permissions) {
            Ok(())
        } else {
            Err(RequirePermissionsError(permissions - *self))
        }
    }
}

pub trait Permission {
    /// Permissions are stored as bit-flags, and this field is a mask of bits
    /// corresponding to this permission (or combination of permissions).
    fn bits() -> PermissionBits;
}

macro_rules! permission {
    (
        $name:ident = $value:expr
    ) => {
        pub struct $name;

        impl Permission for $name {
            #[inline]
            fn bits() -> PermissionBits {
                $value
            }
        }
    };
}

permission!(EditEdition = PermissionBits::EDIT_EDITION);
permission!(PublishEdition = PermissionBits::PUBLISH_EDITION);
permission!(ManageUnpublishing = PermissionBits::MANAGE_UNPUBLISHING);
permission!(ManageAttachments = PermissionBits::MANAGE_ATTACHMENTS);
permission!(ManageUsers = PermissionBits::MANAGE_USERS);
permission!(ViewRestricted = PermissionBits::VIEW_RESTRICTED);

#[derive(ApiError, Debug, Fail)]
#[api(status = "FORBIDDEN", code = "user:insufficient-permissions")]
#[fail(display = "Missing required permissions: {:?}", _0)]
pub struct RequirePermissionsError(PermissionBits);

macro_rules! impl_permissons {
    {
        $( ($($name:ident),+) );+ $(;)*
    } => {
        $(
            impl<$($name),+> Permission for ($($name),+)
            where
                $($name: Permission,)+
            {
                #[inline]
                fn bits() -> PermissionBits {
                    $($name::bits())|+
                }
            }
        )+
    };
}

impl_permissons! {
    (A, B);
    (A, B, C);
}

#[cfg(test)]
mod tests {
    use super::PermissionBits;

    #[test]
    fn require_reports_only_missing_bits() {
        let held = PermissionBits::EDIT_EDITION | PermissionBits::PUBLISH_EDITION;

        assert!(held.require(PermissionBits::PUBLISH_EDITION).is_ok());
        assert!(held
            .require(PermissionBits::PUBLISH_EDITION
                | PermissionBits::MANAGE_UNPUBLISHING)
            .is_err());
    }

    #[test]
    fn permission_groups_cover_their_members() {
        assert!(PermissionBits::MANAGE_CONTENT_BITS
            .contains(PermissionBits::MANAGE_UNPUBLISHING));
        assert!(PermissionBits::MANAGE_USERS_BITS
            .contains(PermissionBits::MANAGE_USERS));
        assert!(PermissionBits::VISIBILITY_BITS
            .contains(PermissionBits::VIEW_RESTRICTED));
    }
}
