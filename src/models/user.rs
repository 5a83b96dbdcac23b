use diesel::{
    Connection as _Connection,
    prelude::*,
    result::{DatabaseErrorKind, Error as DbError},
};
use failure::Fail;
use lettre_email::Mailbox;
use rand::RngCore;

use crate::{
    ApiError,
    db::{
        Connection,
        models as db,
        schema::{sessions, users},
    },
    permissions::PermissionBits,
};

static ARGON2_CONFIG: argon2::Config = argon2::Config {
    ad: &[],
    hash_length: 32,
    lanes: 1,
    mem_cost: 4096,
    secret: &[],
    thread_mode: argon2::ThreadMode::Sequential,
    time_cost: 3,
    variant: argon2::Variant::Argon2id,
    version: argon2::Version::Version13,
};

/// A single user in the system.
#[derive(Clone, Debug)]
pub struct User {
    data: db::User,
}

/// A subset of user's data that can safely be publicly exposed.
#[derive(Debug, Serialize)]
pub struct PublicData {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub permissions: i32,
}

impl User {
    /// Construct `User` from its database counterpart.
    pub(super) fn from_db(data: db::User) -> User {
        User { data }
    }

    /// Get all users.
    pub fn all(dbcon: &Connection) -> Result<Vec<User>, DbError> {
        users::table
            .get_results::<db::User>(dbcon)
            .map(|v| v.into_iter().map(User::from_db).collect())
    }

    /// Find an user by ID.
    pub fn by_id(dbcon: &Connection, id: i32) -> Result<User, FindUserError> {
        users::table
            .filter(users::id.eq(id))
            .get_result::<db::User>(dbcon)
            .optional()?
            .ok_or(FindUserError::NotFound)
            .map(User::from_db)
    }

    /// Find an user by email address.
    pub fn by_email(dbcon: &Connection, email: &str)
    -> Result<User, FindUserError> {
        users::table
            .filter(users::email.eq(email))
            .get_result::<db::User>(dbcon)
            .optional()?
            .ok_or(FindUserError::NotFound)
            .map(User::from_db)
    }

    /// Create a new user.
    pub fn create(
        dbcon: &Connection,
        email: Option<&str>,
        name: &str,
        password: &str,
        permissions: PermissionBits,
    ) -> Result<User, CreateUserError> {
        // Generate salt and hash password.
        let mut salt = [0; 16];
        rand::thread_rng().fill_bytes(&mut salt);

        // Hashing can only fail if the configuration is invalid, or salt
        // is wrong length. All those cases are unlikely.
        let hash = argon2::hash_raw(
            password.as_bytes(),
            &salt,
            &ARGON2_CONFIG,
        ).expect("Cannot hash password");

        diesel::insert_into(users::table)
            .values(db::NewUser {
                email,
                name,
                password: &hash,
                salt: &salt,
                permissions: permissions.bits(),
            })
            .get_result::<db::User>(dbcon)
            .map(User::from_db)
            .map_err(Into::into)
    }

    /// Find an user for given email and try to authenticate as them.
    pub fn authenticate(dbcon: &Connection, email: &str, password: &str)
    -> Result<User, UserAuthenticateError> {
        let user = User::by_email(dbcon, email)?;

        if user.check_password(password) {
            Ok(user)
        } else {
            Err(UserAuthenticateError::BadCredentials)
        }
    }

    /// Verify correctness of a password.
    pub fn check_password(&self, password: &str) -> bool {
        // Verification can only fail if the configuration is invalid, or salt
        // or password digest length are wrong. All those cases are unlikely.
        argon2::verify_raw(
            password.as_bytes(),
            &self.data.salt,
            &self.data.password,
            &ARGON2_CONFIG,
        ).expect("hashing password")
    }

    /// Get the permissions this user has.
    pub fn permissions(&self) -> PermissionBits {
        PermissionBits::from_bits_truncate(self.data.permissions)
    }

    /// Get the mailbox notifications for this user should be sent to, if they
    /// have an email address at all.
    pub fn mailbox(&self) -> Option<Mailbox> {
        self.data.email.as_ref().map(|email| {
            Mailbox::new_with_name(self.data.name.clone(), email.clone())
        })
    }

    /// Get the public portion of this user's data.
    pub fn get_public(&self) -> PublicData {
        let db::User { id, ref name, ref email, permissions, .. } = self.data;

        PublicData {
            id,
            name: name.clone(),
            email: email.clone(),
            permissions,
        }
    }

    /// Change user's password.
    ///
    /// All of the user's existing sessions are destroyed, as they might have
    /// been used by whoever prompted the change.
    pub fn change_password(&mut self, dbcon: &Connection, password: &str)
    -> Result<(), DbError> {
        let mut salt = [0; 16];
        rand::thread_rng().fill_bytes(&mut salt);

        let hash = argon2::hash_raw(
            password.as_bytes(),
            &salt,
            &ARGON2_CONFIG,
        ).expect("Cannot hash password");

        let data = dbcon.transaction(|| {
            diesel::delete(sessions::table
                .filter(sessions::user.eq(self.data.id)))
                .execute(dbcon)?;

            diesel::update(&self.data)
                .set(db::PasswordChange {
                    password: &hash,
                    salt: &salt,
                })
                .get_result::<db::User>(dbcon)
        })?;

        self.data = data;

        Ok(())
    }

    /// Change user's permissions.
    pub fn set_permissions(&mut self, dbcon: &Connection, permissions: PermissionBits)
    -> Result<(), DbError> {
        self.data = diesel::update(&self.data)
            .set(users::permissions.eq(permissions.bits()))
            .get_result(dbcon)?;
        Ok(())
    }

    pub fn into_db(self) -> db::User {
        self.data
    }
}

impl std::ops::Deref for User {
    type Target = db::User;

    fn deref(&self) -> &db::User {
        &self.data
    }
}

#[derive(ApiError, Debug, Fail)]
pub enum FindUserError {
    /// Database error.
    #[api(internal)]
    #[fail(display = "Database error: {}", _0)]
    Internal(#[cause] DbError),
    /// No user found matching given criteria.
    #[api(code = "user:not-found", status = "NOT_FOUND")]
    #[fail(display = "No such user")]
    NotFound,
}

impl_from! { for FindUserError ;
    DbError => |e| FindUserError::Internal(e),
}

#[derive(ApiError, Debug, Fail)]
pub enum CreateUserError {
    /// Database error.
    #[api(internal)]
    #[fail(display = "Database error: {}", _0)]
    Internal(#[cause] DbError),
    /// Duplicate user.
    #[api(code = "user:new:exists", status = "BAD_REQUEST")]
    #[fail(display = "Duplicate user")]
    Duplicate,
}

impl_from! { for CreateUserError ;
    DbError => |e| match e {
        DbError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) =>
            CreateUserError::Duplicate,
        _ => CreateUserError::Internal(e),
    },
}

#[derive(ApiError, Debug, Fail)]
pub enum UserAuthenticateError {
    /// Database error.
    #[api(internal)]
    #[fail(display = "Database error: {}", _0)]
    Internal(#[cause] DbError),
    /// No user with given email, or passwords don't match.
    #[api(code = "user:authenticate:bad-credentials", status = "FORBIDDEN")]
    #[fail(display = "Invalid credentials")]
    BadCredentials,
}

impl_from! { for UserAuthenticateError ;
    DbError => |e| UserAuthenticateError::Internal(e),
    FindUserError => |e| match e {
        FindUserError::Internal(e) => UserAuthenticateError::Internal(e),
        FindUserError::NotFound => UserAuthenticateError::BadCredentials,
    },
}
