//! Session management.

use actix_web::{
    FromRequest,
    HttpRequest,
    HttpResponse,
    ResponseError,
    error::{ErrorInternalServerError, Result},
    http::Cookie,
    middleware::{Middleware, Response, Started},
};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use failure::Fail;
use std::marker::PhantomData;

use crate::{
    db::{
        Connection,
        Pool,
        models::{NewSession, Session as DbSession},
        schema::sessions,
    },
    models::user::{FindUserError, User},
    permissions::{Permission, PermissionBits},
    utils,
};
use super::State;

/// Name of the cookie carrying session ID.
const COOKIE: &str = "sesid";

/// Maximal age of a session, after which user will be required to
/// re-authenticate. Defaults to 30 days.
const MAX_DURATION: i64 = 30;

/// Time which must pass for session to be considered expired due to
/// inactivity, defaults to seven days.
const INACTIVITY_EXPIRATION: i64 = 7;

pub struct SessionManager {
    /// Secret key used to sign session cookies.
    secret: Vec<u8>,
    /// Pool of database connections.
    db: Pool,
}

/// Session extractor.
///
/// Extract session data from request or reject it. Requests can be rejected
/// when session cookie (sesid) is missing (401), when it was corrupted (400),
/// or when the session is missing the permissions requested by `Policy`
/// (403).
pub struct Session<Policy = Normal> {
    data: DbSession,
    _policy: PhantomData<Policy>,
}

/// The default policy: any valid session passes.
pub struct Normal;

impl Permission for Normal {
    #[inline]
    fn bits() -> PermissionBits {
        PermissionBits::empty()
    }
}

/// Data internal to the session manager.
struct SessionData {
    /// Existing session, if any.
    existing: Option<DbSession>,
    /// Data for a new session to be created.
    new: Option<NewSession>,
    /// Whether to destroy the existing session or not. Existing session
    /// is always destroyed if it is to be replaced with a new one.
    destroy: bool,
}

impl SessionManager {
    pub fn new(secret: Vec<u8>, db: Pool) -> SessionManager {
        SessionManager { secret, db }
    }

    /// Should this session still be honoured?
    fn validate(ses: &DbSession) -> bool {
        let now = Utc::now().naive_utc();

        // Disallow expired sessions.
        if now > ses.expires {
            return false;
        }

        // Disallow reviving inactive sessions.
        if now - ses.last_used > Duration::days(INACTIVITY_EXPIRATION) {
            return false;
        }

        true
    }
}

impl<S> Middleware<S> for SessionManager {
    fn start(&self, req: &HttpRequest<S>) -> Result<Started> {
        let cookie = match req.cookie(COOKIE) {
            Some(cookie) => cookie,
            None => return Ok(Started::Done),
        };

        let data = match base64::decode(cookie.value()) {
            Ok(data) => data,
            Err(_) => return Ok(Started::Done),
        };
        let sesid: i32 = match utils::verify(&self.secret, &data) {
            Ok(sesid) => sesid,
            Err(_) => return Ok(Started::Done),
        };

        let db = self.db.get()
            .map_err(|e| ErrorInternalServerError(e.to_string()))?;

        let session = sessions::table
            .filter(sessions::id.eq(sesid))
            .get_result::<DbSession>(&*db)
            .optional()
            .map_err(|e| ErrorInternalServerError(e.to_string()))?;

        let session = match session {
            Some(session) => session,
            None => return Ok(Started::Done),
        };

        if !SessionManager::validate(&session) {
            diesel::delete(&session)
                .execute(&*db)
                .map_err(|e| ErrorInternalServerError(e.to_string()))?;
            return Ok(Started::Done);
        }

        req.extensions_mut().insert(SessionData {
            existing: Some(session),
            new: None,
            destroy: false,
        });

        Ok(Started::Done)
    }

    fn response(&self, req: &HttpRequest<S>, mut rsp: HttpResponse)
    -> Result<Response> {
        if let Some(session) = req.extensions().get::<SessionData>() {
            let now = Utc::now().naive_utc();
            let db = self.db.get()
                .map_err(|e| ErrorInternalServerError(e.to_string()))?;

            if session.existing.is_some() && session.destroy {
                diesel::delete(&session.existing.unwrap())
                    .execute(&*db)
                    .map_err(|e| ErrorInternalServerError(e.to_string()))?;
                rsp.add_cookie(&Cookie::new(COOKIE, ""))?;
            } else if let Some(new) = session.new {
                if let Some(session) = session.existing {
                    diesel::delete(&session)
                        .execute(&*db)
                        .map_err(|e| ErrorInternalServerError(e.to_string()))?;
                }

                let session = diesel::insert_into(sessions::table)
                    .values(new)
                    .get_result::<DbSession>(&*db)
                    .map_err(|e| ErrorInternalServerError(e.to_string()))?;

                let value = utils::sign(&self.secret, session.id)
                    .expect("signing session ID");
                let cookie = Cookie::build(COOKIE, base64::encode(&value))
                    .max_age(Duration::days(MAX_DURATION))
                    .secure(!cfg!(debug_assertions))
                    .http_only(!cfg!(debug_assertions))
                    .finish();
                rsp.add_cookie(&cookie)?;
            } else if let Some(session) = session.existing {
                diesel::update(&session)
                    .set(sessions::last_used.eq(now))
                    .execute(&*db)
                    .map_err(|e| ErrorInternalServerError(e.to_string()))?;
            }
        }

        Ok(Response::Done(rsp))
    }
}

impl<P> Session<P> {
    /// Open a new session for a user, carrying a snapshot of the permissions
    /// they hold right now.
    pub fn create<S>(req: &HttpRequest<S>, user: &User) {
        let now = Utc::now().naive_utc();
        let new = NewSession {
            user: user.id,
            expires: now + Duration::days(MAX_DURATION),
            last_used: now,
            permissions: user.permissions().bits(),
        };

        let mut extensions = req.extensions_mut();

        if let Some(session) = extensions.get_mut::<SessionData>() {
            session.new = Some(new);
            return;
        }

        extensions.insert(SessionData {
            existing: None,
            new: Some(new),
            destroy: false,
        });
    }

    pub fn destroy<S>(req: &HttpRequest<S>, sess: Self) {
        req.extensions_mut().insert(SessionData {
            existing: Some(sess.data),
            new: None,
            destroy: true,
        })
    }

    /// ID of the user owning this session.
    pub fn user_id(&self) -> i32 {
        self.data.user
    }

    /// Load the user owning this session.
    pub fn user(&self, dbcon: &Connection) -> Result<User, FindUserError> {
        User::by_id(dbcon, self.data.user)
    }

    /// Permissions this session was opened with.
    pub fn permissions(&self) -> PermissionBits {
        PermissionBits::from_bits_truncate(self.data.permissions)
    }
}

impl<P> std::ops::Deref for Session<P> {
    type Target = DbSession;

    fn deref(&self) -> &DbSession {
        &self.data
    }
}

impl<P> FromRequest<State> for Session<P>
where
    P: Permission,
{
    type Config = ();
    type Result = Result<Session<P>, SessionFromRequestError>;

    fn from_request(req: &HttpRequest<State>, _cfg: &()) -> Self::Result {
        let session = match req.extensions().get::<SessionData>()
                .and_then(|s| s.existing) {
            Some(session) => session,
            None => return Err(SessionFromRequestError::NoSession),
        };

        let permissions =
            PermissionBits::from_bits_truncate(session.permissions);
        if !permissions.contains(P::bits()) {
            return Err(SessionFromRequestError::Policy);
        }

        Ok(Session {
            data: session,
            _policy: PhantomData,
        })
    }
}

#[derive(Debug, Fail)]
pub enum SessionFromRequestError {
    #[fail(display = "No session")]
    NoSession,
    #[fail(display = "Invalid session token: {}", _0)]
    Verification(#[cause] utils::VerificationError),
    #[fail(display = "Invalid base64: {}", _0)]
    Decoding(#[cause] base64::DecodeError),
    /// Session is missing permissions required by the route.
    #[fail(display = "Rejected by policy")]
    Policy,
}

impl_from! { for SessionFromRequestError ;
    utils::VerificationError => |e| SessionFromRequestError::Verification(e),
    base64::DecodeError => |e| SessionFromRequestError::Decoding(e),
}

impl ResponseError for SessionFromRequestError {
    fn error_response(&self) -> HttpResponse {
        use self::SessionFromRequestError::*;

        match *self {
            NoSession => HttpResponse::Unauthorized()
                .body("a session is required"),
            Verification(_) | Decoding(_) => HttpResponse::BadRequest()
                .body("could not decode session cookie"),
            Policy => HttpResponse::Forbidden()
                .body("access denied by policy"),
        }
    }
}
