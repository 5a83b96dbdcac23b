//! Handling of events and notifications.

use diesel::result::Error as DbError;
use failure::Fail;

mod events;
mod service;

pub use self::{
    events::*,
    service::{EventManager, Notify},
};

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{}", _0)]
    Database(#[cause] DbError),
    #[fail(display = "{}", _0)]
    DatabasePool(#[cause] r2d2::Error),
    #[fail(display = "{}", _0)]
    Serialization(#[cause] rmps::encode::Error),
    #[fail(display = "{}", _0)]
    Deserialization(#[cause] rmps::decode::Error),
    #[fail(display = "unknown event kind: {}", _0)]
    UnknownEvent(String),
}

impl_from! { for Error ;
    DbError => |e| Error::Database(e),
    r2d2::Error => |e| Error::DatabasePool(e),
    rmps::encode::Error => |e| Error::Serialization(e),
    rmps::decode::Error => |e| Error::Deserialization(e),
}
