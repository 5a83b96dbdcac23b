//! Permanent log of what was done, by whom, to what.

use diesel::prelude::*;
use serde::Serialize;

use crate::db::{
    Connection,
    models as db,
    schema::audit_log,
};

/// Entity responsible for an action.
#[derive(Clone, Copy, Debug)]
pub enum Actor {
    /// The system itself. This actor is used for actions carried out
    /// automatically, such as scheduled publication, and for actions invoked
    /// from the CLI.
    System,
    /// A user.
    User(i32),
}

impl Actor {
    fn as_db(&self) -> Option<i32> {
        match *self {
            Actor::System => None,
            Actor::User(id) => Some(id),
        }
    }
}

impl From<i32> for Actor {
    fn from(id: i32) -> Self {
        Actor::User(id)
    }
}

/// Store an entry in the audit log.
///
/// Callers performing a mutation should invoke this from within the same
/// database transaction as the mutation itself, so that a rolled-back action
/// leaves no trace of having happened.
///
/// Serialization problems are logged and swallowed; an action must not fail
/// just because its description could not be recorded in full.
pub fn log_db<A, D>(
    dbcon: &Connection,
    actor: A,
    context: &str,
    context_id: i32,
    kind: &str,
    data: D,
) -> Result<(), diesel::result::Error>
where
    A: Into<Actor>,
    D: Serialize,
{
    let mut buffer = Vec::new();

    if let Err(err) = data.serialize(&mut rmps::Serializer::new(&mut buffer)) {
        error!("could not serialize audit entry for {}:{}: {}",
            context, context_id, err);
        buffer.clear();
    }

    diesel::insert_into(audit_log::table)
        .values(&db::NewAuditEntry {
            actor: actor.into().as_db(),
            context,
            context_id,
            kind,
            data: &buffer,
        })
        .execute(dbcon)?;

    Ok(())
}
