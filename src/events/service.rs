//! Actix actor handling creation and delivery of events.

use actix::{
    Actor,
    Context,
    Handler,
    Message,
    Supervised,
    SystemService,
};
use diesel::prelude::*;

use crate::{
    config::{self, Config},
    db::{
        Pool,
        models as db,
        schema::events,
    },
    mail::Mailer,
    models::user::{FindUserError, User},
    templates::{NotifyMailArgs, NotifyMailArgsUrls},
};
use super::{
    Error,
    events::{Event, ExpandedEvent, expand_event},
};

/// Notify a user of an event.
///
/// After receiving this message the event manager will persist `event` in
/// the database, and attempt to notify the user by email.
pub struct Notify {
    pub user: i32,
    pub event: Event,
}

impl Message for Notify {
    type Result = ();
}

/// Actix actor which manages persisting events and notifying users of them.
pub struct EventManager {
    config: &'static Config,
    pool: Pool,
}

impl EventManager {
    /// Emit an event.
    ///
    /// Errors will be logged, but otherwise ignored; a notification that
    /// could not be delivered must never undo the action it describes.
    pub fn notify<E>(user: &User, event: E)
    where
        Event: From<E>,
    {
        let manager = EventManager::from_registry();
        let message = Notify {
            user: user.id,
            event: Event::from(event),
        };

        if let Err(err) = manager.try_send(message) {
            error!("Could not dispatch event notification: {}", err);
        }
    }

    /// Emit an event.
    ///
    /// This method will create a new database entry and send a notification
    /// email to the user, if they have an email address.
    fn do_notify(&mut self, msg: Notify) -> Result<(), Error> {
        let Notify { user, event } = msg;

        let db = self.pool.get()?;

        let data = event.serialize_data()?;

        let ev = diesel::insert_into(events::table)
            .values(&db::NewEvent {
                user,
                kind: event.kind().as_str(),
                data: &data,
            })
            .get_result::<db::Event>(&*db)?;

        let user = match User::by_id(&*db, user) {
            Ok(user) => user,
            Err(FindUserError::Internal(err)) => return Err(err.into()),
            Err(FindUserError::NotFound) => panic!(
                "Inconsistent database: user doesn't exist but owns \
                an event",
            ),
        };

        if let Some(mailbox) = user.mailbox() {
            let expanded = expand_event(self.config, &*db, &ev)?;

            Mailer::send(
                mailbox,
                "notify",
                subject_for(&expanded),
                &NotifyMailArgs {
                    event: &expanded,
                    urls: NotifyMailArgsUrls {
                        admin: format!("https://{}/admin",
                            self.config.server.domain).into(),
                    },
                },
            );
        }

        Ok(())
    }
}

/// Subject line of the notification email for an event.
fn subject_for(event: &ExpandedEvent) -> String {
    match *event {
        ExpandedEvent::Published { ref edition, .. } =>
            format!("'{}' has been published", edition.title),
        ExpandedEvent::Rejected { ref edition, .. } =>
            format!("'{}' has been rejected", edition.title),
        ExpandedEvent::Unpublished { ref edition, .. } =>
            format!("'{}' has been unpublished", edition.title),
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self {
            config: config::load().expect("Configuration is not loaded"),
            pool: crate::db::pool().expect("Database is not initialized"),
        }
    }
}

impl Actor for EventManager {
    type Context = Context<Self>;
}

impl Supervised for EventManager {
}

impl SystemService for EventManager {
}

impl Handler<Notify> for EventManager {
    type Result = ();

    fn handle(&mut self, msg: Notify, _: &mut Context<Self>) {
        match self.do_notify(msg) {
            Ok(()) => (),
            Err(err) => {
                error!("error sending notification: {}", err);
            }
        }
    }
}
