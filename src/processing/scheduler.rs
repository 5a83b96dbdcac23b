//! Actix actor publishing editions whose scheduled date has arrived.

use actix::{Actor, Addr, Arbiter, AsyncContext, Context};
use chrono::Utc;
use diesel::prelude::*;
use failure::Error;
use std::time::Duration;

use crate::{
    db::{
        Connection,
        Pool,
        models as db,
        schema::editions,
        types::EditionState,
    },
    events::{EventManager, Published},
    models::Edition,
};

/// How often to look for editions which became due.
///
/// It's set to one minute in production and ten seconds in development.
#[cfg(any(not(debug_assertions), doc))]
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[cfg(all(debug_assertions, not(doc)))]
const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Actix actor which publishes scheduled editions at their publication date.
///
/// Editions which became due while the server was down are caught by the
/// sweep performed when the actor starts.
pub struct ScheduledPublisher {
    pool: Pool,
}

impl ScheduledPublisher {
    pub fn new(pool: Pool) -> ScheduledPublisher {
        ScheduledPublisher { pool }
    }

    pub fn start(pool: Pool) -> Addr<ScheduledPublisher> {
        Arbiter::start(move |_| ScheduledPublisher::new(pool))
    }

    fn on_interval(&mut self, _: &mut Context<Self>) {
        match self.sweep() {
            Ok(()) => {}
            Err(err) => error!("Error publishing scheduled editions: {}", err),
        }
    }

    /// Publish every edition whose scheduled date has passed.
    ///
    /// A failure on one edition doesn't prevent the others from being
    /// processed; it will be retried on the next sweep.
    fn sweep(&mut self) -> Result<(), Error> {
        let db = self.pool.get()?;

        let due = editions::table
            .filter(editions::state.eq(EditionState::Scheduled)
                .and(editions::scheduled_publication
                    .le(Utc::now().naive_utc())))
            .get_results::<db::Edition>(&*db)?;

        for data in due {
            if let Err(err) = publish_one(&*db, data.id) {
                error!("Could not publish scheduled edition {}: {}",
                    data.id, err);
            }
        }

        Ok(())
    }
}

fn publish_one(dbcon: &Connection, id: i32) -> Result<(), Error> {
    let mut edition = Edition::by_id(dbcon, id)?;

    edition.publish_from_schedule(dbcon)?;

    info!("published scheduled edition {}", id);

    for author in edition.notification_recipients(dbcon, &[])? {
        EventManager::notify(&author, Published {
            who: None,
            edition: id,
        });
    }

    Ok(())
}

impl Actor for ScheduledPublisher {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        // Catch up on editions which became due while we weren't running.
        self.on_interval(ctx);

        ctx.run_interval(SWEEP_INTERVAL, Self::on_interval);
    }
}
