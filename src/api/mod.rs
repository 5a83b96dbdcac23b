use actix::System;
use actix_web::{
    App,
    middleware::Logger,
    server,
};

use super::{
    Result,
    config::Config,
    db,
    processing::ScheduledPublisher,
};

pub use self::error::{ApiError, Error};

pub(self) use self::error::{RouteExt, RouterExt};

pub mod attachments;
pub mod editions;
pub mod error;
pub mod session;
pub mod users;
pub mod util;

/// Start an API server.
pub fn start(cfg: &'static Config) -> Result<()> {
    let system = System::new("gazette");
    let state = configure(cfg)?;
    let pool = state.db.clone();
    let server = server::new(move || new_app(state.clone()));

    // Publish editions which became due while the server was down, and keep
    // watching for newly due ones.
    ScheduledPublisher::start(pool);

    let server = if let Some(fd) = listenfd::ListenFd::from_env().take_tcp_listener(0)? {
        server.listen(fd)
    } else {
        server.bind(cfg.server.address)?
    };

    server
        .server_hostname(cfg.server.domain.clone())
        .start();

    system.run();

    Ok(())
}

#[derive(Clone)]
pub struct State {
    /// Current configuration.
    pub config: &'static Config,
    /// Database connection pool.
    pub db: db::Pool,
}

pub fn configure(config: &'static Config) -> Result<State> {
    let db = db::pool()?;

    Ok(State { config, db })
}

pub fn new_app(state: State) -> App<State> {
    let sessions = session::SessionManager::new(
        state.config.server.secret.clone(),
        state.db.clone(),
    );

    App::with_state(state)
        .middleware(Logger::default())
        .middleware(sessions)
        .prefix("/api/v1")
        .configure(attachments::routes)
        .configure(editions::routes)
        .configure(users::routes)
}
