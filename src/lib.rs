#[macro_use] extern crate bitflags;
#[macro_use] extern crate diesel;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate log;
#[macro_use] extern crate serde_derive;
#[macro_use] extern crate tera;

#[cfg(not(debug_assertions))]
#[macro_use]
extern crate diesel_migrations;

pub use gazette_macros::*;
pub use self::cli::main;

pub use crate::api::{ApiError, Error};

pub(crate) use self::config::Config;

#[macro_use] mod macros;

pub mod api;
pub mod audit;
pub mod cli;
pub mod config;
pub mod db;
pub mod events;
pub mod mail;
pub mod models;
pub mod permissions;
pub mod processing;
pub mod templates;
pub mod utils;

pub type Result<T, E=failure::Error> = std::result::Result<T, E>;
