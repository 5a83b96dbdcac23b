//! Server administration.

use crate::{Config, Result, api};

pub fn start(config: &'static Config) -> Result<()> {
    api::start(config)?;

    Ok(())
}
