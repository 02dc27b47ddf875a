use std::sync::Arc;

use crate::config::Config;
use crate::core::clock::Clock;
use crate::core::logic::Engine;
use crate::errors::AppResult;

pub mod auto_close;
pub mod directory;
pub mod init;
pub mod log;
pub mod punch;
pub mod report;
pub mod scheduler;
pub mod status;

/// What every command handler receives.
pub struct Ctx {
    pub cfg: Config,
    pub clock: Arc<dyn Clock>,
    pub test: bool,
}

impl Ctx {
    pub fn engine(&self) -> AppResult<Engine> {
        Engine::open(&self.cfg, self.clock.clone())
    }
}
