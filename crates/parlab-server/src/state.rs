//! Shared application state.

use parlab::{Config, Runner, SessionRegistry};

/// State shared by every connection handler
#[derive(Clone)]
pub struct AppState {
    pub runner: Runner,
    pub registry: SessionRegistry,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            runner: Runner::new(config),
            registry: SessionRegistry::new(),
        }
    }

    pub fn config(&self) -> &Config {
        self.runner.config()
    }
}
