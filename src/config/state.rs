// Application state module
// Shared, read-only state handed to every request task

use super::types::Config;
use crate::consumer::RequestStaticResourceConsumer;

/// Application state
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub static_resources: RequestStaticResourceConsumer,
}

impl AppState {
    /// Build state from a loaded config and a fully configured consumer.
    /// Static roots must be registered before this point.
    pub const fn new(config: Config, static_resources: RequestStaticResourceConsumer) -> Self {
        Self {
            config,
            static_resources,
        }
    }
}
