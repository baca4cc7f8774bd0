//! Shared application state handed to every command handler.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::RouterConfig;
use crate::core::{CommandRunner, LogBuffer, RoutingController};

/// Shared application state.
pub struct AppState {
    pub controller: Arc<RoutingController>,
    /// Backs the log pane and the export operation.
    pub log: Arc<LogBuffer>,
    /// Where `export` writes the log text.
    pub export_path: PathBuf,
}

impl AppState {
    pub fn new(config: RouterConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let log = Arc::new(LogBuffer::new());
        let controller = Arc::new(RoutingController::new(config, runner, log.clone()));
        Self {
            controller,
            log,
            export_path: PathBuf::from(crate::config::LOG_EXPORT_FILE),
        }
    }

    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = path.into();
        self
    }
}
