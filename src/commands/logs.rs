//! Log pane and log export commands.

use crate::error::AppError;

use super::state::AppState;

pub fn get_logs(state: &AppState) -> Vec<String> {
    state.log.lines()
}

/// Write the full log text to the export path. Returns the confirmation line.
pub fn export_logs(state: &AppState) -> Result<String, AppError> {
    state.log.export(&state.export_path)?;
    Ok(format!("Logs exported to {}", state.export_path.display()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::RouterConfig;
    use crate::core::runner::testing::FakeRunner;
    use crate::core::LogSink;

    #[test]
    fn test_export_confirms_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tor_router_logs.txt");
        let state = AppState::new(RouterConfig::default(), Arc::new(FakeRunner::new()))
            .with_export_path(&path);
        state.log.emit("Starting Tor service...");

        let confirmation = export_logs(&state).unwrap();

        assert_eq!(confirmation, format!("Logs exported to {}", path.display()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Starting Tor service...");
        assert_eq!(get_logs(&state), vec!["Starting Tor service..."]);
    }

    #[test]
    fn test_export_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(RouterConfig::default(), Arc::new(FakeRunner::new()))
            .with_export_path(dir.path().join("no").join("such").join("dir.txt"));

        assert_eq!(export_logs(&state).unwrap_err().kind(), "Io");
    }

    #[test]
    fn test_default_export_file_name() {
        let state = AppState::new(RouterConfig::default(), Arc::new(FakeRunner::new()));
        assert_eq!(state.export_path, std::path::PathBuf::from("tor_router_logs.txt"));
    }
}
