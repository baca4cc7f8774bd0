//! Dependency check run before any host change.

use crate::error::AppError;

use super::log::LogSink;
use super::runner::CommandRunner;

/// Verify that every command in `required` is installed, in list order.
///
/// Stops at the first missing command and names it in the error.
pub fn check_dependencies(
    runner: &dyn CommandRunner,
    sink: &dyn LogSink,
    required: &[String],
) -> Result<(), AppError> {
    sink.emit("Checking Linux dependencies...");
    for command in required {
        if !runner.locate(command) {
            return Err(AppError::MissingDependency {
                command: command.clone(),
            });
        }
    }
    tracing::debug!("All {} dependencies present", required.len());
    Ok(())
}
