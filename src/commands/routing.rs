//! Routing on/off, identity rotation, and status commands.

use crate::error::AppError;

use super::logic::{status_for, RoutingStatus};
use super::state::AppState;

pub fn start_routing(state: &AppState) -> Result<RoutingStatus, AppError> {
    state.controller.start()?;
    tracing::info!("Tor routing started");
    Ok(get_status(state))
}

pub fn stop_routing(state: &AppState) -> Result<RoutingStatus, AppError> {
    state.controller.stop()?;
    tracing::info!("Tor routing stopped");
    Ok(get_status(state))
}

pub fn new_identity(state: &AppState) -> Result<(), AppError> {
    state.controller.rotate_identity()
}

pub fn get_status(state: &AppState) -> RoutingStatus {
    status_for(state.controller.state())
}
