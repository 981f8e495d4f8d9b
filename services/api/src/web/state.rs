//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use asistencias_core::ports::{DocumentStore, NotificationService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub mailer: Arc<dyn NotificationService>,
    pub config: Arc<Config>,
}
