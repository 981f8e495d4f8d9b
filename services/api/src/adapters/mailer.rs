//! services/api/src/adapters/mailer.rs
//!
//! Notification adapter. The production deployment sends a sign-in alert
//! mail out of band; this adapter records the event in the log instead so
//! the rest of the system exercises the same code path.

use async_trait::async_trait;

use asistencias_core::ports::{NotificationService, PortResult};

/// Logs login notifications instead of delivering them.
#[derive(Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationService for LogMailer {
    async fn notify_login(&self, correo: &str, nombre: &str) -> PortResult<()> {
        tracing::info!(correo, nombre, "login notification");
        Ok(())
    }
}
