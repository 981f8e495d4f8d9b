//! crates/asistencias_core/src/ports.rs
//!
//! Service contracts (traits) at the boundary of the core. The document
//! store and the notification channel are external collaborators; the core
//! only ever talks to them through these traits.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::{Application, Assignment, Course, Offer, User};

/// Maximum number of keys a single `IN`-style store query accepts.
/// Larger key sets must be chunked by the caller (see `join::assignments_for_offers`).
pub const MAX_IN_KEYS: usize = 10;

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Store error: {0}")]
    Store(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Typed access to the five flat document collections.
///
/// The store enforces nothing: every relation is a denormalized string
/// interpreted by the caller, updates are per-document last-write-wins and
/// there are no multi-document transactions. Field updates take a raw JSON
/// map because the admin endpoints patch arbitrary fields of schema-less
/// documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- Usuarios ---
    async fn list_users(&self) -> PortResult<Vec<User>>;
    async fn get_user(&self, id: &str) -> PortResult<User>;
    async fn insert_user(&self, user: User) -> PortResult<String>;
    async fn update_user_fields(&self, id: &str, fields: Map<String, Value>) -> PortResult<()>;
    async fn delete_user(&self, id: &str) -> PortResult<()>;

    // --- Asistencias ---
    async fn list_offers(&self) -> PortResult<Vec<Offer>>;
    async fn get_offer(&self, id: &str) -> PortResult<Offer>;
    async fn offers_by_professor(&self, professor_id: &str) -> PortResult<Vec<Offer>>;
    async fn insert_offer(&self, offer: Offer) -> PortResult<String>;
    async fn update_offer_fields(&self, id: &str, fields: Map<String, Value>) -> PortResult<()>;
    async fn delete_offer(&self, id: &str) -> PortResult<()>;

    // --- Solicitudes ---
    async fn list_applications(&self) -> PortResult<Vec<Application>>;
    async fn get_application(&self, id: &str) -> PortResult<Application>;
    async fn applications_by_user(&self, user_id: &str) -> PortResult<Vec<Application>>;
    async fn insert_application(&self, application: Application) -> PortResult<String>;
    async fn update_application_fields(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> PortResult<()>;
    async fn delete_application(&self, id: &str) -> PortResult<()>;

    // --- AsistenciasAsignadas ---
    /// Assignments whose `asistenciaId` is in `offer_ids`. Rejects more than
    /// [`MAX_IN_KEYS`] keys with a Validation error, mirroring the provider
    /// limit on `IN` filters.
    async fn assignments_by_offer_ids(&self, offer_ids: &[String]) -> PortResult<Vec<Assignment>>;
    async fn insert_assignment(&self, assignment: Assignment) -> PortResult<String>;
    async fn update_assignment_fields(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> PortResult<()>;

    // --- Cursos ---
    async fn get_course(&self, id: &str) -> PortResult<Course>;
    async fn courses_by_professor(&self, professor_id: &str) -> PortResult<Vec<Course>>;
}

/// Outbound notifications. Delivery is out of scope for the core; the
/// production adapter may log, queue or actually send mail.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Notify a user that their account just signed in.
    async fn notify_login(&self, correo: &str, nombre: &str) -> PortResult<()>;
}
