//! services/api/src/web/auth.rs
//!
//! Login endpoint. Credentials live in the Usuarios collection and are
//! compared in plaintext (a carried defect of the data model, not a
//! feature); email matching is case-insensitive. The status-402 branch
//! distinguishes "the store failed while validating" from plain bad
//! credentials, because the client treats the two differently.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;
use utoipa::ToSchema;

use asistencias_core::ports::{DocumentStore, NotificationService};

use crate::web::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Sign in with email and password.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Valid credentials; returns the role slug and user ID"),
        (status = 401, description = "Unknown email or wrong password"),
        (status = 402, description = "The store failed while validating credentials")
    )
)]
pub async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let users = match app_state.store.list_users().await {
        Ok(users) => users,
        Err(e) => {
            error!(error = %e, "credential validation failed");
            return Err((
                StatusCode::PAYMENT_REQUIRED,
                Json(json!({ "message": "Error al validar credenciale", "status": "error" })),
            ));
        }
    };

    let email = payload.email.to_lowercase();
    let matched = users
        .iter()
        .find(|u| u.correo.to_lowercase() == email && u.contrasena == payload.password);

    // The notification fires without awaiting delivery; login never blocks
    // on the mailer. The source system notifies even on bad credentials.
    let nombre = users
        .iter()
        .find(|u| u.correo.to_lowercase() == email)
        .map(|u| u.nombre.clone())
        .unwrap_or_default();
    let mailer = Arc::clone(&app_state.mailer);
    let correo = payload.email.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer.notify_login(&correo, &nombre).await {
            error!(error = %e, "login notification failed");
        }
    });

    match matched {
        Some(user) => Ok(Json(json!({
            "message": "Login exitoso",
            "status": "success",
            "rol": user.tipo_usuario.rol_slug(),
            "id": user.id,
        }))),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Credenciales inválidas", "status": "error" })),
        )),
    }
}
