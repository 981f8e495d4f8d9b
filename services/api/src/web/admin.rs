//! services/api/src/web/admin.rs
//!
//! Admin endpoints: user management, offer review and the monitoring table.
//! Error bodies here use the `error` key; the professor endpoints use
//! `message`. That asymmetry is part of the wire contract.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::error;

use asistencias_core::domain::{OfferState, UserRole};
use asistencias_core::ports::{DocumentStore, PortError};
use asistencias_core::views::{carrera_directory, offer_monitoring, offer_summaries, user_directory};
use asistencias_core::workflow::change_offer_state;

use crate::web::state::AppState;

type HandlerResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn admin_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

/// Every user with their career reference resolved.
pub async fn obtener_usuarios_handler(State(app_state): State<Arc<AppState>>) -> HandlerResult {
    let users = app_state.store.list_users().await.map_err(|e| {
        error!(error = %e, "user listing failed");
        admin_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al obtener los usuarios")
    })?;
    Ok(Json(json!({ "datos": user_directory(&users) })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChange {
    pub id_usuario: String,
    pub nuevo_rol: UserRole,
}

pub async fn actualizar_rol_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RoleChange>,
) -> HandlerResult {
    let mut fields = Map::new();
    fields.insert("tipoUsuario".to_string(), json!(payload.nuevo_rol));
    app_state
        .store
        .update_user_fields(&payload.id_usuario, fields)
        .await
        .map_err(|e| {
            error!(error = %e, "role update failed");
            admin_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al actualizar el rol")
        })?;
    Ok(Json(json!({ "message": "Rol actualizado correctamente" })))
}

/// Patch one arbitrary field of a document found by its display name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    pub nombre_usuario: String,
    pub campo_seleccionado: String,
    pub nuevo_valor: Value,
}

pub async fn actualizar_usuario_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<FieldPatch>,
) -> HandlerResult {
    let failed = || admin_error(StatusCode::BAD_REQUEST, "Error al actualizar el documento");

    let users = app_state.store.list_users().await.map_err(|_| failed())?;
    let user = users
        .iter()
        .find(|u| u.nombre == payload.nombre_usuario)
        .ok_or_else(failed)?;

    let mut fields = Map::new();
    fields.insert(payload.campo_seleccionado, payload.nuevo_valor);
    app_state
        .store
        .update_user_fields(&user.id, fields)
        .await
        .map_err(|e| {
            error!(error = %e, "user field update failed");
            failed()
        })?;
    Ok(Json(json!({ "message": "Documento actualizado correctamente" })))
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: String,
}

pub async fn eliminar_usuario_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> HandlerResult {
    app_state.store.delete_user(&query.id).await.map_err(|e| {
        error!(error = %e, "user delete failed");
        admin_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al eliminar el usuario")
    })?;
    Ok(Json(json!({ "message": "Usuario eliminado correctamente" })))
}

/// Career records (Escuela users with a career), keyed by document ID.
pub async fn carreras_handler(State(app_state): State<Arc<AppState>>) -> HandlerResult {
    let users = app_state.store.list_users().await.map_err(|e| {
        error!(error = %e, "career listing failed");
        admin_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al extraer las carreras")
    })?;
    Ok(Json(json!({ "carreras": carrera_directory(&users) })))
}

pub async fn ofertas_handler(State(app_state): State<Arc<AppState>>) -> HandlerResult {
    let offers = app_state.store.list_offers().await.map_err(|e| {
        error!(error = %e, "offer listing failed");
        admin_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al extraer las ofertas")
    })?;
    Ok(Json(json!({ "ofertas": offer_summaries(&offers) })))
}

#[derive(Debug, Deserialize)]
pub struct OfferIdBody {
    pub id: String,
}

/// Publish an offer under review. The transition runs through the state
/// guard: only Revision -> Abierto (or a no-op repeat) is accepted.
pub async fn aceptar_oferta_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<OfferIdBody>,
) -> HandlerResult {
    match change_offer_state(app_state.store.as_ref(), &payload.id, OfferState::Abierto).await {
        Ok(_) => Ok(Json(json!({ "message": "asistencia aceptada correctamente" }))),
        Err(PortError::InvalidTransition { from, to }) => Err(admin_error(
            StatusCode::BAD_REQUEST,
            &format!("Transición de estado inválida: de {from} a {to}"),
        )),
        Err(PortError::NotFound(_)) => {
            Err(admin_error(StatusCode::NOT_FOUND, "No se encontró la oferta"))
        }
        Err(e) => {
            error!(error = %e, "offer accept failed");
            Err(admin_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al aceptada la asistencia"))
        }
    }
}

/// "Deleting" an offer from the admin screen closes it; the document stays.
pub async fn eliminar_oferta_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> HandlerResult {
    match change_offer_state(app_state.store.as_ref(), &query.id, OfferState::Cerrado).await {
        Ok(_) => Ok(Json(json!({ "message": "asistencia cerrada correctamente" }))),
        Err(PortError::NotFound(_)) => {
            Err(admin_error(StatusCode::NOT_FOUND, "No se encontró la oferta"))
        }
        Err(e) => {
            error!(error = %e, "offer close failed");
            Err(admin_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al cerradar la asistencia"))
        }
    }
}

pub async fn actualizar_oferta_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<FieldPatch>,
) -> HandlerResult {
    let failed = || admin_error(StatusCode::BAD_REQUEST, "Error al actualizar el documento");

    let offers = app_state.store.list_offers().await.map_err(|_| failed())?;
    // The admin screen identifies offers by their program title.
    let offer = offers
        .iter()
        .find(|o| o.titulo_programa == payload.nombre_usuario)
        .ok_or_else(failed)?;

    let mut fields = Map::new();
    fields.insert(payload.campo_seleccionado, payload.nuevo_valor);
    app_state
        .store
        .update_offer_fields(&offer.id, fields)
        .await
        .map_err(|e| {
            error!(error = %e, "offer field update failed");
            failed()
        })?;
    Ok(Json(json!({ "message": "Documento actualizado correctamente" })))
}

pub async fn monitoreo_asistencia_handler(State(app_state): State<Arc<AppState>>) -> HandlerResult {
    let (offers, users) = tokio::join!(app_state.store.list_offers(), app_state.store.list_users());
    let (offers, users) = offers.and_then(|o| users.map(|u| (o, u))).map_err(|e| {
        error!(error = %e, "monitoring snapshot failed");
        admin_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al extraer las asistencias")
    })?;
    Ok(Json(json!({ "asistencias": offer_monitoring(&offers, &users) })))
}
