//! services/api/src/web/estudiantes.rs
//!
//! Student endpoints: profile, the opportunity listing, application
//! registration and tracking.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::error;

use asistencias_core::ports::{DocumentStore, PortError};
use asistencias_core::resolve::UserIndex;
use asistencias_core::views::{application_tracking, carrera_names, opportunity_listing};
use asistencias_core::workflow::{register_application, NewApplication};

use crate::web::state::AppState;

type HandlerResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn student_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    #[serde(default)]
    pub user_id: String,
}

/// Full student document with the career reference resolved and approved
/// course IDs swapped for course names. The stored password never leaves
/// the server.
pub async fn info_estudiante_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<UserIdQuery>,
) -> HandlerResult {
    let store_failed = |e: &PortError| {
        error!(error = %e, "student info lookup failed");
        student_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error al obtener la información del estudiante",
        )
    };

    let user = match app_state.store.get_user(&query.user_id).await {
        Ok(user) => user,
        Err(PortError::NotFound(_)) => {
            return Err(student_error(StatusCode::NOT_FOUND, "Usuario no encontrado"))
        }
        Err(e) => return Err(store_failed(&e)),
    };
    let users = app_state.store.list_users().await.map_err(|e| store_failed(&e))?;

    let carrera = UserIndex::new(&users)
        .resolve_carrera(&user.carrera)
        .found()
        .unwrap_or("")
        .to_string();

    // A course that no longer exists keeps its raw ID in the listing.
    let mut cursos = Vec::with_capacity(user.cursos_aprovados.len());
    for curso_id in &user.cursos_aprovados {
        match app_state.store.get_course(curso_id).await {
            Ok(curso) if !curso.nombre.is_empty() => cursos.push(curso.nombre),
            Ok(_) | Err(PortError::NotFound(_)) => cursos.push(curso_id.clone()),
            Err(e) => return Err(store_failed(&e)),
        }
    }

    let mut datos = serde_json::to_value(&user)
        .map_err(|_| student_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al obtener la información del estudiante"))?;
    if let Value::Object(object) = &mut datos {
        object.remove("contrasena");
        object.insert("carrera".to_string(), json!(carrera));
        object.insert("cursosAprovados".to_string(), json!(cursos));
    }
    Ok(Json(json!({ "datos": datos })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicProfile {
    pub user_id: String,
    #[serde(default)]
    pub carrera: String,
    #[serde(default)]
    pub nivel_academico: String,
    #[serde(default)]
    pub promedio: String,
}

pub async fn registrar_perfil_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<AcademicProfile>,
) -> HandlerResult {
    if let Err(e) = app_state.store.get_user(&payload.user_id).await {
        return Err(match e {
            PortError::NotFound(_) => student_error(StatusCode::NOT_FOUND, "Estudiante no encontrado"),
            e => {
                error!(error = %e, "profile lookup failed");
                student_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al registrar perfil académico")
            }
        });
    }

    let mut fields = Map::new();
    fields.insert("carrera".to_string(), json!(payload.carrera));
    fields.insert("nivelAcademico".to_string(), json!(payload.nivel_academico));
    fields.insert("ponderado".to_string(), json!(payload.promedio));
    app_state
        .store
        .update_user_fields(&payload.user_id, fields)
        .await
        .map_err(|e| {
            error!(error = %e, "profile update failed");
            student_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al registrar perfil académico")
        })?;
    Ok(Json(json!({ "message": "Perfil académico registrado" })))
}

/// Deduplicated career names for the profile dropdown.
pub async fn carreras_handler(State(app_state): State<Arc<AppState>>) -> HandlerResult {
    let users = app_state.store.list_users().await.map_err(|e| {
        error!(error = %e, "career listing failed");
        student_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al extraer las carreras")
    })?;
    Ok(Json(json!({ "carreras": carrera_names(&users) })))
}

/// Every opportunity that is not closed, with references resolved.
#[utoipa::path(
    get,
    path = "/asistencias/oportunidades",
    responses(
        (status = 200, description = "Open opportunities with school and professor names resolved"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn oportunidades_handler(State(app_state): State<Arc<AppState>>) -> HandlerResult {
    let (offers, users) = tokio::join!(app_state.store.list_offers(), app_state.store.list_users());
    let (offers, users) = offers.and_then(|o| users.map(|u| (o, u))).map_err(|e| {
        error!(error = %e, "opportunity snapshot failed");
        student_error(StatusCode::INTERNAL_SERVER_ERROR, "No se pudieron obtener las oportunidades")
    })?;
    Ok(Json(json!({ "oportunidades": opportunity_listing(&offers, &users) })))
}

/// Register an application for an opportunity.
#[utoipa::path(
    post,
    path = "/solicitudes/registrar",
    responses(
        (status = 200, description = "Application stored; a matching offer gets its counter bumped"),
        (status = 400, description = "Missing userId or tituloOportunidad"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn registrar_solicitud_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<NewApplication>,
) -> HandlerResult {
    match register_application(app_state.store.as_ref(), payload).await {
        Ok(_) => Ok(Json(json!({ "mensaje": "Solicitud registrada correctamente" }))),
        Err(PortError::Validation(message)) => {
            Err(student_error(StatusCode::BAD_REQUEST, &message))
        }
        Err(e) => {
            error!(error = %e, "application registration failed");
            Err(student_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al registrar la solicitud"))
        }
    }
}

/// Per-student tracking rows: the student's applications joined back to the
/// offers they target.
pub async fn seguimiento_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<UserIdQuery>,
) -> HandlerResult {
    if query.user_id.is_empty() {
        return Err(student_error(StatusCode::BAD_REQUEST, "Falta el ID del usuario"));
    }

    let (applications, offers, users) = tokio::join!(
        app_state.store.applications_by_user(&query.user_id),
        app_state.store.list_offers(),
        app_state.store.list_users(),
    );
    let rows = applications
        .and_then(|a| offers.and_then(|o| users.map(|u| application_tracking(&a, &o, &u))))
        .map_err(|e| {
            error!(error = %e, "tracking snapshot failed");
            student_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al obtener las solicitudes")
        })?;
    Ok(Json(json!({ "solicitudes": rows })))
}
