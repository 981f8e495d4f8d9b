//! services/api/src/web/profesores.rs
//!
//! Professor endpoints: profile, courses, the offer lifecycle, the
//! assignment dashboard and the application review actions. Error bodies
//! use the `message` key throughout, matching what the professor screens
//! parse.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::error;

use asistencias_core::domain::{ApplicationState, ChangeRecord, Offer, OfferState};
use asistencias_core::join::normalize_title;
use asistencias_core::ports::{DocumentStore, PortError};
use asistencias_core::resolve::UserIndex;
use asistencias_core::views::professor_dashboard;
use asistencias_core::workflow::{
    approve_application, change_offer_state, fecha_display, reject_application,
    set_application_state, ApprovalRequest,
};

use crate::web::state::AppState;

type HandlerResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn msg_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": message })))
}

fn transition_error(from: &str, to: &str) -> (StatusCode, Json<Value>) {
    msg_error(
        StatusCode::BAD_REQUEST,
        &format!("Transición de estado inválida: de {from} a {to}"),
    )
}

//=========================================================================================
// Profile and Courses
//=========================================================================================

/// Full user document minus the stored password.
pub async fn info_profesores_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult {
    match app_state.store.get_user(&id).await {
        Ok(user) => {
            let mut value = serde_json::to_value(&user).map_err(|_| {
                msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error getting document")
            })?;
            if let Value::Object(object) = &mut value {
                object.remove("contrasena");
            }
            Ok(Json(value))
        }
        Err(PortError::NotFound(_)) => Err(msg_error(StatusCode::NOT_FOUND, "No such document!")),
        Err(e) => {
            error!(error = %e, "professor lookup failed");
            Err(msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error getting document"))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub correo: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub sede: String,
    #[serde(default)]
    pub password: String,
}

pub async fn update_info_profesores_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ProfileUpdate>,
) -> HandlerResult {
    let mut fields = Map::new();
    fields.insert("nombre".to_string(), json!(payload.nombre));
    fields.insert("correo".to_string(), json!(payload.correo));
    fields.insert("telefono".to_string(), json!(payload.telefono));
    fields.insert("sede".to_string(), json!(payload.sede));
    fields.insert("contrasena".to_string(), json!(payload.password));
    match app_state.store.update_user_fields(&id, fields).await {
        Ok(()) => Ok(Json(json!({ "message": "Document successfully updated!" }))),
        Err(PortError::NotFound(_)) => Err(msg_error(StatusCode::NOT_FOUND, "No such document!")),
        Err(e) => {
            error!(error = %e, "professor update failed");
            Err(msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error updating document"))
        }
    }
}

pub async fn cursos_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let cursos = app_state.store.courses_by_professor(&id).await.map_err(|e| {
        error!(error = %e, "course listing failed");
        msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error getting document")
    })?;
    if cursos.is_empty() {
        return Err(msg_error(StatusCode::NOT_FOUND, "No courses found for this professor"));
    }
    Ok(Json(json!(cursos)))
}

/// Every offer the professor is in charge of, regardless of state.
pub async fn historial_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let offers = app_state.store.offers_by_professor(&id).await.map_err(|e| {
        error!(error = %e, "offer history failed");
        msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error getting document")
    })?;
    if offers.is_empty() {
        return Err(msg_error(StatusCode::NOT_FOUND, "No courses found for this professor"));
    }
    Ok(Json(json!(offers)))
}

/// Career name for a professor, resolved through the Escuela record the
/// `carrera` field references.
pub async fn search_carrera_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let store_failed = |e: &PortError| {
        error!(error = %e, "career lookup failed");
        msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error getting document")
    };

    let user = match app_state.store.get_user(&id).await {
        Ok(user) => user,
        Err(PortError::NotFound(_)) => {
            return Err(msg_error(StatusCode::NOT_FOUND, "No such document!"))
        }
        Err(e) => return Err(store_failed(&e)),
    };
    if user.carrera.is_empty() {
        return Err(msg_error(
            StatusCode::NOT_FOUND,
            "No se encontró la carrera asociada al usuario.",
        ));
    }
    let users = app_state.store.list_users().await.map_err(|e| store_failed(&e))?;
    let carrera = UserIndex::new(&users)
        .resolve_carrera(&user.carrera)
        .found()
        .ok_or_else(|| msg_error(StatusCode::NOT_FOUND, "No se encontró la carrera."))?
        .to_string();

    let mut value = serde_json::to_value(&user)
        .map_err(|_| msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error getting document"))?;
    if let Value::Object(object) = &mut value {
        object.remove("contrasena");
        object.insert("carrera".to_string(), json!(carrera));
    }
    Ok(Json(value))
}

//=========================================================================================
// Dashboard and Offer Lifecycle
//=========================================================================================

/// Assigned offers joined through the chunked lookup, plus the closed
/// offers that never got an assignment.
pub async fn dashboard_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult {
    match professor_dashboard(app_state.store.as_ref(), &id).await {
        Ok(dashboard) => Ok(Json(json!(dashboard))),
        Err(PortError::NotFound(message)) => Err(msg_error(StatusCode::NOT_FOUND, &message)),
        Err(e) => {
            error!(error = %e, "dashboard build failed");
            Err(msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error obteniendo documentos."))
        }
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// The submission form sends `YYYY-MM-DD`; the collections store `DD/MM/YYYY`.
fn reformat_date(date: &str) -> String {
    let parts: Vec<&str> = date.split('-').collect();
    match parts.as_slice() {
        [year, month, day] => format!("{day}/{month}/{year}"),
        _ => date.to_string(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOffer {
    #[serde(default)]
    pub beneficios: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub fecha_cierre: String,
    #[serde(default)]
    pub fecha_inicio: String,
    #[serde(default)]
    pub horario: String,
    #[serde(default)]
    pub horas_semanal: Value,
    #[serde(default)]
    pub nombre_programa: String,
    #[serde(default)]
    pub objetivos: String,
    #[serde(default)]
    pub requisitos: String,
    #[serde(default)]
    pub tipo: String,
    #[serde(default)]
    pub vacantes: Value,
    #[serde(default)]
    pub estado: OfferState,
    #[serde(default)]
    pub semestre: String,
    #[serde(default)]
    pub departamento: String,
    #[serde(default)]
    pub promedio_requerido: Value,
    #[serde(default)]
    pub total_horas: Value,
    #[serde(default)]
    pub requisitos_adicionales: String,
}

pub async fn insert_oferta_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<NewOffer>,
) -> HandlerResult {
    let hora_x_semana = as_text(&payload.horas_semanal);
    let offer = Offer {
        titulo_programa: payload.nombre_programa,
        tipo: payload.tipo,
        estado: payload.estado,
        persona_a_cargo: id,
        departamento: payload.departamento,
        cantidad_vacantes: as_text(&payload.vacantes),
        cantidad_solicitudes: 0,
        total_horas: as_text(&payload.total_horas),
        hora_x_semana: hora_x_semana.clone(),
        semestre: payload.semestre,
        fecha_inicio: reformat_date(&payload.fecha_inicio),
        fecha_fin: reformat_date(&payload.fecha_cierre),
        descripcion: payload.descripcion,
        horario: payload.horario,
        objetivos: payload.objetivos,
        beneficio: payload.beneficios,
        promedio_requerido: as_text(&payload.promedio_requerido),
        requisitos: payload
            .requisitos
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        requisitos_adicionales: payload.requisitos_adicionales,
        historial_cambios: vec![ChangeRecord {
            cambios: "Creación de la oferta".to_string(),
            fecha: fecha_display(Utc::now().date_naive()),
            hora_x_semana,
        }],
        ..Offer::default()
    };

    let id = app_state.store.insert_offer(offer).await.map_err(|e| {
        error!(error = %e, "offer insert failed");
        msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error inserting new oferta")
    })?;
    Ok(Json(json!({ "message": "Oferta creada exitosamente", "id": id })))
}

/// The professor's offers with the document ID surfaced as `asistenciaId`.
pub async fn asistencias_by_profesor_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let offers = app_state.store.offers_by_professor(&id).await.map_err(|e| {
        error!(error = %e, "offer listing failed");
        msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error getting document")
    })?;
    if offers.is_empty() {
        return Err(msg_error(StatusCode::NOT_FOUND, "No asistencias found for this professor"));
    }
    let rows: Vec<Value> = offers
        .iter()
        .map(|offer| {
            let mut value = serde_json::to_value(offer).unwrap_or_default();
            if let Value::Object(object) = &mut value {
                object.insert("asistenciaId".to_string(), json!(offer.id));
            }
            value
        })
        .collect();
    Ok(Json(json!(rows)))
}

/// Applications whose denormalized title matches any registered offer.
pub async fn solicitudes_relacionadas_handler(
    State(app_state): State<Arc<AppState>>,
    Path(_id): Path<String>,
) -> HandlerResult {
    let store_failed = |e: &PortError| {
        error!(error = %e, "related applications lookup failed");
        msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al buscar solicitudes relacionadas.")
    };

    let offers = app_state.store.list_offers().await.map_err(|e| store_failed(&e))?;
    let titles: std::collections::HashSet<String> = offers
        .iter()
        .map(|o| normalize_title(&o.titulo_programa))
        .filter(|t| !t.is_empty())
        .collect();
    if titles.is_empty() {
        return Err(msg_error(
            StatusCode::NOT_FOUND,
            "No hay títulos de programa registrados en la colección Asistencias.",
        ));
    }

    let applications = app_state.store.list_applications().await.map_err(|e| store_failed(&e))?;
    let related: Vec<_> = applications
        .into_iter()
        .filter(|a| {
            !a.titulo_oportunidad.is_empty()
                && titles.contains(&normalize_title(&a.titulo_oportunidad))
        })
        .collect();
    if related.is_empty() {
        return Err(msg_error(
            StatusCode::NOT_FOUND,
            "No se encontraron solicitudes relacionadas con los títulos de las asistencias.",
        ));
    }
    Ok(Json(json!(related)))
}

pub async fn update_oferta_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> HandlerResult {
    match app_state.store.update_offer_fields(&id, fields).await {
        Ok(()) => Ok(Json(json!({ "message": "Oferta actualizada exitosamente!" }))),
        Err(PortError::NotFound(_)) => {
            Err(msg_error(StatusCode::NOT_FOUND, "No se encontró la oferta."))
        }
        Err(e) => {
            error!(error = %e, "offer update failed");
            Err(msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al actualizar la oferta."))
        }
    }
}

pub async fn close_oferta_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult {
    match change_offer_state(app_state.store.as_ref(), &id, OfferState::Cerrado).await {
        Ok(_) => Ok(Json(json!({ "message": "Oferta cerrada exitosamente." }))),
        Err(PortError::NotFound(_)) => {
            Err(msg_error(StatusCode::NOT_FOUND, "No se encontró la oferta."))
        }
        Err(e) => {
            error!(error = %e, "offer close failed");
            Err(msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al cerrar la oferta."))
        }
    }
}

/// Hard delete, unlike the admin close.
pub async fn delete_oferta_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult {
    app_state.store.delete_offer(&id).await.map_err(|e| {
        error!(error = %e, "offer delete failed");
        msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al eliminar la oferta.")
    })?;
    Ok(Json(json!({ "message": "Oferta eliminada exitosamente." })))
}

//=========================================================================================
// Assignment Feedback and Tracking
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub desempeno: Value,
    #[serde(default)]
    pub retroalimentacion: Value,
}

pub async fn add_desempeno_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<Feedback>,
) -> HandlerResult {
    let mut fields = Map::new();
    fields.insert("desempeno".to_string(), payload.desempeno);
    fields.insert("retroalimentacion".to_string(), payload.retroalimentacion);
    match app_state.store.update_assignment_fields(&id, fields).await {
        Ok(()) => Ok(Json(json!({
            "message": "Desempeño y retroalimentación agregados exitosamente."
        }))),
        Err(PortError::NotFound(_)) => {
            Err(msg_error(StatusCode::NOT_FOUND, "Documento no encontrado"))
        }
        Err(e) => {
            error!(error = %e, "feedback update failed");
            Err(msg_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al agregar el desempeño y retroalimentación.",
            ))
        }
    }
}

/// Feedback lands on the assignment while it is active ("asignada") and on
/// the offer itself once closed ("cerrada").
pub async fn update_asistencia_feedback_handler(
    State(app_state): State<Arc<AppState>>,
    Path((feedback_type, id)): Path<(String, String)>,
    Json(payload): Json<Feedback>,
) -> HandlerResult {
    let mut fields = Map::new();
    fields.insert("retroalimentacion".to_string(), payload.retroalimentacion);
    fields.insert("desempeno".to_string(), payload.desempeno);

    let result = match feedback_type.as_str() {
        "asignada" => app_state.store.update_assignment_fields(&id, fields).await,
        "cerrada" => app_state.store.update_offer_fields(&id, fields).await,
        _ => return Err(msg_error(StatusCode::BAD_REQUEST, "Tipo inválido")),
    };
    match result {
        Ok(()) => Ok(Json(json!({ "message": "Feedback guardado correctamente." }))),
        Err(PortError::NotFound(_)) => {
            Err(msg_error(StatusCode::NOT_FOUND, "Documento no encontrado"))
        }
        Err(e) => {
            error!(error = %e, "feedback update failed");
            Err(msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error interno."))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SeguimientoUpdate {
    #[serde(default)]
    pub tutorias_cumplidas: Value,
    #[serde(default)]
    pub asistencias_cumplidas: Value,
    #[serde(default)]
    pub cumplimiento_tareas: Value,
    #[serde(default)]
    pub tutorias_por_cumplir: Value,
    #[serde(default)]
    pub asistencias_por_cumplir: Value,
    #[serde(default)]
    pub tareas_por_cumplir: Value,
}

pub async fn update_seguimiento_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<SeguimientoUpdate>,
) -> HandlerResult {
    let mut fields = Map::new();
    fields.insert("tutoriasCumplidas".to_string(), payload.tutorias_cumplidas);
    fields.insert("asistenciasCumplidas".to_string(), payload.asistencias_cumplidas);
    fields.insert("cumplimientoTareas".to_string(), payload.cumplimiento_tareas);
    fields.insert("tutoriasPorCumplir".to_string(), payload.tutorias_por_cumplir);
    fields.insert("asistenciasPorCumplir".to_string(), payload.asistencias_por_cumplir);
    fields.insert("tareasPorCumplir".to_string(), payload.tareas_por_cumplir);
    match app_state.store.update_assignment_fields(&id, fields).await {
        Ok(()) => Ok(Json(json!({ "message": "Seguimiento actualizado correctamente." }))),
        Err(PortError::NotFound(_)) => {
            Err(msg_error(StatusCode::NOT_FOUND, "Documento no encontrado"))
        }
        Err(e) => {
            error!(error = %e, "tracking update failed");
            Err(msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al actualizar seguimiento"))
        }
    }
}

//=========================================================================================
// Application Review Actions
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct PostulacionAction {
    #[serde(default)]
    pub titulo: String,
    pub estado: Option<ApplicationState>,
    pub reunion: Option<bool>,
}

/// Update the state and/or meeting flag of one student's application,
/// found by normalized title.
pub async fn update_postulacion_acciones_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(payload): Json<PostulacionAction>,
) -> HandlerResult {
    let store_failed = |e: &PortError| {
        error!(error = %e, "application action failed");
        msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error updating postulación.")
    };

    let wanted = normalize_title(&payload.titulo);
    let applications = app_state
        .store
        .applications_by_user(&user_id)
        .await
        .map_err(|e| store_failed(&e))?;
    let application = applications
        .iter()
        .find(|a| normalize_title(&a.titulo_oportunidad) == wanted)
        .ok_or_else(|| msg_error(StatusCode::NOT_FOUND, "No se encontró la postulación."))?;

    if let Some(estado) = payload.estado {
        match set_application_state(app_state.store.as_ref(), application, estado).await {
            Ok(_) => {}
            Err(PortError::InvalidTransition { from, to }) => {
                return Err(transition_error(&from, &to))
            }
            Err(e) => return Err(store_failed(&e)),
        }
    }
    if let Some(reunion) = payload.reunion {
        let mut fields = Map::new();
        fields.insert("reunion".to_string(), json!(reunion));
        app_state
            .store
            .update_application_fields(&application.id, fields)
            .await
            .map_err(|e| store_failed(&e))?;
    }
    Ok(Json(json!({ "message": "Postulación actualizada exitosamente." })))
}

/// Approve an application: create the assignment, then drop the student's
/// matching applications.
#[utoipa::path(
    patch,
    path = "/assignAndRemoveSolicitud",
    responses(
        (status = 200, description = "Assignment created and the application removed"),
        (status = 404, description = "No open offer matches the requested title"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn assign_and_remove_solicitud_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ApprovalRequest>,
) -> HandlerResult {
    let policy = app_state.config.approval_policy;
    match approve_application(app_state.store.as_ref(), payload, policy).await {
        Ok(()) => Ok(Json(json!({ "message": "Estudiante asignado y solicitud eliminada." }))),
        Err(PortError::NotFound(message)) => Err(msg_error(StatusCode::NOT_FOUND, &message)),
        Err(e) => {
            error!(error = %e, "approval failed");
            Err(msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error interno del servidor."))
        }
    }
}

pub async fn set_solicitud_reunion_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let mut fields = Map::new();
    fields.insert("reunion".to_string(), json!(true));
    match app_state.store.update_application_fields(&id, fields).await {
        Ok(()) => Ok(Json(json!({ "message": "Reunión solicitada en la postulación." }))),
        Err(PortError::NotFound(_)) => {
            Err(msg_error(StatusCode::NOT_FOUND, "No se encontró la postulación."))
        }
        Err(e) => {
            error!(error = %e, "meeting request failed");
            Err(msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al solicitar reunión."))
        }
    }
}

/// Reject an application. The success message is the source system's exact
/// string, kept for wire compatibility even though it reads like the
/// meeting endpoint's.
pub async fn rechazar_postulacion_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult {
    match reject_application(app_state.store.as_ref(), &id).await {
        Ok(_) => Ok(Json(json!({ "message": "Reunión solicitada en la postulación." }))),
        Err(PortError::InvalidTransition { from, to }) => Err(transition_error(&from, &to)),
        Err(PortError::NotFound(_)) => {
            Err(msg_error(StatusCode::NOT_FOUND, "No se encontró la postulación."))
        }
        Err(e) => {
            error!(error = %e, "rejection failed");
            Err(msg_error(StatusCode::INTERNAL_SERVER_ERROR, "Error al rechazar postulación"))
        }
    }
}
