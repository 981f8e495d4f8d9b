//! services/api/src/web/mod.rs
//!
//! HTTP surface: route table, the OpenAPI master definition and the handler
//! modules. Paths, JSON shapes and message strings are the wire contract the
//! mobile client already speaks; they are Spanish and stay that way.

pub mod admin;
pub mod auth;
pub mod estudiantes;
pub mod profesores;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use utoipa::OpenApi;

use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login_handler,
        estudiantes::oportunidades_handler,
        estudiantes::registrar_solicitud_handler,
        profesores::assign_and_remove_solicitud_handler,
    ),
    components(
        schemas(auth::LoginRequest)
    ),
    tags(
        (name = "Asistencias API", description = "Backend for the university assistantship platform.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Route Table
//=========================================================================================

/// Builds the full application router over the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // Auth
        .route("/login", post(auth::login_handler))
        // Admin
        .route("/admin/obtenerDatosUsuarios", get(admin::obtener_usuarios_handler))
        .route("/admin/ActualizarRol", put(admin::actualizar_rol_handler))
        .route("/admin/ActualizarUsuario", put(admin::actualizar_usuario_handler))
        .route("/admin/EliminarUsuario", delete(admin::eliminar_usuario_handler))
        .route("/admin/carreras", get(admin::carreras_handler))
        .route("/admin/Ofertas", get(admin::ofertas_handler))
        .route("/admin/aceptarOferta", put(admin::aceptar_oferta_handler))
        .route("/admin/eliminarOferta", delete(admin::eliminar_oferta_handler))
        .route("/admin/actualizarOferta", put(admin::actualizar_oferta_handler))
        .route("/admin/monitoreoAsistencia", get(admin::monitoreo_asistencia_handler))
        // Estudiantes
        .route("/estudiantes/infoEstudiantes", get(estudiantes::info_estudiante_handler))
        .route("/estudiantes/registrarPerfil", post(estudiantes::registrar_perfil_handler))
        .route("/estudiantes/carreras", get(estudiantes::carreras_handler))
        .route("/asistencias/oportunidades", get(estudiantes::oportunidades_handler))
        .route("/solicitudes/registrar", post(estudiantes::registrar_solicitud_handler))
        .route("/solicitudes/seguimiento", get(estudiantes::seguimiento_handler))
        // Profesores
        .route("/infoProfesores/{id}", get(profesores::info_profesores_handler))
        .route("/updateInfoProfesores/{id}", patch(profesores::update_info_profesores_handler))
        .route("/getCursos/{id}", get(profesores::cursos_handler))
        .route("/getHistorial/{id}", get(profesores::historial_handler))
        .route("/getUserInfoByAsistencias/{id}", get(profesores::dashboard_handler))
        .route("/insertNewOferta/{id}", post(profesores::insert_oferta_handler))
        .route("/getAsistenciasByProfesor/{id}", get(profesores::asistencias_by_profesor_handler))
        .route(
            "/getSolicitudesRelacionadasConAsistencias/{id}",
            get(profesores::solicitudes_relacionadas_handler),
        )
        .route("/updateOferta/{id}", patch(profesores::update_oferta_handler))
        .route("/closeOferta/{id}", patch(profesores::close_oferta_handler))
        .route("/deleteOferta/{id}", delete(profesores::delete_oferta_handler))
        .route("/addDesempeno/{id}", patch(profesores::add_desempeno_handler))
        .route("/searchCarreraByuserId/{id}", get(profesores::search_carrera_handler))
        .route(
            "/updatePostulacionAcciones/{userId}",
            patch(profesores::update_postulacion_acciones_handler),
        )
        .route(
            "/updateAsistenciaFeedback/{type}/{id}",
            patch(profesores::update_asistencia_feedback_handler),
        )
        .route(
            "/assignAndRemoveSolicitud",
            patch(profesores::assign_and_remove_solicitud_handler),
        )
        .route("/setSolicitudReunion/{id}", patch(profesores::set_solicitud_reunion_handler))
        .route("/rechazarPostulacion/{id}", patch(profesores::rechazar_postulacion_handler))
        .route("/updateSeguimiento/{id}", patch(profesores::update_seguimiento_handler))
        .with_state(app_state)
}
