//! End-to-end tests over the real router and the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use api_lib::adapters::{LogMailer, MemoryStore};
use api_lib::config::Config;
use api_lib::web::{router, state::AppState};
use asistencias_core::domain::{Application, Course, Offer, User};
use asistencias_core::ports::DocumentStore;

fn app_with_store() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let app_state = Arc::new(AppState {
        store: store.clone(),
        mailer: Arc::new(LogMailer::new()),
        config: Arc::new(Config::default()),
    });
    (router(app_state), store)
}

fn user(value: Value) -> User {
    serde_json::from_value(value).expect("valid user fixture")
}

fn offer(value: Value) -> Offer {
    serde_json::from_value(value).expect("valid offer fixture")
}

fn application(value: Value) -> Application {
    serde_json::from_value(value).expect("valid application fixture")
}

fn course(value: Value) -> Course {
    serde_json::from_value(value).expect("valid course fixture")
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("valid request"))
        .await
        .expect("router never fails");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, value)
}

async fn seed_campus(store: &MemoryStore) {
    store
        .insert_user(user(json!({
            "id": "esc1",
            "nombre": "Escuela de Computación",
            "tipoUsuario": "Escuela",
            "carrera": "Computación"
        })))
        .await
        .unwrap();
    store
        .insert_user(user(json!({
            "id": "prof1",
            "nombre": "Ana Rojas",
            "correo": "ana@universidad.ac.cr",
            "contrasena": "segura123",
            "tipoUsuario": "Profesor",
            "carrera": "esc1"
        })))
        .await
        .unwrap();
    store
        .insert_user(user(json!({
            "id": "est1",
            "nombre": "Luis Mora",
            "correo": "luis@estudiante.ac.cr",
            "contrasena": "clave456",
            "tipoUsuario": "Estudiante",
            "carrera": "esc1"
        })))
        .await
        .unwrap();
    store
        .insert_offer(offer(json!({
            "id": "of1",
            "tituloPrograma": "Tutoría Matemática",
            "tipo": "tutoria",
            "estado": "Abierto",
            "personaACargo": "prof1",
            "departamento": "esc1",
            "cantidadVacantes": "1",
            "totalHoras": "8",
            "semestre": "II-2026"
        })))
        .await
        .unwrap();
    store
        .insert_offer(offer(json!({
            "id": "of2",
            "tituloPrograma": "Asistencia Compiladores",
            "estado": "Cerrado",
            "personaACargo": "prof1"
        })))
        .await
        .unwrap();
}

#[tokio::test]
async fn login_returns_role_and_id() {
    let (app, store) = app_with_store();
    seed_campus(&store).await;

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        Some(json!({ "email": "LUIS@estudiante.ac.cr", "password": "clave456" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["rol"], "estudiante");
    assert_eq!(body["id"], "est1");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let (app, store) = app_with_store();
    seed_campus(&store).await;

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        Some(json!({ "email": "luis@estudiante.ac.cr", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Credenciales inválidas");
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn opportunity_listing_resolves_names_and_hides_closed_offers() {
    let (app, store) = app_with_store();
    seed_campus(&store).await;

    let (status, body) = send(&app, "GET", "/asistencias/oportunidades", None).await;
    assert_eq!(status, StatusCode::OK);
    let oportunidades = body["oportunidades"].as_array().unwrap();
    assert_eq!(oportunidades.len(), 1);
    assert_eq!(oportunidades[0]["titulo"], "Tutoría Matemática");
    assert_eq!(oportunidades[0]["escuela"], "Escuela de Computación");
    assert_eq!(oportunidades[0]["encargado"], "Ana Rojas");
    assert_eq!(oportunidades[0]["horas"], "8 horas mínimas a la semana");
}

#[tokio::test]
async fn registering_shows_up_in_tracking_and_bumps_the_counter() {
    let (app, store) = app_with_store();
    seed_campus(&store).await;

    let (status, body) = send(
        &app,
        "POST",
        "/solicitudes/registrar",
        Some(json!({
            "userId": "est1",
            "tituloOportunidad": " TUTORÍA MATEMÁTICA ",
            "nombre": "Luis Mora",
            "horas": "10"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mensaje"], "Solicitud registrada correctamente");

    let (status, body) = send(&app, "GET", "/solicitudes/seguimiento?userId=est1", None).await;
    assert_eq!(status, StatusCode::OK);
    let solicitudes = body["solicitudes"].as_array().unwrap();
    assert_eq!(solicitudes.len(), 1);
    assert_eq!(solicitudes[0]["tipoBeca"], "tutoria");
    assert_eq!(solicitudes[0]["periodo"], "II-2026");
    assert_eq!(solicitudes[0]["responsable"], "Ana Rojas");
    assert_eq!(solicitudes[0]["horasTrabajadas"], 10);

    let (_, body) = send(&app, "GET", "/asistencias/oportunidades", None).await;
    assert_eq!(body["oportunidades"][0]["cantidadSolicitudes"], "1");
}

#[tokio::test]
async fn tracking_without_user_id_is_rejected() {
    let (app, _) = app_with_store();
    let (status, body) = send(&app, "GET", "/solicitudes/seguimiento", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Falta el ID del usuario");
}

#[tokio::test]
async fn approval_moves_the_application_into_an_assignment() {
    let (app, store) = app_with_store();
    seed_campus(&store).await;
    store
        .insert_application(application(json!({
            "id": "sol1",
            "userId": "est1",
            "tituloOportunidad": "Tutoría Matemática",
            "estado": "Pendiente"
        })))
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        "PATCH",
        "/assignAndRemoveSolicitud",
        Some(json!({ "userId": "est1", "tituloOportunidad": "tutoría matemática" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Estudiante asignado y solicitud eliminada.");

    // The professor dashboard now carries the assignment.
    let (status, body) = send(&app, "GET", "/getUserInfoByAsistencias/prof1", None).await;
    assert_eq!(status, StatusCode::OK);
    let asignadas = body["asignadas"].as_array().unwrap();
    assert_eq!(asignadas.len(), 1);
    assert_eq!(asignadas[0]["datosAsignacion"]["userId"], "est1");
    assert_eq!(asignadas[0]["datosAsignacion"]["pago"], 2000);
    assert_eq!(asignadas[0]["datosAsistencia"]["tituloPrograma"], "Tutoría Matemática");

    // And the student's tracking view is empty again.
    let (_, body) = send(&app, "GET", "/solicitudes/seguimiento?userId=est1", None).await;
    assert_eq!(body["solicitudes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn approval_without_open_offer_is_not_found() {
    let (app, store) = app_with_store();
    seed_campus(&store).await;

    let (status, body) = send(
        &app,
        "PATCH",
        "/assignAndRemoveSolicitud",
        Some(json!({ "userId": "est1", "tituloOportunidad": "Asistencia Compiladores" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No existe Asistencia abierta con ese título.");
}

#[tokio::test]
async fn accepting_a_closed_offer_is_an_invalid_transition() {
    let (app, store) = app_with_store();
    seed_campus(&store).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/admin/aceptarOferta",
        Some(json!({ "id": "of2" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Transición de estado inválida: de Cerrado a Abierto"
    );
}

#[tokio::test]
async fn accepting_an_offer_under_review_publishes_it() {
    let (app, store) = app_with_store();
    store
        .insert_offer(offer(json!({
            "id": "of3",
            "tituloPrograma": "Asistencia Redes",
            "estado": "Revision"
        })))
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        "/admin/aceptarOferta",
        Some(json!({ "id": "of3" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "asistencia aceptada correctamente");

    let (_, body) = send(&app, "GET", "/admin/Ofertas", None).await;
    assert_eq!(body["ofertas"][0]["estado"], "Abierto");
}

#[tokio::test]
async fn admin_directory_resolves_careers_per_row() {
    let (app, store) = app_with_store();
    seed_campus(&store).await;
    store
        .insert_user(user(json!({
            "id": "prof2",
            "nombre": "Marco Brenes",
            "tipoUsuario": "Profesor",
            "carrera": "no-existe"
        })))
        .await
        .unwrap();

    let (status, body) = send(&app, "GET", "/admin/obtenerDatosUsuarios", None).await;
    assert_eq!(status, StatusCode::OK);
    let datos = body["datos"].as_array().unwrap();
    let by_name = |nombre: &str| {
        datos
            .iter()
            .find(|d| d["nombre"] == nombre)
            .cloned()
            .unwrap()
    };
    assert_eq!(by_name("Ana Rojas")["carrera"], "Computación");
    assert_eq!(by_name("Marco Brenes")["carrera"], "Carrera no encontrada");
}

#[tokio::test]
async fn inserting_an_offer_reformats_dates_and_seeds_history() {
    let (app, store) = app_with_store();
    seed_campus(&store).await;

    let (status, body) = send(
        &app,
        "POST",
        "/insertNewOferta/prof1",
        Some(json!({
            "nombrePrograma": "Asistencia Bases de Datos",
            "fechaInicio": "2026-03-01",
            "fechaCierre": "2026-07-15",
            "horasSemanal": 10,
            "vacantes": 2,
            "requisitos": "Bases de datos, Programación 2",
            "estado": "Revision",
            "departamento": "esc1",
            "totalHoras": "80"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Oferta creada exitosamente");
    let id = body["id"].as_str().unwrap().to_string();

    let offer = store.get_offer(&id).await.unwrap();
    assert_eq!(offer.fecha_inicio, "01/03/2026");
    assert_eq!(offer.fecha_fin, "15/07/2026");
    assert_eq!(offer.hora_x_semana, "10");
    assert_eq!(offer.cantidad_vacantes, "2");
    assert_eq!(
        offer.requisitos,
        vec!["Bases de datos".to_string(), "Programación 2".to_string()]
    );
    assert_eq!(offer.historial_cambios.len(), 1);
    assert_eq!(offer.historial_cambios[0].cambios, "Creación de la oferta");
}

#[tokio::test]
async fn student_info_strips_the_password_and_resolves_courses() {
    let (app, store) = app_with_store();
    seed_campus(&store).await;
    store
        .insert_course(course(json!({
            "id": "c1",
            "nombre": "Cálculo I",
            "profesor": "prof1"
        })))
        .await
        .unwrap();
    let mut fields = serde_json::Map::new();
    fields.insert("cursosAprovados".to_string(), json!(["c1", "c-fantasma"]));
    store.update_user_fields("est1", fields).await.unwrap();

    let (status, body) = send(&app, "GET", "/estudiantes/infoEstudiantes?userId=est1", None).await;
    assert_eq!(status, StatusCode::OK);
    let datos = &body["datos"];
    assert!(datos.get("contrasena").is_none());
    assert_eq!(datos["carrera"], "Computación");
    assert_eq!(datos["cursosAprovados"], json!(["Cálculo I", "c-fantasma"]));
}
