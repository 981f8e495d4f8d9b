//! crates/asistencias_core/src/views.rs
//!
//! Aggregate View Builder: composes the resolver and the joiner into the
//! shaped response objects the mobile client expects. All read-side views
//! work over per-request snapshots; a resolution miss degrades to a
//! placeholder and the row is kept, never dropped.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::{Application, ApplicationState, Assignment, Offer, OfferState, User, UserRole};
use crate::join::{assignments_for_offers, normalize_title, OfferRef};
use crate::ports::{DocumentStore, PortError, PortResult, MAX_IN_KEYS};
use crate::resolve::UserIndex;

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

/// One row of the admin user listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDirectoryEntry {
    pub id: String,
    pub nombre: String,
    pub rol: UserRole,
    pub correo: String,
    pub carrera: String,
    pub telefono: String,
    pub sede: String,
}

/// Admin listing of every user with the career reference resolved per row.
pub fn user_directory(users: &[User]) -> Vec<UserDirectoryEntry> {
    let index = UserIndex::new(users);
    users
        .iter()
        .map(|user| UserDirectoryEntry {
            id: user.id.clone(),
            nombre: user.nombre.clone(),
            rol: user.tipo_usuario,
            correo: user.correo.clone(),
            carrera: index.carrera_display(user),
            telefono: user.telefono.clone(),
            sede: user.sede.clone(),
        })
        .collect()
}

/// A career record as the admin screens consume it.
#[derive(Debug, Clone, Serialize)]
pub struct CarreraEntry {
    pub id: String,
    pub carrera: String,
}

/// Escuela users with a career assigned, keyed by their document ID.
pub fn carrera_directory(users: &[User]) -> Vec<CarreraEntry> {
    users
        .iter()
        .filter(|u| u.tipo_usuario == UserRole::Escuela && !u.carrera.is_empty())
        .map(|u| CarreraEntry {
            id: u.id.clone(),
            carrera: u.carrera.clone(),
        })
        .collect()
}

/// Deduplicated career names for the student-facing dropdown.
pub fn carrera_names(users: &[User]) -> Vec<String> {
    let mut seen = HashSet::new();
    users
        .iter()
        .filter(|u| u.tipo_usuario == UserRole::Escuela && !u.carrera.is_empty())
        .map(|u| u.carrera.trim().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// One row of the admin offer listing.
#[derive(Debug, Clone, Serialize)]
pub struct OfferSummary {
    pub id: String,
    pub nombre: String,
    pub tipo: String,
    pub estado: OfferState,
    pub estudiantes: String,
    pub horas: String,
}

pub fn offer_summaries(offers: &[Offer]) -> Vec<OfferSummary> {
    offers
        .iter()
        .map(|offer| OfferSummary {
            id: offer.id.clone(),
            nombre: offer.titulo_programa.clone(),
            tipo: offer.tipo.clone(),
            estado: offer.estado,
            estudiantes: offer.cantidad_vacantes.clone(),
            horas: offer.total_horas.clone(),
        })
        .collect()
}

/// One row of the admin monitoring table.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringRow {
    pub id: String,
    pub asistencia: String,
    pub periodo: String,
    pub responsable: String,
    pub estado: OfferState,
}

/// Every offer with its `personaACargo` reference resolved to a name.
pub fn offer_monitoring(offers: &[Offer], users: &[User]) -> Vec<MonitoringRow> {
    let index = UserIndex::new(users);
    offers
        .iter()
        .map(|offer| MonitoringRow {
            id: offer.id.clone(),
            asistencia: offer.titulo_programa.clone(),
            periodo: offer.semestre.clone(),
            responsable: index.nombre_or(&offer.persona_a_cargo, ""),
            estado: offer.estado,
        })
        .collect()
}

/// An open opportunity as shown to students, with school and professor
/// references resolved and display defaults applied.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityView {
    pub id: String,
    pub titulo: String,
    pub escuela: String,
    pub encargado: String,
    pub horas: String,
    pub requisitos: String,
    pub descripcion: String,
    pub tipo: String,
    pub estado: OfferState,
    pub horario: String,
    pub cantidad_vacantes: String,
    pub cantidad_solicitudes: String,
    pub objetivos: String,
    pub beneficio: String,
    pub promedio_requerido: String,
    pub semestre: String,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    pub total_horas: String,
}

/// Opportunity listing: everything not yet closed, with references resolved
/// against the Usuarios snapshot.
pub fn opportunity_listing(offers: &[Offer], users: &[User]) -> Vec<OpportunityView> {
    let index = UserIndex::new(users);
    offers
        .iter()
        .filter(|offer| offer.estado != OfferState::Cerrado)
        .map(|offer| OpportunityView {
            id: offer.id.clone(),
            titulo: or_placeholder(&offer.titulo_programa, "Sin título"),
            escuela: index.nombre_or(&offer.departamento, "Desconocido"),
            encargado: index.nombre_or(&offer.persona_a_cargo, "Sin encargado"),
            horas: format!(
                "{} horas mínimas a la semana",
                or_placeholder(&offer.total_horas, "0")
            ),
            requisitos: if offer.requisitos.is_empty() {
                "Sin requisitos".to_string()
            } else {
                offer.requisitos.join(", ")
            },
            descripcion: offer.descripcion.clone(),
            tipo: offer.tipo.clone(),
            estado: offer.estado,
            horario: or_placeholder(&offer.horario, "Sin horario definido"),
            cantidad_vacantes: or_placeholder(&offer.cantidad_vacantes, "0"),
            cantidad_solicitudes: offer.cantidad_solicitudes.to_string(),
            objetivos: or_placeholder(&offer.objetivos, "No especificados"),
            beneficio: or_placeholder(&offer.beneficio, "No aplica"),
            promedio_requerido: or_placeholder(&offer.promedio_requerido, "No especificado"),
            semestre: or_placeholder(&offer.semestre, "No definido"),
            fecha_inicio: or_placeholder(&offer.fecha_inicio, "No definida"),
            fecha_fin: or_placeholder(&offer.fecha_fin, "No definida"),
            total_horas: or_placeholder(&offer.total_horas, "0"),
        })
        .collect()
}

/// One row of a student's application tracking view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRow {
    pub id: String,
    pub titulo: String,
    pub tipo_beca: String,
    pub periodo: String,
    pub responsable: String,
    pub estado: ApplicationState,
    pub horas_trabajadas: i64,
    pub avances: bool,
    pub retroalimentacion: bool,
    pub certificados: bool,
}

/// Tracking rows for one student's applications. Applications whose offer
/// cannot be found still surface with placeholder values; rows are deduped
/// by application ID.
pub fn application_tracking(
    applications: &[Application],
    offers: &[Offer],
    users: &[User],
) -> Vec<TrackingRow> {
    let index = UserIndex::new(users);
    let mut by_title: HashMap<String, &Offer> = HashMap::new();
    for offer in offers {
        let key = normalize_title(&offer.titulo_programa);
        if !key.is_empty() {
            // Last title match wins, as in the source system's scan.
            by_title.insert(key, offer);
        }
    }
    let by_id: HashMap<&str, &Offer> = offers.iter().map(|o| (o.id.as_str(), o)).collect();

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for application in applications {
        if application.titulo_oportunidad.is_empty() || !seen.insert(application.id.clone()) {
            continue;
        }
        let matched = match application.offer_ref() {
            OfferRef::ById(id) => by_id.get(id.as_str()).copied(),
            OfferRef::ByTitle(title) => by_title.get(&normalize_title(&title)).copied(),
        };
        let (tipo_beca, periodo, responsable) = match matched {
            Some(offer) => (
                or_placeholder(&offer.tipo, "Sin tipo"),
                or_placeholder(&offer.semestre, "Sin periodo"),
                index.nombre_or(&offer.persona_a_cargo, "No asignado"),
            ),
            None => (
                "Sin tipo".to_string(),
                "Sin periodo".to_string(),
                "No asignado".to_string(),
            ),
        };
        rows.push(TrackingRow {
            id: application.id.clone(),
            titulo: application.titulo_oportunidad.clone(),
            tipo_beca,
            periodo,
            responsable,
            estado: application.estado,
            horas_trabajadas: application.horas.trim().parse().unwrap_or(0),
            avances: false,
            retroalimentacion: false,
            certificados: false,
        });
    }
    rows
}

/// An assignment paired with the offer it fills.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedOffer {
    pub asignacion_id: String,
    pub datos_asignacion: Assignment,
    pub datos_asistencia: Offer,
}

/// A closed offer without an assigned counterpart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedOffer {
    pub asistencia_id: String,
    pub datos_asistencia: Offer,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfessorDashboard {
    pub asignadas: Vec<AssignedOffer>,
    pub cerradas: Vec<ClosedOffer>,
}

/// Builds the professor dashboard: the professor's offers joined to their
/// assignments through the chunked `IN` lookup, and the closed offers that
/// do not already appear (by normalized title) in the assigned section.
pub async fn professor_dashboard(
    store: &dyn DocumentStore,
    professor_id: &str,
) -> PortResult<ProfessorDashboard> {
    let offers = store.offers_by_professor(professor_id).await?;
    if offers.is_empty() {
        return Err(PortError::NotFound(
            "No se encontraron asistencias para este profesor.".to_string(),
        ));
    }

    let offer_ids: Vec<String> = offers.iter().map(|o| o.id.clone()).collect();
    let assignments = assignments_for_offers(store, &offer_ids, MAX_IN_KEYS).await?;

    let by_id: HashMap<&str, &Offer> = offers.iter().map(|o| (o.id.as_str(), o)).collect();
    let mut asignadas = Vec::new();
    for assignment in assignments {
        // An assignment pointing at a vanished offer is skipped, not fatal.
        if let Some(offer) = by_id.get(assignment.asistencia_id.as_str()) {
            asignadas.push(AssignedOffer {
                asignacion_id: assignment.id.clone(),
                datos_asistencia: (*offer).clone(),
                datos_asignacion: assignment,
            });
        }
    }

    let assigned_titles: HashSet<String> = asignadas
        .iter()
        .map(|a| normalize_title(&a.datos_asistencia.titulo_programa))
        .collect();
    let cerradas = offers
        .iter()
        .filter(|offer| offer.estado == OfferState::Cerrado)
        .filter(|offer| !assigned_titles.contains(&normalize_title(&offer.titulo_programa)))
        .map(|offer| ClosedOffer {
            asistencia_id: offer.id.clone(),
            datos_asistencia: offer.clone(),
        })
        .collect();

    Ok(ProfessorDashboard { asignadas, cerradas })
}
