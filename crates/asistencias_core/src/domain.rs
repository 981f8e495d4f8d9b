//! crates/asistencias_core/src/domain.rs
//!
//! Core data structures for the assistantship platform. Every struct mirrors
//! a document in one of the flat store collections (Usuarios, Asistencias,
//! Solicitudes, AsistenciasAsignadas, Cursos). The store is schema-less, so
//! unknown fields are preserved through the `extra` flatten maps and most
//! scalar fields default when absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The role stored in a Usuario document's `tipoUsuario` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Estudiante,
    Profesor,
    Administrador,
    Escuela,
    Departamento,
}

impl UserRole {
    /// The role string the login endpoint hands to the client.
    /// Escuela and Departamento users share the "escuela" frontend.
    pub fn rol_slug(&self) -> &'static str {
        match self {
            UserRole::Estudiante => "estudiante",
            UserRole::Profesor => "profesor",
            UserRole::Administrador => "admin",
            UserRole::Escuela | UserRole::Departamento => "escuela",
        }
    }
}

/// Lifecycle state of an Offer. Advances only forward; `Cerrado` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OfferState {
    #[default]
    Revision,
    Abierto,
    Cerrado,
}

impl OfferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferState::Revision => "Revision",
            OfferState::Abierto => "Abierto",
            OfferState::Cerrado => "Cerrado",
        }
    }
}

/// Lifecycle state of an Application. `Aprobado` and `Rechazado` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ApplicationState {
    #[default]
    Pendiente,
    Aprobado,
    Rechazado,
}

impl ApplicationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationState::Pendiente => "Pendiente",
            ApplicationState::Aprobado => "Aprobado",
            ApplicationState::Rechazado => "Rechazado",
        }
    }
}

/// A Usuario document. Career records are Usuario documents of type Escuela:
/// for students and professors `carrera` holds the ID of such a document,
/// for Escuela users it holds the career name itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub correo: String,
    /// Stored and compared in plaintext. A known defect of the data model,
    /// carried as-is; see DESIGN.md.
    #[serde(default)]
    pub contrasena: String,
    pub tipo_usuario: UserRole,
    #[serde(default)]
    pub carrera: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub sede: String,
    #[serde(default)]
    pub nivel_academico: String,
    #[serde(default)]
    pub ponderado: String,
    #[serde(default)]
    pub cursos_aprovados: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of an Offer's append-only `historialCambios` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    #[serde(default)]
    pub cambios: String,
    #[serde(default)]
    pub fecha: String,
    #[serde(default)]
    pub hora_x_semana: String,
}

/// An Asistencia document: a published assistantship/tutoring offer.
///
/// Numeric-looking fields (`cantidadVacantes`, `totalHoras`, ...) are kept as
/// strings because that is how the store holds them; `cantidadSolicitudes` is
/// the one genuine counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub titulo_programa: String,
    #[serde(default)]
    pub tipo: String,
    #[serde(default)]
    pub estado: OfferState,
    /// User ID of the professor in charge.
    #[serde(default)]
    pub persona_a_cargo: String,
    /// User ID of the school that published the offer.
    #[serde(default)]
    pub departamento: String,
    #[serde(default)]
    pub cantidad_vacantes: String,
    /// Incremented when an application is registered. Never decremented,
    /// so it can drift from the number of live applications.
    #[serde(default)]
    pub cantidad_solicitudes: i64,
    #[serde(default)]
    pub total_horas: String,
    #[serde(default)]
    pub hora_x_semana: String,
    #[serde(default)]
    pub semestre: String,
    #[serde(default)]
    pub fecha_inicio: String,
    #[serde(default)]
    pub fecha_fin: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub horario: String,
    #[serde(default)]
    pub objetivos: String,
    #[serde(default)]
    pub beneficio: String,
    #[serde(default)]
    pub promedio_requerido: String,
    #[serde(default)]
    pub requisitos: Vec<String>,
    #[serde(default)]
    pub requisitos_adicionales: String,
    /// User IDs of students who applied.
    #[serde(default)]
    pub postulaciones: Vec<String>,
    #[serde(default)]
    pub historial_cambios: Vec<ChangeRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A Solicitud document: a student's request to fill an offer.
///
/// The wire contract joins by denormalized title (`tituloOportunidad`), not
/// by ID. `oferta_id` is resolved at write time when a matching offer exists
/// so later joins can use the stable ID; legacy records carry `None` and
/// fall back to the title join.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub titulo_oportunidad: String,
    #[serde(default)]
    pub estado: ApplicationState,
    #[serde(default)]
    pub reunion: bool,
    #[serde(default)]
    pub fecha: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oferta_id: Option<String>,
    // Submitted profile snapshot.
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub correo: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub promedio: String,
    #[serde(default)]
    pub horas: String,
    #[serde(default)]
    pub nota: String,
    #[serde(default)]
    pub comentarios: String,
    #[serde(default)]
    pub documento: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An AsistenciaAsignada document, created when an application is approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(default)]
    pub id: String,
    pub asistencia_id: String,
    pub user_id: String,
    #[serde(default)]
    pub pago: i64,
    #[serde(default)]
    pub desempeno: String,
    #[serde(default)]
    pub retroalimentacion: String,
    #[serde(default)]
    pub fecha_asignacion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activo: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A Curso document, referenced by a student's `cursosAprovados` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub nombre: String,
    /// User ID of the professor teaching the course.
    #[serde(default)]
    pub profesor: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
