//! crates/asistencias_core/src/resolve.rs
//!
//! Reference Resolver: looks up foreign-key-like string fields (`carrera`,
//! `personaACargo`, `departamento`) against a pre-fetched snapshot of the
//! Usuarios collection. A snapshot is built once per request so listing
//! paths never issue per-row point reads.
//!
//! A miss degrades to a sentinel or caller-supplied placeholder; it never
//! aborts the surrounding listing.

use std::collections::HashMap;

use crate::domain::{User, UserRole};

/// Sentinel shown when a student's or professor's `carrera` reference does
/// not resolve to a career record.
pub const CARRERA_NOT_FOUND: &str = "Carrera no encontrada";

/// Outcome of a reference lookup. Callers must handle both arms; there is
/// no raw dereference anywhere in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a, T: ?Sized> {
    Found(&'a T),
    Missing,
}

impl<'a, T: ?Sized> Resolved<'a, T> {
    pub fn found(self) -> Option<&'a T> {
        match self {
            Resolved::Found(value) => Some(value),
            Resolved::Missing => None,
        }
    }
}

/// An id -> user index over a Usuarios snapshot.
pub struct UserIndex<'a> {
    by_id: HashMap<&'a str, &'a User>,
}

impl<'a> UserIndex<'a> {
    pub fn new(users: &'a [User]) -> Self {
        let by_id = users.iter().map(|u| (u.id.as_str(), u)).collect();
        Self { by_id }
    }

    pub fn resolve(&self, id: &str) -> Resolved<'a, User> {
        match self.by_id.get(id) {
            Some(user) => Resolved::Found(user),
            None => Resolved::Missing,
        }
    }

    /// Display name for a user reference, or `placeholder` when the
    /// reference is dangling.
    pub fn nombre_or(&self, id: &str, placeholder: &str) -> String {
        match self.resolve(id) {
            Resolved::Found(user) if !user.nombre.is_empty() => user.nombre.clone(),
            _ => placeholder.to_string(),
        }
    }

    /// Resolves a `carrera` reference (the ID of an Escuela user acting as a
    /// career record) to the career name. The stored display value is
    /// returned case-preserved; only join keys elsewhere get normalized.
    pub fn resolve_carrera(&self, carrera_ref: &str) -> Resolved<'a, str> {
        match self.resolve(carrera_ref) {
            Resolved::Found(record) if !record.carrera.is_empty() => {
                Resolved::Found(record.carrera.as_str())
            }
            _ => Resolved::Missing,
        }
    }

    /// Career name for a directory row. Students and professors carry a
    /// reference; Escuela users carry the name itself. Misses fall back to
    /// the documented sentinel instead of failing the listing.
    pub fn carrera_display(&self, user: &User) -> String {
        match user.tipo_usuario {
            UserRole::Estudiante | UserRole::Profesor => self
                .resolve_carrera(&user.carrera)
                .found()
                .map(str::to_string)
                .unwrap_or_else(|| CARRERA_NOT_FOUND.to_string()),
            UserRole::Escuela | UserRole::Departamento if !user.carrera.is_empty() => {
                user.carrera.clone()
            }
            _ => CARRERA_NOT_FOUND.to_string(),
        }
    }
}
