//! crates/asistencias_core/src/transition.rs
//!
//! State Transition Guard. The source system wrote `estado` fields
//! unconditionally, which allowed closed offers to be resurrected; every
//! status write now goes through these checks and an illegal transition is
//! reported as an error rather than silently ignored.

use crate::domain::{ApplicationState, OfferState};
use crate::ports::{PortError, PortResult};

/// Result of a legal transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed,
    /// Target state equals the current state; callers skip the write.
    Noop,
}

impl OfferState {
    /// Legal moves: Revision -> Abierto, Revision -> Cerrado,
    /// Abierto -> Cerrado. Same-state is a no-op success; `Cerrado` is
    /// terminal.
    pub fn transition(self, to: OfferState) -> PortResult<Transition> {
        if self == to {
            return Ok(Transition::Noop);
        }
        match (self, to) {
            (OfferState::Revision, OfferState::Abierto)
            | (OfferState::Revision, OfferState::Cerrado)
            | (OfferState::Abierto, OfferState::Cerrado) => Ok(Transition::Changed),
            (from, to) => Err(PortError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            }),
        }
    }
}

impl ApplicationState {
    /// Legal moves: Pendiente -> Aprobado, Pendiente -> Rechazado. Both
    /// targets are terminal.
    pub fn transition(self, to: ApplicationState) -> PortResult<Transition> {
        if self == to {
            return Ok(Transition::Noop);
        }
        match (self, to) {
            (ApplicationState::Pendiente, ApplicationState::Aprobado)
            | (ApplicationState::Pendiente, ApplicationState::Rechazado) => Ok(Transition::Changed),
            (from, to) => Err(PortError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            }),
        }
    }
}
