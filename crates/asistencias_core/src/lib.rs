pub mod domain;
pub mod join;
pub mod ports;
pub mod resolve;
pub mod transition;
pub mod views;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_store;

pub use domain::{
    Application, ApplicationState, Assignment, ChangeRecord, Course, Offer, OfferState, User,
    UserRole,
};
pub use ports::{DocumentStore, NotificationService, PortError, PortResult, MAX_IN_KEYS};
