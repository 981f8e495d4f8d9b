pub mod mailer;
pub mod store;

pub use mailer::LogMailer;
pub use store::MemoryStore;
