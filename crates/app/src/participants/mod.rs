//! Participants

pub mod data;
pub mod errors;
pub mod records;
pub mod service;
mod store;

pub use errors::ParticipantsServiceError;
pub use service::*;
pub use store::{IdentityStore, MockIdentityStore, PgIdentityStore};
