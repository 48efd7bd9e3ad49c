//! Participant Handlers

pub(crate) mod login;
pub(crate) mod password_recovery;
pub(crate) mod register;
pub(crate) mod session;
pub(crate) mod unique_id;
