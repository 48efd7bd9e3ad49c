//! Participant identity, session tokens and authorization for AMoSS services.

pub mod auth;
pub mod context;
pub mod database;
pub mod participants;

#[cfg(test)]
mod test;
