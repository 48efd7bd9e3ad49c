//! Session tokens, participant identity and route authorization.

mod authorize;
mod capacity;
mod claims;
mod credentials;
mod keys;
mod participant_id;
pub mod rotation;
pub mod secrets;
mod service;
pub mod studies;
mod token;

pub use authorize::*;
pub use capacity::{Capacity, UnknownCapacity};
pub use claims::{SessionClaims, TOKEN_ISSUER};
pub use credentials::{
    CredentialError, PasswordCredential, SALT_LENGTH, generate_salt, hash_email,
    verify_password, verify_without_credential,
};
pub use keys::{SigningKey, SigningKeys};
pub use participant_id::{PARTICIPANT_ID_DIGITS, ParticipantId, ParticipantIdError, normalize_id};
pub use secrets::{MockSecretStore, SecretStore, SecretStoreError, VaultClient, VaultConfig};
pub use service::*;
pub use studies::{is_known_study, token_lifetime};
pub use token::*;
