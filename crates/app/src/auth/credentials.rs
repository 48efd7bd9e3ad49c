//! Salted password credentials.
//!
//! Passwords are hashed with bcrypt over `salt + password`. Salts are
//! regenerated on every successful login, so a participant's stored
//! credential rolls over each time it is used.

use std::{fmt, sync::LazyLock};

use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::auth::SigningKey;

/// Length of a generated password salt.
pub const SALT_LENGTH: usize = 58;

/// bcrypt ignores input past this many bytes.
const BCRYPT_MAX_INPUT: usize = 72;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;

#[cfg(test)]
const HASH_COST: u32 = 4;

/// Stand-in credential checked when no participant matched, so unknown IDs
/// cost the same bcrypt work as known ones.
static DUMMY_CREDENTIAL: LazyLock<Option<PasswordCredential>> =
    LazyLock::new(|| PasswordCredential::create("no participant has this password").ok());

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password must not be empty")]
    EmptyPassword,

    #[error("password hashing failed")]
    Hash(#[from] bcrypt::BcryptError),
}

/// A salt and the bcrypt hash of `salt + password`.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordCredential {
    pub salt: String,
    pub hash: String,
}

impl PasswordCredential {
    /// Hash `password` under a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty password or when bcrypt fails.
    pub fn create(password: &str) -> Result<Self, CredentialError> {
        if password.is_empty() {
            return Err(CredentialError::EmptyPassword);
        }

        let salt = generate_salt();
        let hash = bcrypt::hash(hash_input(&salt, password).as_bytes(), HASH_COST)?;

        Ok(Self { salt, hash })
    }

    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        verify_password(&self.hash, &self.salt, password)
    }
}

impl fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordCredential(**redacted**)")?;
        Ok(())
    }
}

/// Random alphanumeric salt of [`SALT_LENGTH`] characters from the OS RNG.
#[must_use]
pub fn generate_salt() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect()
}

/// Check `supplied` against a stored bcrypt hash of `salt + password`.
///
/// Comparison is done by bcrypt itself. A malformed stored hash verifies as
/// `false`.
#[must_use]
pub fn verify_password(stored_hash: &str, salt: &str, supplied: &str) -> bool {
    if supplied.is_empty() {
        return false;
    }

    let input = hash_input(salt, supplied);

    match bcrypt::verify(input.as_bytes(), stored_hash) {
        Ok(true) => true,
        Ok(false) if salt.len() + supplied.len() > BCRYPT_MAX_INPUT => {
            // Credentials stored before pre-hashing were truncated by bcrypt.
            let legacy = Zeroizing::new(format!("{salt}{supplied}"));

            bcrypt::verify(legacy.as_bytes(), stored_hash).unwrap_or(false)
        }
        Ok(false) => false,
        Err(error) => {
            tracing::warn!(%error, "stored password hash is unreadable");
            false
        }
    }
}

/// Run a full password check that can never succeed.
///
/// Used on lookups that found no participant.
pub fn verify_without_credential(supplied: &str) -> bool {
    if let Some(dummy) = DUMMY_CREDENTIAL.as_ref() {
        let _matched = verify_password(&dummy.hash, &dummy.salt, supplied);
    }

    false
}

/// Hex SHA-256 of the lowercased email followed by the signing secret.
///
/// Emails are only ever stored in this form.
#[must_use]
pub fn hash_email(email: &str, pepper: &SigningKey) -> String {
    let mut hasher = Sha256::new();

    hasher.update(email.trim().to_lowercase().as_bytes());
    hasher.update(pepper.as_bytes());

    format!("{:x}", hasher.finalize())
}

/// bcrypt input for a salt and password.
///
/// Inputs that would exceed bcrypt's limit are reduced to the hex SHA-256 of
/// `salt + password` so every password byte is significant.
fn hash_input(salt: &str, password: &str) -> Zeroizing<String> {
    let joined = Zeroizing::new(format!("{salt}{password}"));

    if joined.len() <= BCRYPT_MAX_INPUT {
        return joined;
    }

    Zeroizing::new(format!("{:x}", Sha256::digest(joined.as_bytes())))
}
