//! Process-wide signing key holder.

use std::{fmt, sync::Arc};

use tokio::sync::watch;
use zeroize::Zeroize;

/// HMAC secret used to sign and verify session tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    bytes: Vec<u8>,
}

impl SigningKey {
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: secret.into(),
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(**redacted**)")?;
        Ok(())
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// Shared, swappable signing key.
///
/// Readers take an [`Arc`] snapshot of the current key and never wait on a
/// rotation. [`SigningKeys::rotate`] publishes a whole new key at once, so a
/// reader sees either the old key or the new one.
#[derive(Debug, Clone)]
pub struct SigningKeys {
    sender: Arc<watch::Sender<Arc<SigningKey>>>,
}

impl SigningKeys {
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        let (sender, _receiver) = watch::channel(Arc::new(key));

        Self {
            sender: Arc::new(sender),
        }
    }

    /// Snapshot of the active key.
    #[must_use]
    pub fn current(&self) -> Arc<SigningKey> {
        Arc::clone(&self.sender.borrow())
    }

    /// Replace the active key. Returns `true` when the key changed.
    pub fn rotate(&self, key: SigningKey) -> bool {
        self.sender.send_if_modified(|current| {
            if **current == key {
                return false;
            }

            *current = Arc::new(key);

            true
        })
    }

    /// Receiver notified on every rotation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<SigningKey>> {
        self.sender.subscribe()
    }
}
