//! Participant ID normalization.
//!
//! Participant IDs are stored and signed in a fixed ten digit form: shorter IDs
//! are right-padded with zero digits (`7775` becomes `7775000000`). This is digit
//! padding, not rounding. Every entry point converts raw IDs through
//! [`ParticipantId::normalize`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal digits in a normalized participant ID.
pub const PARTICIPANT_ID_DIGITS: u32 = 10;

const MAX_PARTICIPANT_ID: i64 = 9_999_999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParticipantIdError {
    #[error("participant id must be positive, got {0}")]
    NotPositive(i64),

    #[error("participant id {0} has more than {PARTICIPANT_ID_DIGITS} digits")]
    TooManyDigits(i64),

    #[error("participant id {0} is not in its {PARTICIPANT_ID_DIGITS} digit form")]
    NotNormalized(i64),
}

/// A normalized, ten digit participant ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ParticipantId(i64);

impl ParticipantId {
    /// Pad `raw` with trailing zero digits until it has exactly ten digits.
    ///
    /// # Errors
    ///
    /// Returns an error when `raw` is not positive or already has more than ten
    /// digits.
    pub fn normalize(raw: i64) -> Result<Self, ParticipantIdError> {
        if raw <= 0 {
            return Err(ParticipantIdError::NotPositive(raw));
        }

        if raw > MAX_PARTICIPANT_ID {
            return Err(ParticipantIdError::TooManyDigits(raw));
        }

        let mut padded = raw;

        while digit_count(padded) < PARTICIPANT_ID_DIGITS {
            padded *= 10;
        }

        Ok(Self(padded))
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// Normalize a raw participant ID to its ten digit form.
///
/// # Errors
///
/// See [`ParticipantId::normalize`].
pub fn normalize_id(raw: i64) -> Result<i64, ParticipantIdError> {
    ParticipantId::normalize(raw).map(ParticipantId::get)
}

fn digit_count(value: i64) -> u32 {
    value.checked_ilog10().map_or(1, |log| log + 1)
}

/// Accepts only values that are already normalized. Used when reading IDs back
/// out of claims and rows.
impl TryFrom<i64> for ParticipantId {
    type Error = ParticipantIdError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let normalized = Self::normalize(value)?;

        if normalized.0 != value {
            return Err(ParticipantIdError::NotNormalized(value));
        }

        Ok(normalized)
    }
}

impl From<ParticipantId> for i64 {
    fn from(value: ParticipantId) -> Self {
        value.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
