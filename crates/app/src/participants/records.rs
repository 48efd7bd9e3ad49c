//! Participant Records

use sqlx::{FromRow, Row, postgres::PgRow};

use crate::auth::{Capacity, ParticipantId};

/// Identity fields needed to authenticate a participant.
///
/// Salt and hash come from the same row, so a concurrent credential rotation
/// can't pair one login's salt with another's hash.
#[derive(Clone, PartialEq, Eq)]
pub struct ParticipantProfile {
    /// Normalized participant ID.
    pub participant_id: ParticipantId,

    /// Role the participant acts in.
    pub capacity: Capacity,

    /// Study the participant belongs to; `None` for admins.
    pub study: Option<String>,

    /// Salt mixed into the password hash.
    pub password_salt: String,

    /// bcrypt hash of `password_salt + password`.
    pub password_hash: String,

    /// Whether the participant has given consent.
    pub is_consented: bool,
}

impl std::fmt::Debug for ParticipantProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantProfile")
            .field("participant_id", &self.participant_id)
            .field("capacity", &self.capacity)
            .field("study", &self.study)
            .field("is_consented", &self.is_consented)
            .finish_non_exhaustive()
    }
}

impl<'r> FromRow<'r, PgRow> for ParticipantProfile {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let participant_id = ParticipantId::try_from(row.try_get::<i64, _>("participant_id")?)
            .map_err(|error| sqlx::Error::Decode(Box::new(error)))?;

        let capacity = row
            .try_get::<&str, _>("capacity")?
            .parse::<Capacity>()
            .map_err(|error| sqlx::Error::Decode(Box::new(error)))?;

        Ok(Self {
            participant_id,
            capacity,
            study: row.try_get("study")?,
            password_salt: row.try_get("password_salt")?,
            password_hash: row.try_get("password_hash")?,
            is_consented: row.try_get("is_consented")?,
        })
    }
}
