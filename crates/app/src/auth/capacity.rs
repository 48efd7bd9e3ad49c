//! Participant capacities (roles).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role a participant acts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capacity {
    /// Platform administrator. Not bound to a study.
    Admin,

    /// Study coordinator. May register participants into its study.
    Coordinator,

    /// Study participant.
    Patient,
}

impl Capacity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Coordinator => "coordinator",
            Self::Patient => "patient",
        }
    }

    /// Whether claims for this capacity must carry a study.
    #[must_use]
    pub const fn requires_study(self) -> bool {
        !matches!(self, Self::Admin)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown capacity \"{0}\"")]
pub struct UnknownCapacity(pub String);

impl FromStr for Capacity {
    type Err = UnknownCapacity;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "coordinator" => Ok(Self::Coordinator),
            "patient" => Ok(Self::Patient),
            other => Err(UnknownCapacity(other.to_string())),
        }
    }
}
