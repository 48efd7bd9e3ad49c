//! Study allow-lists.

use jiff::SignedDuration;

const HOURS_PER_YEAR: i64 = 24 * 365;

/// Default session lifetime: one year.
pub const DEFAULT_TOKEN_LIFETIME: SignedDuration = SignedDuration::from_hours(HOURS_PER_YEAR);

/// Session lifetime for long-running studies: three years.
pub const LONG_TOKEN_LIFETIME: SignedDuration = SignedDuration::from_hours(3 * HOURS_PER_YEAR);

/// Studies whose participants keep a session for [`LONG_TOKEN_LIFETIME`].
pub const LONG_EXPIRY_STUDIES: &[&str] = &["cfd-sleep-study", "cfd-sleep_study", "cfd-sleep-study-test"];

/// Studies an administrator may register coordinators into.
pub const KNOWN_STUDIES: &[&str] = &[
    "hf",
    "chf",
    "depression monitoring",
    "moyo",
    "test",
    "super",
    "pCRF",
    "sleepBank",
    "utsw",
    "sleep technology",
    "ptsd-vns",
    "ptsd_twin",
    "ptsd_grc",
    "otsuka",
    "Anytime Fitness Study",
    "PRO-C study",
    "vismet",
    "cfd-sleep-study",
    "cfd-sleep-study-test",
    "cfd-sleep_study",
    "cfd-classroom-audio",
];

#[must_use]
pub fn is_known_study(study: &str) -> bool {
    KNOWN_STUDIES.contains(&study)
}

/// Session lifetime for a token bound to `study`.
#[must_use]
pub fn token_lifetime(study: Option<&str>) -> SignedDuration {
    match study {
        Some(study) if LONG_EXPIRY_STUDIES.contains(&study) => LONG_TOKEN_LIFETIME,
        _ => DEFAULT_TOKEN_LIFETIME,
    }
}
