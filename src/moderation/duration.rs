//! Mute duration value object.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Longest accepted mute, one year expressed in minutes.
pub const MAX_MUTE_MINUTES: i64 = 525_600;

/// Time unit accepted by the mute command grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl MuteUnit {
    /// Single-letter suffix used in command text (`5m`, `2h`, `1d`, `1w`).
    #[must_use]
    pub const fn suffix(self) -> char {
        match self {
            Self::Minutes => 'm',
            Self::Hours => 'h',
            Self::Days => 'd',
            Self::Weeks => 'w',
        }
    }

    const fn minutes(self) -> i64 {
        match self {
            Self::Minutes => 1,
            Self::Hours => 60,
            Self::Days => 60 * 24,
            Self::Weeks => 60 * 24 * 7,
        }
    }
}

/// Invalid mute durations, rejected at construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("mute duration must be positive")]
    NonPositive,
    #[error("mute duration cannot exceed one year")]
    TooLong,
}

/// A validated mute length.
///
/// Carries only the amount and unit; the absolute expiry is derived from a
/// supplied instant at the moment the restriction is applied, so a batched
/// fan-out that takes seconds does not drift against the parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuteDuration {
    amount: u32,
    unit: MuteUnit,
}

impl MuteDuration {
    /// Validate and build a duration.
    ///
    /// # Errors
    ///
    /// Rejects zero amounts and durations longer than one year.
    pub const fn new(amount: u32, unit: MuteUnit) -> Result<Self, DurationError> {
        if amount == 0 {
            return Err(DurationError::NonPositive);
        }
        if (amount as i64) * unit.minutes() > MAX_MUTE_MINUTES {
            return Err(DurationError::TooLong);
        }
        Ok(Self { amount, unit })
    }

    #[must_use]
    pub const fn amount(&self) -> u32 {
        self.amount
    }

    #[must_use]
    pub const fn unit(&self) -> MuteUnit {
        self.unit
    }

    /// Absolute unmute instant for a restriction applied at `now`.
    #[must_use]
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::minutes(i64::from(self.amount) * self.unit.minutes())
    }
}

impl std::fmt::Display for MuteDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}
