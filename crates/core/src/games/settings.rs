use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("seconds per question must be > 0")]
    InvalidSecondsPerQuestion,

    #[error("mismatch delay must be > 0")]
    InvalidMismatchDelay,
}

/// Timing rules for a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSettings {
    seconds_per_question: u32,
}

impl QuizSettings {
    pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 30;

    /// # Errors
    ///
    /// Returns `SettingsError::InvalidSecondsPerQuestion` if the countdown is zero.
    pub fn new(seconds_per_question: u32) -> Result<Self, SettingsError> {
        if seconds_per_question == 0 {
            return Err(SettingsError::InvalidSecondsPerQuestion);
        }
        Ok(Self {
            seconds_per_question,
        })
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            seconds_per_question: Self::DEFAULT_SECONDS_PER_QUESTION,
        }
    }
}

/// Timing rules for a memory session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySettings {
    mismatch_delay: Duration,
}

impl MemorySettings {
    pub const DEFAULT_MISMATCH_DELAY: Duration = Duration::from_secs(1);

    /// # Errors
    ///
    /// Returns `SettingsError::InvalidMismatchDelay` for a zero delay.
    pub fn new(mismatch_delay: Duration) -> Result<Self, SettingsError> {
        if mismatch_delay.is_zero() {
            return Err(SettingsError::InvalidMismatchDelay);
        }
        Ok(Self { mismatch_delay })
    }

    /// How long a mismatched pair stays face up before flipping back.
    #[must_use]
    pub fn mismatch_delay(&self) -> Duration {
        self.mismatch_delay
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            mismatch_delay: Self::DEFAULT_MISMATCH_DELAY,
        }
    }
}

/// Coarse rating of a 0-100 game score, shown on the completion screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    WellPlayed,
    KeepPracticing,
}

impl ScoreBand {
    #[must_use]
    pub fn for_score(score: u32) -> Self {
        match score {
            70.. => Self::Excellent,
            50..=69 => Self::WellPlayed,
            _ => Self::KeepPracticing,
        }
    }
}
