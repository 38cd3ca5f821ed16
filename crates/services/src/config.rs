//! Runtime configuration read from the environment (and `.env`).

use std::time::Duration;

use learn_core::games::{MemorySettings, QuizSettings};

use crate::error::ConfigError;

pub const DB_URL_VAR: &str = "LEARN_DB_URL";
pub const QUIZ_SECONDS_VAR: &str = "LEARN_QUIZ_SECONDS";
pub const MEMORY_MISMATCH_MS_VAR: &str = "LEARN_MEMORY_MISMATCH_MS";

pub const DEFAULT_DB_URL: &str = "sqlite:dev.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_url: String,
    pub quiz: QuizSettings,
    pub memory: MemorySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.to_owned(),
            quiz: QuizSettings::default(),
            memory: MemorySettings::default(),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a numeric variable is malformed or zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Missing keys keep defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a numeric variable is malformed or zero.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(DB_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config.db_url = url;
        }
        if let Some(raw) = lookup(QUIZ_SECONDS_VAR) {
            let seconds = parse_number(QUIZ_SECONDS_VAR, &raw)?;
            let seconds = u32::try_from(seconds).map_err(|_| ConfigError::InvalidNumber {
                var: QUIZ_SECONDS_VAR,
                raw: raw.clone(),
            })?;
            config.quiz = QuizSettings::new(seconds)?;
        }
        if let Some(raw) = lookup(MEMORY_MISMATCH_MS_VAR) {
            let millis = parse_number(MEMORY_MISMATCH_MS_VAR, &raw)?;
            config.memory = MemorySettings::new(Duration::from_millis(millis))?;
        }

        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }
}

fn parse_number(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            raw: raw.to_owned(),
        })
}
