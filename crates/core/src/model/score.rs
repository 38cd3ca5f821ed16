use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::games::{MemoryOutcome, QuizOutcome};
use crate::model::ids::{GameId, ScoreId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("score {0} is outside 0..=100")]
    OutOfRange(i64),
}

pub const MAX_SCORE: u32 = 100;

/// A score about to be stored. The raw value is clamped into `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub user_id: UserId,
    pub game_id: GameId,
    pub score: u32,
    pub time_spent_secs: Option<u32>,
    pub completed_at: DateTime<Utc>,
}

impl NewScore {
    #[must_use]
    pub fn new(
        user_id: UserId,
        game_id: GameId,
        raw_score: i64,
        time_spent_secs: Option<u32>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let clamped = raw_score.clamp(0, i64::from(MAX_SCORE));
        Self {
            user_id,
            game_id,
            score: u32::try_from(clamped).unwrap_or(0),
            time_spent_secs,
            completed_at,
        }
    }

    #[must_use]
    pub fn from_quiz(
        user_id: UserId,
        game_id: GameId,
        outcome: &QuizOutcome,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self::new(user_id, game_id, i64::from(outcome.score), None, completed_at)
    }

    #[must_use]
    pub fn from_memory(
        user_id: UserId,
        game_id: GameId,
        outcome: &MemoryOutcome,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            user_id,
            game_id,
            i64::from(outcome.score),
            Some(outcome.elapsed_secs),
            completed_at,
        )
    }

    #[must_use]
    pub fn assign_id(self, id: ScoreId) -> GameScore {
        GameScore {
            id,
            user_id: self.user_id,
            game_id: self.game_id,
            score: self.score,
            time_spent_secs: self.time_spent_secs,
            completed_at: self.completed_at,
        }
    }
}

/// A persisted game result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameScore {
    id: ScoreId,
    user_id: UserId,
    game_id: GameId,
    score: u32,
    time_spent_secs: Option<u32>,
    completed_at: DateTime<Utc>,
}

impl GameScore {
    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` for a stored score above 100 or below 0.
    pub fn from_persisted(
        id: ScoreId,
        user_id: UserId,
        game_id: GameId,
        score: i64,
        time_spent_secs: Option<u32>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ScoreError> {
        let score = u32::try_from(score)
            .ok()
            .filter(|s| *s <= MAX_SCORE)
            .ok_or(ScoreError::OutOfRange(score))?;
        Ok(Self {
            id,
            user_id,
            game_id,
            score,
            time_spent_secs,
            completed_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ScoreId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> Option<u32> {
        self.time_spent_secs
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
