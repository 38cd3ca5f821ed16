use thiserror::Error;

use crate::games::{MemoryError, QuizError, SettingsError};
use crate::model::{GameError, LessonError, ScoreError, UserError};

/// Umbrella error for callers that do not care which domain rule failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    User(#[from] UserError),
}
