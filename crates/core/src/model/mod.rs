mod game;
mod ids;
mod lesson;
mod score;
mod user;

pub use ids::{GameId, LessonId, ParseIdError, ScoreId, UserId};

pub use game::{Game, GameConfig, GameError, GameKind, MemoryConfig, QuizConfig};
pub use lesson::{Lesson, LessonDraft, LessonError, LessonProgress, ValidatedLesson};
pub use score::{GameScore, MAX_SCORE, NewScore, ScoreError};
pub use user::{Email, User, UserError};
