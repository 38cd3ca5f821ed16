use std::sync::Arc;

use learn_core::games::{MemoryOutcome, QuizOutcome};
use learn_core::model::{GameId, GameScore, NewScore, UserId};
use storage::repository::{GameRepository, ScoreRepository, ScoreRow};

use crate::Clock;
use crate::error::ScoreServiceError;

/// Records finished games and lists a learner's history.
#[derive(Clone)]
pub struct ScoreService {
    clock: Clock,
    games: Arc<dyn GameRepository>,
    scores: Arc<dyn ScoreRepository>,
}

impl ScoreService {
    #[must_use]
    pub fn new(
        clock: Clock,
        games: Arc<dyn GameRepository>,
        scores: Arc<dyn ScoreRepository>,
    ) -> Self {
        Self {
            clock,
            games,
            scores,
        }
    }

    /// Persist a raw score, clamped to 0-100.
    ///
    /// # Errors
    ///
    /// Returns `ScoreServiceError::GameNotFound` if the game does not exist.
    pub async fn record(
        &self,
        user_id: UserId,
        game_id: GameId,
        raw_score: i64,
        time_spent_secs: Option<u32>,
    ) -> Result<GameScore, ScoreServiceError> {
        let score = NewScore::new(user_id, game_id, raw_score, time_spent_secs, self.clock.now());
        self.persist(score).await
    }

    /// # Errors
    ///
    /// See [`ScoreService::record`].
    pub async fn record_quiz(
        &self,
        user_id: UserId,
        game_id: GameId,
        outcome: &QuizOutcome,
    ) -> Result<GameScore, ScoreServiceError> {
        self.persist(NewScore::from_quiz(user_id, game_id, outcome, self.clock.now()))
            .await
    }

    /// # Errors
    ///
    /// See [`ScoreService::record`].
    pub async fn record_memory(
        &self,
        user_id: UserId,
        game_id: GameId,
        outcome: &MemoryOutcome,
    ) -> Result<GameScore, ScoreServiceError> {
        self.persist(NewScore::from_memory(user_id, game_id, outcome, self.clock.now()))
            .await
    }

    /// A user's scores, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ScoreServiceError::Storage` if repository access fails.
    pub async fn list(&self, user_id: UserId, limit: u32) -> Result<Vec<ScoreRow>, ScoreServiceError> {
        Ok(self.scores.list_scores(user_id, limit).await?)
    }

    async fn persist(&self, score: NewScore) -> Result<GameScore, ScoreServiceError> {
        if self.games.get_game(score.game_id).await?.is_none() {
            return Err(ScoreServiceError::GameNotFound(score.game_id));
        }
        let id = self.scores.append_score(&score).await?;
        tracing::info!(
            user_id = %score.user_id,
            game_id = %score.game_id,
            score = score.score,
            "score recorded"
        );
        Ok(score.assign_id(id))
    }
}
