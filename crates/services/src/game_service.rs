use std::sync::Arc;

use learn_core::games::{MemorySettings, QuizSettings};
use learn_core::model::{Game, GameId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use storage::repository::GameRepository;

use crate::error::GameServiceError;
use crate::play::{MemoryDriver, QuizDriver};

/// Game catalogue and the entry point for starting a play-through.
#[derive(Clone)]
pub struct GameService {
    games: Arc<dyn GameRepository>,
    quiz_settings: QuizSettings,
    memory_settings: MemorySettings,
}

impl GameService {
    #[must_use]
    pub fn new(games: Arc<dyn GameRepository>) -> Self {
        Self {
            games,
            quiz_settings: QuizSettings::default(),
            memory_settings: MemorySettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, quiz: QuizSettings, memory: MemorySettings) -> Self {
        self.quiz_settings = quiz;
        self.memory_settings = memory;
        self
    }

    /// # Errors
    ///
    /// Returns `GameServiceError::Storage` if repository access fails.
    pub async fn list(&self) -> Result<Vec<Game>, GameServiceError> {
        Ok(self.games.list_games().await?)
    }

    /// # Errors
    ///
    /// Returns `GameServiceError::NotFound` if the game does not exist.
    pub async fn get(&self, id: GameId) -> Result<Game, GameServiceError> {
        self.games
            .get_game(id)
            .await?
            .ok_or(GameServiceError::NotFound(id))
    }

    /// Start a timed quiz over a stored multiple-choice game.
    ///
    /// # Errors
    ///
    /// Returns `GameServiceError::NotFound` for an unknown id and
    /// `GameServiceError::Game` if the game is not a quiz.
    pub async fn start_quiz(&self, id: GameId) -> Result<QuizDriver, GameServiceError> {
        let session = self.get(id).await?.quiz_session(self.quiz_settings)?;
        tracing::debug!(game_id = %id, "quiz started");
        Ok(QuizDriver::spawn(session))
    }

    /// Deal a stored memory game with an entropy-seeded shuffle.
    ///
    /// # Errors
    ///
    /// See [`GameService::start_memory_with_rng`].
    pub async fn start_memory(&self, id: GameId) -> Result<MemoryDriver, GameServiceError> {
        let rng = StdRng::from_rng(&mut rand::rng());
        self.start_memory_with_rng(id, rng).await
    }

    /// Deal a stored memory game using `rng` for every shuffle.
    ///
    /// # Errors
    ///
    /// Returns `GameServiceError::NotFound` for an unknown id and
    /// `GameServiceError::Game` if the game is not a memory game.
    pub async fn start_memory_with_rng<R>(
        &self,
        id: GameId,
        mut rng: R,
    ) -> Result<MemoryDriver, GameServiceError>
    where
        R: Rng + Send + 'static,
    {
        let session = self
            .get(id)
            .await?
            .memory_session(self.memory_settings, &mut rng)?;
        tracing::debug!(game_id = %id, "memory game started");
        Ok(MemoryDriver::spawn(session, rng))
    }
}
