use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::games::{
    CardDef, MemoryError, MemorySession, MemorySettings, Question, QuizError, QuizSession,
    QuizSettings, validate_deck,
};
use crate::model::ids::GameId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameError {
    #[error("game title cannot be empty")]
    EmptyTitle,

    #[error("unknown game type: {0}")]
    UnknownKind(String),

    #[error("expected a {expected} game, found {found}")]
    KindMismatch { expected: GameKind, found: GameKind },

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

//
// ─── KIND / CONFIG ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    MultipleChoice,
    Memory,
}

impl GameKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GameKind::MultipleChoice => "multiple-choice",
            GameKind::Memory => "memory",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple-choice" => Ok(GameKind::MultipleChoice),
            "memory" => Ok(GameKind::Memory),
            other => Err(GameError::UnknownKind(other.to_owned())),
        }
    }
}

/// Stored payload of a quiz game: `{"questions": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfig {
    pub questions: Vec<Question>,
}

/// Stored payload of a memory game: `{"cards": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub cards: Vec<CardDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameConfig {
    MultipleChoice(QuizConfig),
    Memory(MemoryConfig),
}

impl GameConfig {
    #[must_use]
    pub fn kind(&self) -> GameKind {
        match self {
            GameConfig::MultipleChoice(_) => GameKind::MultipleChoice,
            GameConfig::Memory(_) => GameKind::Memory,
        }
    }

    /// Check the payload can start a session.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Quiz` for an empty quiz and `GameError::Memory` for
    /// a malformed deck.
    pub fn validate(&self) -> Result<(), GameError> {
        match self {
            GameConfig::MultipleChoice(config) if config.questions.is_empty() => {
                Err(QuizError::NoQuestions.into())
            }
            GameConfig::MultipleChoice(_) => Ok(()),
            GameConfig::Memory(config) => validate_deck(&config.cards).map(|_| ()).map_err(Into::into),
        }
    }
}

//
// ─── GAME ──────────────────────────────────────────────────────────────────────
//

/// A playable mini-game definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    id: GameId,
    title: String,
    description: Option<String>,
    config: GameConfig,
    created_at: DateTime<Utc>,
}

impl Game {
    /// # Errors
    ///
    /// Returns `GameError::EmptyTitle` for a blank title, or the config's
    /// validation error.
    pub fn new(
        id: GameId,
        title: impl Into<String>,
        description: Option<String>,
        config: GameConfig,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GameError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(GameError::EmptyTitle);
        }
        config.validate()?;
        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description,
            config,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> GameId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> GameKind {
        self.config.kind()
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Start a quiz over this game's questions.
    ///
    /// # Errors
    ///
    /// Returns `GameError::KindMismatch` if this is not a quiz.
    pub fn quiz_session(&self, settings: QuizSettings) -> Result<QuizSession, GameError> {
        match &self.config {
            GameConfig::MultipleChoice(config) => {
                Ok(QuizSession::with_settings(config.questions.clone(), settings)?)
            }
            GameConfig::Memory(_) => Err(GameError::KindMismatch {
                expected: GameKind::MultipleChoice,
                found: GameKind::Memory,
            }),
        }
    }

    /// Deal a memory game from this game's cards.
    ///
    /// # Errors
    ///
    /// Returns `GameError::KindMismatch` if this is not a memory game.
    pub fn memory_session<R: Rng + ?Sized>(
        &self,
        settings: MemorySettings,
        rng: &mut R,
    ) -> Result<MemorySession, GameError> {
        match &self.config {
            GameConfig::Memory(config) => Ok(MemorySession::with_settings(
                config.cards.clone(),
                settings,
                rng,
            )?),
            GameConfig::MultipleChoice(_) => Err(GameError::KindMismatch {
                expected: GameKind::Memory,
                found: GameKind::MultipleChoice,
            }),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn quiz_game() -> Game {
        let q = Question::new("Q", vec!["a".into(), "b".into()], 1).unwrap();
        Game::new(
            GameId::new(1),
            "Quiz de programmation",
            None,
            GameConfig::MultipleChoice(QuizConfig { questions: vec![q] }),
            fixed_now(),
        )
        .unwrap()
    }

    fn memory_game() -> Game {
        Game::new(
            GameId::new(2),
            "Jeu de mémoire",
            Some("Mémorisez les concepts".into()),
            GameConfig::Memory(MemoryConfig {
                cards: CardDef::pairs(["Variable", "Fonction"]),
            }),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in [GameKind::MultipleChoice, GameKind::Memory] {
            assert_eq!(kind.as_str().parse::<GameKind>().unwrap(), kind);
        }
        assert!(matches!(
            "puzzle".parse::<GameKind>(),
            Err(GameError::UnknownKind(_))
        ));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let empty_quiz = GameConfig::MultipleChoice(QuizConfig { questions: vec![] });
        assert_eq!(
            Game::new(GameId::new(1), "Quiz", None, empty_quiz, fixed_now()).unwrap_err(),
            GameError::Quiz(QuizError::NoQuestions)
        );
        let odd = GameConfig::Memory(MemoryConfig {
            cards: vec![CardDef::new("a", 1)],
        });
        assert!(matches!(
            Game::new(GameId::new(1), "Memory", None, odd, fixed_now()),
            Err(GameError::Memory(_))
        ));
        let ok = GameConfig::Memory(MemoryConfig {
            cards: CardDef::pairs(["a"]),
        });
        assert_eq!(
            Game::new(GameId::new(1), "  ", None, ok, fixed_now()).unwrap_err(),
            GameError::EmptyTitle
        );
    }

    #[test]
    fn sessions_require_matching_kind() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(quiz_game().quiz_session(QuizSettings::default()).is_ok());
        assert!(matches!(
            quiz_game().memory_session(MemorySettings::default(), &mut rng),
            Err(GameError::KindMismatch { .. })
        ));
        let memory = memory_game().memory_session(MemorySettings::default(), &mut rng).unwrap();
        assert_eq!(memory.total_pairs(), 2);
        assert!(memory_game().quiz_session(QuizSettings::default()).is_err());
    }
}
