use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learn_core::model::{
    Email, Game, GameConfig, GameId, GameKind, GameScore, Lesson, LessonId, LessonProgress,
    NewScore, ScoreId, User, UserId, ValidatedLesson,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Insert shape for a game; the id is assigned by the repository.
#[derive(Debug, Clone)]
pub struct NewGameRecord {
    pub title: String,
    pub description: Option<String>,
    pub config: GameConfig,
    pub created_at: DateTime<Utc>,
}

impl NewGameRecord {
    #[must_use]
    pub fn from_game(game: &Game) -> Self {
        Self {
            title: game.title().to_owned(),
            description: game.description().map(str::to_owned),
            config: game.config().clone(),
            created_at: game.created_at(),
        }
    }
}

/// A user's progress on a lesson joined with the lesson's title and order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRow {
    pub progress: LessonProgress,
    pub lesson_title: String,
    pub lesson_order: u32,
}

/// A score joined with the game it was earned in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub score: GameScore,
    pub game_title: String,
    pub game_kind: GameKind,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user with a unique email.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email is already registered.
    async fn insert_user(&self, email: &Email, name: Option<String>) -> Result<User, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;
}

#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Persist a new lesson and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn insert_lesson(&self, lesson: &ValidatedLesson) -> Result<LessonId, StorageError>;

    /// Overwrite an existing lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no lesson has this id.
    async fn update_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// Delete a lesson together with its progress rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no lesson has this id.
    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError>;

    /// Lessons ordered by their `order`, then id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_lessons(&self, published_only: bool) -> Result<Vec<Lesson>, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Insert or replace the progress row for `(user, lesson)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lesson does not exist.
    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError>;

    /// A user's progress ordered by lesson order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_progress(&self, user_id: UserId) -> Result<Vec<ProgressRow>, StorageError>;
}

#[async_trait]
pub trait GameRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the game cannot be stored.
    async fn insert_new_game(&self, game: NewGameRecord) -> Result<GameId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails or the stored config is unreadable.
    async fn get_game(&self, id: GameId) -> Result<Option<Game>, StorageError>;

    /// Games in creation order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_games(&self) -> Result<Vec<Game>, StorageError>;
}

#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user or game does not exist.
    async fn append_score(&self, score: &NewScore) -> Result<ScoreId, StorageError>;

    /// A user's scores, newest first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_scores(&self, user_id: UserId, limit: u32) -> Result<Vec<ScoreRow>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryTables {
    next_id: u64,
    users: BTreeMap<UserId, User>,
    lessons: BTreeMap<LessonId, Lesson>,
    progress: HashMap<(UserId, LessonId), LessonProgress>,
    games: BTreeMap<GameId, Game>,
    scores: Vec<GameScore>,
}

impl MemoryTables {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<MemoryTables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryTables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, email: &Email, name: Option<String>) -> Result<User, StorageError> {
        let mut guard = self.lock()?;
        if guard.users.values().any(|u| u.email() == email) {
            return Err(StorageError::Conflict);
        }
        let id = UserId::new(guard.allocate());
        let user = User::new(id, email.clone(), name);
        guard.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.users.values().find(|u| u.email() == email).cloned())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.users.get(&id).cloned())
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn insert_lesson(&self, lesson: &ValidatedLesson) -> Result<LessonId, StorageError> {
        let mut guard = self.lock()?;
        let id = LessonId::new(guard.allocate());
        guard.lessons.insert(id, lesson.clone().assign_id(id));
        Ok(id)
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard
            .lessons
            .get_mut(&lesson.id())
            .ok_or(StorageError::NotFound)?;
        *slot = lesson.clone();
        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.lessons.get(&id).cloned())
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.lessons.remove(&id).ok_or(StorageError::NotFound)?;
        guard.progress.retain(|(_, lesson_id), _| *lesson_id != id);
        Ok(())
    }

    async fn list_lessons(&self, published_only: bool) -> Result<Vec<Lesson>, StorageError> {
        let guard = self.lock()?;
        let mut lessons: Vec<Lesson> = guard
            .lessons
            .values()
            .filter(|l| !published_only || l.is_published())
            .cloned()
            .collect();
        lessons.sort_by_key(|l| (l.order(), l.id()));
        Ok(lessons)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.lessons.contains_key(&progress.lesson_id()) {
            return Err(StorageError::NotFound);
        }
        guard
            .progress
            .insert((progress.user_id(), progress.lesson_id()), progress.clone());
        Ok(())
    }

    async fn list_progress(&self, user_id: UserId) -> Result<Vec<ProgressRow>, StorageError> {
        let guard = self.lock()?;
        let mut rows: Vec<ProgressRow> = guard
            .progress
            .values()
            .filter(|p| p.user_id() == user_id)
            .filter_map(|p| {
                guard.lessons.get(&p.lesson_id()).map(|lesson| ProgressRow {
                    progress: p.clone(),
                    lesson_title: lesson.title().to_owned(),
                    lesson_order: lesson.order(),
                })
            })
            .collect();
        rows.sort_by_key(|r| (r.lesson_order, r.progress.lesson_id()));
        Ok(rows)
    }
}

#[async_trait]
impl GameRepository for InMemoryRepository {
    async fn insert_new_game(&self, game: NewGameRecord) -> Result<GameId, StorageError> {
        let mut guard = self.lock()?;
        let id = GameId::new(guard.allocate());
        let game = Game::new(id, game.title, game.description, game.config, game.created_at)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.games.insert(id, game);
        Ok(id)
    }

    async fn get_game(&self, id: GameId) -> Result<Option<Game>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.games.get(&id).cloned())
    }

    async fn list_games(&self) -> Result<Vec<Game>, StorageError> {
        let guard = self.lock()?;
        let mut games: Vec<Game> = guard.games.values().cloned().collect();
        games.sort_by_key(|g| (g.created_at(), g.id()));
        Ok(games)
    }
}

#[async_trait]
impl ScoreRepository for InMemoryRepository {
    async fn append_score(&self, score: &NewScore) -> Result<ScoreId, StorageError> {
        let mut guard = self.lock()?;
        if !guard.games.contains_key(&score.game_id) || !guard.users.contains_key(&score.user_id) {
            return Err(StorageError::NotFound);
        }
        let id = ScoreId::new(guard.allocate());
        guard.scores.push(score.clone().assign_id(id));
        Ok(id)
    }

    async fn list_scores(&self, user_id: UserId, limit: u32) -> Result<Vec<ScoreRow>, StorageError> {
        let guard = self.lock()?;
        let mut rows: Vec<ScoreRow> = guard
            .scores
            .iter()
            .filter(|s| s.user_id() == user_id)
            .filter_map(|s| {
                guard.games.get(&s.game_id()).map(|game| ScoreRow {
                    score: s.clone(),
                    game_title: game.title().to_owned(),
                    game_kind: game.kind(),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.score
                .completed_at()
                .cmp(&a.score.completed_at())
                .then(b.score.id().cmp(&a.score.id()))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub games: Arc<dyn GameRepository>,
    pub scores: Arc<dyn ScoreRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            users: Arc::new(repo.clone()),
            lessons: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            games: Arc::new(repo.clone()),
            scores: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::games::{CardDef, Question};
    use learn_core::model::{LessonDraft, MemoryConfig, QuizConfig};
    use learn_core::time::fixed_now;

    fn lesson(title: &str, order: u32) -> ValidatedLesson {
        LessonDraft {
            title: title.into(),
            description: None,
            content: "<p>x</p>".into(),
            order,
        }
        .validate(fixed_now())
        .unwrap()
    }

    fn quiz_record() -> NewGameRecord {
        let q = Question::new("Q", vec!["a".into(), "b".into()], 0).unwrap();
        NewGameRecord {
            title: "Quiz".into(),
            description: None,
            config: GameConfig::MultipleChoice(QuizConfig { questions: vec![q] }),
            created_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let repo = InMemoryRepository::new();
        let email = Email::parse("ana@example.com").unwrap();
        repo.insert_user(&email, None).await.unwrap();
        let err = repo.insert_user(&email, None).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn lessons_list_in_order_and_filter_unpublished() {
        let repo = InMemoryRepository::new();
        let second = repo.insert_lesson(&lesson("B", 2)).await.unwrap();
        let first = repo.insert_lesson(&lesson("A", 1)).await.unwrap();

        let mut published = repo.get_lesson(first).await.unwrap().unwrap();
        published
            .update(
                LessonDraft {
                    title: "A".into(),
                    description: None,
                    content: String::new(),
                    order: 1,
                },
                true,
                fixed_now(),
            )
            .unwrap();
        repo.update_lesson(&published).await.unwrap();

        let all = repo.list_lessons(false).await.unwrap();
        assert_eq!(all.iter().map(Lesson::id).collect::<Vec<_>>(), vec![first, second]);
        let visible = repo.list_lessons(true).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id(), first);
    }

    #[tokio::test]
    async fn deleting_a_lesson_drops_its_progress() {
        let repo = InMemoryRepository::new();
        let id = repo.insert_lesson(&lesson("A", 1)).await.unwrap();
        let user = UserId::new(77);
        repo.upsert_progress(&LessonProgress::mark(user, id, true, fixed_now()))
            .await
            .unwrap();
        assert_eq!(repo.list_progress(user).await.unwrap().len(), 1);

        repo.delete_lesson(id).await.unwrap();
        assert!(repo.list_progress(user).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_lesson(id).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn scores_require_known_game_and_list_newest_first() {
        let repo = InMemoryRepository::new();
        let user = repo
            .insert_user(&Email::parse("leo@example.com").unwrap(), None)
            .await
            .unwrap();
        let game = repo.insert_new_game(quiz_record()).await.unwrap();

        let missing = NewScore::new(user.id(), GameId::new(999), 50, None, fixed_now());
        assert!(matches!(
            repo.append_score(&missing).await,
            Err(StorageError::NotFound)
        ));

        let older = NewScore::new(user.id(), game, 40, None, fixed_now());
        let newer = NewScore::new(
            user.id(),
            game,
            90,
            None,
            fixed_now() + chrono::Duration::minutes(1),
        );
        repo.append_score(&older).await.unwrap();
        repo.append_score(&newer).await.unwrap();

        let rows = repo.list_scores(user.id(), 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].score.score(), 90);
        assert_eq!(rows[0].game_title, "Quiz");
        assert_eq!(rows[0].game_kind, GameKind::MultipleChoice);
        assert_eq!(repo.list_scores(user.id(), 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn games_round_trip_config() {
        let repo = InMemoryRepository::new();
        let record = NewGameRecord {
            title: "Memory".into(),
            description: Some("pairs".into()),
            config: GameConfig::Memory(MemoryConfig {
                cards: CardDef::pairs(["a", "b"]),
            }),
            created_at: fixed_now(),
        };
        let id = repo.insert_new_game(record).await.unwrap();
        let game = repo.get_game(id).await.unwrap().unwrap();
        assert_eq!(game.kind(), GameKind::Memory);
        assert_eq!(repo.list_games().await.unwrap().len(), 1);
    }
}
