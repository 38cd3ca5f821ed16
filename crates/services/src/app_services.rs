use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::account_service::AccountService;
use crate::config::AppConfig;
use crate::dashboard_service::DashboardService;
use crate::error::AppServicesError;
use crate::game_service::GameService;
use crate::lesson_service::LessonService;
use crate::progress_service::ProgressService;
use crate::score_service::ScoreService;

/// Assembles app-facing services over one `Storage`.
#[derive(Clone)]
pub struct AppServices {
    lessons: Arc<LessonService>,
    progress: Arc<ProgressService>,
    games: Arc<GameService>,
    scores: Arc<ScoreService>,
    dashboard: Arc<DashboardService>,
    accounts: Arc<AccountService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage at `config.db_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(config: &AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.db_url).await?;
        tracing::info!(db = %config.db_url, "storage ready");
        Ok(Self::with_config(storage, clock, config))
    }

    /// Build services with default game timings.
    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock) -> Self {
        Self::with_config(storage, clock, &AppConfig::default())
    }

    #[must_use]
    pub fn with_config(storage: Storage, clock: Clock, config: &AppConfig) -> Self {
        let lessons = Arc::new(LessonService::new(clock, Arc::clone(&storage.lessons)));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.progress),
        ));
        let games = Arc::new(
            GameService::new(Arc::clone(&storage.games)).with_settings(config.quiz, config.memory),
        );
        let scores = Arc::new(ScoreService::new(
            clock,
            Arc::clone(&storage.games),
            Arc::clone(&storage.scores),
        ));
        let dashboard = Arc::new(DashboardService::new(
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.games),
            Arc::clone(&storage.scores),
        ));
        let accounts = Arc::new(AccountService::new(Arc::clone(&storage.users)));

        Self {
            lessons,
            progress,
            games,
            scores,
            dashboard,
            accounts,
        }
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn games(&self) -> Arc<GameService> {
        Arc::clone(&self.games)
    }

    #[must_use]
    pub fn scores(&self) -> Arc<ScoreService> {
        Arc::clone(&self.scores)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        Arc::clone(&self.accounts)
    }
}
