use std::sync::Arc;

use chrono::{DateTime, Utc};
use learn_core::model::{GameId, LessonId, UserId};
use serde::Serialize;
use storage::repository::{
    GameRepository, LessonRepository, ProgressRepository, ScoreRepository, StorageError,
};

pub const RECENT_SCORES: usize = 10;
pub const RECENT_ACTIVITY: usize = 5;

/// Headline numbers for a learner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_lessons: usize,
    pub completed_lessons: usize,
    pub total_games: usize,
    pub games_played: usize,
    /// Rounded mean of every score, 0 with no games played.
    pub average_score: u32,
    pub best_score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScorePoint {
    pub game_id: GameId,
    pub game_title: String,
    pub score: u32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Lesson,
    Game,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub title: String,
    pub at: DateTime<Utc>,
    /// Only set for games.
    pub score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonProgressPoint {
    pub lesson_id: LessonId,
    pub title: String,
    pub completed: bool,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    /// Newest first.
    pub recent_scores: Vec<ScorePoint>,
    /// Completed lessons and played games, newest first.
    pub recent_activity: Vec<Activity>,
    pub lesson_progress: Vec<LessonProgressPoint>,
}

/// Aggregates lessons, progress and scores into a learner's dashboard.
#[derive(Clone)]
pub struct DashboardService {
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<dyn ProgressRepository>,
    games: Arc<dyn GameRepository>,
    scores: Arc<dyn ScoreRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<dyn ProgressRepository>,
        games: Arc<dyn GameRepository>,
        scores: Arc<dyn ScoreRepository>,
    ) -> Self {
        Self {
            lessons,
            progress,
            games,
            scores,
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if any repository query fails.
    pub async fn dashboard(&self, user_id: UserId) -> Result<Dashboard, StorageError> {
        let lessons = self.lessons.list_lessons(true).await?;
        let progress = self.progress.list_progress(user_id).await?;
        let games = self.games.list_games().await?;
        let scores = self.scores.list_scores(user_id, u32::MAX).await?;

        let values: Vec<u32> = scores.iter().map(|row| row.score.score()).collect();
        let stats = DashboardStats {
            total_lessons: lessons.len(),
            completed_lessons: progress.iter().filter(|p| p.progress.is_completed()).count(),
            total_games: games.len(),
            games_played: scores.len(),
            average_score: rounded_mean(&values),
            best_score: values.iter().copied().max().unwrap_or(0),
        };

        let recent_scores = scores
            .iter()
            .take(RECENT_SCORES)
            .map(|row| ScorePoint {
                game_id: row.score.game_id(),
                game_title: row.game_title.clone(),
                score: row.score.score(),
                completed_at: row.score.completed_at(),
            })
            .collect();

        let mut recent_activity: Vec<Activity> = progress
            .iter()
            .filter_map(|row| {
                row.progress.completed_at().map(|at| Activity {
                    kind: ActivityKind::Lesson,
                    title: row.lesson_title.clone(),
                    at,
                    score: None,
                })
            })
            .chain(scores.iter().map(|row| Activity {
                kind: ActivityKind::Game,
                title: row.game_title.clone(),
                at: row.score.completed_at(),
                score: Some(row.score.score()),
            }))
            .collect();
        recent_activity.sort_by(|a, b| b.at.cmp(&a.at));
        recent_activity.truncate(RECENT_ACTIVITY);

        let lesson_progress = progress
            .iter()
            .map(|row| {
                let completed = row.progress.is_completed();
                LessonProgressPoint {
                    lesson_id: row.progress.lesson_id(),
                    title: row.lesson_title.clone(),
                    completed,
                    percentage: if completed { 100 } else { 0 },
                }
            })
            .collect();

        Ok(Dashboard {
            stats,
            recent_scores,
            recent_activity,
            lesson_progress,
        })
    }
}

/// Mean rounded half-up; 0 for an empty slice.
fn rounded_mean(values: &[u32]) -> u32 {
    if values.is_empty() {
        return 0;
    }
    let sum: u64 = values.iter().map(|v| u64::from(*v)).sum();
    let n = u64::try_from(values.len()).unwrap_or(u64::MAX);
    u32::try_from((2 * sum + n) / (2 * n)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppServices, Clock};
    use chrono::Duration;
    use learn_core::model::GameKind;
    use learn_core::time::fixed_now;
    use storage::repository::Storage;

    #[test]
    fn mean_rounds_half_up() {
        assert_eq!(rounded_mean(&[]), 0);
        assert_eq!(rounded_mean(&[50, 51]), 51);
        assert_eq!(rounded_mean(&[10, 10, 11]), 10);
    }

    #[tokio::test]
    async fn empty_dashboard_is_all_zero() {
        let app = AppServices::from_storage(Storage::in_memory(), Clock::fixed(fixed_now()));
        let board = app.dashboard().dashboard(UserId::new(1)).await.unwrap();
        assert_eq!(board.stats, DashboardStats::default());
        assert!(board.recent_activity.is_empty());
    }

    #[tokio::test]
    async fn activity_mixes_lessons_and_games_newest_first() {
        let storage = Storage::in_memory();
        storage::sample::seed(&storage, fixed_now()).await.unwrap();
        let mut clock = Clock::fixed(fixed_now());
        let app = AppServices::from_storage(storage.clone(), clock);

        let user = app.accounts().sign_in("ines@example.com", "pw").await.unwrap().unwrap();
        let lessons = app.lessons().list_published().await.unwrap();
        let games = app.games().list().await.unwrap();
        let quiz = games.iter().find(|g| g.kind() == GameKind::MultipleChoice).unwrap();
        let memory = games.iter().find(|g| g.kind() == GameKind::Memory).unwrap();

        app.progress().mark(user.id(), lessons[0].id(), true).await.unwrap();
        app.progress().mark(user.id(), lessons[1].id(), false).await.unwrap();

        clock.advance(Duration::minutes(1));
        let app = AppServices::from_storage(storage.clone(), clock);
        app.scores().record(user.id(), quiz.id(), 50, None).await.unwrap();
        clock.advance(Duration::minutes(1));
        let app = AppServices::from_storage(storage, clock);
        app.scores().record(user.id(), memory.id(), 95, Some(25)).await.unwrap();

        let board = app.dashboard().dashboard(user.id()).await.unwrap();
        assert_eq!(
            board.stats,
            DashboardStats {
                total_lessons: 3,
                completed_lessons: 1,
                total_games: 2,
                games_played: 2,
                average_score: 73,
                best_score: 95,
            }
        );
        let kinds: Vec<ActivityKind> = board.recent_activity.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![ActivityKind::Game, ActivityKind::Game, ActivityKind::Lesson]
        );
        assert_eq!(board.recent_activity[0].score, Some(95));
        assert_eq!(board.recent_scores[0].game_title, "Jeu de mémoire");
        assert_eq!(board.lesson_progress.len(), 2);
        assert_eq!(board.lesson_progress[0].percentage, 100);
        assert_eq!(board.lesson_progress[1].percentage, 0);

        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json["recent_activity"][2]["kind"], "lesson");
    }
}
