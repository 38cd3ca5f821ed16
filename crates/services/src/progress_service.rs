use std::sync::Arc;

use learn_core::model::{LessonId, LessonProgress, UserId};
use storage::repository::{LessonRepository, ProgressRepository, ProgressRow};

use crate::Clock;
use crate::error::ProgressError;

/// Tracks which lessons each learner has completed.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            lessons,
            progress,
        }
    }

    /// Mark a lesson complete or not for a user. Marking again overwrites.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::LessonNotFound` if the lesson does not exist.
    pub async fn mark(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        completed: bool,
    ) -> Result<LessonProgress, ProgressError> {
        if self.lessons.get_lesson(lesson_id).await?.is_none() {
            return Err(ProgressError::LessonNotFound(lesson_id));
        }
        let progress = LessonProgress::mark(user_id, lesson_id, completed, self.clock.now());
        self.progress.upsert_progress(&progress).await?;
        tracing::info!(user_id = %user_id, lesson_id = %lesson_id, completed, "lesson progress saved");
        Ok(progress)
    }

    /// A user's progress rows in lesson order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if repository access fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<ProgressRow>, ProgressError> {
        Ok(self.progress.list_progress(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::model::LessonDraft;
    use learn_core::time::{fixed_clock, fixed_now};
    use storage::repository::Storage;

    #[tokio::test]
    async fn marking_requires_an_existing_lesson() {
        let storage = Storage::in_memory();
        let service = ProgressService::new(fixed_clock(), storage.lessons, storage.progress);
        let err = service
            .mark(UserId::new(1), LessonId::new(5), true)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::LessonNotFound(_)));
    }

    #[tokio::test]
    async fn marking_twice_keeps_one_row() {
        let storage = Storage::in_memory();
        let lesson = storage
            .lessons
            .insert_lesson(
                &LessonDraft {
                    title: "Intro".into(),
                    description: None,
                    content: String::new(),
                    order: 1,
                }
                .validate(fixed_now())
                .unwrap(),
            )
            .await
            .unwrap();
        let service = ProgressService::new(fixed_clock(), storage.lessons, storage.progress);
        let user = UserId::new(9);

        let done = service.mark(user, lesson, true).await.unwrap();
        assert_eq!(done.completed_at(), Some(fixed_now()));
        service.mark(user, lesson, false).await.unwrap();

        let rows = service.list(user).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].progress.is_completed());
        assert_eq!(rows[0].progress.completed_at(), None);
    }
}
