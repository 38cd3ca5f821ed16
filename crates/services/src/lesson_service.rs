use std::sync::Arc;

use learn_core::model::{Lesson, LessonDraft, LessonId};
use storage::repository::LessonRepository;

use crate::Clock;
use crate::error::LessonServiceError;
use crate::lesson_content::render_lesson_content;

/// Lesson catalogue: reading for learners, editing for authors.
#[derive(Clone)]
pub struct LessonService {
    clock: Clock,
    lessons: Arc<dyn LessonRepository>,
}

impl LessonService {
    #[must_use]
    pub fn new(clock: Clock, lessons: Arc<dyn LessonRepository>) -> Self {
        Self { clock, lessons }
    }

    /// Published lessons in display order.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn list_published(&self) -> Result<Vec<Lesson>, LessonServiceError> {
        Ok(self.lessons.list_lessons(true).await?)
    }

    /// Every lesson, drafts included, in display order.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn list_all(&self) -> Result<Vec<Lesson>, LessonServiceError> {
        Ok(self.lessons.list_lessons(false).await?)
    }

    /// # Errors
    ///
    /// Returns `LessonServiceError::NotFound` if the lesson does not exist.
    pub async fn get(&self, id: LessonId) -> Result<Lesson, LessonServiceError> {
        self.lessons
            .get_lesson(id)
            .await?
            .ok_or(LessonServiceError::NotFound(id))
    }

    /// Create an unpublished lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Lesson` for validation failures.
    /// Returns `LessonServiceError::Storage` if persistence fails.
    pub async fn create(&self, draft: LessonDraft) -> Result<LessonId, LessonServiceError> {
        let validated = draft.validate(self.clock.now())?;
        let id = self.lessons.insert_lesson(&validated).await?;
        tracing::info!(lesson_id = %id, "lesson created");
        Ok(id)
    }

    /// Replace a lesson's fields and publication flag.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::NotFound` if the lesson does not exist.
    /// Returns `LessonServiceError::Lesson` for validation failures.
    pub async fn update(
        &self,
        id: LessonId,
        draft: LessonDraft,
        published: bool,
    ) -> Result<Lesson, LessonServiceError> {
        let mut lesson = self.get(id).await?;
        lesson.update(draft, published, self.clock.now())?;
        self.lessons.update_lesson(&lesson).await?;
        tracing::info!(lesson_id = %id, published, "lesson updated");
        Ok(lesson)
    }

    /// Delete a lesson and every progress row pointing at it.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::NotFound` if the lesson does not exist.
    pub async fn delete(&self, id: LessonId) -> Result<(), LessonServiceError> {
        match self.lessons.delete_lesson(id).await {
            Ok(()) => {
                tracing::info!(lesson_id = %id, "lesson deleted");
                Ok(())
            }
            Err(storage::repository::StorageError::NotFound) => {
                Err(LessonServiceError::NotFound(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The lesson's content as sanitized HTML.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::NotFound` if the lesson does not exist.
    pub async fn rendered_content(&self, id: LessonId) -> Result<String, LessonServiceError> {
        let lesson = self.get(id).await?;
        Ok(render_lesson_content(lesson.content()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::time::fixed_clock;
    use storage::repository::Storage;

    fn service() -> LessonService {
        LessonService::new(fixed_clock(), Storage::in_memory().lessons)
    }

    fn draft(title: &str, order: u32) -> LessonDraft {
        LessonDraft {
            title: title.into(),
            description: None,
            content: "<h2>Titre</h2><script>x()</script>".into(),
            order,
        }
    }

    #[tokio::test]
    async fn new_lessons_stay_hidden_until_published() {
        let lessons = service();
        let id = lessons.create(draft("Les fonctions", 3)).await.unwrap();
        assert!(lessons.list_published().await.unwrap().is_empty());
        assert_eq!(lessons.list_all().await.unwrap().len(), 1);

        let updated = lessons.update(id, draft("Les fonctions", 3), true).await.unwrap();
        assert!(updated.is_published());
        assert_eq!(lessons.list_published().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_lessons_are_reported() {
        let lessons = service();
        let missing = LessonId::new(42);
        assert!(matches!(
            lessons.get(missing).await,
            Err(LessonServiceError::NotFound(id)) if id == missing
        ));
        assert!(matches!(
            lessons.delete(missing).await,
            Err(LessonServiceError::NotFound(_))
        ));
        assert!(matches!(
            lessons.update(missing, draft("x", 1), true).await,
            Err(LessonServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn blank_titles_are_rejected() {
        let lessons = service();
        assert!(matches!(
            lessons.create(draft("  ", 1)).await,
            Err(LessonServiceError::Lesson(_))
        ));
    }

    #[tokio::test]
    async fn rendered_content_is_sanitized() {
        let lessons = service();
        let id = lessons.create(draft("Intro", 1)).await.unwrap();
        let html = lessons.rendered_content(id).await.unwrap();
        assert_eq!(html, "<h2>Titre</h2>");
    }
}
