use learn_core::model::{Lesson, LessonId, ValidatedLesson};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, lesson_id_from_i64, map_lesson_row, write_error};
use crate::repository::{LessonRepository, StorageError};

const LESSON_COLUMNS: &str =
    "id, title, description, content, sort_order, published, created_at, updated_at";

#[async_trait::async_trait]
impl LessonRepository for SqliteRepository {
    async fn insert_lesson(&self, lesson: &ValidatedLesson) -> Result<LessonId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO lessons (title, description, content, sort_order, published, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ",
        )
        .bind(lesson.title.as_str())
        .bind(lesson.description.as_deref())
        .bind(lesson.content.as_str())
        .bind(i64::from(lesson.order))
        .bind(lesson.published)
        .bind(lesson.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        lesson_id_from_i64(res.last_insert_rowid())
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE lessons
            SET title = ?2, description = ?3, content = ?4, sort_order = ?5,
                published = ?6, updated_at = ?7
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("lesson_id", lesson.id().value())?)
        .bind(lesson.title())
        .bind(lesson.description())
        .bind(lesson.content())
        .bind(i64::from(lesson.order()))
        .bind(lesson.is_published())
        .bind(lesson.updated_at())
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = ?1"))
            .bind(id_to_i64("lesson_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_lesson_row).transpose()
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM lessons WHERE id = ?1")
            .bind(id_to_i64("lesson_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_lessons(&self, published_only: bool) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE (?1 = 0 OR published = 1) ORDER BY sort_order ASC, id ASC"
        ))
        .bind(published_only)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_lesson_row).collect()
    }
}
