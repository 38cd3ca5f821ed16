use learn_core::model::{LessonProgress, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_progress_row, ser, write_error};
use crate::repository::{ProgressRepository, ProgressRow, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO lesson_progress (user_id, lesson_id, completed, completed_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                completed = excluded.completed,
                completed_at = excluded.completed_at
            ",
        )
        .bind(id_to_i64("user_id", progress.user_id().value())?)
        .bind(id_to_i64("lesson_id", progress.lesson_id().value())?)
        .bind(progress.is_completed())
        .bind(progress.completed_at())
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn list_progress(&self, user_id: UserId) -> Result<Vec<ProgressRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT p.user_id, p.lesson_id, p.completed, p.completed_at,
                   l.title AS lesson_title, l.sort_order AS lesson_order
            FROM lesson_progress p
            JOIN lessons l ON l.id = p.lesson_id
            WHERE p.user_id = ?1
            ORDER BY l.sort_order ASC, l.id ASC
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                let order: i64 = row.try_get("lesson_order").map_err(ser)?;
                Ok(ProgressRow {
                    progress: map_progress_row(row)?,
                    lesson_title: row.try_get("lesson_title").map_err(ser)?,
                    lesson_order: u32::try_from(order).map_err(ser)?,
                })
            })
            .collect()
    }
}
