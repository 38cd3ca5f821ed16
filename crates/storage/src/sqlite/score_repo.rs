use learn_core::model::{NewScore, ScoreId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    conn, id_to_i64, map_score_row, parse_game_kind, score_id_from_i64, ser, write_error,
};
use crate::repository::{ScoreRepository, ScoreRow, StorageError};

#[async_trait::async_trait]
impl ScoreRepository for SqliteRepository {
    async fn append_score(&self, score: &NewScore) -> Result<ScoreId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO game_scores (user_id, game_id, score, time_spent, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_to_i64("user_id", score.user_id.value())?)
        .bind(id_to_i64("game_id", score.game_id.value())?)
        .bind(i64::from(score.score))
        .bind(score.time_spent_secs.map(i64::from))
        .bind(score.completed_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        score_id_from_i64(res.last_insert_rowid())
    }

    async fn list_scores(&self, user_id: UserId, limit: u32) -> Result<Vec<ScoreRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT s.id, s.user_id, s.game_id, s.score, s.time_spent, s.completed_at,
                   g.title AS game_title, g.kind AS game_kind
            FROM game_scores s
            JOIN games g ON g.id = s.game_id
            WHERE s.user_id = ?1
            ORDER BY s.completed_at DESC, s.id DESC
            LIMIT ?2
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                Ok(ScoreRow {
                    score: map_score_row(row)?,
                    game_title: row.try_get("game_title").map_err(ser)?,
                    game_kind: parse_game_kind(&row.try_get::<String, _>("game_kind").map_err(ser)?)?,
                })
            })
            .collect()
    }
}
