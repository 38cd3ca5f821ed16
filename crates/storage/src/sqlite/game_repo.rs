use learn_core::model::{Game, GameId};

use super::SqliteRepository;
use super::mapping::{conn, config_to_json, game_id_from_i64, id_to_i64, map_game_row, write_error};
use crate::repository::{GameRepository, NewGameRecord, StorageError};

#[async_trait::async_trait]
impl GameRepository for SqliteRepository {
    async fn insert_new_game(&self, game: NewGameRecord) -> Result<GameId, StorageError> {
        game.config
            .validate()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let config = config_to_json(&game.config)?;

        let res = sqlx::query(
            r"
            INSERT INTO games (title, description, kind, config, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(game.title)
        .bind(game.description)
        .bind(game.config.kind().as_str())
        .bind(config)
        .bind(game.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        game_id_from_i64(res.last_insert_rowid())
    }

    async fn get_game(&self, id: GameId) -> Result<Option<Game>, StorageError> {
        let row = sqlx::query(
            "SELECT id, title, description, kind, config, created_at FROM games WHERE id = ?1",
        )
        .bind(id_to_i64("game_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;
        row.as_ref().map(map_game_row).transpose()
    }

    async fn list_games(&self) -> Result<Vec<Game>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, kind, config, created_at
            FROM games
            ORDER BY created_at ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_game_row).collect()
    }
}
