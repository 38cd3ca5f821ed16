use chrono::{DateTime, Utc};
use learn_core::model::{
    Email, Game, GameConfig, GameId, GameKind, GameScore, Lesson, LessonId, LessonProgress,
    MemoryConfig, QuizConfig, ScoreId, User, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Unique violations become `Conflict`, missing parents become `NotFound`.
pub(crate) fn write_error(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn game_id_from_i64(v: i64) -> Result<GameId, StorageError> {
    Ok(GameId::new(i64_to_u64("game_id", v)?))
}

pub(crate) fn score_id_from_i64(v: i64) -> Result<ScoreId, StorageError> {
    Ok(ScoreId::new(i64_to_u64("score_id", v)?))
}

pub(crate) fn parse_game_kind(s: &str) -> Result<GameKind, StorageError> {
    s.parse().map_err(ser)
}

/// The `config` column holds only the kind-specific payload; the kind lives
/// in its own column.
pub(crate) fn config_to_json(config: &GameConfig) -> Result<String, StorageError> {
    match config {
        GameConfig::MultipleChoice(quiz) => serde_json::to_string(quiz).map_err(ser),
        GameConfig::Memory(memory) => serde_json::to_string(memory).map_err(ser),
    }
}

pub(crate) fn config_from_json(kind: GameKind, json: &str) -> Result<GameConfig, StorageError> {
    match kind {
        GameKind::MultipleChoice => serde_json::from_str::<QuizConfig>(json)
            .map(GameConfig::MultipleChoice)
            .map_err(ser),
        GameKind::Memory => serde_json::from_str::<MemoryConfig>(json)
            .map(GameConfig::Memory)
            .map_err(ser),
    }
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let id = user_id_from_i64(row.try_get("id").map_err(ser)?)?;
    let email = Email::parse(row.try_get::<String, _>("email").map_err(ser)?).map_err(ser)?;
    let name: String = row.try_get("name").map_err(ser)?;
    Ok(User::new(id, email, Some(name)))
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;
    Lesson::from_persisted(
        lesson_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get("title").map_err(ser)?,
        row.try_get("description").map_err(ser)?,
        row.try_get("content").map_err(ser)?,
        i64_to_u32("sort_order", row.try_get("sort_order").map_err(ser)?)?,
        row.try_get("published").map_err(ser)?,
        created_at,
        updated_at,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<LessonProgress, StorageError> {
    LessonProgress::from_persisted(
        user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        lesson_id_from_i64(row.try_get("lesson_id").map_err(ser)?)?,
        row.try_get("completed").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_game_row(row: &SqliteRow) -> Result<Game, StorageError> {
    let kind = parse_game_kind(&row.try_get::<String, _>("kind").map_err(ser)?)?;
    let config = config_from_json(kind, &row.try_get::<String, _>("config").map_err(ser)?)?;
    Game::new(
        game_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get("description").map_err(ser)?,
        config,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_score_row(row: &SqliteRow) -> Result<GameScore, StorageError> {
    let time_spent = row
        .try_get::<Option<i64>, _>("time_spent")
        .map_err(ser)?
        .map(|v| i64_to_u32("time_spent", v))
        .transpose()?;
    GameScore::from_persisted(
        score_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        game_id_from_i64(row.try_get("game_id").map_err(ser)?)?,
        row.try_get("score").map_err(ser)?,
        time_spent,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::games::CardDef;

    #[test]
    fn memory_config_json_keeps_content_and_pair_fields() {
        let config = GameConfig::Memory(MemoryConfig {
            cards: CardDef::pairs(["H2O"]),
        });
        let json = config_to_json(&config).unwrap();
        assert!(json.contains("\"content\":\"H2O\""));
        assert!(json.contains("\"pair\""));
        let back = config_from_json(GameKind::Memory, &json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn kind_mismatched_payload_is_a_serialization_error() {
        let err = config_from_json(GameKind::MultipleChoice, r#"{"cards":[]}"#).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
