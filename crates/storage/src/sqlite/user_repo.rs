use learn_core::model::{Email, User, UserId};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_user_row, user_id_from_i64, write_error};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, email: &Email, name: Option<String>) -> Result<User, StorageError> {
        // Resolve the display name before the row exists so both sides agree.
        let provisional = User::new(UserId::new(0), email.clone(), name);

        let res = sqlx::query("INSERT INTO users (email, name) VALUES (?1, ?2)")
            .bind(email.as_str())
            .bind(provisional.name())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        let id = user_id_from_i64(res.last_insert_rowid())?;
        tracing::debug!(user_id = %id, "user created");
        Ok(User::new(
            id,
            email.clone(),
            Some(provisional.name().to_owned()),
        ))
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StorageError> {
        let row = sqlx::query("SELECT id, email, name FROM users WHERE email = ?1")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_user_row).transpose()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query("SELECT id, email, name FROM users WHERE id = ?1")
            .bind(id_to_i64("user_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_user_row).transpose()
    }
}
