use std::sync::Arc;

use learn_core::model::{Email, User};
use storage::repository::{StorageError, UserRepository};

use crate::error::AccountError;

/// Demo credential sign-in: any non-empty email/password pair is accepted and
/// an account is created on first sign-in.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

impl AccountService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Returns `Ok(None)` when either credential is blank.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::User` for a malformed email and
    /// `AccountError::Storage` if repository access fails.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Option<User>, AccountError> {
        if email.trim().is_empty() || password.is_empty() {
            return Ok(None);
        }
        let email = Email::parse(email)?;
        if let Some(user) = self.users.find_user_by_email(&email).await? {
            return Ok(Some(user));
        }

        match self.users.insert_user(&email, None).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id(), "account created on first sign-in");
                Ok(Some(user))
            }
            // Another sign-in created the account first.
            Err(StorageError::Conflict) => Ok(self.users.find_user_by_email(&email).await?),
            Err(e) => Err(e.into()),
        }
    }
}
