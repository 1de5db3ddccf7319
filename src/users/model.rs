use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(skip_serializing)]
    pub hashed_password: String, // Argon2 PHC string, never exposed
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: OffsetDateTime,
}

/// Fields for a user that does not exist yet; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: Option<String>,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

/// Partial update. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl User {
    /// Returns a new record with the provided fields applied.
    ///
    /// `hashed_password` is the hash of `update.password` when one was given; the
    /// plaintext itself is never copied into the record.
    pub fn merged(&self, update: &UserUpdate, hashed_password: Option<String>) -> User {
        User {
            id: self.id,
            email: update.email.clone().unwrap_or_else(|| self.email.clone()),
            full_name: update.full_name.clone().or_else(|| self.full_name.clone()),
            hashed_password: hashed_password.unwrap_or_else(|| self.hashed_password.clone()),
            is_active: update.is_active.unwrap_or(self.is_active),
            is_superuser: update.is_superuser.unwrap_or(self.is_superuser),
            created_at: self.created_at,
        }
    }
}
