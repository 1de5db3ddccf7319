use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::User;

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl From<User> for UserPublic {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            is_active: u.is_active,
            is_superuser: u.is_superuser,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersPublic {
    pub data: Vec<UserPublic>,
    pub count: i64,
}

/// Superuser-driven account creation.
#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    #[serde(default = "yes")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

fn yes() -> bool {
    true
}

/// Open self-registration; never grants superuser.
#[derive(Debug, Deserialize)]
pub struct UserRegister {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl From<UserRegister> for UserCreate {
    fn from(r: UserRegister) -> Self {
        Self {
            email: r.email,
            password: r.password,
            full_name: r.full_name,
            is_active: true,
            is_superuser: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserUpdateMe {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePassword {
    pub current_password: String,
    pub new_password: String,
}
