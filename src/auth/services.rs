use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::password::PasswordContext;
use crate::users::{model::User, repo::UserStore};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Turns an (email, password) pair into the matching user.
///
/// Unknown email and wrong password both yield `Ok(None)`, and both pay for one
/// hash verification. `is_active` is not looked at here; callers decide.
pub async fn authenticate(
    users: &dyn UserStore,
    passwords: &PasswordContext,
    email: &str,
    password: &str,
) -> anyhow::Result<Option<User>> {
    let Some(user) = users.find_by_email(email).await? else {
        passwords.verify_dummy(password);
        debug!("authentication failed");
        return Ok(None);
    };
    if !passwords.verify(password, &user.hashed_password) {
        debug!("authentication failed");
        return Ok(None);
    }
    Ok(Some(user))
}
