use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::{error::AppError, state::AppState, users::model::User};

/// The active user named by a valid bearer access token.
pub struct CurrentUser(pub User);

/// A `CurrentUser` that is also a superuser.
pub struct SuperUser(pub User);

pub(crate) fn bearer_token(parts: &Parts) -> Option<&str> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
}

pub(crate) async fn resolve_user(state: &AppState, token: &str) -> Result<User, AppError> {
    let user_id = state.keys.verify_access(token).map_err(|reason| {
        warn!(reason = ?reason, "invalid access token");
        AppError::InvalidToken
    })?;
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    if !user.is_active {
        return Err(AppError::InactiveUser);
    }
    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::InvalidToken)?;
        Ok(CurrentUser(resolve_user(state, token).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SuperUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_superuser {
            warn!(user_id = %user.id, "superuser required");
            return Err(AppError::NotAuthorized);
        }
        Ok(SuperUser(user))
    }
}
