use axum::{
    extract::{Path, State},
    response::Html,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, Message, NewPassword, TokenResponse},
        extractors::{CurrentUser, SuperUser},
        reset::{generate_reset_token, verify_reset_token},
        services::{authenticate, normalize_email},
    },
    error::AppError,
    state::AppState,
    users::{dto::UserPublic, model::UserUpdate},
};

pub(crate) const MIN_PASSWORD_LEN: usize = 8;

pub fn login_routes() -> Router<AppState> {
    Router::new()
        .route("/login/access-token", post(login_access_token))
        .route("/login/test-token", post(test_token))
        .route("/password-recovery/:email", post(recover_password))
        .route("/reset-password/", post(reset_password))
        .route(
            "/password-recovery-html-content/:email",
            post(recover_password_html_content),
        )
}

#[instrument(skip(state, payload))]
pub async fn login_access_token(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = normalize_email(&payload.email);
    let user = authenticate(&*state.users, &state.passwords, &email, &payload.password)
        .await?
        .ok_or_else(|| {
            warn!("login rejected");
            AppError::InvalidCredentials
        })?;
    if !user.is_active {
        warn!(user_id = %user.id, "login by inactive user");
        return Err(AppError::InactiveUser);
    }
    let access_token = state.keys.sign_access(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse::bearer(access_token)))
}

#[instrument(skip_all)]
pub async fn test_token(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(UserPublic::from(user))
}

#[instrument(skip(state))]
pub async fn recover_password(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Message>, AppError> {
    let email = normalize_email(&email);
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    let token = generate_reset_token(&state.keys, &user.email)?;
    let mail = state
        .templates
        .reset_password_email(&state.config, &user.email, &token)?;
    state.mailer.send(&user.email, &mail).await?;
    info!(user_id = %user.id, "password recovery email sent");
    Ok(Json(Message::new("Password recovery email sent")))
}

#[instrument(skip(state, body))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<NewPassword>,
) -> Result<Json<Message>, AppError> {
    let email = verify_reset_token(&state.keys, &body.token).ok_or_else(|| {
        warn!("invalid reset token");
        AppError::InvalidToken
    })?;
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    if !user.is_active {
        return Err(AppError::InactiveUser);
    }
    if body.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest("Password too short".into()));
    }
    let hash = state.passwords.hash(&body.new_password)?;
    state
        .users
        .update(&user.merged(&UserUpdate::default(), Some(hash)))
        .await?;
    info!(user_id = %user.id, "password reset");
    Ok(Json(Message::new("Password updated successfully")))
}

#[instrument(skip(state, _admin))]
pub async fn recover_password_html_content(
    State(state): State<AppState>,
    _admin: SuperUser,
    Path(email): Path<String>,
) -> Result<Html<String>, AppError> {
    let email = normalize_email(&email);
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    let token = generate_reset_token(&state.keys, &user.email)?;
    let mail = state
        .templates
        .reset_password_email(&state.config, &user.email, &token)?;
    Ok(Html(mail.html_content))
}
