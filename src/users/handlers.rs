use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{UpdatePassword, UserCreate, UserPublic, UserRegister, UserUpdateMe, UsersPublic},
    model::UserUpdate,
    service::{create_user as create_user_record, update_user as update_user_record},
};
use crate::{
    auth::{
        dto::Message,
        extractors::{CurrentUser, SuperUser},
        gate::{can_read, Identity},
    },
    error::AppError,
    pagination::Pagination,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(read_users).post(create_user))
        .route("/users/signup", post(register_user))
        .route("/users/me", get(read_user_me).patch(update_user_me))
        .route("/users/me/password", patch(update_password_me))
        .route("/users/:id", get(read_user_by_id).patch(update_user))
}

#[instrument(skip(state, _admin))]
pub async fn read_users(
    State(state): State<AppState>,
    _admin: SuperUser,
    Query(p): Query<Pagination>,
) -> Result<Json<UsersPublic>, AppError> {
    let p = p.clamped();
    let count = state.users.count().await?;
    let data = state
        .users
        .list(p.skip, p.limit)
        .await?
        .into_iter()
        .map(UserPublic::from)
        .collect();
    Ok(Json(UsersPublic { data, count }))
}

#[instrument(skip(state, _admin, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    _admin: SuperUser,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserPublic>), AppError> {
    let user = create_user_record(&state, payload).await?;
    let mail = state.templates.new_account_email(&state.config, &user.email)?;
    if let Err(e) = state.mailer.send(&user.email, &mail).await {
        warn!(error = %e, user_id = %user.id, "new account email failed");
    }
    Ok((StatusCode::CREATED, Json(UserPublic::from(user))))
}

#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<UserRegister>,
) -> Result<(StatusCode, Json<UserPublic>), AppError> {
    let user = create_user_record(&state, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(UserPublic::from(user))))
}

#[instrument(skip_all)]
pub async fn read_user_me(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(UserPublic::from(user))
}

#[instrument(skip(state, user, payload))]
pub async fn update_user_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UserUpdateMe>,
) -> Result<Json<UserPublic>, AppError> {
    let update = UserUpdate {
        email: payload.email,
        full_name: payload.full_name,
        ..Default::default()
    };
    let user = update_user_record(&state, &user, update).await?;
    Ok(Json(UserPublic::from(user)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_password_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdatePassword>,
) -> Result<Json<Message>, AppError> {
    if !state
        .passwords
        .verify(&payload.current_password, &user.hashed_password)
    {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(AppError::BadRequest("Incorrect password".into()));
    }
    if payload.current_password == payload.new_password {
        return Err(AppError::BadRequest(
            "New password cannot be the same as the current one".into(),
        ));
    }
    let update = UserUpdate {
        password: Some(payload.new_password),
        ..Default::default()
    };
    update_user_record(&state, &user, update).await?;
    Ok(Json(Message::new("Password updated successfully")))
}

#[instrument(skip(state, me))]
pub async fn read_user_by_id(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserPublic>, AppError> {
    if !can_read(Identity::from(&me), id) {
        return Err(AppError::NotAuthorized);
    }
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(Json(UserPublic::from(user)))
}

#[instrument(skip(state, _admin, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    _admin: SuperUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserPublic>, AppError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    let user = update_user_record(&state, &user, payload).await?;
    Ok(Json(UserPublic::from(user)))
}
