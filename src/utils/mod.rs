use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    auth::{dto::Message, extractors::SuperUser},
    error::AppError,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct TestEmailParams {
    pub email_to: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/utils/test-email/", post(send_test_email))
        .route("/utils/health-check/", get(health_check))
}

#[instrument(skip(state, _admin))]
pub async fn send_test_email(
    State(state): State<AppState>,
    _admin: SuperUser,
    Query(params): Query<TestEmailParams>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let mail = state.templates.test_email(&state.config, &params.email_to)?;
    state.mailer.send(&params.email_to, &mail).await?;
    Ok((StatusCode::CREATED, Json(Message::new("Test email sent"))))
}

pub async fn health_check() -> Json<bool> {
    Json(true)
}
