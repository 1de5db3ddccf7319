use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{ItemPublic, ItemsPublic},
    model::{Item, ItemCreate, ItemUpdate},
};
use crate::{
    auth::{
        dto::Message,
        extractors::CurrentUser,
        gate::{can_delete, can_read, can_write, Identity, OwnerScope},
    },
    error::AppError,
    pagination::Pagination,
    state::AppState,
};

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(read_items).post(create_item))
        .route(
            "/items/:id",
            get(read_item).put(update_item).delete(delete_item),
        )
}

/// Loads an item and checks it against `allowed`. Missing beats forbidden.
async fn load_authorized(
    state: &AppState,
    identity: Identity,
    id: Uuid,
    allowed: fn(Identity, Uuid) -> bool,
) -> Result<Item, AppError> {
    let item = state
        .items
        .get(id)
        .await?
        .ok_or(AppError::NotFound("Item"))?;
    if !allowed(identity, item.owner_id) {
        warn!(user_id = %identity.id, item_id = %id, "item access denied");
        return Err(AppError::NotAuthorized);
    }
    Ok(item)
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn read_items(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<ItemsPublic>, AppError> {
    let p = p.clamped();
    let scope = OwnerScope::for_identity(Identity::from(&user));
    let count = state.items.count(scope).await?;
    let data = state
        .items
        .list(scope, p.skip, p.limit)
        .await?
        .into_iter()
        .map(ItemPublic::from)
        .collect();
    Ok(Json(ItemsPublic { data, count }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn read_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemPublic>, AppError> {
    let item = load_authorized(&state, Identity::from(&user), id, can_read).await?;
    Ok(Json(ItemPublic::from(item)))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ItemCreate>,
) -> Result<(StatusCode, Json<ItemPublic>), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".into()));
    }
    let item = state.items.insert(user.id, payload).await?;
    info!(item_id = %item.id, "item created");
    Ok((StatusCode::CREATED, Json(ItemPublic::from(item))))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ItemUpdate>,
) -> Result<Json<ItemPublic>, AppError> {
    let item = load_authorized(&state, Identity::from(&user), id, can_write).await?;
    if matches!(payload.title.as_deref(), Some(t) if t.trim().is_empty()) {
        return Err(AppError::BadRequest("title is required".into()));
    }
    let item = state.items.update(&item.merged(&payload)).await?;
    Ok(Json(ItemPublic::from(item)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, AppError> {
    let item = load_authorized(&state, Identity::from(&user), id, can_delete).await?;
    state.items.delete(item.id).await?;
    info!(item_id = %item.id, "item deleted");
    Ok(Json(Message::new("Item deleted successfully")))
}
