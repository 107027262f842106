use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    state::AppState,
    users::{
        dto::{LoginRequest, OfflineRequest, RegisterRequest, SessionView, UpdateUserRequest, UserView},
        error::DirectoryResult,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register))
        .route("/users/:id", get(get_user).put(update_user))
        .route("/users/offline/:id", put(set_offline))
}

pub fn login_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> DirectoryResult<Json<Vec<UserView>>> {
    let users = state.directory.list().await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> DirectoryResult<Json<UserView>> {
    let user = state.directory.get_by_id(id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> DirectoryResult<(StatusCode, Json<SessionView>)> {
    let user = state.directory.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> DirectoryResult<Json<SessionView>> {
    let user = state.directory.login(payload).await?;
    Ok(Json(user.into()))
}

/// Answers 204 but still renders the updated user.
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> DirectoryResult<(StatusCode, Json<UserView>)> {
    let user = state.directory.update(id, payload).await?;
    Ok((StatusCode::NO_CONTENT, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn set_offline(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<OfflineRequest>,
) -> DirectoryResult<Json<UserView>> {
    let user = state.directory.set_offline(id, payload).await?;
    Ok(Json(user.into()))
}
