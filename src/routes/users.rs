use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::TryStreamExt;
use mongodb::bson::doc;
use serde_json::json;

use crate::{
    auth::AuthUser,
    database::users,
    error::AppError,
    models::{parse_id, user::UserResponse},
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_handler))
        .route("/{id}", get(get_handler).delete(delete_handler))
}

async fn list_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    auth.ensure_admin()?;

    let all: Vec<_> = users(&state.db)
        .find(doc! {})
        .await?
        .map_ok(UserResponse::from)
        .try_collect()
        .await?;

    Ok(Json(all))
}

async fn get_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth.ensure_admin()?;
    let id = parse_id(&id)?;

    let user = users(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("user"))?;

    Ok(Json(UserResponse::from(user)))
}

async fn delete_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth.ensure_admin()?;
    let id = parse_id(&id)?;

    let result = users(&state.db).delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound("user"));
    }

    Ok(Json(json!({ "message": "user deleted" })))
}
