use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use mongodb::bson::{doc, DateTime};
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::{
    auth::{hash_password, issue_token, verify_password, AuthUser},
    database::users,
    error::{is_duplicate_key, AppError},
    models::user::{ChangePassword, Login, Role, Signup, User, UserResponse},
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/signup", post(signup_handler))
        .route("/login", post(login_handler))
        .route("/change-password", post(change_password_handler))
}

/// Creates an account. Self-service signups are always plain users; admins
/// are promoted out of band.
async fn signup_handler(
    State(state): State<SharedState>,
    Json(payload): Json<Signup>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let now = DateTime::now();
    let mut user = User {
        id: None,
        name: payload.name,
        email: payload.email.to_lowercase(),
        password_hash: hash_password(&payload.password)?,
        phone: payload.phone,
        role: Role::User,
        created_at: now,
        updated_at: now,
    };

    let result = users(&state.db).insert_one(&user).await.map_err(|e| {
        if is_duplicate_key(&e) {
            AppError::Duplicate("email")
        } else {
            e.into()
        }
    })?;

    user.id = result.inserted_id.as_object_id();
    info!("New signup: {}", user.email);

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Verifies credentials and returns a bearer token plus the user record.
/// Unknown email and wrong password are indistinguishable in the response.
async fn login_handler(
    State(state): State<SharedState>,
    Json(payload): Json<Login>,
) -> Result<impl IntoResponse, AppError> {
    let user = users(&state.db)
        .find_one(doc! { "email": payload.email.to_lowercase() })
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let id = user.id.ok_or(AppError::Internal)?;
    let token = issue_token(&id, user.role, &state.config)?;

    Ok(Json(json!({
        "token": token,
        "user": UserResponse::from(user),
    })))
}

async fn change_password_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<ChangePassword>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = users(&state.db)
        .find_one(doc! { "_id": auth.id })
        .await?
        .ok_or(AppError::NotFound("user"))?;

    verify_current_password(&payload.current_password, &user.password_hash)?;

    users(&state.db)
        .update_one(
            doc! { "_id": auth.id },
            doc! { "$set": {
                "password_hash": hash_password(&payload.new_password)?,
                "updated_at": DateTime::now(),
            }},
        )
        .await?;

    Ok(Json(json!({ "message": "password updated" })))
}

/// Bad credentials are a 401 here just as they are at login.
fn verify_current_password(current: &str, stored_hash: &str) -> Result<(), AppError> {
    if verify_password(current, stored_hash) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;

    #[test]
    fn wrong_current_password_is_unauthorized() {
        let hash = hash_password("original-pass").unwrap();

        assert!(verify_current_password("original-pass", &hash).is_ok());
        assert!(matches!(
            verify_current_password("a-guess", &hash),
            Err(AppError::Unauthorized)
        ));
    }
}
