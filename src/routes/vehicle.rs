use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime};
use serde_json::json;
use validator::Validate;

use crate::{
    auth::AuthUser,
    database::registrations,
    error::{is_duplicate_key, AppError},
    models::{
        parse_id,
        vehicle::{
            RegistrationFields, RegistrationResponse, RegistrationStatus,
            UpdateRegistrationStatus, VehicleRegistration,
        },
    },
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_handler).post(create_handler))
        .route(
            "/{id}",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/{id}/status", patch(update_status_handler))
}

async fn create_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<RegistrationFields>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let now = DateTime::now();
    let mut registration = VehicleRegistration {
        id: None,
        owner_name: payload.owner_name,
        nic: payload.nic,
        vehicle_number: payload.vehicle_number,
        vehicle_type: payload.vehicle_type,
        vehicle_model: payload.vehicle_model,
        color: payload.color,
        status: RegistrationStatus::Pending,
        submitted_by: auth.id,
        created_at: now,
        updated_at: now,
    };

    let result = registrations(&state.db)
        .insert_one(&registration)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Duplicate("vehicle_number")
            } else {
                e.into()
            }
        })?;

    registration.id = result.inserted_id.as_object_id();

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse::from(registration)),
    ))
}

async fn list_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let query = if auth.is_admin() {
        doc! {}
    } else {
        doc! { "submitted_by": auth.id }
    };

    let all: Vec<_> = registrations(&state.db)
        .find(query)
        .await?
        .map_ok(RegistrationResponse::from)
        .try_collect()
        .await?;

    Ok(Json(all))
}

async fn get_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let registration = registrations(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("vehicle registration"))?;

    if !auth.can_access(&registration.submitted_by) {
        return Err(AppError::Forbidden);
    }

    Ok(Json(RegistrationResponse::from(registration)))
}

/// Owners may correct a submission while it is still pending; once reviewed,
/// only an admin can touch it.
async fn update_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<RegistrationFields>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let id = parse_id(&id)?;

    let existing = registrations(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("vehicle registration"))?;

    if !may_edit(&auth, &existing) {
        return Err(AppError::Forbidden);
    }

    let update = doc! { "$set": {
        "owner_name": &payload.owner_name,
        "nic": &payload.nic,
        "vehicle_number": &payload.vehicle_number,
        "vehicle_type": payload.vehicle_type.as_str(),
        "vehicle_model": &payload.vehicle_model,
        "color": &payload.color,
        "updated_at": DateTime::now(),
    }};

    registrations(&state.db)
        .update_one(doc! { "_id": id }, update)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Duplicate("vehicle_number")
            } else {
                e.into()
            }
        })?;

    let registration = registrations(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("vehicle registration"))?;

    Ok(Json(RegistrationResponse::from(registration)))
}

/// Owners may edit only while the record is still pending; admins always may.
fn may_edit(auth: &AuthUser, registration: &VehicleRegistration) -> bool {
    auth.is_admin()
        || (registration.submitted_by == auth.id
            && registration.status == RegistrationStatus::Pending)
}

async fn update_status_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRegistrationStatus>,
) -> Result<impl IntoResponse, AppError> {
    auth.ensure_admin()?;
    let id = parse_id(&id)?;

    let result = registrations(&state.db)
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "status": payload.status.as_str(),
                "updated_at": DateTime::now(),
            }},
        )
        .await?;
    if result.matched_count == 0 {
        return Err(AppError::NotFound("vehicle registration"));
    }

    let registration = registrations(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("vehicle registration"))?;

    Ok(Json(RegistrationResponse::from(registration)))
}

async fn delete_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let registration = registrations(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("vehicle registration"))?;

    if !auth.can_access(&registration.submitted_by) {
        return Err(AppError::Forbidden);
    }

    registrations(&state.db)
        .delete_one(doc! { "_id": id })
        .await?;

    Ok(Json(json!({ "message": "vehicle registration deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    use crate::models::{user::Role, vehicle::VehicleType};

    fn registration(owner: ObjectId, status: RegistrationStatus) -> VehicleRegistration {
        VehicleRegistration {
            id: Some(ObjectId::new()),
            owner_name: "Sunil Fernando".into(),
            nic: "881234567V".into(),
            vehicle_number: "WP-CAB-1234".into(),
            vehicle_type: VehicleType::Van,
            vehicle_model: "Nissan Caravan".into(),
            color: "silver".into(),
            status,
            submitted_by: owner,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }

    #[test]
    fn owner_may_edit_while_pending_only() {
        let owner = ObjectId::new();
        let auth = AuthUser {
            id: owner,
            role: Role::User,
        };

        assert!(may_edit(&auth, &registration(owner, RegistrationStatus::Pending)));
        assert!(!may_edit(&auth, &registration(owner, RegistrationStatus::Approved)));
        assert!(!may_edit(&auth, &registration(owner, RegistrationStatus::Rejected)));
    }

    #[test]
    fn admin_may_edit_any_state() {
        let admin = AuthUser {
            id: ObjectId::new(),
            role: Role::Admin,
        };

        for status in [
            RegistrationStatus::Pending,
            RegistrationStatus::Approved,
            RegistrationStatus::Rejected,
        ] {
            assert!(may_edit(&admin, &registration(ObjectId::new(), status)));
        }
    }

    #[test]
    fn stranger_may_not_edit() {
        let stranger = AuthUser {
            id: ObjectId::new(),
            role: Role::User,
        };

        assert!(!may_edit(
            &stranger,
            &registration(ObjectId::new(), RegistrationStatus::Pending)
        ));
    }
}
