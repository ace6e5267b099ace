use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document, DateTime};
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::{
    auth::AuthUser,
    database::emergencies,
    error::AppError,
    models::{
        emergency::{
            CreateEmergency, EmergencyFilter, EmergencyRequest, EmergencyStatus,
            UpdateEmergencyStatus,
        },
        parse_id,
    },
    routes::{parse_field, take_field},
    state::SharedState,
    uploads::{remove_all_quietly, save_file, MAX_PHOTOS},
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_handler).post(create_handler))
        .route("/{id}", get(get_handler).delete(delete_handler))
        .route("/{id}/status", patch(update_status_handler))
}

/// Multipart submission: text fields plus up to [`MAX_PHOTOS`] photos.
/// Photos are written as they stream in; if the request is then rejected,
/// the already-written files are removed best-effort.
async fn create_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut photos: Vec<String> = Vec::new();

    let payload =
        match collect_submission(&state.config.upload_dir, multipart, &mut photos).await {
            Ok(payload) => payload,
            Err(e) => {
                remove_all_quietly(&state.config.upload_dir, &photos).await;
                return Err(e);
            }
        };

    let now = DateTime::now();
    let mut request = EmergencyRequest {
        id: None,
        name: payload.name,
        phone: payload.phone,
        latitude: payload.latitude,
        longitude: payload.longitude,
        vehicle_type: payload.vehicle_type,
        vehicle_model: payload.vehicle_model,
        vehicle_color: payload.vehicle_color,
        vehicle_number: payload.vehicle_number,
        description: payload.description,
        photos,
        status: EmergencyStatus::Pending,
        requested_by: auth.id,
        assigned_to: None,
        created_at: now,
        updated_at: now,
    };

    let result = match emergencies(&state.db).insert_one(&request).await {
        Ok(result) => result,
        Err(e) => {
            remove_all_quietly(&state.config.upload_dir, &request.photos).await;
            return Err(e.into());
        }
    };

    request.id = result.inserted_id.as_object_id();
    info!(
        "Emergency request {} created by {}",
        request.id.map(|id| id.to_hex()).unwrap_or_default(),
        auth.id.to_hex()
    );

    Ok((
        StatusCode::CREATED,
        Json(request.into_response(&state.config.public_url)),
    ))
}

/// Drains the multipart stream, writing photos to disk and collecting text
/// fields, then validates the assembled payload.
async fn collect_submission(
    upload_dir: &str,
    mut multipart: Multipart,
    photos: &mut Vec<String>,
) -> Result<CreateEmergency, AppError> {
    let mut fields: HashMap<String, String> = HashMap::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "photos" {
            if photos.len() == MAX_PHOTOS {
                return Err(AppError::BadRequest(format!(
                    "at most {MAX_PHOTOS} photos allowed"
                )));
            }

            let content_type = field.content_type().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            let stored = save_file(upload_dir, "emergency", &content_type, data).await?;
            photos.push(stored);
        } else {
            fields.insert(name, field.text().await?);
        }
    }

    let payload = CreateEmergency {
        name: take_field(&mut fields, "name")?,
        phone: take_field(&mut fields, "phone")?,
        latitude: parse_field(&mut fields, "latitude")?,
        longitude: parse_field(&mut fields, "longitude")?,
        vehicle_type: take_field(&mut fields, "vehicle_type")?,
        vehicle_model: take_field(&mut fields, "vehicle_model")?,
        vehicle_color: take_field(&mut fields, "vehicle_color")?,
        vehicle_number: take_field(&mut fields, "vehicle_number")?,
        description: take_field(&mut fields, "description")?,
    };
    payload.validate()?;

    Ok(payload)
}

/// Admins see every request, users only their own. `?status=` narrows by
/// workflow state.
async fn list_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Query(filter): Query<EmergencyFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut query = if auth.is_admin() {
        doc! {}
    } else {
        doc! { "requested_by": auth.id }
    };

    if let Some(raw) = filter.status {
        let status: EmergencyStatus = raw
            .parse()
            .map_err(|_| AppError::BadRequest(format!("unknown status: {raw}")))?;
        query.insert("status", status.as_str());
    }

    let requests: Vec<EmergencyRequest> =
        emergencies(&state.db).find(query).await?.try_collect().await?;

    let base = &state.config.public_url;
    let responses: Vec<_> = requests
        .into_iter()
        .map(|request| request.into_response(base))
        .collect();

    Ok(Json(responses))
}

async fn get_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let request = emergencies(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("emergency request"))?;

    if !auth.can_access(&request.requested_by) {
        return Err(AppError::Forbidden);
    }

    Ok(Json(request.into_response(&state.config.public_url)))
}

async fn update_status_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEmergencyStatus>,
) -> Result<impl IntoResponse, AppError> {
    auth.ensure_admin()?;
    let id = parse_id(&id)?;

    let mut update: Document = doc! {
        "status": payload.status.as_str(),
        "updated_at": DateTime::now(),
    };
    if let Some(assignee) = payload.assigned_to.as_deref() {
        update.insert("assigned_to", parse_id(assignee)?);
    }

    let result = emergencies(&state.db)
        .update_one(doc! { "_id": id }, doc! { "$set": update })
        .await?;
    if result.matched_count == 0 {
        return Err(AppError::NotFound("emergency request"));
    }

    let request = emergencies(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("emergency request"))?;

    Ok(Json(request.into_response(&state.config.public_url)))
}

async fn delete_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let request = emergencies(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("emergency request"))?;

    if !auth.can_access(&request.requested_by) {
        return Err(AppError::Forbidden);
    }

    emergencies(&state.db).delete_one(doc! { "_id": id }).await?;
    remove_all_quietly(&state.config.upload_dir, &request.photos).await;

    Ok(Json(json!({ "message": "emergency request deleted" })))
}
