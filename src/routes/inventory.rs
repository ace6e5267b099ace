use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime};
use serde_json::json;
use validator::Validate;

use crate::{
    auth::AuthUser,
    database::inventory,
    error::{is_duplicate_key, AppError, FieldError},
    models::{
        inventory::{Category, InventoryFields, InventoryFilter, InventoryItem},
        parse_id,
    },
    routes::{parse_field, take_field},
    state::SharedState,
    uploads::{remove_quietly, save_file},
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_handler).post(create_handler))
        .route(
            "/{id}",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
}

/// Catalog reads are public; the storefront lists parts without a session.
async fn list_handler(
    State(state): State<SharedState>,
    Query(filter): Query<InventoryFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut query = doc! {};
    if let Some(raw) = filter.category {
        let category: Category = raw
            .parse()
            .map_err(|_| AppError::BadRequest(format!("unknown category: {raw}")))?;
        query.insert("category", category.as_str());
    }

    let items: Vec<InventoryItem> = inventory(&state.db).find(query).await?.try_collect().await?;

    let base = &state.config.public_url;
    let responses: Vec<_> = items
        .into_iter()
        .map(|item| item.into_response(base))
        .collect();

    Ok(Json(responses))
}

async fn get_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let item = inventory(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("inventory item"))?;

    Ok(Json(item.into_response(&state.config.public_url)))
}

async fn create_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth.ensure_admin()?;

    let (payload, image) = match collect_submission(&state, multipart).await {
        Ok(parts) => parts,
        Err((e, image)) => {
            if let Some(stored) = image {
                remove_quietly(&state.config.upload_dir, &stored).await;
            }
            return Err(e);
        }
    };

    let now = DateTime::now();
    let mut item = InventoryItem {
        id: None,
        product_id: payload.product_id,
        name: payload.name,
        price: payload.price,
        quantity: payload.quantity,
        description: payload.description,
        category: payload.category,
        image,
        created_at: now,
        updated_at: now,
    };

    let result = match inventory(&state.db).insert_one(&item).await {
        Ok(result) => result,
        Err(e) => {
            if let Some(stored) = &item.image {
                remove_quietly(&state.config.upload_dir, stored).await;
            }
            return Err(if is_duplicate_key(&e) {
                AppError::Duplicate("product_id")
            } else {
                e.into()
            });
        }
    };

    item.id = result.inserted_id.as_object_id();

    Ok((
        StatusCode::CREATED,
        Json(item.into_response(&state.config.public_url)),
    ))
}

/// PUT replaces every field; an attached image replaces the stored one, which
/// is then removed best-effort.
async fn update_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth.ensure_admin()?;
    let id = parse_id(&id)?;

    let existing = inventory(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("inventory item"))?;

    let (payload, new_image) = match collect_submission(&state, multipart).await {
        Ok(parts) => parts,
        Err((e, image)) => {
            if let Some(stored) = image {
                remove_quietly(&state.config.upload_dir, &stored).await;
            }
            return Err(e);
        }
    };

    let image = new_image.clone().or(existing.image.clone());
    let update = doc! { "$set": {
        "product_id": &payload.product_id,
        "name": &payload.name,
        "price": payload.price,
        "quantity": payload.quantity,
        "description": &payload.description,
        "category": payload.category.as_str(),
        "image": image.as_deref(),
        "updated_at": DateTime::now(),
    }};

    if let Err(e) = inventory(&state.db)
        .update_one(doc! { "_id": id }, update)
        .await
    {
        if let Some(stored) = &new_image {
            remove_quietly(&state.config.upload_dir, stored).await;
        }
        return Err(if is_duplicate_key(&e) {
            AppError::Duplicate("product_id")
        } else {
            e.into()
        });
    }

    // The replaced image only goes away once the new document state is stored.
    if new_image.is_some() {
        if let Some(old) = &existing.image {
            remove_quietly(&state.config.upload_dir, old).await;
        }
    }

    let item = inventory(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("inventory item"))?;

    Ok(Json(item.into_response(&state.config.public_url)))
}

async fn delete_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth.ensure_admin()?;
    let id = parse_id(&id)?;

    let item = inventory(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("inventory item"))?;

    inventory(&state.db).delete_one(doc! { "_id": id }).await?;

    if let Some(image) = &item.image {
        remove_quietly(&state.config.upload_dir, image).await;
    }

    Ok(Json(json!({ "message": "inventory item deleted" })))
}

/// Drains the multipart stream into validated fields plus an optional stored
/// image. On failure the already-stored image path rides along for cleanup.
async fn collect_submission(
    state: &SharedState,
    mut multipart: Multipart,
) -> Result<(InventoryFields, Option<String>), (AppError, Option<String>)> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut image: Option<String> = None;

    let drain = async {
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "image" {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                let stored =
                    save_file(&state.config.upload_dir, "inventory", &content_type, data).await?;
                if let Some(previous) = image.replace(stored) {
                    remove_quietly(&state.config.upload_dir, &previous).await;
                }
            } else {
                fields.insert(name, field.text().await?);
            }
        }
        Ok::<(), AppError>(())
    }
    .await;

    if let Err(e) = drain {
        return Err((e, image));
    }

    match parse_fields(&mut fields) {
        Ok(payload) => Ok((payload, image)),
        Err(e) => Err((e, image)),
    }
}

fn parse_fields(fields: &mut HashMap<String, String>) -> Result<InventoryFields, AppError> {
    let category_raw = take_field(fields, "category")?;
    let category: Category = category_raw.parse().map_err(|_| {
        AppError::Validation(vec![FieldError {
            field: "category".to_string(),
            message: format!("unknown category: {category_raw}"),
        }])
    })?;

    let payload = InventoryFields {
        product_id: take_field(fields, "product_id")?,
        name: take_field(fields, "name")?,
        price: parse_field(fields, "price")?,
        quantity: parse_field(fields, "quantity")?,
        description: fields.remove("description").unwrap_or_default(),
        category,
    };
    payload.validate()?;

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_fields() -> HashMap<String, String> {
        HashMap::from([
            ("product_id".to_string(), "BRK-PAD-022".to_string()),
            ("name".to_string(), "Front brake pad set".to_string()),
            ("price".to_string(), "5400.0".to_string()),
            ("quantity".to_string(), "12".to_string()),
            ("description".to_string(), "Ceramic pads".to_string()),
            ("category".to_string(), "brakes".to_string()),
        ])
    }

    #[test]
    fn parse_fields_builds_payload() {
        let payload = parse_fields(&mut base_fields()).unwrap();
        assert_eq!(payload.product_id, "BRK-PAD-022");
        assert_eq!(payload.category, Category::Brakes);
        assert_eq!(payload.quantity, 12);
    }

    #[test]
    fn parse_fields_rejects_unknown_category() {
        let mut fields = base_fields();
        fields.insert("category".to_string(), "exhaust".to_string());

        let err = parse_fields(&mut fields).unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation variant");
        };
        assert_eq!(errors[0].field, "category");
    }

    #[test]
    fn parse_fields_allows_missing_description() {
        let mut fields = base_fields();
        fields.remove("description");

        let payload = parse_fields(&mut fields).unwrap();
        assert!(payload.description.is_empty());
    }
}
