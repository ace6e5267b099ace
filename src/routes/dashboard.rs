use std::collections::HashMap;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use futures::TryStreamExt;
use mongodb::{bson::doc, Collection};
use serde_json::json;

use crate::{
    auth::AuthUser,
    database::{emergencies, inventory, registrations, users},
    error::AppError,
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new().route("/summary", get(summary_handler))
}

/// Aggregated counts backing the admin dashboard: request and registration
/// totals by status, inventory size and stock, and the user count.
async fn summary_handler(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    auth.ensure_admin()?;

    let emergency_counts = status_counts(&emergencies(&state.db)).await?;
    let registration_counts = status_counts(&registrations(&state.db)).await?;
    let (items, stock) = inventory_totals(&state).await?;
    let user_count = users(&state.db).count_documents(doc! {}).await?;

    Ok(Json(json!({
        "emergency": emergency_counts,
        "registrations": registration_counts,
        "inventory": { "items": items, "stock": stock },
        "users": user_count,
    })))
}

async fn status_counts<T: Send + Sync>(
    collection: &Collection<T>,
) -> Result<HashMap<String, i64>, AppError> {
    let pipeline = vec![doc! {
        "$group": { "_id": "$status", "count": { "$sum": 1 } }
    }];

    let mut counts = HashMap::new();
    let mut cursor = collection.aggregate(pipeline).await?;
    while let Some(group) = cursor.try_next().await? {
        let status = group.get_str("_id").unwrap_or_default().to_string();
        let count = group
            .get_i32("count")
            .map(i64::from)
            .or_else(|_| group.get_i64("count"))
            .unwrap_or(0);
        counts.insert(status, count);
    }

    Ok(counts)
}

async fn inventory_totals(state: &SharedState) -> Result<(i64, i64), AppError> {
    let pipeline = vec![doc! {
        "$group": {
            "_id": null,
            "items": { "$sum": 1 },
            "stock": { "$sum": "$quantity" },
        }
    }];

    let mut cursor = inventory(&state.db).aggregate(pipeline).await?;
    let Some(totals) = cursor.try_next().await? else {
        return Ok((0, 0));
    };

    let items = totals
        .get_i32("items")
        .map(i64::from)
        .or_else(|_| totals.get_i64("items"))
        .unwrap_or(0);
    let stock = totals
        .get_i32("stock")
        .map(i64::from)
        .or_else(|_| totals.get_i64("stock"))
        .unwrap_or(0);

    Ok((items, stock))
}
