//! # MongoDB
//!
//! Document store holding every resource collection.
//!
//! ## Collections
//!
//! - `users`: identity records, unique on **email**
//! - `emergency_requests`: roadside incidents, owned by a user
//! - `inventory_items`: spare-parts catalog, unique on **product_id**
//! - `vehicle_registrations`: owner/vehicle pairings, unique on **vehicle_number**
//!
//! Uniqueness is enforced by indexes created at startup, not by read-then-write
//! checks, so concurrent duplicate submissions surface as driver errors that the
//! routes map to 409.

use mongodb::{
    bson::doc, options::IndexOptions, Client, Collection, Database, IndexModel,
};
use tracing::info;

use crate::models::{
    emergency::EmergencyRequest, inventory::InventoryItem, user::User,
    vehicle::VehicleRegistration,
};

pub const USERS: &str = "users";
pub const EMERGENCY_REQUESTS: &str = "emergency_requests";
pub const INVENTORY_ITEMS: &str = "inventory_items";
pub const VEHICLE_REGISTRATIONS: &str = "vehicle_registrations";

pub async fn init_mongo(mongo_url: &str, db_name: &str) -> Database {
    let client = Client::with_uri_str(mongo_url).await.unwrap();
    let db = client.database(db_name);

    create_unique_indexes(&db).await;

    info!("Connected to MongoDB database {db_name}");
    db
}

async fn create_unique_indexes(db: &Database) {
    unique_index(&users(db), "email").await;
    unique_index(&inventory(db), "product_id").await;
    unique_index(&registrations(db), "vehicle_number").await;
}

async fn unique_index<T: Send + Sync>(collection: &Collection<T>, field: &str) {
    let index = IndexModel::builder()
        .keys(doc! { field: 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();

    collection.create_index(index).await.unwrap();
}

pub fn users(db: &Database) -> Collection<User> {
    db.collection(USERS)
}

pub fn emergencies(db: &Database) -> Collection<EmergencyRequest> {
    db.collection(EMERGENCY_REQUESTS)
}

pub fn inventory(db: &Database) -> Collection<InventoryItem> {
    db.collection(INVENTORY_ITEMS)
}

pub fn registrations(db: &Database) -> Collection<VehicleRegistration> {
    db.collection(VEHICLE_REGISTRATIONS)
}
