//! Documentation of the Roadside vehicle-service backend.
//!
//!
//!
//! # General Infrastructure
//! - REST API consumed by the vehicle-service SPA
//! - One MongoDB database, one collection per resource
//! - Bearer JWT auth; admin/user roles checked per route
//! - Photo and image uploads stored on local disk, served back under `/uploads`
//! - Containers talk to MongoDB by internal name; only the API port is public
//!
//!
//!
//! # Resources
//!
//! | Prefix | Resource |
//! |---|---|
//! | `/api/auth` | signup, login, password change |
//! | `/api/users` | account administration (admin) |
//! | `/api/emergency` | roadside assistance requests |
//! | `/api/inventory` | spare-parts catalog |
//! | `/api/vehicle-registration` | owner/vehicle records |
//! | `/api/dashboard` | aggregated counts (admin) |
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run against a local MongoDB.
//! ```sh
//! JWT_SECRET=dev-secret cargo run
//! ```
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, StatusCode,
    },
    response::IntoResponse,
    routing::get,
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod uploads;

use state::State;

// Multipart bodies carry up to five photos; the limit leaves headroom over
// the per-file cap.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await;

    std::fs::create_dir_all(&state.config.upload_dir).expect("Uploads directory misconfigured!");

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/health", get(health_handler))
        .nest("/api/auth", routes::auth::router())
        .nest("/api/users", routes::users::router())
        .nest("/api/emergency", routes::emergency::router())
        .nest("/api/inventory", routes::inventory::router())
        .nest("/api/vehicle-registration", routes::vehicle::router())
        .nest("/api/dashboard", routes::dashboard::router())
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
