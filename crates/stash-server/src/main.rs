mod api;

use api::{public::*, resources::*, share::*, users::*};
use axum::{
    Router,
    http::{Method, header},
    routing::{get, post, put},
};
use stash_core::{AppCore, paths};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(serde::Serialize)]
struct Health {
    status: String,
}

async fn health() -> axum::Json<Health> {
    axum::Json(Health {
        status: "stash is working!".to_string(),
    })
}

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stash_server=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting Stash server");

    let db_path =
        paths::ensure_database_path_string().expect("Failed to determine Stash database path");
    let core = Arc::new(
        AppCore::new(&db_path)
            .await
            .expect("Failed to initialize app core"),
    );

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(api::identity::USER_HEADER),
        ]);

    let shared_state = core.clone();

    let app = Router::new()
        .route("/health", get(health))
        // Resource synchronization
        .route("/api/resources", get(list_resources))
        .route("/api/resources/save", post(save_owned))
        .route("/api/resources/{id}/shared", put(save_shared_item))
        // Sharing actions
        .route("/api/share", post(share))
        // Anonymous public access
        .route("/api/public/{token}", get(resolve_public))
        // User directory
        .route("/api/users", post(create_user))
        .route("/api/users/{username}", get(get_user))
        .layer(cors)
        .with_state(shared_state);

    let addr = std::env::var("STASH_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("Stash running on http://{addr}");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
