use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod validate;

use services::uploads::{UploadStore, PUBLIC_PREFIX};

#[derive(Clone)]
pub struct AppState {
    pub db: db::Database,
    pub config: config::Config,
    pub uploads: UploadStore,
}

impl AppState {
    pub fn new(db: db::Database, config: config::Config) -> Self {
        let uploads = UploadStore::new(&config.upload_dir);
        Self {
            db,
            config,
            uploads,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Everything under /my requires authentication
    let my_routes = routes::my::router()
        .nest("/schedule", routes::schedules::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Mixed public reads and authenticated writes; handlers that need a
    // caller take `AuthUser`
    let post_routes = routes::posts::router()
        .merge(routes::comments::router())
        .merge(routes::likes::router());

    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", routes::auth::router())
        .nest("/post", post_routes)
        .nest("/my", my_routes)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(state.uploads.base_path()))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Not found" })),
    )
}
