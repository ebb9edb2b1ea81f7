pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::GatewayConfig;
use crate::services::backend::StoreHandle;
use crate::services::staging::StagingManager;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{any, get},
};
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::objects::upload_file,
        api::handlers::objects::delete_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::response::ApiResponse,
            api::handlers::objects::UploadForm,
            api::handlers::objects::DeleteForm,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "objects", description = "Upload and delete objects in the backend store"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub staging: Arc<StagingManager>,
    pub store: Arc<StoreHandle>,
}

impl AppState {
    pub fn new(config: GatewayConfig, store: Arc<StoreHandle>) -> Self {
        let staging = StagingManager::new(config.staging_dir.clone(), config.max_form_size);
        Self {
            config: Arc::new(config),
            staging: Arc::new(staging),
            store,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let web_root = state.config.web_root.clone();
    let max_form_size = state.config.max_form_size;

    Router::new()
        .route_service("/", ServeFile::new(web_root.join("index.html")))
        .nest_service("/assets", ServeDir::new(web_root.join("assets")))
        // Any method is routed so non-POST calls get the JSON rejection.
        .route("/upload", any(api::handlers::upload_file))
        .route("/delete", any(api::handlers::delete_file))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(api::middleware::trace::trace_layer())
        // Outermost, so the trace span already sees the request id.
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(DefaultBodyLimit::max(max_form_size))
        .with_state(state)
}
