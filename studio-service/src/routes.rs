//! 工作台服务路由模块

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use common::middleware::request_id_middleware;

use crate::handlers;
use crate::pages;
use crate::state::AppState;
use crate::ApiDoc;

/// JSON operations and registry endpoints.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/studio/is-connected", post(handlers::is_connected))
        .route("/api/studio/tables", post(handlers::list_tables))
        .route("/api/studio/tables/counts", post(handlers::list_tables_with_counts))
        .route("/api/studio/columns", post(handlers::list_columns))
        .route("/api/studio/rows", post(handlers::list_rows))
        .route("/api/studio/grid", post(handlers::grid))
        .route("/api/connections/save", post(handlers::save_connection))
        .route(
            "/api/registry",
            get(handlers::get_registry).put(handlers::upsert_connection),
        )
        .route("/api/registry/active", put(handlers::set_active_connection))
        .route("/api/registry/{name}", delete(handlers::delete_connection))
        .route("/api/health", get(handlers::health_check))
}

/// Rendered page and its form posts.
pub fn page_router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route(pages::STUDIO_PATH, get(pages::studio_page))
        .route("/studio/connections", post(pages::add_connection))
        .route("/studio/connections/{name}/select", post(pages::select_connection))
        .route("/studio/connections/{name}/delete", post(pages::delete_connection))
}

/// Full application with middleware applied.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_router())
        .merge(page_router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
