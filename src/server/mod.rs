//! JSON API server

use anyhow::Result;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::content::Post;
use crate::error::BlogError;
use crate::query::{ListParams, ListResult};
use crate::Blog;

/// Server state
type AppState = Arc<Blog>;

/// Error body, `{"detail": "..."}`
#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for BlogError {
    fn into_response(self) -> Response {
        let status = match &self {
            BlogError::NotFound(_) => StatusCode::NOT_FOUND,
            BlogError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BlogError::RepositoryUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the API router
pub fn router(blog: Blog) -> Router {
    let cors = cors_layer(&blog.config.server.cors_origins);
    let state: AppState = Arc::new(blog);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/blog/posts", get(list_posts_handler))
        .route("/api/blog/posts/:slug", get(get_post_handler))
        .route("/api/blog/tags", get(tags_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured origins, with credentials
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Start the API server
pub async fn start(blog: Blog, ip: &str, port: u16) -> Result<()> {
    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    tracing::info!(
        "Serving posts from {:?} at http://{}:{}",
        blog.content_dir,
        ip,
        port
    );
    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let app = router(blog);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn root_handler(State(blog): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "message": blog.config.title,
        "version": blog.config.version,
        "docs": "/api/blog/posts",
    }))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

async fn list_posts_handler(
    State(blog): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResult>, BlogError> {
    let Query(params) = params.map_err(|e| BlogError::InvalidInput(e.body_text()))?;
    Ok(Json(blog.list_posts(params).await?))
}

async fn get_post_handler(
    State(blog): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, BlogError> {
    Ok(Json(blog.render_post(&slug).await?))
}

async fn tags_handler(State(blog): State<AppState>) -> Result<impl IntoResponse, BlogError> {
    let tags = blog.list_tags().await?;
    Ok(Json(json!({ "tags": tags })))
}
