//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and service construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and query parameters
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use shopdesk_infra::config::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(cfg).await?;
    Ok(router(Arc::new(services)))
}

/// Router over already-built services.
pub fn router(services: Arc<AppServices>) -> Router {
    // Protected routes: require a principal from the auth gateway.
    let protected = routes::router().layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/marketplace/kaspi/feed.xml", get(routes::marketplace::feed))
        .merge(protected)
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
