use axum::{Router, routing::post};

pub mod common;
pub mod inventory;
pub mod marketplace;
pub mod orders;
pub mod products;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/inventory", inventory::router())
        .nest("/orders", orders::router())
        .route("/marketplace/kaspi/sync", post(marketplace::sync))
}
