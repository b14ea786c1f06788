use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
};

use shopdesk_products::{AssortmentItem, NewProduct, ProductPatch};

use crate::app::dto;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/receive", post(receive_assortment))
        .route("/:id", get(get_product).put(update_product))
        .route("/:id/movements", get(product_movements))
        .route("/:id/reconcile", get(reconcile_product))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewProduct>,
) -> axum::response::Response {
    let result = services
        .catalog
        .create_product(body, Some(principal.principal()))
        .await
        .map(|created| {
            serde_json::json!({
                "product": created.product,
                "opening_movement": created.opening,
            })
        });
    respond(StatusCode::CREATED, result)
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let result = services
        .catalog
        .list_products()
        .await
        .map(|items| serde_json::json!({ "items": items }));
    respond(StatusCode::OK, result)
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.catalog.product(id).await)
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> axum::response::Response {
    let id = match dto::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.catalog.update_product(id, patch).await)
}

pub async fn product_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::MovementQuery>,
) -> axum::response::Response {
    let id = match dto::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut filter = match query.into_filter() {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    filter.product_id = Some(id);

    // Unknown product is a 404, not an empty history.
    if let Err(e) = services.catalog.product(id).await {
        return crate::app::errors::ledger_error_to_response(e);
    }
    let result = services
        .ledger
        .movements(&filter)
        .await
        .map(|items| serde_json::json!({ "items": items }));
    respond(StatusCode::OK, result)
}

pub async fn reconcile_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.ledger.reconcile(id).await)
}

pub async fn receive_assortment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(items): Json<Vec<AssortmentItem>>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services
            .catalog
            .receive_assortment(items, Some(principal.principal()))
            .await,
    )
}
