use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    routing::post,
};

use crate::app::dto;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/movements", post(adjust_stock).get(list_movements))
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&body.product_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let direction = match dto::parse_direction(&body.direction) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    respond(
        StatusCode::CREATED,
        services
            .ledger
            .adjust(product_id, direction, body.quantity, Some(principal.principal()))
            .await,
    )
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::MovementQuery>,
) -> axum::response::Response {
    let filter = match query.into_filter() {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let result = services
        .ledger
        .movements(&filter)
        .await
        .map(|items| serde_json::json!({ "items": items }));
    respond(StatusCode::OK, result)
}
