use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
};

use shopdesk_core::OrderId;
use shopdesk_infra::CreateOrder;

use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", post(transition_status))
}

fn parse_order_id(raw: &str) -> Result<OrderId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("order"))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CreateOrder>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services
            .orders
            .create_order(body, Some(principal.principal()))
            .await,
    )
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::OrdersQuery>,
) -> axum::response::Response {
    let status = match query.status.as_deref().map(dto::parse_status).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .orders
        .list_orders(status)
        .await
        .map(|items| serde_json::json!({ "items": items }));
    respond(StatusCode::OK, result)
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.orders.order(id).await)
}

pub async fn transition_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::TransitionStatusRequest>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let next = match dto::parse_status(&body.status) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.orders.transition_status(id, next).await)
}
