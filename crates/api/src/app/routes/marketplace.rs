use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

/// Partner catalog feed; public so the marketplace can poll it.
pub async fn feed(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.feed.render().await {
        Ok(xml) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
            xml,
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn sync(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::SyncQuery>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_admin(&principal) {
        return resp;
    }
    tracing::info!(principal_id = %principal.principal_id(), days = ?query.days, "marketplace sync requested");
    respond(StatusCode::OK, services.sync_marketplace(query.days).await)
}
