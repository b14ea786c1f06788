use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shopdesk_infra::LedgerError;

/// Map a service error onto the HTTP error envelope.
pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    let status = match &err {
        LedgerError::ProductNotFound(_) | LedgerError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LedgerError::InsufficientStock { .. } | LedgerError::Conflict(_) => StatusCode::CONFLICT,
        LedgerError::TransientLockTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, code = err.code(), "request failed");
    }

    let mut body = json!({
        "error": err.code(),
        "message": err.to_string(),
    });
    if let LedgerError::InsufficientStock {
        product_id,
        line,
        requested,
        available,
    } = &err
    {
        body["product_id"] = json!(product_id);
        body["line"] = json!(line);
        body["requested"] = json!(requested);
        body["available"] = json!(available);
    }

    (status, axum::Json(body)).into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn invalid_id(what: &str) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id"))
}
