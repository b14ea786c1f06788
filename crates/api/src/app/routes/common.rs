use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use shopdesk_infra::LedgerResult;

use crate::app::errors;

/// Serialize a service result with `status`, or map the error.
pub fn respond<T: Serialize>(status: StatusCode, result: LedgerResult<T>) -> axum::response::Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
