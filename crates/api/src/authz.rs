//! Role checks applied by handlers before calling a service.

use axum::http::StatusCode;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Only admins may trigger a marketplace sync.
pub fn require_admin(principal: &PrincipalContext) -> Result<(), axum::response::Response> {
    if principal.role().is_admin() {
        return Ok(());
    }
    Err(json_error(
        StatusCode::FORBIDDEN,
        "forbidden",
        format!("role '{}' may not perform this action", principal.role()),
    ))
}
