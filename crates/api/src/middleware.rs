use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use shopdesk_auth::{PrincipalId, Role};

use crate::context::PrincipalContext;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";

/// Reads the principal asserted by the upstream auth gateway.
pub async fn auth_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let principal = extract_principal(req.headers())?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

fn extract_principal(headers: &HeaderMap) -> Result<PrincipalContext, StatusCode> {
    let id: PrincipalId = header_str(headers, PRINCIPAL_ID_HEADER)?
        .parse()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let role = header_str(headers, PRINCIPAL_ROLE_HEADER)?;
    Ok(PrincipalContext::new(id, Role::new(role.to_string())))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, StatusCode> {
    let value = headers
        .get(name)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .trim();
    if value.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn principal_requires_both_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_principal(&headers), Err(StatusCode::UNAUTHORIZED));

        let id = PrincipalId::new();
        headers.insert(PRINCIPAL_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(extract_principal(&headers), Err(StatusCode::UNAUTHORIZED));

        headers.insert(PRINCIPAL_ROLE_HEADER, HeaderValue::from_static("admin"));
        let ctx = extract_principal(&headers).unwrap();
        assert_eq!(ctx.principal_id(), id);
        assert!(ctx.role().is_admin());
    }

    #[test]
    fn malformed_id_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(PRINCIPAL_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        headers.insert(PRINCIPAL_ROLE_HEADER, HeaderValue::from_static("staff"));
        assert_eq!(extract_principal(&headers), Err(StatusCode::UNAUTHORIZED));
    }
}
