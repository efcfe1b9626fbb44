use axum::http::HeaderMap;

use crate::types::{Identity, Role};

/// Authenticated actor placed in request extensions by the gate.
/// Only present on requests that passed path authorization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedActor {
    pub identity: Identity,
    pub role: Role,
}

/// Verified identity placed in request extensions on enrollment paths,
/// where no role is required yet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedIdentity(pub Identity);

/// Extract the bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Empty bearer token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}
