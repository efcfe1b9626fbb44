use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::auth::{extract_bearer_token, AuthenticatedActor, VerifiedIdentity};
use crate::app::AppState;
use crate::authz::{normalize_path, AuthzError};
use crate::error::ApiError;

/// Route gate applied to every request.
///
/// Public paths pass straight through. Enrollment paths need a verified
/// identity token only. Everything else needs a verified identity token, a
/// resolved role, and a policy pattern matching the normalized path.
/// Anything short of that is denied.
pub async fn authorize_request(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = normalize_path(request.uri().path());

    if state.engine.is_public(&path) {
        return next.run(request).await;
    }

    let identity = match extract_bearer_token(request.headers()) {
        Ok(token) => match state.verifier.verify(token) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(path = %path, "rejecting identity token: {}", e);
                return ApiError::from(AuthzError::Unauthenticated).into_response();
            }
        },
        Err(msg) => {
            tracing::debug!(path = %path, "no identity token: {}", msg);
            return ApiError::from(AuthzError::Unauthenticated).into_response();
        }
    };

    if state.engine.is_enrollment(&path) {
        tracing::debug!(identity = %identity, path = %path, "enrollment request");
        request.extensions_mut().insert(VerifiedIdentity(identity));
        return next.run(request).await;
    }

    let role = state.roles.resolve(&identity).await;
    if let Some(err) = state.engine.authorize(role, &path).into_error(role, &path) {
        tracing::info!(identity = %identity, path = %path, "request denied");
        return ApiError::from(err).into_response();
    }

    // into_error returned None, so a role is present
    let Some(role) = role else {
        return ApiError::from(AuthzError::NoRole).into_response();
    };

    request
        .extensions_mut()
        .insert(AuthenticatedActor { identity, role });
    next.run(request).await
}
