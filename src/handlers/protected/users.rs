use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthenticatedActor};
use crate::types::{ClientId, Identity, Role};

#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct RoleAssignment {
    pub identity: Identity,
    pub role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub identity: Identity,
    pub client_id: ClientId,
    pub created: bool,
}

/// Account administration stays admin-only even if a policy file opens the path
fn require_admin(actor: &AuthenticatedActor) -> Result<(), ApiError> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("administrator role required"))
    }
}

/// GET /api/users/:identity/role
pub async fn get_role(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(identity): Path<String>,
) -> ApiResult<RoleAssignment> {
    require_admin(&actor)?;

    let identity = Identity::new(identity);
    let role = state
        .accounts
        .find_role(&identity)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no role assigned to {}", identity)))?;

    Ok(ApiResponse::success(RoleAssignment { identity, role }))
}

/// PUT /api/users/:identity/role - write the new role and evict the cached one
pub async fn put_role(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(identity): Path<String>,
    body: Result<Json<RoleChangeRequest>, JsonRejection>,
) -> ApiResult<RoleAssignment> {
    require_admin(&actor)?;

    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let role = request.role.parse::<Role>().map_err(|e| ApiError::bad_request(format!("{}", e)))?;

    let identity = Identity::new(identity);
    if !state.roles.change_role(&identity, role).await? {
        return Err(ApiError::not_found(format!("account {} not found", identity)));
    }

    tracing::info!("{} set role of {} to {}", actor.identity, identity, role);
    Ok(ApiResponse::success(RoleAssignment { identity, role }))
}

/// POST /api/users/:identity/client - give an existing account its client record
pub async fn create_client(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(identity): Path<String>,
) -> ApiResult<ClientRecord> {
    require_admin(&actor)?;

    let identity = Identity::new(identity);
    let provisioned = state
        .accounts
        .ensure_client(&identity)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("account {} not found", identity)))?;

    let record = ClientRecord {
        identity,
        client_id: provisioned.record,
        created: provisioned.created,
    };
    if record.created {
        tracing::info!("{} created client {} for {}", actor.identity, record.client_id, record.identity);
        Ok(ApiResponse::created(record))
    } else {
        Ok(ApiResponse::success(record))
    }
}
