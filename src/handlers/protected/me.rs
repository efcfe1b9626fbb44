use axum::{extract::State, Extension};
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::Account;
use crate::middleware::{ApiResponse, ApiResult, AuthenticatedActor, VerifiedIdentity};
use crate::types::{ClientId, Identity, Role};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub identity: Identity,
    pub role: Role,
    pub client_id: Option<ClientId>,
    pub is_freelancer: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub identity: Identity,
    /// Stays `null` until an administrator assigns a role
    pub role: Option<Role>,
    pub client_id: Option<ClientId>,
    pub is_freelancer: bool,
    pub is_new_account: bool,
}

/// GET /api/me - the caller's identity, resolved role and profiles
pub async fn get(State(state): State<AppState>, Extension(actor): Extension<AuthenticatedActor>) -> ApiResult<MeResponse> {
    let account = state.accounts.find_account(&actor.identity).await?;
    let (client_id, is_freelancer) = match account {
        Some(account) => (account.client_id, account.is_freelancer),
        None => (None, false),
    };

    Ok(ApiResponse::success(MeResponse {
        identity: actor.identity,
        role: actor.role,
        client_id,
        is_freelancer,
    }))
}

/// POST /api/me/sync - create the caller's account on first sign-in.
///
/// New accounts get no role, so every other route keeps answering NO_ROLE
/// until an administrator assigns one.
pub async fn sync(
    State(state): State<AppState>,
    Extension(VerifiedIdentity(identity)): Extension<VerifiedIdentity>,
) -> ApiResult<SyncResponse> {
    let provisioned = state.accounts.ensure_account(&identity).await?;
    let Account {
        identity,
        role,
        client_id,
        is_freelancer,
    } = provisioned.record;

    let response = SyncResponse {
        identity,
        role,
        client_id,
        is_freelancer,
        is_new_account: provisioned.created,
    };

    if provisioned.created {
        tracing::info!("Created account for {}", response.identity);
        Ok(ApiResponse::created(response))
    } else {
        Ok(ApiResponse::success(response))
    }
}
