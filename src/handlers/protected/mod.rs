// handlers/protected/mod.rs - handlers behind the route gate
//
// Every handler here can rely on an AuthenticatedActor extension.
pub mod me;
pub mod missions;
pub mod users;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AuthenticatedActor;
use crate::services::MissionActor;

/// Ownership context for the actor, with a fresh client-record read
pub(crate) async fn mission_actor(state: &AppState, actor: &AuthenticatedActor) -> Result<MissionActor, ApiError> {
    let client_id = state.accounts.find_client_id(&actor.identity).await?;
    Ok(MissionActor {
        role: actor.role,
        client_id,
    })
}
