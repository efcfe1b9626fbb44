use crate::authz::AuthzError;
use crate::database::models::Mission;
use crate::database::{DatabaseError, MissionStore};
use crate::types::{ClientId, MissionId, Role};

/// Acting identity as far as mission ownership is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionActor {
    pub role: Role,
    pub client_id: Option<ClientId>,
}

/// Mutate/delete rule: administrators always, clients only for missions
/// they own. Read access is a separate concern.
pub fn can_mutate(actor_role: Role, actor_client_id: Option<&ClientId>, mission: &Mission) -> bool {
    match actor_role {
        Role::Admin => true,
        Role::Client => actor_client_id.is_some_and(|id| *id == mission.client_id),
        Role::Support | Role::Freelancer => false,
    }
}

/// Owning client for a new mission. Clients always create for themselves;
/// administrators must say which client they are acting for.
pub fn creation_owner(actor: &MissionActor, requested: Option<ClientId>) -> Result<ClientId, AuthzError> {
    match actor.role {
        Role::Admin => requested
            .ok_or_else(|| AuthzError::Forbidden("clientId is required when creating on behalf of a client".to_string())),
        Role::Client => {
            let own = actor.client_id.clone().ok_or_else(|| {
                AuthzError::Forbidden("account has no client record".to_string())
            })?;
            match requested {
                Some(requested) if requested != own => Err(AuthzError::Forbidden(
                    "cannot create missions for another client".to_string(),
                )),
                _ => Ok(own),
            }
        }
        Role::Support | Role::Freelancer => Err(AuthzError::Forbidden(format!(
            "role {} cannot create missions",
            actor.role
        ))),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error(transparent)]
    Denied(#[from] AuthzError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Loads the mission fresh and checks existence before ownership, so a
/// missing mission is `NotFound` and someone else's mission is `Forbidden`.
pub async fn authorize_mutation(
    store: &dyn MissionStore,
    actor: &MissionActor,
    mission_id: &MissionId,
) -> Result<Mission, GuardError> {
    let mission = store
        .find_mission(mission_id)
        .await?
        .ok_or_else(|| AuthzError::NotFound(format!("mission {}", mission_id)))?;

    if !can_mutate(actor.role, actor.client_id.as_ref(), &mission) {
        tracing::warn!(
            "Ownership check failed: {} (client {:?}) on mission {} owned by {}",
            actor.role,
            actor.client_id,
            mission.id,
            mission.client_id
        );
        return Err(AuthzError::Forbidden(format!(
            "not allowed to modify mission {}",
            mission.id
        ))
        .into());
    }

    Ok(mission)
}
