use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::database::MissionStore;
use crate::types::MissionId;

/// Cascade steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    Payments,
    Contract,
    Mission,
}

impl CascadeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CascadeStep::Payments => "payments",
            CascadeStep::Contract => "contract",
            CascadeStep::Mission => "mission",
        }
    }
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeOutcome {
    Deleted,
    /// A step failed; nothing after it ran
    PartialFailure { step: CascadeStep, cause: String },
    NotFound,
}

/// Deletes a mission's payments, then its contract, then the mission row.
///
/// A failing step stops the cascade, so the mission is never removed while
/// dependents may still reference it. Dependents already deleted stay
/// deleted; running the cascade again picks up where it stopped.
#[derive(Clone)]
pub struct CascadeDeleter {
    store: Arc<dyn MissionStore>,
}

impl CascadeDeleter {
    pub fn new(store: Arc<dyn MissionStore>) -> Self {
        Self { store }
    }

    pub async fn delete_mission_cascade(&self, mission_id: &MissionId) -> CascadeOutcome {
        let dependents = match self.store.mission_dependents(mission_id).await {
            Ok(Some(dependents)) => dependents,
            Ok(None) => return CascadeOutcome::NotFound,
            // Nothing has been touched yet; report it against the first step
            Err(e) => return failure(mission_id, CascadeStep::Payments, e),
        };

        if dependents.payment_count > 0 {
            tracing::info!("Deleting {} payments of mission {}", dependents.payment_count, mission_id);
            if let Err(e) = self.store.delete_payments(mission_id).await {
                return failure(mission_id, CascadeStep::Payments, e);
            }
        }

        if dependents.has_contract {
            tracing::info!("Deleting contract of mission {}", mission_id);
            if let Err(e) = self.store.delete_contract(mission_id).await {
                return failure(mission_id, CascadeStep::Contract, e);
            }
        }

        match self.store.delete_mission(mission_id).await {
            Ok(0) => {
                tracing::info!("Mission {} was already deleted", mission_id);
                CascadeOutcome::Deleted
            }
            Ok(_) => {
                tracing::info!("Deleted mission {}", mission_id);
                CascadeOutcome::Deleted
            }
            Err(e) => failure(mission_id, CascadeStep::Mission, e),
        }
    }
}

fn failure(mission_id: &MissionId, step: CascadeStep, cause: impl fmt::Display) -> CascadeOutcome {
    tracing::error!("Cascade delete of mission {} failed at {} step: {}", mission_id, step, cause);
    CascadeOutcome::PartialFailure {
        step,
        cause: cause.to_string(),
    }
}
