use async_trait::async_trait;

use super::manager::DatabaseError;
use super::models::{Account, Mission, MissionChanges, MissionDependents, MissionDetail, NewMission, Provisioned};
use crate::types::{ClientId, Identity, MissionId, Role};

/// Identity -> role/client lookups and account provisioning
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn find_role(&self, identity: &Identity) -> Result<Option<Role>, DatabaseError>;

    async fn find_client_id(&self, identity: &Identity) -> Result<Option<ClientId>, DatabaseError>;

    async fn find_account(&self, identity: &Identity) -> Result<Option<Account>, DatabaseError>;

    /// Overwrite the role of an existing account. Returns false when the identity is unknown.
    async fn set_role(&self, identity: &Identity, role: Role) -> Result<bool, DatabaseError>;

    /// Create the account without a role when it does not exist yet.
    /// An existing account is returned untouched.
    async fn ensure_account(&self, identity: &Identity) -> Result<Provisioned<Account>, DatabaseError>;

    /// Create the account with `role`, or overwrite the role of an existing one
    async fn upsert_role(&self, identity: &Identity, role: Role) -> Result<(), DatabaseError>;

    /// Create the client record of an existing account, or return the one it
    /// already owns. `None` when the identity is unknown.
    async fn ensure_client(&self, identity: &Identity) -> Result<Option<Provisioned<ClientId>>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// Mission, contract and payment persistence.
///
/// Delete methods return the number of affected rows; deleting rows that
/// are already gone is not an error.
#[async_trait]
pub trait MissionStore: Send + Sync {
    async fn list_missions(&self) -> Result<Vec<Mission>, DatabaseError>;

    async fn find_mission(&self, id: &MissionId) -> Result<Option<Mission>, DatabaseError>;

    async fn mission_detail(&self, id: &MissionId) -> Result<Option<MissionDetail>, DatabaseError>;

    async fn create_mission(&self, mission: NewMission) -> Result<Mission, DatabaseError>;

    async fn update_mission(
        &self,
        id: &MissionId,
        changes: MissionChanges,
    ) -> Result<Option<Mission>, DatabaseError>;

    /// `None` when the mission does not exist
    async fn mission_dependents(&self, id: &MissionId) -> Result<Option<MissionDependents>, DatabaseError>;

    async fn delete_payments(&self, id: &MissionId) -> Result<u64, DatabaseError>;

    async fn delete_contract(&self, id: &MissionId) -> Result<u64, DatabaseError>;

    async fn delete_mission(&self, id: &MissionId) -> Result<u64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
