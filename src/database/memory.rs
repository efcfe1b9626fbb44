use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Account, Contract, Mission, MissionChanges, MissionDependents, MissionDetail, NewMission, Payment, Provisioned,
};
use super::store::{MissionStore, RoleStore};
use crate::types::{ClientId, Identity, MissionId, Role};

/// Mutating calls recorded by the in-memory store, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    CreateMission(MissionId),
    UpdateMission(MissionId),
    DeletePayments(MissionId),
    DeleteContract(MissionId),
    DeleteMission(MissionId),
    SetRole(Identity, Role),
    CreateAccount(Identity),
    UpsertRole(Identity, Role),
    CreateClient(Identity, ClientId),
}

#[derive(Default)]
struct State {
    accounts: HashMap<Identity, Account>,
    missions: HashMap<MissionId, Mission>,
    contracts: HashMap<MissionId, Contract>,
    payments: Vec<Payment>,
    /// Only kept by stores built with [`MemoryStore::recording`]
    operations: Option<Vec<StoreOperation>>,
}

impl State {
    fn record(&mut self, operation: StoreOperation) {
        if let Some(operations) = self.operations.as_mut() {
            operations.push(operation);
        }
    }
}

/// In-process store for local development and tests
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that also keeps an ordered log of its mutating calls
    pub fn recording() -> Self {
        let state = State {
            operations: Some(Vec::new()),
            ..State::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn insert_account(&self, account: Account) {
        let mut state = self.state.write().await;
        state.accounts.insert(account.identity.clone(), account);
    }

    pub async fn insert_mission(&self, mission: Mission) {
        let mut state = self.state.write().await;
        state.missions.insert(mission.id.clone(), mission);
    }

    pub async fn insert_contract(&self, contract: Contract) {
        let mut state = self.state.write().await;
        state.contracts.insert(contract.mission_id.clone(), contract);
    }

    pub async fn insert_payment(&self, payment: Payment) {
        let mut state = self.state.write().await;
        state.payments.push(payment);
    }

    /// Recorded mutations; always empty unless built with [`MemoryStore::recording`]
    pub async fn operations(&self) -> Vec<StoreOperation> {
        self.state.read().await.operations.clone().unwrap_or_default()
    }

    pub async fn payment_count(&self, id: &MissionId) -> usize {
        let state = self.state.read().await;
        state.payments.iter().filter(|p| &p.mission_id == id).count()
    }

    pub async fn has_contract(&self, id: &MissionId) -> bool {
        self.state.read().await.contracts.contains_key(id)
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find_role(&self, identity: &Identity) -> Result<Option<Role>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.accounts.get(identity).and_then(|a| a.role))
    }

    async fn find_client_id(&self, identity: &Identity) -> Result<Option<ClientId>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.accounts.get(identity).and_then(|a| a.client_id.clone()))
    }

    async fn find_account(&self, identity: &Identity) -> Result<Option<Account>, DatabaseError> {
        Ok(self.state.read().await.accounts.get(identity).cloned())
    }

    async fn set_role(&self, identity: &Identity, role: Role) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        let Some(account) = state.accounts.get_mut(identity) else {
            return Ok(false);
        };
        account.role = Some(role);
        state.record(StoreOperation::SetRole(identity.clone(), role));
        Ok(true)
    }

    async fn ensure_account(&self, identity: &Identity) -> Result<Provisioned<Account>, DatabaseError> {
        let mut state = self.state.write().await;
        if let Some(account) = state.accounts.get(identity) {
            return Ok(Provisioned::existing(account.clone()));
        }

        let account = Account::new(identity.clone());
        state.accounts.insert(identity.clone(), account.clone());
        state.record(StoreOperation::CreateAccount(identity.clone()));
        Ok(Provisioned::created(account))
    }

    async fn upsert_role(&self, identity: &Identity, role: Role) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        state
            .accounts
            .entry(identity.clone())
            .or_insert_with(|| Account::new(identity.clone()))
            .role = Some(role);
        state.record(StoreOperation::UpsertRole(identity.clone(), role));
        Ok(())
    }

    async fn ensure_client(&self, identity: &Identity) -> Result<Option<Provisioned<ClientId>>, DatabaseError> {
        let mut state = self.state.write().await;
        let Some(account) = state.accounts.get_mut(identity) else {
            return Ok(None);
        };
        if let Some(client_id) = &account.client_id {
            return Ok(Some(Provisioned::existing(client_id.clone())));
        }

        let client_id = ClientId(Uuid::new_v4().to_string());
        account.client_id = Some(client_id.clone());
        state.record(StoreOperation::CreateClient(identity.clone(), client_id.clone()));
        Ok(Some(Provisioned::created(client_id)))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[async_trait]
impl MissionStore for MemoryStore {
    async fn list_missions(&self) -> Result<Vec<Mission>, DatabaseError> {
        let state = self.state.read().await;
        let mut missions: Vec<Mission> = state.missions.values().cloned().collect();
        missions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(missions)
    }

    async fn find_mission(&self, id: &MissionId) -> Result<Option<Mission>, DatabaseError> {
        Ok(self.state.read().await.missions.get(id).cloned())
    }

    async fn mission_detail(&self, id: &MissionId) -> Result<Option<MissionDetail>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.missions.get(id).map(|mission| MissionDetail {
            mission: mission.clone(),
            contract: state.contracts.get(id).cloned(),
            payments: state
                .payments
                .iter()
                .filter(|p| &p.mission_id == id)
                .cloned()
                .collect(),
        }))
    }

    async fn create_mission(&self, new: NewMission) -> Result<Mission, DatabaseError> {
        let now = Utc::now();
        let mission = Mission {
            id: MissionId(Uuid::new_v4().to_string()),
            client_id: new.client_id,
            status: new.status,
            daily_rate: new.daily_rate,
            timeframe: new.timeframe,
            description: new.description,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.write().await;
        state.record(StoreOperation::CreateMission(mission.id.clone()));
        state.missions.insert(mission.id.clone(), mission.clone());
        Ok(mission)
    }

    async fn update_mission(
        &self,
        id: &MissionId,
        changes: MissionChanges,
    ) -> Result<Option<Mission>, DatabaseError> {
        let mut state = self.state.write().await;
        let Some(mission) = state.missions.get_mut(id) else {
            return Ok(None);
        };

        if let Some(status) = changes.status {
            mission.status = status;
        }
        if let Some(daily_rate) = changes.daily_rate {
            mission.daily_rate = daily_rate;
        }
        if let Some(timeframe) = changes.timeframe {
            mission.timeframe = timeframe;
        }
        if let Some(description) = changes.description {
            mission.description = description;
        }
        mission.updated_at = Utc::now();

        let updated = mission.clone();
        state.record(StoreOperation::UpdateMission(id.clone()));
        Ok(Some(updated))
    }

    async fn mission_dependents(&self, id: &MissionId) -> Result<Option<MissionDependents>, DatabaseError> {
        let state = self.state.read().await;
        if !state.missions.contains_key(id) {
            return Ok(None);
        }
        Ok(Some(MissionDependents {
            payment_count: state.payments.iter().filter(|p| &p.mission_id == id).count() as u64,
            has_contract: state.contracts.contains_key(id),
        }))
    }

    async fn delete_payments(&self, id: &MissionId) -> Result<u64, DatabaseError> {
        let mut state = self.state.write().await;
        let before = state.payments.len();
        state.payments.retain(|p| &p.mission_id != id);
        let removed = (before - state.payments.len()) as u64;
        state.record(StoreOperation::DeletePayments(id.clone()));
        Ok(removed)
    }

    async fn delete_contract(&self, id: &MissionId) -> Result<u64, DatabaseError> {
        let mut state = self.state.write().await;
        let removed = state.contracts.remove(id).map_or(0, |_| 1);
        state.record(StoreOperation::DeleteContract(id.clone()));
        Ok(removed)
    }

    async fn delete_mission(&self, id: &MissionId) -> Result<u64, DatabaseError> {
        let mut state = self.state.write().await;
        let removed = state.missions.remove(id).map_or(0, |_| 1);
        state.record(StoreOperation::DeleteMission(id.clone()));
        Ok(removed)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::MissionStatus;
    use rust_decimal::Decimal;

    fn mission(id: &str, client: &str) -> Mission {
        let now = Utc::now();
        Mission {
            id: MissionId::new(id),
            client_id: ClientId::new(client),
            status: MissionStatus::Open,
            daily_rate: Decimal::new(500, 0),
            timeframe: 30,
            description: "Build a landing page".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn set_role_only_touches_known_accounts() {
        let store = MemoryStore::new();
        store
            .insert_account(Account {
                role: Some(Role::Freelancer),
                ..Account::new(Identity::new("user_1"))
            })
            .await;

        assert!(store.set_role(&Identity::new("user_1"), Role::Client).await.unwrap());
        assert!(!store.set_role(&Identity::new("ghost"), Role::Admin).await.unwrap());
        assert_eq!(
            store.find_role(&Identity::new("user_1")).await.unwrap(),
            Some(Role::Client)
        );
    }

    #[tokio::test]
    async fn ensure_account_creates_without_a_role_once() {
        let store = MemoryStore::recording();
        let identity = Identity::new("user_new");

        let first = store.ensure_account(&identity).await.unwrap();
        assert!(first.created);
        assert_eq!(first.record.role, None);
        assert_eq!(store.find_role(&identity).await.unwrap(), None);

        store.set_role(&identity, Role::Client).await.unwrap();
        let second = store.ensure_account(&identity).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.record.role, Some(Role::Client));

        assert_eq!(
            store.operations().await,
            vec![
                StoreOperation::CreateAccount(identity.clone()),
                StoreOperation::SetRole(identity, Role::Client),
            ]
        );
    }

    #[tokio::test]
    async fn upsert_role_creates_or_promotes() {
        let store = MemoryStore::new();
        store
            .insert_account(Account {
                role: Some(Role::Support),
                ..Account::new(Identity::new("user_1"))
            })
            .await;

        store.upsert_role(&Identity::new("user_1"), Role::Admin).await.unwrap();
        store.upsert_role(&Identity::new("user_2"), Role::Admin).await.unwrap();

        assert_eq!(store.find_role(&Identity::new("user_1")).await.unwrap(), Some(Role::Admin));
        assert_eq!(store.find_role(&Identity::new("user_2")).await.unwrap(), Some(Role::Admin));
    }

    #[tokio::test]
    async fn ensure_client_is_idempotent_and_needs_an_account() {
        let store = MemoryStore::new();
        let identity = Identity::new("user_1");
        assert_eq!(store.ensure_client(&identity).await.unwrap(), None);

        store.ensure_account(&identity).await.unwrap();
        let created = store.ensure_client(&identity).await.unwrap().unwrap();
        assert!(created.created);

        let again = store.ensure_client(&identity).await.unwrap().unwrap();
        assert!(!again.created);
        assert_eq!(again.record, created.record);
        assert_eq!(store.find_client_id(&identity).await.unwrap(), Some(created.record));
    }

    #[tokio::test]
    async fn plain_store_keeps_no_operation_log() {
        let store = MemoryStore::new();
        store.insert_mission(mission("m1", "c1")).await;
        store.delete_payments(&MissionId::new("m1")).await.unwrap();
        store.delete_mission(&MissionId::new("m1")).await.unwrap();
        store.upsert_role(&Identity::new("user_1"), Role::Admin).await.unwrap();

        assert!(store.operations().await.is_empty());
        assert!(store.state.read().await.operations.is_none());
    }

    #[tokio::test]
    async fn repeated_deletes_are_no_ops() {
        let store = MemoryStore::new();
        store.insert_mission(mission("m1", "c1")).await;

        assert_eq!(store.delete_mission(&MissionId::new("m1")).await.unwrap(), 1);
        assert_eq!(store.delete_mission(&MissionId::new("m1")).await.unwrap(), 0);
        assert_eq!(store.delete_payments(&MissionId::new("m1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_applies_only_given_fields() {
        let store = MemoryStore::new();
        store.insert_mission(mission("m1", "c1")).await;

        let updated = store
            .update_mission(
                &MissionId::new("m1"),
                MissionChanges {
                    timeframe: Some(45),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.timeframe, 45);
        assert_eq!(updated.description, "Build a landing page");
        assert!(store
            .update_mission(&MissionId::new("missing"), MissionChanges::default())
            .await
            .unwrap()
            .is_none());
    }
}
