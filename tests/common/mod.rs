#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use freelance_api_rust::app::{build_router, AppState};
use freelance_api_rust::auth::{generate_jwt, Claims};
use freelance_api_rust::authz::PolicyTable;
use freelance_api_rust::config::AppConfig;
use freelance_api_rust::database::models::{
    Account, Contract, Mission, MissionChanges, MissionDependents, MissionDetail, MissionStatus, NewMission, Payment,
};
use freelance_api_rust::database::{DatabaseError, MemoryStore, MissionStore, RoleStore};
use freelance_api_rust::services::CascadeStep;
use freelance_api_rust::types::{ClientId, Identity, MissionId, Role};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const BOOTSTRAP_ADMIN: &str = "bootstrap-admin";

// ---------------------------------------------------------------------------
// Spawned server binary
// ---------------------------------------------------------------------------

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // In-memory store with a seeded admin, no database needed
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_freelance-api-rust"));
        cmd.env("FREELANCE_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("JWT_SECRET", TEST_SECRET)
            .env("AUTHZ_BOOTSTRAP_ADMIN", BOOTSTRAP_ADMIN)
            .env_remove("DATABASE_URL")
            .env_remove("AUTHZ_POLICY_FILE")
            .env_remove("AUTHZ_PUBLIC_PATHS")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

// ---------------------------------------------------------------------------
// In-process router
// ---------------------------------------------------------------------------

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = TEST_SECRET.to_string();
    config.authz.role_cache_ttl_secs = 3600;
    config
}

pub fn token(identity: &str) -> String {
    generate_jwt(TEST_SECRET, &Claims::new(&Identity::new(identity), 1).expect("claims")).expect("token")
}

pub fn test_app(accounts: Arc<dyn RoleStore>, missions: Arc<dyn MissionStore>) -> (Router, AppState) {
    let policy = PolicyTable::builtin().expect("builtin policy");
    let state = AppState::new(test_config(), policy, accounts, missions).expect("app state");
    (build_router(state.clone()), state)
}

pub fn memory_app(store: &MemoryStore) -> (Router, AppState) {
    test_app(Arc::new(store.clone()), Arc::new(store.clone()))
}

/// Accounts: admin-1, support-1, freelancer-1, client-42-user (client-42),
/// client-99-user (client-99). Missions: abc123 owned by client-42 with a
/// contract and two payments, m-99 owned by client-99 with neither.
pub async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::recording();

    let accounts = [
        ("admin-1", Role::Admin, None),
        ("support-1", Role::Support, None),
        ("freelancer-1", Role::Freelancer, None),
        ("client-42-user", Role::Client, Some("client-42")),
        ("client-99-user", Role::Client, Some("client-99")),
    ];
    for (identity, role, client_id) in accounts {
        store
            .insert_account(Account {
                identity: Identity::new(identity),
                role: Some(role),
                client_id: client_id.map(ClientId::new),
                is_freelancer: role == Role::Freelancer,
            })
            .await;
    }

    let now = Utc::now();
    store.insert_mission(mission("abc123", "client-42")).await;
    store.insert_mission(mission("m-99", "client-99")).await;
    store
        .insert_contract(Contract {
            id: "contract-abc123".to_string(),
            mission_id: MissionId::new("abc123"),
            terms: "Standard freelance contract terms".to_string(),
            start_date: now,
            end_date: None,
        })
        .await;
    for n in 0..2 {
        store
            .insert_payment(Payment {
                id: format!("payment-{n}"),
                mission_id: MissionId::new("abc123"),
                amount: Decimal::new(15000, 0),
                currency: "EUR".to_string(),
                method: "Bank Transfer".to_string(),
                transaction_date: now,
            })
            .await;
    }

    store
}

pub fn mission(id: &str, client: &str) -> Mission {
    let now = Utc::now();
    Mission {
        id: MissionId::new(id),
        client_id: ClientId::new(client),
        status: MissionStatus::InProgress,
        daily_rate: Decimal::new(500, 0),
        timeframe: 30,
        description: "E-commerce platform development".to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// One request through the router; returns status and parsed JSON body
pub async fn send(
    router: &Router,
    method: Method,
    path: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

// ---------------------------------------------------------------------------
// Store that fails one cascade step
// ---------------------------------------------------------------------------

pub struct FailingMissionStore {
    pub inner: MemoryStore,
    pub fail_at: CascadeStep,
}

impl FailingMissionStore {
    fn check(&self, step: CascadeStep) -> Result<(), DatabaseError> {
        if self.fail_at == step {
            Err(DatabaseError::QueryError(format!("could not delete {}", step)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MissionStore for FailingMissionStore {
    async fn list_missions(&self) -> Result<Vec<Mission>, DatabaseError> {
        self.inner.list_missions().await
    }
    async fn find_mission(&self, id: &MissionId) -> Result<Option<Mission>, DatabaseError> {
        self.inner.find_mission(id).await
    }
    async fn mission_detail(&self, id: &MissionId) -> Result<Option<MissionDetail>, DatabaseError> {
        self.inner.mission_detail(id).await
    }
    async fn create_mission(&self, mission: NewMission) -> Result<Mission, DatabaseError> {
        self.inner.create_mission(mission).await
    }
    async fn update_mission(&self, id: &MissionId, changes: MissionChanges) -> Result<Option<Mission>, DatabaseError> {
        self.inner.update_mission(id, changes).await
    }
    async fn mission_dependents(&self, id: &MissionId) -> Result<Option<MissionDependents>, DatabaseError> {
        self.inner.mission_dependents(id).await
    }
    async fn delete_payments(&self, id: &MissionId) -> Result<u64, DatabaseError> {
        self.check(CascadeStep::Payments)?;
        self.inner.delete_payments(id).await
    }
    async fn delete_contract(&self, id: &MissionId) -> Result<u64, DatabaseError> {
        self.check(CascadeStep::Contract)?;
        self.inner.delete_contract(id).await
    }
    async fn delete_mission(&self, id: &MissionId) -> Result<u64, DatabaseError> {
        self.check(CascadeStep::Mission)?;
        self.inner.delete_mission(id).await
    }
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
