use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    Account, Contract, Mission, MissionChanges, MissionDependents, MissionDetail, MissionStatus, NewMission, Payment,
    Provisioned,
};
use super::store::{MissionStore, RoleStore};
use crate::types::{ClientId, Identity, MissionId, Role};

const MISSION_COLUMNS: &str =
    "id, client_id, status, daily_rate, timeframe, description, created_at, updated_at";

/// Accounts live in `users` (keyed by identity-provider subject, `role` NULL
/// until assigned) with at most one `clients` and one `freelancers` row per user.
#[derive(Clone)]
pub struct PgRoleStore {
    pool: PgPool,
}

impl PgRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn find_role(&self, identity: &Identity) -> Result<Option<Role>, DatabaseError> {
        // Outer None: no account. Inner None: account without a role.
        let role: Option<Option<String>> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(role.flatten().and_then(|value| parse_role(identity, &value)))
    }

    async fn find_client_id(&self, identity: &Identity) -> Result<Option<ClientId>, DatabaseError> {
        let client_id: Option<String> = sqlx::query_scalar("SELECT id FROM clients WHERE user_id = $1")
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(client_id.map(ClientId))
    }

    async fn find_account(&self, identity: &Identity) -> Result<Option<Account>, DatabaseError> {
        let row = sqlx::query(
            "SELECT u.role,
                    (SELECT c.id FROM clients c WHERE c.user_id = u.id) AS client_id,
                    EXISTS (SELECT 1 FROM freelancers f WHERE f.user_id = u.id) AS is_freelancer
             FROM users u WHERE u.id = $1",
        )
        .bind(identity.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let role: Option<String> = row.try_get("role")?;
        let client_id: Option<String> = row.try_get("client_id")?;
        Ok(Some(Account {
            identity: identity.clone(),
            role: role.and_then(|value| parse_role(identity, &value)),
            client_id: client_id.map(ClientId),
            is_freelancer: row.try_get("is_freelancer")?,
        }))
    }

    async fn set_role(&self, identity: &Identity, role: Role) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET role = $2, updated_at = now() WHERE id = $1")
            .bind(identity.as_str())
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ensure_account(&self, identity: &Identity) -> Result<Provisioned<Account>, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO users (id, role, updated_at) VALUES ($1, NULL, now())
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(identity.as_str())
        .execute(&self.pool)
        .await?;
        let inserted = result.rows_affected() > 0;

        let account = self
            .find_account(identity)
            .await?
            .ok_or_else(|| DatabaseError::QueryError(format!("account {} vanished after insert", identity)))?;

        if inserted {
            tracing::info!("Created account for '{}' without a role", identity);
            Ok(Provisioned::created(account))
        } else {
            Ok(Provisioned::existing(account))
        }
    }

    async fn upsert_role(&self, identity: &Identity, role: Role) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO users (id, role, updated_at) VALUES ($1, $2, now())
             ON CONFLICT (id) DO UPDATE SET role = EXCLUDED.role, updated_at = now()",
        )
        .bind(identity.as_str())
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ensure_client(&self, identity: &Identity) -> Result<Option<Provisioned<ClientId>>, DatabaseError> {
        // clients.user_id is UNIQUE, so concurrent calls still produce one row
        let created: Option<String> = sqlx::query_scalar(
            "INSERT INTO clients (id, user_id)
             SELECT $2, u.id FROM users u WHERE u.id = $1
             ON CONFLICT (user_id) DO NOTHING
             RETURNING id",
        )
        .bind(identity.as_str())
        .bind(Uuid::new_v4().to_string())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(id) = created {
            return Ok(Some(Provisioned::created(ClientId(id))));
        }

        Ok(self.find_client_id(identity).await?.map(Provisioned::existing))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

fn parse_role(identity: &Identity, value: &str) -> Option<Role> {
    match value.parse::<Role>() {
        Ok(role) => Some(role),
        Err(e) => {
            tracing::warn!("Ignoring unrecognized role for identity '{}': {}", identity, e);
            None
        }
    }
}

#[derive(Clone)]
pub struct PgMissionStore {
    pool: PgPool,
}

impl PgMissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn mission_from_row(row: &PgRow) -> Result<Mission, DatabaseError> {
    let status: String = row.try_get("status")?;
    Ok(Mission {
        id: MissionId(row.try_get("id")?),
        client_id: ClientId(row.try_get("client_id")?),
        status: status.parse::<MissionStatus>().map_err(DatabaseError::QueryError)?,
        daily_rate: row.try_get("daily_rate")?,
        timeframe: row.try_get("timeframe")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn contract_from_row(row: &PgRow) -> Result<Contract, DatabaseError> {
    Ok(Contract {
        id: row.try_get("id")?,
        mission_id: MissionId(row.try_get("mission_id")?),
        terms: row.try_get("terms")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
    })
}

fn payment_from_row(row: &PgRow) -> Result<Payment, DatabaseError> {
    Ok(Payment {
        id: row.try_get("id")?,
        mission_id: MissionId(row.try_get("mission_id")?),
        amount: row.try_get("amount")?,
        currency: row.try_get("currency")?,
        method: row.try_get("method")?,
        transaction_date: row.try_get("transaction_date")?,
    })
}

#[async_trait]
impl MissionStore for PgMissionStore {
    async fn list_missions(&self) -> Result<Vec<Mission>, DatabaseError> {
        let sql = format!("SELECT {} FROM missions ORDER BY created_at DESC", MISSION_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(mission_from_row).collect()
    }

    async fn find_mission(&self, id: &MissionId) -> Result<Option<Mission>, DatabaseError> {
        let sql = format!("SELECT {} FROM missions WHERE id = $1", MISSION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(mission_from_row).transpose()
    }

    async fn mission_detail(&self, id: &MissionId) -> Result<Option<MissionDetail>, DatabaseError> {
        let Some(mission) = self.find_mission(id).await? else {
            return Ok(None);
        };

        let contract = sqlx::query(
            "SELECT id, mission_id, terms, start_date, end_date FROM contracts WHERE mission_id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(contract_from_row)
        .transpose()?;

        let payments = sqlx::query(
            "SELECT id, mission_id, amount, currency, method, transaction_date
             FROM payments WHERE mission_id = $1 ORDER BY transaction_date",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(payment_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(MissionDetail {
            mission,
            contract,
            payments,
        }))
    }

    async fn create_mission(&self, mission: NewMission) -> Result<Mission, DatabaseError> {
        let sql = format!(
            "INSERT INTO missions (id, client_id, status, daily_rate, timeframe, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {}",
            MISSION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(mission.client_id.as_str())
            .bind(mission.status.as_str())
            .bind(mission.daily_rate)
            .bind(mission.timeframe)
            .bind(&mission.description)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        mission_from_row(&row)
    }

    async fn update_mission(
        &self,
        id: &MissionId,
        changes: MissionChanges,
    ) -> Result<Option<Mission>, DatabaseError> {
        let sql = format!(
            "UPDATE missions SET
                status = COALESCE($2, status),
                daily_rate = COALESCE($3, daily_rate),
                timeframe = COALESCE($4, timeframe),
                description = COALESCE($5, description),
                updated_at = now()
             WHERE id = $1
             RETURNING {}",
            MISSION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .bind(changes.status.map(|s| s.as_str()))
            .bind(changes.daily_rate)
            .bind(changes.timeframe)
            .bind(changes.description)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(mission_from_row).transpose()
    }

    async fn mission_dependents(&self, id: &MissionId) -> Result<Option<MissionDependents>, DatabaseError> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM payments WHERE mission_id = m.id) AS payment_count,
                EXISTS (SELECT 1 FROM contracts WHERE mission_id = m.id) AS has_contract
             FROM missions m WHERE m.id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let payment_count: i64 = row.try_get("payment_count")?;
                Ok(Some(MissionDependents {
                    payment_count: payment_count.max(0) as u64,
                    has_contract: row.try_get("has_contract")?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn delete_payments(&self, id: &MissionId) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM payments WHERE mission_id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_contract(&self, id: &MissionId) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM contracts WHERE mission_id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_mission(&self, id: &MissionId) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM missions WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
