use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Contract, Payment};
use crate::types::{ClientId, MissionId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    Draft,
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Draft => "DRAFT",
            MissionStatus::Open => "OPEN",
            MissionStatus::InProgress => "IN_PROGRESS",
            MissionStatus::Completed => "COMPLETED",
            MissionStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(MissionStatus::Draft),
            "OPEN" => Ok(MissionStatus::Open),
            "IN_PROGRESS" => Ok(MissionStatus::InProgress),
            "COMPLETED" => Ok(MissionStatus::Completed),
            "CANCELLED" => Ok(MissionStatus::Cancelled),
            other => Err(format!("unknown mission status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: MissionId,
    pub client_id: ClientId,
    pub status: MissionStatus,
    pub daily_rate: Decimal,
    /// Expected duration in days
    pub timeframe: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mission with its dependent records, as returned by single-mission reads
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionDetail {
    #[serde(flatten)]
    pub mission: Mission,
    pub contract: Option<Contract>,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMission {
    pub client_id: ClientId,
    pub status: MissionStatus,
    pub daily_rate: Decimal,
    pub timeframe: i32,
    pub description: String,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionChanges {
    pub status: Option<MissionStatus>,
    pub daily_rate: Option<Decimal>,
    pub timeframe: Option<i32>,
    pub description: Option<String>,
}

impl MissionChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.daily_rate.is_none()
            && self.timeframe.is_none()
            && self.description.is_none()
    }
}

/// What a cascade delete has to remove before the mission row itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissionDependents {
    pub payment_count: u64,
    pub has_contract: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_store_strings() {
        for status in [
            MissionStatus::Draft,
            MissionStatus::Open,
            MissionStatus::InProgress,
            MissionStatus::Completed,
            MissionStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<MissionStatus>(), Ok(status));
        }
        assert!("open".parse::<MissionStatus>().is_err());
    }

    #[test]
    fn changes_deserialize_from_camel_case() {
        let changes: MissionChanges =
            serde_json::from_value(serde_json::json!({ "dailyRate": "450.00", "status": "IN_PROGRESS" }))
                .unwrap();
        assert_eq!(changes.status, Some(MissionStatus::InProgress));
        assert_eq!(changes.daily_rate, Some(Decimal::new(45000, 2)));
        assert!(changes.description.is_none());
        assert!(!changes.is_empty());
        assert!(MissionChanges::default().is_empty());
    }
}
