use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::MissionId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub mission_id: MissionId,
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub transaction_date: DateTime<Utc>,
}
