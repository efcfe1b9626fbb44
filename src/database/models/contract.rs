use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::MissionId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub mission_id: MissionId,
    pub terms: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}
