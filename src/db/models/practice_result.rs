use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ComparisonSource;

/// A single scored comparison tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeResult {
    pub id: String,
    pub session_id: Option<String>,
    pub run_id: String,
    pub user_id: String,
    pub sign: String,
    pub confidence: f64,
    pub is_match: bool,
    pub source: ComparisonSource,
    pub created_at: DateTime<Utc>,
}
