use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Running,
    Completed,
    Cancelled,
    Interrupted,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "Running",
            SessionStatus::Completed => "Completed",
            SessionStatus::Cancelled => "Cancelled",
            SessionStatus::Interrupted => "Interrupted",
        }
    }
}

/// One multi-sign practice session as stored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSessionRecord {
    pub id: String,
    pub user_id: String,
    pub signs: Vec<String>,
    pub status: SessionStatus,
    pub signs_completed: u32,
    pub signs_skipped: u32,
    pub xp_earned: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PracticeSessionRecord {
    pub fn running(id: String, user_id: String, signs: Vec<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            signs,
            status: SessionStatus::Running,
            signs_completed: 0,
            signs_skipped: 0,
            xp_earned: 0,
            started_at,
            ended_at: None,
            created_at: started_at,
            updated_at: started_at,
        }
    }
}
