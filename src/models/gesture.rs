use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::landmark::Landmark;

/// What the comparison loop sends once per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureComparisonRequest {
    pub landmarks: Vec<Landmark>,
    pub target_gesture: String,
    pub user_id: String,
}

/// Where a confidence value came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonSource {
    Service,
    Fallback,
}

impl ComparisonSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonSource::Service => "Service",
            ComparisonSource::Fallback => "Fallback",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureComparisonResponse {
    pub confidence: f64,
    pub is_match: bool,
    pub message: String,
    pub gesture: Option<String>,
    pub source: ComparisonSource,
}

impl GestureComparisonResponse {
    /// Clamp a raw similarity into `[0, 1]`; anything non-finite scores zero.
    pub fn normalize_confidence(raw: f64) -> f64 {
        if raw.is_finite() {
            raw.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// A scored attempt, kept in the learner's gesture history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureRecognitionResult {
    pub detected: bool,
    pub confidence: f64,
    pub gesture: String,
    pub landmarks: Vec<Landmark>,
}

/// Reference recording registered for a sign on the gesture service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeGesture {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "name")]
    pub gesture_name: String,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
