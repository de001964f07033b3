use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PracticeError, PracticeErrorKind};

use super::feedback::{FeedbackBand, POSITION_HAND_MESSAGE};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DetectionStatus {
    #[default]
    Idle,
    Detecting,
    Success,
    Error,
}

/// Snapshot of one practice attempt against a single target sign.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PracticeState {
    pub status: DetectionStatus,
    pub target_sign: Option<String>,
    pub run_id: Option<String>,
    pub confidence: f64,
    pub feedback: String,
    pub band: Option<FeedbackBand>,
    pub error: Option<PracticeErrorKind>,
    pub comparisons: u64,
    pub dropped_ticks: u64,
    pub started_at: Option<DateTime<Utc>>,
}

impl PracticeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_detecting(&self) -> bool {
        self.status == DetectionStatus::Detecting
    }

    pub fn begin(&mut self, run_id: String, target_sign: String, start_at: DateTime<Utc>) {
        *self = Self {
            status: DetectionStatus::Detecting,
            target_sign: Some(target_sign),
            run_id: Some(run_id),
            feedback: POSITION_HAND_MESSAGE.into(),
            started_at: Some(start_at),
            ..Self::default()
        };
    }

    pub fn show_no_hand(&mut self) {
        if self.is_detecting() {
            self.band = Some(FeedbackBand::PositionHand);
            self.feedback = POSITION_HAND_MESSAGE.into();
        }
    }

    /// Applies a scored comparison. Returns true only on the detecting → success edge.
    pub fn apply_score(&mut self, confidence: f64, threshold: f64) -> bool {
        if !self.is_detecting() {
            return false;
        }
        let band = FeedbackBand::for_confidence(confidence, threshold);
        let sign = self.target_sign.as_deref().unwrap_or_default();
        self.comparisons += 1;
        self.confidence = confidence;
        self.feedback = band.message(sign, confidence);
        self.band = Some(band);
        if band == FeedbackBand::Matched {
            self.status = DetectionStatus::Success;
            return true;
        }
        false
    }

    /// Keeps detecting but tells the learner the comparison service is down.
    pub fn show_service_unavailable(&mut self, err: &PracticeError) {
        if self.is_detecting() {
            self.feedback = err.user_message();
        }
    }

    pub fn record_dropped_tick(&mut self) {
        self.dropped_ticks += 1;
    }

    pub fn fail(&mut self, err: &PracticeError) {
        self.status = DetectionStatus::Error;
        self.error = Some(err.kind());
        self.band = None;
        self.feedback = err.user_message();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detecting() -> PracticeState {
        let mut state = PracticeState::new();
        state.begin("run-1".into(), "Hello".into(), Utc::now());
        state
    }

    #[test]
    fn success_is_terminal_until_reset() {
        let mut state = detecting();
        assert!(!state.apply_score(0.55, 0.8));
        assert_eq!(state.band, Some(FeedbackBand::GoodProgress));
        assert!(state.apply_score(0.95, 0.8));
        assert_eq!(state.status, DetectionStatus::Success);

        assert!(!state.apply_score(0.99, 0.8));
        assert_eq!(state.comparisons, 2);

        state.reset();
        assert_eq!(state.status, DetectionStatus::Idle);
        assert!(state.target_sign.is_none());
    }

    #[test]
    fn failure_records_kind_and_message() {
        let mut state = detecting();
        state.fail(&PracticeError::PermissionDenied);
        assert_eq!(state.status, DetectionStatus::Error);
        assert_eq!(state.error, Some(PracticeErrorKind::PermissionDenied));
        assert!(state.feedback.to_lowercase().contains("permission"));
    }

    #[test]
    fn no_hand_only_changes_feedback() {
        let mut state = detecting();
        state.apply_score(0.4, 0.8);
        state.show_no_hand();
        assert_eq!(state.status, DetectionStatus::Detecting);
        assert_eq!(state.feedback, POSITION_HAND_MESSAGE);
    }
}
