use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::SessionStatus;

/// How a single sign in a session ended.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SignOutcome {
    Matched { confidence: f64, xp: u64 },
    Skipped,
    /// The gesture service has no reference recordings for the sign.
    NoGestures,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignResult {
    pub sign: String,
    pub outcome: Option<SignOutcome>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub user_id: String,
    pub status: SessionStatus,
    pub signs: Vec<SignResult>,
    pub signs_completed: u32,
    pub signs_skipped: u32,
    pub xp_earned: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Ordered walk through a handful of target signs.
#[derive(Debug, Clone)]
pub struct PracticeSession {
    pub id: String,
    pub user_id: String,
    results: Vec<SignResult>,
    current_index: usize,
    total_points: u64,
    pub started_at: DateTime<Utc>,
}

impl PracticeSession {
    /// Keeps at most `max_signs` of `signs`, in order.
    pub fn new(
        id: String,
        user_id: String,
        signs: Vec<String>,
        max_signs: usize,
        started_at: DateTime<Utc>,
    ) -> Self {
        let results = signs
            .into_iter()
            .take(max_signs)
            .map(|sign| SignResult { sign, outcome: None })
            .collect();
        Self {
            id,
            user_id,
            results,
            current_index: 0,
            total_points: 0,
            started_at,
        }
    }

    pub fn signs(&self) -> Vec<String> {
        self.results.iter().map(|r| r.sign.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_sign(&self) -> Option<&str> {
        self.results
            .get(self.current_index)
            .map(|result| result.sign.as_str())
    }

    /// Credits the current sign. Returns false if it already has an outcome.
    pub fn handle_success(&mut self, confidence: f64, xp: u64) -> bool {
        let Some(result) = self.results.get_mut(self.current_index) else {
            return false;
        };
        if result.outcome.is_some() {
            return false;
        }
        result.outcome = Some(SignOutcome::Matched { confidence, xp });
        self.total_points += xp;
        true
    }

    pub fn skip(&mut self) {
        self.settle(SignOutcome::Skipped);
    }

    pub fn mark_no_gestures(&mut self) {
        self.settle(SignOutcome::NoGestures);
    }

    fn settle(&mut self, outcome: SignOutcome) {
        if let Some(result) = self.results.get_mut(self.current_index) {
            if result.outcome.is_none() {
                result.outcome = Some(outcome);
            }
        }
    }

    /// Moves to the next sign. Returns false once every sign has been visited.
    pub fn advance(&mut self) -> bool {
        if self.current_index < self.results.len() {
            self.current_index += 1;
        }
        !self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.results.len()
    }

    pub fn signs_completed(&self) -> u32 {
        self.count(|outcome| matches!(outcome, SignOutcome::Matched { .. }))
    }

    /// Skipped signs, including ones with nothing to compare against.
    pub fn signs_skipped(&self) -> u32 {
        self.count(|outcome| matches!(outcome, SignOutcome::Skipped | SignOutcome::NoGestures))
    }

    fn count(&self, predicate: impl Fn(&SignOutcome) -> bool) -> u32 {
        self.results
            .iter()
            .filter(|result| result.outcome.as_ref().is_some_and(|outcome| predicate(outcome)))
            .count() as u32
    }

    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    pub fn summary(&self, status: SessionStatus, ended_at: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            user_id: self.user_id.clone(),
            status,
            signs: self.results.clone(),
            signs_completed: self.signs_completed(),
            signs_skipped: self.signs_skipped(),
            xp_earned: self.total_points,
            started_at: self.started_at,
            ended_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(signs: &[&str], max: usize) -> PracticeSession {
        PracticeSession::new(
            "s1".into(),
            "guest".into(),
            signs.iter().map(|s| s.to_string()).collect(),
            max,
            Utc::now(),
        )
    }

    #[test]
    fn caps_sign_count() {
        let session = session(&["Hello", "Thank You", "Please", "Yes", "No", "Goodbye"], 5);
        assert_eq!(session.len(), 5);
        assert_eq!(session.current_sign(), Some("Hello"));
    }

    #[test]
    fn success_is_credited_once_per_sign() {
        let mut session = session(&["Hello", "Yes"], 5);
        assert!(session.handle_success(0.91, 50));
        assert!(!session.handle_success(0.97, 50));
        assert_eq!(session.total_points(), 50);

        assert!(session.advance());
        assert_eq!(session.current_sign(), Some("Yes"));
        session.skip();
        assert!(!session.handle_success(0.9, 50));
        assert!(!session.advance());
        assert!(session.is_complete());

        let summary = session.summary(SessionStatus::Completed, Utc::now());
        assert_eq!(summary.signs_completed, 1);
        assert_eq!(summary.signs_skipped, 1);
        assert_eq!(summary.xp_earned, 50);
        assert_eq!(summary.signs[1].outcome, Some(SignOutcome::Skipped));
    }

    #[test]
    fn missing_gestures_count_as_skipped() {
        let mut session = session(&["Hello"], 5);
        session.mark_no_gestures();
        assert!(!session.advance());
        assert_eq!(session.signs_skipped(), 1);
        assert_eq!(session.signs_completed(), 0);
        // Advancing past the end stays complete.
        assert!(!session.advance());
        assert_eq!(session.current_sign(), None);
    }

    #[test]
    fn empty_session_is_complete() {
        assert!(session(&[], 5).is_complete());
    }
}
