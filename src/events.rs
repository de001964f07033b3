//! Outbound notifications from the practice engine.
//!
//! Controllers publish state snapshots through an [`EventSink`]; a UI or the
//! CLI subscribes to them. Emission is fire-and-forget: a sink that has no
//! listeners silently drops events.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::{
    comparison::PracticeState,
    models::{GestureRecognitionResult, UserProgress},
    practice::SessionSummary,
};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum PracticeEvent {
    PracticeStateChanged(PracticeState),
    GestureScored(GestureRecognitionResult),
    ProgressUpdated(UserProgress),
    SessionCompleted(SessionSummary),
}

impl PracticeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PracticeEvent::PracticeStateChanged(_) => "practice-state-changed",
            PracticeEvent::GestureScored(_) => "gesture-scored",
            PracticeEvent::ProgressUpdated(_) => "progress-updated",
            PracticeEvent::SessionCompleted(_) => "session-completed",
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: PracticeEvent);
}

/// Fans events out to any number of async subscribers.
#[derive(Clone)]
pub struct BroadcastEvents {
    sender: broadcast::Sender<PracticeEvent>,
}

impl BroadcastEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PracticeEvent> {
        self.sender.subscribe()
    }
}

impl EventSink for BroadcastEvents {
    fn emit(&self, event: PracticeEvent) {
        let _ = self.sender.send(event);
    }
}

pub struct NullEvents;

impl EventSink for NullEvents {
    fn emit(&self, _event: PracticeEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let events = BroadcastEvents::new(8);
        let mut rx = events.subscribe();
        events.emit(PracticeEvent::PracticeStateChanged(PracticeState::new()));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "practice-state-changed");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "practice-state-changed");
        assert_eq!(json["payload"]["status"], "idle");
    }

    #[test]
    fn emitting_without_listeners_is_fine() {
        BroadcastEvents::new(1).emit(PracticeEvent::ProgressUpdated(UserProgress::new("guest")));
        NullEvents.emit(PracticeEvent::ProgressUpdated(UserProgress::new("guest")));
    }
}
