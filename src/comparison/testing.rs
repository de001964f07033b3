//! Scripted comparison service for controller and session tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use futures::future::BoxFuture;

use crate::{
    error::PracticeError,
    models::{ComparisonSource, GestureComparisonRequest, GestureComparisonResponse},
};

use super::client::ComparisonService;

pub struct ScriptedService {
    confidences: Mutex<VecDeque<f64>>,
    default_confidence: f64,
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    targets: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub fn constant(confidence: f64) -> Self {
        Self {
            confidences: Mutex::new(VecDeque::new()),
            default_confidence: confidence,
            delay: Duration::ZERO,
            fail: false,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        }
    }

    /// Returns `scores` in order, then `then` forever.
    pub fn sequence(scores: Vec<f64>, then: f64) -> Self {
        Self {
            confidences: Mutex::new(scores.into()),
            ..Self::constant(then)
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::constant(0.0)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ComparisonService for ScriptedService {
    fn compare<'a>(
        &'a self,
        request: &'a GestureComparisonRequest,
    ) -> BoxFuture<'a, Result<GestureComparisonResponse, PracticeError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.targets.lock().unwrap().push(request.target_gesture.clone());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let _guard = InFlight(&self.in_flight);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(PracticeError::NetworkFailure("service unavailable".into()));
            }

            let confidence = self
                .confidences
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.default_confidence);
            Ok(GestureComparisonResponse {
                confidence,
                is_match: confidence >= 0.8,
                message: "scripted".into(),
                gesture: Some(request.target_gesture.clone()),
                source: ComparisonSource::Service,
            })
        })
    }
}
