use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::{mpsc, watch, Mutex},
    time::{self, MissedTickBehavior},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use uuid::Uuid;

use crate::{
    camera::{CameraDriver, DetectionFeed},
    config::PracticeConfig,
    db::{Database, PracticeResult},
    error::PracticeError,
    events::{EventSink, PracticeEvent},
    models::{
        GestureComparisonRequest, GestureComparisonResponse, GestureRecognitionResult,
        HandLandmarks, Landmark,
    },
};

use super::{
    client::ComparisonService,
    feedback::FeedbackBand,
    state::{DetectionStatus, PracticeState},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Handed to the success hook once the display delay has elapsed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessReport {
    pub run_id: String,
    pub target_sign: String,
    pub confidence: f64,
    pub landmarks: Vec<Landmark>,
}

type SuccessHook = Box<dyn FnOnce(SuccessReport) + Send + 'static>;

struct ActiveRun {
    run_id: String,
    token: CancellationToken,
    tracker: TaskTracker,
}

/// Drives one target sign at a time: camera → detector → comparison ticks →
/// feedback, until success, a terminal error, or `stop`.
#[derive(Clone)]
pub struct PracticeController {
    state: Arc<Mutex<PracticeState>>,
    state_tx: Arc<watch::Sender<PracticeState>>,
    camera: Arc<Mutex<CameraDriver>>,
    service: Arc<dyn ComparisonService>,
    events: Arc<dyn EventSink>,
    history: Option<Database>,
    config: PracticeConfig,
    user_id: String,
    active: Arc<Mutex<Option<ActiveRun>>>,
}

impl PracticeController {
    pub fn new(
        camera: CameraDriver,
        service: Arc<dyn ComparisonService>,
        events: Arc<dyn EventSink>,
        config: PracticeConfig,
        user_id: impl Into<String>,
    ) -> Self {
        let (state_tx, _) = watch::channel(PracticeState::new());
        Self {
            state: Arc::new(Mutex::new(PracticeState::new())),
            state_tx: Arc::new(state_tx),
            camera: Arc::new(Mutex::new(camera)),
            service,
            events,
            history: None,
            config,
            user_id: user_id.into(),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Record every scored tick in the local history store.
    pub fn with_history(mut self, db: Database) -> Self {
        self.history = Some(db);
        self
    }

    pub async fn snapshot(&self) -> PracticeState {
        self.state.lock().await.clone()
    }

    pub fn watch(&self) -> watch::Receiver<PracticeState> {
        self.state_tx.subscribe()
    }

    pub async fn live_tracks(&self) -> usize {
        self.camera.lock().await.live_tracks()
    }

    /// Opens the camera, binds the detector and begins comparing against
    /// `target_sign`. `on_success` runs at most once, after the success display
    /// delay, and never after `stop` has returned.
    ///
    /// Camera and detector failures leave the controller in `Error` with the
    /// camera released; call `try_again` before starting another run. A `stop`
    /// issued while the camera or detector is still coming up cuts the start
    /// short with `Cancelled`.
    pub async fn start<F>(
        &self,
        target_sign: &str,
        session_id: Option<String>,
        on_success: F,
    ) -> Result<PracticeState, PracticeError>
    where
        F: FnOnce(SuccessReport) + Send + 'static,
    {
        let run_id = Uuid::new_v4().to_string();
        let token = CancellationToken::new();
        let tracker = TaskTracker::new();
        {
            let mut active = self.active.lock().await;
            let state = self.state.lock().await;
            if active.is_some() || state.status != DetectionStatus::Idle {
                return Err(PracticeError::AlreadyActive);
            }
            *active = Some(ActiveRun {
                run_id: run_id.clone(),
                token: token.clone(),
                tracker: tracker.clone(),
            });
        }

        let opened = {
            let mut camera = self.camera.lock().await;
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(PracticeError::Cancelled),
                result = open_feed(&mut camera) => result,
            };
            if result.is_err() {
                camera.stop_camera().await;
            }
            result
        };

        let feed = match opened {
            Ok(feed) => feed,
            Err(err) => {
                {
                    let mut state = self.state.lock().await;
                    if token.is_cancelled() {
                        log_info!("practice for '{target_sign}' stopped while starting");
                        return Err(PracticeError::Cancelled);
                    }
                    log_error!("practice for '{target_sign}' could not start: {err}");
                    state.fail(&err);
                    state.target_sign = Some(target_sign.to_string());
                    publish(self.events.as_ref(), &self.state_tx, &state);
                }
                self.release(&run_id).await;
                return Err(err);
            }
        };

        let mut state = self.state.lock().await;
        if token.is_cancelled() {
            drop(state);
            self.camera.lock().await.stop_camera().await;
            log_info!("practice for '{target_sign}' stopped while starting");
            return Err(PracticeError::Cancelled);
        }
        state.begin(run_id.clone(), target_sign.to_string(), Utc::now());
        publish(self.events.as_ref(), &self.state_tx, &state);

        let ctx = RunContext {
            state: self.state.clone(),
            state_tx: self.state_tx.clone(),
            camera: self.camera.clone(),
            service: self.service.clone(),
            events: self.events.clone(),
            history: self.history.clone(),
            config: self.config.clone(),
            user_id: self.user_id.clone(),
            run_id: run_id.clone(),
            target_sign: target_sign.to_string(),
            session_id,
        };
        tracker.spawn(comparison_loop(
            ctx,
            feed,
            token,
            tracker.clone(),
            Box::new(on_success),
        ));

        log_info!("practice run {run_id} started for '{target_sign}'");
        Ok(state.clone())
    }

    /// Cancels the ticker, any in-flight comparison and the frame loop, waits
    /// for all of them, releases the camera and resets to `Idle`. Idempotent.
    pub async fn stop(&self) {
        let run = self.active.lock().await.take();
        if let Some(run) = run {
            run.token.cancel();
            run.tracker.close();
            run.tracker.wait().await;
        }

        self.camera.lock().await.stop_camera().await;

        let mut state = self.state.lock().await;
        if state.status != DetectionStatus::Idle {
            if let Some(run_id) = &state.run_id {
                log_info!("practice run {run_id} reset");
            }
            state.reset();
            publish(self.events.as_ref(), &self.state_tx, &state);
        }
    }

    /// Leaves `Success` or `Error` for `Idle` so the next run can start.
    pub async fn try_again(&self) {
        self.stop().await;
    }

    /// Forgets a run that never got going, unless `stop` already took it.
    async fn release(&self, run_id: &str) {
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|run| run.run_id == run_id) {
            *active = None;
        }
    }
}

async fn open_feed(camera: &mut CameraDriver) -> Result<DetectionFeed, PracticeError> {
    camera.start_preview().await?;
    camera.start_detection().await
}

fn publish(events: &dyn EventSink, state_tx: &watch::Sender<PracticeState>, state: &PracticeState) {
    events.emit(PracticeEvent::PracticeStateChanged(state.clone()));
    state_tx.send_replace(state.clone());
}

/// Clears the in-flight flag when a comparison task finishes or is cancelled.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
struct RunContext {
    state: Arc<Mutex<PracticeState>>,
    state_tx: Arc<watch::Sender<PracticeState>>,
    camera: Arc<Mutex<CameraDriver>>,
    service: Arc<dyn ComparisonService>,
    events: Arc<dyn EventSink>,
    history: Option<Database>,
    config: PracticeConfig,
    user_id: String,
    run_id: String,
    target_sign: String,
    session_id: Option<String>,
}

impl RunContext {
    fn owns(&self, state: &PracticeState) -> bool {
        state.run_id.as_deref() == Some(self.run_id.as_str())
    }

    fn publish(&self, state: &PracticeState) {
        publish(self.events.as_ref(), &self.state_tx, state);
    }

    async fn show_no_hand(&self) {
        let mut state = self.state.lock().await;
        if self.owns(&state) && state.is_detecting() && state.band != Some(FeedbackBand::PositionHand) {
            state.show_no_hand();
            self.publish(&state);
        }
    }

    async fn record_dropped_tick(&self) {
        let mut state = self.state.lock().await;
        if self.owns(&state) {
            state.record_dropped_tick();
        }
    }

    async fn fail(&self, err: PracticeError) {
        log_error!("practice run {} failed: {err}", self.run_id);
        {
            let mut state = self.state.lock().await;
            if self.owns(&state) {
                state.fail(&err);
                self.publish(&state);
            }
        }
        self.camera.lock().await.stop_camera().await;
    }

    async fn record(&self, request: GestureComparisonRequest, response: &GestureComparisonResponse, matched: bool) {
        self.events.emit(PracticeEvent::GestureScored(GestureRecognitionResult {
            detected: matched,
            confidence: response.confidence,
            gesture: request.target_gesture.clone(),
            landmarks: request.landmarks,
        }));

        let Some(db) = &self.history else {
            return;
        };
        let result = PracticeResult {
            id: Uuid::new_v4().to_string(),
            session_id: self.session_id.clone(),
            run_id: self.run_id.clone(),
            user_id: self.user_id.clone(),
            sign: request.target_gesture,
            confidence: response.confidence,
            is_match: matched,
            source: response.source,
            created_at: Utc::now(),
        };
        if let Err(err) = db.insert_practice_result(&result).await {
            log_warn!("failed to record practice result: {err}");
        }
    }
}

async fn comparison_loop(
    ctx: RunContext,
    feed: DetectionFeed,
    token: CancellationToken,
    tracker: TaskTracker,
    on_success: SuccessHook,
) {
    let DetectionFeed {
        latest,
        mut failures,
    } = feed;
    let comparing = token.child_token();
    let in_flight = Arc::new(AtomicBool::new(false));
    let (success_tx, mut success_rx) = mpsc::channel::<(f64, Vec<Landmark>)>(1);
    let mut on_success = Some(on_success);
    let mut failures_open = true;

    let mut ticker = time::interval(ctx.config.comparison_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                log_info!("comparison loop for run {} cancelled", ctx.run_id);
                return;
            }
            failure = failures.recv(), if failures_open => {
                match failure {
                    Some(err) => {
                        comparing.cancel();
                        ctx.fail(err).await;
                        return;
                    }
                    None => failures_open = false,
                }
            }
            Some((confidence, landmarks)) = success_rx.recv() => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = time::sleep(ctx.config.success_display()) => {}
                }
                if let Some(hook) = on_success.take() {
                    log_info!("'{}' matched in run {}", ctx.target_sign, ctx.run_id);
                    hook(SuccessReport {
                        run_id: ctx.run_id.clone(),
                        target_sign: ctx.target_sign.clone(),
                        confidence,
                        landmarks,
                    });
                }
                return;
            }
            _ = ticker.tick(), if !comparing.is_cancelled() => {
                let hand = latest.borrow().clone();
                match hand {
                    None => ctx.show_no_hand().await,
                    Some(hand) => {
                        if in_flight.swap(true, Ordering::AcqRel) {
                            log_debug!("comparison still in flight; dropping tick");
                            ctx.record_dropped_tick().await;
                        } else {
                            let guard = InFlightGuard(in_flight.clone());
                            if !comparing.is_cancelled() {
                                tracker.spawn(compare_once(
                                    ctx.clone(),
                                    hand,
                                    comparing.clone(),
                                    guard,
                                    success_tx.clone(),
                                ));
                            }
                        }
                    }
                }
            }
        }
    }
}

async fn compare_once(
    ctx: RunContext,
    hand: HandLandmarks,
    comparing: CancellationToken,
    guard: InFlightGuard,
    success_tx: mpsc::Sender<(f64, Vec<Landmark>)>,
) {
    let request = GestureComparisonRequest {
        landmarks: hand.landmarks,
        target_gesture: ctx.target_sign.clone(),
        user_id: ctx.user_id.clone(),
    };

    let outcome = tokio::select! {
        biased;
        _ = comparing.cancelled() => return,
        outcome = ctx.service.compare(&request) => outcome,
    };

    let (response, matched) = {
        let mut state = ctx.state.lock().await;
        if comparing.is_cancelled() || !ctx.owns(&state) {
            return;
        }
        match outcome {
            Ok(response) => {
                let matched = state.apply_score(response.confidence, ctx.config.confidence_threshold);
                ctx.publish(&state);
                if matched {
                    comparing.cancel();
                    let _ = success_tx.try_send((response.confidence, request.landmarks.clone()));
                }
                (response, matched)
            }
            Err(err) => {
                log_warn!("comparison unavailable for '{}': {err}", ctx.target_sign);
                state.show_service_unavailable(&err);
                ctx.publish(&state);
                return;
            }
        }
    };
    drop(guard);

    ctx.record(request, &response, matched).await;
}
