use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, Duration, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{error::PracticeError, models::HandLandmarks};

use super::{
    detector::{DetectorHandle, SharedDetector},
    stream::{CameraSource, MediaStream, StreamMetadata, VideoConstraints},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

const DEFAULT_FRAME_RATE: u32 = 30;
const METADATA_POLL_MS: u64 = 25;

type SharedStream = Arc<Mutex<Box<dyn MediaStream>>>;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CameraPhase {
    Off,
    Preview,
    Detecting,
}

/// Output of an active detection loop.
pub struct DetectionFeed {
    /// First detected hand of the most recent frame, `None` when no hand is in view.
    pub latest: watch::Receiver<Option<HandLandmarks>>,
    /// Receives at most one fatal camera/detector error, then closes.
    pub failures: mpsc::Receiver<PracticeError>,
}

/// Handle on a running frame loop. Dropping it without `unsubscribe` still
/// cancels the loop, but only `unsubscribe` waits for it to finish.
pub struct DetectionSubscription {
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl DetectionSubscription {
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub async fn unsubscribe(&mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                log_error!("frame loop task failed to join: {err}");
            }
        }
    }
}

impl Drop for DetectionSubscription {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

pub struct CameraDriver {
    source: Arc<dyn CameraSource>,
    detector: DetectorHandle,
    metadata_timeout: Duration,
    stream: Option<SharedStream>,
    metadata: Option<StreamMetadata>,
    subscription: Option<DetectionSubscription>,
}

impl CameraDriver {
    pub fn new(
        source: Arc<dyn CameraSource>,
        detector: DetectorHandle,
        metadata_timeout: Duration,
    ) -> Self {
        Self {
            source,
            detector,
            metadata_timeout,
            stream: None,
            metadata: None,
            subscription: None,
        }
    }

    pub fn phase(&self) -> CameraPhase {
        match (&self.stream, &self.subscription) {
            (None, _) => CameraPhase::Off,
            (Some(_), Some(sub)) if sub.is_active() => CameraPhase::Detecting,
            (Some(_), _) => CameraPhase::Preview,
        }
    }

    pub fn live_tracks(&self) -> usize {
        self.stream
            .as_ref()
            .map(|stream| lock_stream(stream).live_tracks())
            .unwrap_or(0)
    }

    pub fn metadata(&self) -> Option<StreamMetadata> {
        self.metadata
    }

    /// Open the camera and wait (bounded) for its first metadata.
    pub async fn start_preview(&mut self) -> Result<(), PracticeError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = match self.open(VideoConstraints::preferred()).await {
            Err(PracticeError::UnsupportedConstraints) => {
                log_warn!("camera rejected preferred constraints; retrying relaxed");
                self.open(VideoConstraints::relaxed()).await?
            }
            other => other?,
        };

        // Owned by the driver before the wait so `stop_camera` always sees it.
        let stream: SharedStream = Arc::new(Mutex::new(stream));
        self.stream = Some(stream.clone());
        self.metadata = None;

        match time::timeout(self.metadata_timeout, wait_for_metadata(stream)).await {
            Ok(metadata) => {
                log_info!(
                    "camera preview ready: {}x{} @ {}fps",
                    metadata.width,
                    metadata.height,
                    metadata.frame_rate
                );
                self.metadata = Some(metadata);
            }
            Err(_) => {
                log_warn!(
                    "camera metadata not ready after {}ms; continuing",
                    self.metadata_timeout.as_millis()
                );
            }
        }
        Ok(())
    }

    /// Bind the detector to the preview stream.
    ///
    /// Waits for the shared detector when it is still loading rather than
    /// failing; a load failure is returned as `DetectorLoadFailure`.
    pub async fn start_detection(&mut self) -> Result<DetectionFeed, PracticeError> {
        let stream = self
            .stream
            .clone()
            .ok_or_else(|| PracticeError::StreamFailure("camera preview not started".into()))?;

        if self.subscription.as_ref().is_some_and(|sub| sub.is_active()) {
            return Err(PracticeError::AlreadyActive);
        }

        let detector = match self.detector.get() {
            Ok(detector) => detector,
            Err(PracticeError::DetectorNotLoaded) => {
                log_info!("hand detector still loading; waiting");
                self.detector.ready().await?
            }
            Err(err) => return Err(err),
        };

        let frame_rate = self
            .metadata
            .map(|m| m.frame_rate)
            .filter(|rate| *rate > 0)
            .unwrap_or(DEFAULT_FRAME_RATE);
        let frame_interval = Duration::from_millis(1000 / u64::from(frame_rate)).max(Duration::from_millis(1));

        let (latest_tx, latest_rx) = watch::channel(None);
        let (failure_tx, failure_rx) = mpsc::channel(1);
        let cancel_token = CancellationToken::new();

        let handle = tokio::spawn(frame_loop(
            stream,
            detector,
            latest_tx,
            failure_tx,
            cancel_token.clone(),
            frame_interval,
        ));

        self.subscription = Some(DetectionSubscription {
            cancel_token,
            handle: Some(handle),
        });

        Ok(DetectionFeed {
            latest: latest_rx,
            failures: failure_rx,
        })
    }

    /// Stop detection, then release every track. Safe to call in any phase.
    pub async fn stop_camera(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe().await;
        }

        if let Some(stream) = self.stream.take() {
            let mut guard = lock_stream(&stream);
            guard.stop_tracks();
            log_info!("camera stream {} stopped", guard.id());
        }
        self.metadata = None;
    }

    async fn open(&self, constraints: VideoConstraints) -> Result<Box<dyn MediaStream>, PracticeError> {
        let source = self.source.clone();
        tokio::task::spawn_blocking(move || source.open(&constraints))
            .await
            .map_err(|err| PracticeError::StreamFailure(format!("camera open task failed: {err}")))?
    }
}

impl Drop for CameraDriver {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            drop(subscription);
        }
        if let Some(stream) = self.stream.take() {
            lock_stream(&stream).stop_tracks();
        }
    }
}

fn lock_stream(stream: &Mutex<Box<dyn MediaStream>>) -> MutexGuard<'_, Box<dyn MediaStream>> {
    match stream.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

async fn wait_for_metadata(stream: SharedStream) -> StreamMetadata {
    loop {
        if let Some(metadata) = lock_stream(&stream).metadata() {
            return metadata;
        }
        time::sleep(Duration::from_millis(METADATA_POLL_MS)).await;
    }
}

enum FrameOutcome {
    NoFrame,
    Hands(Vec<HandLandmarks>),
}

fn process_frame(stream: &SharedStream, detector: &SharedDetector) -> Result<FrameOutcome, PracticeError> {
    let frame = match lock_stream(stream).read_frame()? {
        Some(frame) => frame,
        None => return Ok(FrameOutcome::NoFrame),
    };

    let mut detector = match detector.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    detector.detect(&frame).map(FrameOutcome::Hands)
}

async fn frame_loop(
    stream: SharedStream,
    detector: SharedDetector,
    latest_tx: watch::Sender<Option<HandLandmarks>>,
    failure_tx: mpsc::Sender<PracticeError>,
    cancel_token: CancellationToken,
    frame_interval: Duration,
) {
    let mut ticker = time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("frame loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let result = tokio::task::spawn_blocking({
                    let stream = stream.clone();
                    let detector = detector.clone();
                    move || process_frame(&stream, &detector)
                })
                .await;

                // Nothing is published once stop has been requested.
                if cancel_token.is_cancelled() {
                    break;
                }

                match result {
                    Ok(Ok(FrameOutcome::NoFrame)) => {}
                    Ok(Ok(FrameOutcome::Hands(hands))) => {
                        if let Some(hand) = hands.first() {
                            if !hand.is_complete() {
                                log_debug!(
                                    "detector returned {} landmarks for {} hand",
                                    hand.landmarks.len(),
                                    hand.handedness.as_str()
                                );
                            }
                        }
                        latest_tx.send_replace(hands.into_iter().next());
                    }
                    Ok(Err(err)) => {
                        log_error!("frame processing failed: {err}");
                        let _ = failure_tx.try_send(err);
                        break;
                    }
                    Err(join_err) => {
                        log_error!("frame worker join failed: {join_err}");
                        let _ = failure_tx.try_send(PracticeError::StreamFailure(join_err.to_string()));
                        break;
                    }
                }
            }
        }
    }
}
