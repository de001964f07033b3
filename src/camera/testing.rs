//! In-process camera and detector doubles shared by the crate's tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Instant,
};

use image::RgbImage;

use crate::{
    config::DetectorConfig,
    error::PracticeError,
    models::{HandLandmarks, Handedness, Landmark, LANDMARKS_PER_HAND},
};

use super::{
    detector::{DetectorLoader, HandDetector},
    stream::{CameraSource, MediaStream, StreamMetadata, VideoConstraints, VideoFrame},
};

pub fn sample_hand() -> HandLandmarks {
    let landmarks = (0..LANDMARKS_PER_HAND)
        .map(|i| Landmark::new(0.4 + i as f32 * 0.01, 0.5 - i as f32 * 0.01, -0.02))
        .collect();
    HandLandmarks::new(Handedness::Right, landmarks)
}

#[derive(Debug, Clone, Copy)]
pub enum OpenFailure {
    PermissionDenied,
    DeviceNotFound,
    DeviceBusy,
    UnsupportedConstraints,
}

impl From<OpenFailure> for PracticeError {
    fn from(failure: OpenFailure) -> Self {
        match failure {
            OpenFailure::PermissionDenied => PracticeError::PermissionDenied,
            OpenFailure::DeviceNotFound => PracticeError::DeviceNotFound,
            OpenFailure::DeviceBusy => PracticeError::DeviceBusy,
            OpenFailure::UnsupportedConstraints => PracticeError::UnsupportedConstraints,
        }
    }
}

pub struct FakeCamera {
    failures: Mutex<VecDeque<OpenFailure>>,
    attempts: AtomicUsize,
    live: Arc<AtomicUsize>,
    last_constraints: Mutex<Option<VideoConstraints>>,
    reports_metadata: bool,
}

impl FakeCamera {
    pub fn working() -> Self {
        Self::failing(Vec::new())
    }

    /// Fails the first opens in order, then succeeds.
    pub fn failing(failures: Vec<OpenFailure>) -> Self {
        Self {
            failures: Mutex::new(failures.into()),
            attempts: AtomicUsize::new(0),
            live: Arc::new(AtomicUsize::new(0)),
            last_constraints: Mutex::new(None),
            reports_metadata: true,
        }
    }

    /// Never reports metadata, so `start_preview` waits out its full timeout.
    pub fn without_metadata() -> Self {
        Self {
            reports_metadata: false,
            ..Self::working()
        }
    }

    pub fn open_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn live_tracks(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn last_constraints(&self) -> Option<VideoConstraints> {
        *self.last_constraints.lock().unwrap()
    }
}

impl CameraSource for FakeCamera {
    fn open(&self, constraints: &VideoConstraints) -> Result<Box<dyn MediaStream>, PracticeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        *self.last_constraints.lock().unwrap() = Some(*constraints);
        if let Some(failure) = self.failures.lock().unwrap().pop_front() {
            return Err(failure.into());
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            live: self.live.clone(),
            stopped: false,
            sequence: 0,
            image: Arc::new(RgbImage::new(4, 3)),
            reports_metadata: self.reports_metadata,
        }))
    }
}

struct FakeStream {
    live: Arc<AtomicUsize>,
    stopped: bool,
    sequence: u64,
    image: Arc<RgbImage>,
    reports_metadata: bool,
}

impl MediaStream for FakeStream {
    fn id(&self) -> &str {
        "fake-stream"
    }

    fn metadata(&self) -> Option<StreamMetadata> {
        self.reports_metadata.then_some(StreamMetadata {
            width: 640,
            height: 480,
            frame_rate: 100,
        })
    }

    fn read_frame(&mut self) -> Result<Option<VideoFrame>, PracticeError> {
        if self.stopped {
            return Err(PracticeError::StreamFailure("stream stopped".into()));
        }
        self.sequence += 1;
        Ok(Some(VideoFrame {
            sequence: self.sequence,
            captured_at: Instant::now(),
            image: self.image.clone(),
        }))
    }

    fn stop_tracks(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn live_tracks(&self) -> usize {
        usize::from(!self.stopped)
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

#[derive(Clone)]
pub struct FakeLoader {
    hand: Option<HandLandmarks>,
    fail_detect: bool,
    failing_loads: Arc<AtomicUsize>,
    loads: Arc<AtomicUsize>,
    detect_calls: Arc<AtomicUsize>,
}

impl FakeLoader {
    pub fn with_hand(hand: HandLandmarks) -> Self {
        Self {
            hand: Some(hand),
            fail_detect: false,
            failing_loads: Arc::new(AtomicUsize::new(0)),
            loads: Arc::new(AtomicUsize::new(0)),
            detect_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn no_hands() -> Self {
        Self {
            hand: None,
            ..Self::with_hand(sample_hand())
        }
    }

    pub fn failing_detect() -> Self {
        Self {
            fail_detect: true,
            ..Self::with_hand(sample_hand())
        }
    }

    /// Fails the first `times` loads, then loads normally.
    pub fn failing_load(times: usize) -> Self {
        Self {
            failing_loads: Arc::new(AtomicUsize::new(times)),
            ..Self::with_hand(sample_hand())
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }
}

impl DetectorLoader for FakeLoader {
    fn load(&self, _config: &DetectorConfig) -> Result<Box<dyn HandDetector>, PracticeError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_loads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PracticeError::DetectorLoadFailure("model download failed".into()));
        }
        Ok(Box::new(FakeDetector {
            hand: self.hand.clone(),
            fail: self.fail_detect,
            calls: self.detect_calls.clone(),
        }))
    }
}

struct FakeDetector {
    hand: Option<HandLandmarks>,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl HandDetector for FakeDetector {
    fn detect(&mut self, _frame: &VideoFrame) -> Result<Vec<HandLandmarks>, PracticeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PracticeError::StreamFailure("detector crashed".into()));
        }
        Ok(self.hand.iter().cloned().collect())
    }
}
