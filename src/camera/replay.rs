//! Drive the practice flow from a recorded landmark file instead of a webcam.
//!
//! A recording is JSON:
//!
//! ```json
//! { "frameRate": 30, "width": 640, "height": 480,
//!   "frames": [ { "hands": [ { "handedness": "right", "landmarks": [[0.5, 0.5, 0.0], ...] } ] } ] }
//! ```
//!
//! The same recording backs both the camera (blank frames at the recorded
//! rate) and the detector (hands looked up by frame sequence), looping at the end.

use std::{
    path::Path,
    sync::Arc,
    time::Instant,
};

use anyhow::{Context, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::DetectorConfig, error::PracticeError, models::HandLandmarks};

use super::{
    detector::{DetectorLoader, HandDetector},
    stream::{CameraSource, MediaStream, StreamMetadata, VideoConstraints, VideoFrame},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedFrame {
    #[serde(default)]
    pub hands: Vec<HandLandmarks>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkRecording {
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    pub frames: Vec<RecordedFrame>,
}

fn default_frame_rate() -> u32 {
    30
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

impl LandmarkRecording {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recording {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("failed to parse recording {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let recording: Self = serde_json::from_str(contents)?;
        Ok(recording)
    }

    fn hands_at(&self, sequence: u64) -> Vec<HandLandmarks> {
        if self.frames.is_empty() {
            return Vec::new();
        }
        let index = (sequence % self.frames.len() as u64) as usize;
        self.frames[index].hands.clone()
    }
}

#[derive(Clone)]
pub struct ReplayCamera {
    recording: Arc<LandmarkRecording>,
}

impl ReplayCamera {
    pub fn new(recording: Arc<LandmarkRecording>) -> Self {
        Self { recording }
    }
}

impl CameraSource for ReplayCamera {
    fn open(&self, constraints: &VideoConstraints) -> Result<Box<dyn MediaStream>, PracticeError> {
        if self.recording.frames.is_empty() {
            return Err(PracticeError::DeviceNotFound);
        }
        let width = constraints.width.unwrap_or(self.recording.width);
        let height = constraints.height.unwrap_or(self.recording.height);
        Ok(Box::new(ReplayStream {
            id: Uuid::new_v4().to_string(),
            metadata: StreamMetadata {
                width,
                height,
                frame_rate: self.recording.frame_rate,
            },
            blank: Arc::new(RgbImage::new(width, height)),
            next_sequence: 0,
            live: true,
        }))
    }
}

struct ReplayStream {
    id: String,
    metadata: StreamMetadata,
    blank: Arc<RgbImage>,
    next_sequence: u64,
    live: bool,
}

impl MediaStream for ReplayStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> Option<StreamMetadata> {
        Some(self.metadata)
    }

    fn read_frame(&mut self) -> Result<Option<VideoFrame>, PracticeError> {
        if !self.live {
            return Err(PracticeError::StreamFailure("replay stream stopped".into()));
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Ok(Some(VideoFrame {
            sequence,
            captured_at: Instant::now(),
            image: self.blank.clone(),
        }))
    }

    fn stop_tracks(&mut self) {
        self.live = false;
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.live)
    }
}

#[derive(Clone)]
pub struct ReplayDetectorLoader {
    recording: Arc<LandmarkRecording>,
}

impl ReplayDetectorLoader {
    pub fn new(recording: Arc<LandmarkRecording>) -> Self {
        Self { recording }
    }
}

impl DetectorLoader for ReplayDetectorLoader {
    fn load(&self, config: &DetectorConfig) -> Result<Box<dyn HandDetector>, PracticeError> {
        Ok(Box::new(ReplayDetector {
            recording: self.recording.clone(),
            max_hands: config.max_num_hands.max(1) as usize,
        }))
    }
}

struct ReplayDetector {
    recording: Arc<LandmarkRecording>,
    max_hands: usize,
}

impl HandDetector for ReplayDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<HandLandmarks>, PracticeError> {
        let mut hands = self.recording.hands_at(frame.sequence);
        hands.truncate(self.max_hands);
        Ok(hands)
    }
}
