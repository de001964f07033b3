use std::{sync::Arc, time::Instant};

use image::RgbImage;

use crate::error::PracticeError;

/// Requested capture format. `None` lets the device pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub user_facing: bool,
}

impl VideoConstraints {
    /// 640x480 front camera, video only.
    pub fn preferred() -> Self {
        Self {
            width: Some(640),
            height: Some(480),
            user_facing: true,
        }
    }

    /// Any resolution, any facing mode.
    pub fn relaxed() -> Self {
        Self {
            width: None,
            height: None,
            user_facing: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamMetadata {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub sequence: u64,
    pub captured_at: Instant,
    pub image: Arc<RgbImage>,
}

/// Source of camera streams (the platform's media-devices API).
///
/// Opening may block on a permission prompt, so callers run it on the
/// blocking pool.
pub trait CameraSource: Send + Sync {
    fn open(&self, constraints: &VideoConstraints) -> Result<Box<dyn MediaStream>, PracticeError>;
}

/// A live video stream with one or more tracks. Dropping a stream must
/// release its tracks.
pub trait MediaStream: Send {
    fn id(&self) -> &str;

    /// `Some` once the first frame's dimensions are known.
    fn metadata(&self) -> Option<StreamMetadata>;

    /// Grab the most recent frame. `Ok(None)` means no new frame yet.
    fn read_frame(&mut self) -> Result<Option<VideoFrame>, PracticeError>;

    /// Stop every track. Must be safe to call repeatedly.
    fn stop_tracks(&mut self);

    fn live_tracks(&self) -> usize;
}
