pub mod detector;
pub mod driver;
pub mod replay;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use detector::{DetectorHandle, DetectorLoader, HandDetector, SharedDetector};
pub use driver::{CameraDriver, CameraPhase, DetectionFeed, DetectionSubscription};
pub use replay::{LandmarkRecording, ReplayCamera, ReplayDetectorLoader};
pub use stream::{CameraSource, MediaStream, StreamMetadata, VideoConstraints, VideoFrame};
