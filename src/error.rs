//! Error taxonomy for the practice flow.
//!
//! Camera and detector failures are terminal for the current practice run and
//! carry a specific message the learner can act on. Data-layer and comparison
//! failures are normally absorbed by their fallback policies and only reach
//! this type when a caller asks for the raw result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PracticeError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera device found")]
    DeviceNotFound,
    #[error("camera is in use by another application")]
    DeviceBusy,
    #[error("camera does not support the requested constraints")]
    UnsupportedConstraints,
    #[error("hand detector is still loading")]
    DetectorNotLoaded,
    #[error("hand detector failed to load: {0}")]
    DetectorLoadFailure(String),
    #[error("camera stream failed: {0}")]
    StreamFailure(String),
    #[error("network request failed: {0}")]
    NetworkFailure(String),
    #[error("no practice gestures registered for '{0}'")]
    DataNotFound(String),
    #[error("a practice run is already active")]
    AlreadyActive,
    #[error("practice was stopped before it started")]
    Cancelled,
}

/// Serializable discriminant so UI layers can branch without parsing messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PracticeErrorKind {
    PermissionDenied,
    DeviceNotFound,
    DeviceBusy,
    UnsupportedConstraints,
    DetectorNotLoaded,
    DetectorLoadFailure,
    StreamFailure,
    NetworkFailure,
    DataNotFound,
    AlreadyActive,
    Cancelled,
}

impl PracticeError {
    pub fn kind(&self) -> PracticeErrorKind {
        match self {
            PracticeError::PermissionDenied => PracticeErrorKind::PermissionDenied,
            PracticeError::DeviceNotFound => PracticeErrorKind::DeviceNotFound,
            PracticeError::DeviceBusy => PracticeErrorKind::DeviceBusy,
            PracticeError::UnsupportedConstraints => PracticeErrorKind::UnsupportedConstraints,
            PracticeError::DetectorNotLoaded => PracticeErrorKind::DetectorNotLoaded,
            PracticeError::DetectorLoadFailure(_) => PracticeErrorKind::DetectorLoadFailure,
            PracticeError::StreamFailure(_) => PracticeErrorKind::StreamFailure,
            PracticeError::NetworkFailure(_) => PracticeErrorKind::NetworkFailure,
            PracticeError::DataNotFound(_) => PracticeErrorKind::DataNotFound,
            PracticeError::AlreadyActive => PracticeErrorKind::AlreadyActive,
            PracticeError::Cancelled => PracticeErrorKind::Cancelled,
        }
    }

    /// Message shown in the feedback panel when this error ends a run.
    pub fn user_message(&self) -> String {
        match self {
            PracticeError::PermissionDenied => {
                "Camera permission was denied. Allow camera access in your browser or system settings and try again.".into()
            }
            PracticeError::DeviceNotFound => {
                "No camera was found. Connect a webcam and try again.".into()
            }
            PracticeError::DeviceBusy => {
                "Your camera is being used by another application. Close it and try again.".into()
            }
            PracticeError::UnsupportedConstraints => {
                "Your camera does not support the required video settings.".into()
            }
            PracticeError::DetectorNotLoaded => {
                "Hand tracking is still loading. Please wait a moment.".into()
            }
            PracticeError::DetectorLoadFailure(_) => {
                "Hand tracking failed to load. Check your connection and try again.".into()
            }
            PracticeError::StreamFailure(_) => {
                "The camera stream stopped unexpectedly. Try again.".into()
            }
            PracticeError::NetworkFailure(_) => {
                "Unable to reach the gesture recognition service.".into()
            }
            PracticeError::DataNotFound(sign) => {
                format!("No gestures found for \"{sign}\" yet.")
            }
            PracticeError::AlreadyActive => "Practice is already running.".into(),
            PracticeError::Cancelled => "Practice was stopped.".into(),
        }
    }

    /// Camera and detector errors end the run and need an explicit retry.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PracticeError::PermissionDenied
                | PracticeError::DeviceNotFound
                | PracticeError::DeviceBusy
                | PracticeError::UnsupportedConstraints
                | PracticeError::DetectorLoadFailure(_)
                | PracticeError::StreamFailure(_)
        )
    }
}
