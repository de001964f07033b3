pub mod client;
pub mod controller;
pub mod feedback;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ComparisonService, FallbackComparison, GestureApiClient, FALLBACK_CONFIDENCE_FLOOR};
pub use controller::{PracticeController, SuccessReport};
pub use feedback::FeedbackBand;
pub use state::{DetectionStatus, PracticeState};
