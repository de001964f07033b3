//! Multi-sign practice sessions.

pub mod runner;
pub mod session;

pub use runner::{GestureLibrary, SessionCommand, SessionHandle, SessionRunner};
pub use session::{PracticeSession, SessionSummary, SignOutcome, SignResult};
