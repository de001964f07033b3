pub mod practice_result;
pub mod practice_session;

pub use practice_result::PracticeResult;
pub use practice_session::{PracticeSessionRecord, SessionStatus};
