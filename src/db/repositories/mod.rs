pub mod practice_results;
pub mod practice_sessions;
