mod connection;
pub mod helpers;
mod migrations;
pub mod models;
pub mod repositories;

pub use connection::Database;
pub use models::{PracticeResult, PracticeSessionRecord, SessionStatus};

#[cfg(test)]
pub(crate) use connection::temp_database;
