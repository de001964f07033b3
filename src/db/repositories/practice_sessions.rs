use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_optional_datetime, parse_status, to_i64, to_u32, to_u64},
    models::{PracticeSessionRecord, SessionStatus},
};

const SESSION_COLUMNS: &str = "id, user_id, signs, status, signs_completed, signs_skipped, xp_earned, started_at, ended_at, created_at, updated_at";

fn row_to_session(row: &Row) -> Result<PracticeSessionRecord> {
    let signs: String = row.get("signs")?;
    let status: String = row.get("status")?;
    let signs_completed: i64 = row.get("signs_completed")?;
    let signs_skipped: i64 = row.get("signs_skipped")?;
    let xp_earned: i64 = row.get("xp_earned")?;
    let started_at: String = row.get("started_at")?;
    let ended_at: Option<String> = row.get("ended_at")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(PracticeSessionRecord {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        signs: serde_json::from_str(&signs).context("failed to parse signs")?,
        status: parse_status(&status)?,
        signs_completed: to_u32(signs_completed, "signs_completed")?,
        signs_skipped: to_u32(signs_skipped, "signs_skipped")?,
        xp_earned: to_u64(xp_earned, "xp_earned")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        ended_at: parse_optional_datetime(ended_at, "ended_at")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    pub async fn insert_practice_session(&self, session: &PracticeSessionRecord) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO practice_sessions (id, user_id, signs, status, signs_completed, signs_skipped, xp_earned, started_at, ended_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.id,
                    record.user_id,
                    serde_json::to_string(&record.signs)?,
                    record.status.as_str(),
                    record.signs_completed,
                    record.signs_skipped,
                    to_i64(record.xp_earned)?,
                    record.started_at.to_rfc3339(),
                    record.ended_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert practice session")?;
            Ok(())
        })
        .await
    }

    pub async fn update_practice_session_progress(
        &self,
        session_id: &str,
        signs_completed: u32,
        signs_skipped: u32,
        xp_earned: u64,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE practice_sessions
                 SET signs_completed = ?1,
                     signs_skipped = ?2,
                     xp_earned = ?3,
                     updated_at = ?4
                 WHERE id = ?5",
                params![
                    signs_completed,
                    signs_skipped,
                    to_i64(xp_earned)?,
                    updated_at.to_rfc3339(),
                    session_id,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn mark_practice_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
        ended_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE practice_sessions
                 SET status = ?1,
                     ended_at = ?2,
                     updated_at = ?3
                 WHERE id = ?4",
                params![
                    status.as_str(),
                    ended_at.map(|dt| dt.to_rfc3339()),
                    updated_at.to_rfc3339(),
                    session_id,
                ],
            )?;
            if rows_affected == 0 {
                return Err(anyhow!("practice session {session_id} not found"));
            }
            Ok(())
        })
        .await
    }

    pub async fn get_practice_session(&self, session_id: &str) -> Result<Option<PracticeSessionRecord>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM practice_sessions WHERE id = ?1"
            ))?;
            let session = stmt
                .query_row(params![session_id], |row| Ok(row_to_session(row)))
                .optional()?
                .transpose()?;
            Ok(session)
        })
        .await
    }

    /// Sessions still marked `Running`, newest first.
    pub async fn get_incomplete_practice_sessions(&self) -> Result<Vec<PracticeSessionRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS}
                 FROM practice_sessions
                 WHERE status = 'Running'
                 ORDER BY started_at DESC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }

    pub async fn mark_practice_session_interrupted(
        &self,
        session_id: &str,
        stopped_at: DateTime<Utc>,
    ) -> Result<()> {
        self.mark_practice_session_status(
            session_id,
            SessionStatus::Interrupted,
            Some(stopped_at),
            stopped_at,
        )
        .await
    }

    pub async fn list_practice_sessions(&self, limit: usize) -> Result<Vec<PracticeSessionRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS}
                 FROM practice_sessions
                 ORDER BY started_at DESC
                 LIMIT ?1"
            ))?;

            let mut rows = stmt.query(params![limit])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }
}
