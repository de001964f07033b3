use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_source},
    models::PracticeResult,
};

fn row_to_result(row: &Row) -> Result<PracticeResult> {
    let source: String = row.get("source")?;
    let created_at: String = row.get("created_at")?;

    Ok(PracticeResult {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        run_id: row.get("run_id")?,
        user_id: row.get("user_id")?,
        sign: row.get("sign")?,
        confidence: row.get("confidence")?,
        is_match: row.get("is_match")?,
        source: parse_source(&source)?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn insert_practice_result(&self, result: &PracticeResult) -> Result<()> {
        let record = result.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO practice_results (id, session_id, run_id, user_id, sign, confidence, is_match, source, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id,
                    record.session_id,
                    record.run_id,
                    record.user_id,
                    record.sign,
                    record.confidence,
                    record.is_match,
                    record.source.as_str(),
                    record.created_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert practice result")?;
            Ok(())
        })
        .await
    }

    /// Most recent results first, optionally for one sign only.
    pub async fn list_practice_results(
        &self,
        sign: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PracticeResult>> {
        let sign = sign.map(str::to_string);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, run_id, user_id, sign, confidence, is_match, source, created_at
                 FROM practice_results
                 WHERE ?1 IS NULL OR sign = ?1
                 ORDER BY created_at DESC
                 LIMIT ?2",
            )?;

            let mut rows = stmt.query(params![sign, limit])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_result(row)?);
            }
            Ok(results)
        })
        .await
    }

    pub async fn list_session_results(&self, session_id: &str) -> Result<Vec<PracticeResult>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, run_id, user_id, sign, confidence, is_match, source, created_at
                 FROM practice_results
                 WHERE session_id = ?1
                 ORDER BY created_at ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_result(row)?);
            }
            Ok(results)
        })
        .await
    }
}
