use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::StoreConfig,
    models::{Badge, ProgressStats, UserProgress},
};

/// Thin client for a PostgREST-style table API (`{url}/rest/v1/{table}`).
#[derive(Clone)]
pub struct RemoteStore {
    http: Client,
    base_url: Url,
    anon_key: String,
}

/// `user_progress` row as stored remotely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProgressRow {
    user_id: String,
    #[serde(default)]
    level: Option<u32>,
    #[serde(default)]
    xp: Option<u64>,
    #[serde(default)]
    xp_to_next_level: Option<u64>,
    #[serde(default)]
    streak: Option<u32>,
    #[serde(default)]
    last_active_date: Option<String>,
    #[serde(default)]
    completed_lessons: Vec<String>,
    #[serde(default)]
    completed_modules: Vec<u32>,
    #[serde(default)]
    badges: Vec<Badge>,
    #[serde(default)]
    stats: Option<ProgressStats>,
}

impl From<&UserProgress> for ProgressRow {
    fn from(progress: &UserProgress) -> Self {
        Self {
            user_id: progress.user_id.clone(),
            level: Some(progress.level),
            xp: Some(progress.xp),
            xp_to_next_level: Some(progress.xp_to_next_level),
            streak: Some(progress.streak),
            last_active_date: progress.last_active_date.map(|d| d.to_string()),
            completed_lessons: progress.completed_lessons.clone(),
            completed_modules: progress.completed_modules.clone(),
            badges: progress.badges.clone(),
            stats: Some(progress.stats.clone()),
        }
    }
}

impl From<ProgressRow> for UserProgress {
    fn from(row: ProgressRow) -> Self {
        let defaults = UserProgress::new(row.user_id.clone());
        Self {
            level: row.level.unwrap_or(defaults.level),
            xp: row.xp.unwrap_or(defaults.xp),
            xp_to_next_level: row.xp_to_next_level.unwrap_or(defaults.xp_to_next_level),
            streak: row.streak.unwrap_or(defaults.streak),
            // Accepts plain dates and full timestamps.
            last_active_date: row
                .last_active_date
                .as_deref()
                .and_then(|raw| raw.get(..10))
                .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()),
            completed_lessons: row.completed_lessons,
            completed_modules: row.completed_modules,
            badges: row.badges,
            stats: row.stats.unwrap_or_default(),
            user_id: row.user_id,
        }
    }
}

impl RemoteStore {
    pub fn new(config: &StoreConfig, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build table API client")?;
        let base_url = Url::parse(&format!("{}/rest/v1/", config.url.trim_end_matches('/')))
            .with_context(|| format!("invalid store url {}", config.url))?;
        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key.clone(),
        })
    }

    fn table(&self, table: &str) -> Result<Url> {
        self.base_url
            .join(table)
            .with_context(|| format!("invalid table name {table}"))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// `filters` are PostgREST column filters such as `("id", "eq.1-1")`.
    pub async fn select<T: DeserializeOwned>(&self, table: &str, filters: &[(&str, &str)]) -> Result<Vec<T>> {
        let mut query: Vec<(&str, &str)> = vec![("select", "*")];
        query.extend_from_slice(filters);

        let rows = self
            .authorize(self.http.get(self.table(table)?))
            .query(&query)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("select from {table} failed"))?
            .json::<Vec<T>>()
            .await
            .with_context(|| format!("failed to decode {table} rows"))?;
        Ok(rows)
    }

    pub async fn upsert<T: Serialize>(&self, table: &str, row: &T) -> Result<()> {
        self.authorize(self.http.post(self.table(table)?))
            .header("Prefer", "resolution=merge-duplicates")
            .json(row)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("upsert into {table} failed"))?;
        Ok(())
    }

    pub async fn user_progress(&self, user_id: &str) -> Result<UserProgress> {
        let filter = format!("eq.{user_id}");
        let rows: Vec<ProgressRow> = self
            .select("user_progress", &[("user_id", filter.as_str())])
            .await?;
        rows.into_iter()
            .next()
            .map(UserProgress::from)
            .ok_or_else(|| anyhow!("no progress stored for {user_id}"))
    }

    pub async fn upsert_progress(&self, progress: &UserProgress) -> Result<()> {
        self.upsert("user_progress", &ProgressRow::from(progress)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Lesson, utils::test_http::serve_once};

    fn store(url: &str) -> RemoteStore {
        RemoteStore::new(
            &StoreConfig {
                url: url.into(),
                anon_key: "anon-key".into(),
            },
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn select_sends_auth_headers_and_decodes_rows() {
        let (address, server) = serve_once(
            "200 OK",
            r#"[{"id":"9-1","title":"Remote","description":"","category":"basics","difficulty":"advanced","duration":7,"completed":false,"locked":false,"xp_reward":30}]"#,
        )
        .await;

        let lessons: Vec<Lesson> = store(&address).select("lessons", &[]).await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].duration_minutes, 7);
        assert_eq!(lessons[0].xp_reward, 30);

        let raw = server.await.unwrap().to_ascii_lowercase();
        assert!(raw.starts_with("get /rest/v1/lessons?select=*"));
        assert!(raw.contains("apikey: anon-key"));
        assert!(raw.contains("authorization: bearer anon-key"));
    }

    #[tokio::test]
    async fn progress_row_accepts_timestamps() {
        let (address, _server) = serve_once(
            "200 OK",
            r#"[{"user_id":"u1","level":4,"xp":1200,"xp_to_next_level":800,"streak":2,"last_active_date":"2024-05-01T10:00:00Z"}]"#,
        )
        .await;

        let progress = store(&address).user_progress("u1").await.unwrap();
        assert_eq!(progress.level, 4);
        assert_eq!(progress.last_active_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert!(progress.completed_lessons.is_empty());
        assert!(progress.completed_modules.is_empty());
    }

    #[tokio::test]
    async fn missing_progress_is_an_error() {
        let (address, _server) = serve_once("200 OK", "[]").await;
        assert!(store(&address).user_progress("u1").await.is_err());
    }
}
