//! Learning content and remote progress.
//!
//! Reads go to the remote table API when one is configured and fall back to
//! the built-in catalogue on any failure. Writes report errors to the caller.

pub mod catalog;
pub mod quizzes;
pub mod remote;

use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use crate::{
    config::StoreConfig,
    models::{Lesson, QuizQuestion, Sign, UserProgress},
};

pub use catalog::PracticeSign;
pub use remote::RemoteStore;

#[derive(Clone)]
pub struct DataStore {
    remote: Option<RemoteStore>,
}

impl DataStore {
    pub fn new(config: &StoreConfig, timeout: Duration) -> Self {
        if !config.is_configured() {
            info!("data store not configured; serving built-in content");
            return Self::offline();
        }
        match RemoteStore::new(config, timeout) {
            Ok(remote) => Self {
                remote: Some(remote),
            },
            Err(err) => {
                warn!("failed to set up remote data store, serving built-in content: {err:#}");
                Self::offline()
            }
        }
    }

    pub fn offline() -> Self {
        Self { remote: None }
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn lessons(&self) -> Vec<Lesson> {
        if let Some(remote) = &self.remote {
            match remote.select::<Lesson>("lessons", &[("order", "id.asc")]).await {
                Ok(lessons) if !lessons.is_empty() => return lessons,
                Ok(_) => warn!("remote lessons table is empty; using built-in lessons"),
                Err(err) => warn!("failed to fetch lessons, using built-in lessons: {err:#}"),
            }
        }
        catalog::lessons()
    }

    pub async fn lessons_by_module(&self, module_id: u32) -> Vec<Lesson> {
        self.lessons()
            .await
            .into_iter()
            .filter(|lesson| lesson.module_id == module_id)
            .collect()
    }

    pub async fn lesson(&self, lesson_id: &str) -> Option<Lesson> {
        self.lessons()
            .await
            .into_iter()
            .find(|lesson| lesson.id == lesson_id)
    }

    pub async fn signs(&self) -> Vec<Sign> {
        if let Some(remote) = &self.remote {
            match remote.select::<Sign>("signs", &[]).await {
                Ok(signs) if !signs.is_empty() => return signs,
                Ok(_) => warn!("remote signs table is empty; using built-in signs"),
                Err(err) => warn!("failed to fetch signs, using built-in signs: {err:#}"),
            }
        }
        catalog::signs()
    }

    pub async fn signs_by_category(&self, category: &str) -> Vec<Sign> {
        self.signs()
            .await
            .into_iter()
            .filter(|sign| sign.category == category)
            .collect()
    }

    /// Word lookup across every known sign, including the ones taught in
    /// lessons. The whole phrase is tried first, then each word; matches keep
    /// query order and appear once.
    pub async fn search_signs(&self, query: &str) -> Vec<Sign> {
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if words.is_empty() {
            return Vec::new();
        }

        let mut known = self.signs().await;
        for lesson in self.lessons().await {
            known.extend(lesson.signs);
        }

        let mut terms = vec![words.join(" ")];
        terms.extend(words);

        let mut found: Vec<Sign> = Vec::new();
        for term in terms {
            let Some(sign) = known.iter().find(|sign| sign.word.to_lowercase() == term) else {
                continue;
            };
            if !found.iter().any(|seen| seen.word == sign.word) {
                found.push(sign.clone());
            }
        }
        found
    }

    pub fn module_quiz(&self, module_id: u32) -> Vec<QuizQuestion> {
        quizzes::module_quiz(module_id)
    }

    pub fn practice_signs(&self) -> Vec<PracticeSign> {
        catalog::practice_signs()
    }

    pub async fn user_progress(&self, user_id: &str) -> UserProgress {
        if let Some(remote) = &self.remote {
            match remote.user_progress(user_id).await {
                Ok(progress) => return progress,
                Err(err) => warn!("failed to fetch progress for {user_id}, using defaults: {err:#}"),
            }
        }
        catalog::default_progress(user_id)
    }

    pub async fn upsert_progress(&self, progress: &UserProgress) -> Result<()> {
        match &self.remote {
            Some(remote) => remote.upsert_progress(progress).await,
            None => {
                info!(
                    "progress for {} kept locally (level {}, {} xp)",
                    progress.user_id, progress.level, progress.xp
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_http::serve_once;

    fn unreachable_store() -> DataStore {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        DataStore::new(
            &StoreConfig {
                url: format!("http://127.0.0.1:{port}"),
                anon_key: "anon-key".into(),
            },
            Duration::from_millis(500),
        )
    }

    #[tokio::test]
    async fn unconfigured_store_serves_catalog() {
        let store = DataStore::new(&StoreConfig::default(), Duration::from_secs(1));
        assert!(!store.is_remote());
        assert_eq!(store.lessons().await.len(), catalog::lessons().len());
        assert_eq!(store.lessons_by_module(2).await.len(), 3);
        assert_eq!(store.lesson("1-2").await.unwrap().title, "Polite Expressions");
        assert!(store.lesson("99-1").await.is_none());
        assert_eq!(store.signs_by_category("greetings").await.len(), 3);
    }

    #[tokio::test]
    async fn search_matches_phrases_then_words() {
        let store = DataStore::offline();

        let words: Vec<String> = store
            .search_signs("  Hello please hello ")
            .await
            .into_iter()
            .map(|sign| sign.word)
            .collect();
        assert_eq!(words, vec!["Hello", "Please"]);

        let phrase = store.search_signs("thank   YOU").await;
        assert_eq!(phrase.len(), 1);
        assert_eq!(phrase[0].word, "Thank You");

        assert_eq!(store.search_signs("goodbye").await[0].word, "Goodbye");
        assert!(store.search_signs("   ").await.is_empty());
        assert!(store.search_signs("giraffe").await.is_empty());
    }

    #[tokio::test]
    async fn failed_reads_fall_back() {
        let store = unreachable_store();
        assert!(store.is_remote());
        assert_eq!(store.signs().await, catalog::signs());
        let progress = store.user_progress("guest").await;
        assert_eq!(progress.level, 3);
        assert_eq!(progress.xp_to_next_level, 550);
    }

    #[tokio::test]
    async fn failed_writes_are_reported() {
        let store = unreachable_store();
        assert!(store.upsert_progress(&UserProgress::new("guest")).await.is_err());
    }

    #[tokio::test]
    async fn remote_rows_win_when_present() {
        let (address, _server) = serve_once(
            "200 OK",
            r#"[{"id":"r1","word":"Yes","category":"answers","video_url":"/yes.jpg","thumbnail_url":"/yes.jpg","description":"","difficulty":"beginner"}]"#,
        )
        .await;
        let store = DataStore::new(
            &StoreConfig {
                url: address,
                anon_key: "anon-key".into(),
            },
            Duration::from_secs(2),
        );
        let signs = store.signs().await;
        assert_eq!(signs.len(), 1);
        assert_eq!(signs[0].video_url, "/yes.jpg");
    }
}
