//! Runtime configuration read from the environment.
//!
//! Every value has a documented default so the engine runs unconfigured:
//! without a data-store URL the content layer serves its built-in catalogue,
//! and without a backend URL the comparison client targets localhost.

use std::{path::PathBuf, time::Duration};

use log::warn;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_DETECTOR_CDN_URL: &str = "https://cdn.jsdelivr.net/npm/@mediapipe";
pub const DATA_DIR_NAME: &str = ".signsee";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorConfig {
    pub cdn_url: String,
    pub max_num_hands: u32,
    pub model_complexity: u32,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            cdn_url: DEFAULT_DETECTOR_CDN_URL.into(),
            max_num_hands: 2,
            model_complexity: 1,
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.6,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub url: String,
    pub anon_key: String,
}

impl StoreConfig {
    /// Blank or placeholder credentials mean "serve built-in content".
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
            && !self.anon_key.is_empty()
            && !self.url.contains("placeholder")
            && !self.anon_key.contains("placeholder")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FallbackPolicy {
    /// Substitute a plausible confidence so practice keeps moving.
    SyntheticConfidence,
    /// Stay in detecting and tell the learner the service is unreachable.
    Surface,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeConfig {
    pub max_signs_per_session: usize,
    pub xp_per_sign: u64,
    pub confidence_threshold: f64,
    pub comparison_interval_ms: u64,
    pub success_display_ms: u64,
    pub metadata_timeout_ms: u64,
    pub compare_timeout_ms: u64,
    pub fallback_policy: FallbackPolicy,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            max_signs_per_session: 5,
            xp_per_sign: 50,
            confidence_threshold: 0.8,
            comparison_interval_ms: 200,
            success_display_ms: 2000,
            metadata_timeout_ms: 5000,
            compare_timeout_ms: 3000,
            fallback_policy: FallbackPolicy::SyntheticConfidence,
        }
    }
}

impl PracticeConfig {
    pub fn comparison_interval(&self) -> Duration {
        Duration::from_millis(self.comparison_interval_ms.max(1))
    }

    pub fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_timeout_ms)
    }

    pub fn compare_timeout(&self) -> Duration {
        Duration::from_millis(self.compare_timeout_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub detector: DetectorConfig,
    pub store: StoreConfig,
    pub practice: PracticeConfig,
    /// Holds the SQLite history and learner settings.
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                url: DEFAULT_BACKEND_URL.into(),
            },
            detector: DetectorConfig::default(),
            store: StoreConfig::default(),
            practice: PracticeConfig::default(),
            data_dir: PathBuf::from(DATA_DIR_NAME),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unparsable values keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("SIGNSEE_BACKEND_URL") {
            config.backend.url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = get("SIGNSEE_DETECTOR_CDN_URL") {
            config.detector.cdn_url = url;
        }
        if let Some(url) = get("SIGNSEE_STORE_URL") {
            config.store.url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = get("SIGNSEE_STORE_ANON_KEY") {
            config.store.anon_key = key;
        }
        if let Some(dir) = get("SIGNSEE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        } else if let Some(home) = get("HOME") {
            config.data_dir = PathBuf::from(home).join(DATA_DIR_NAME);
        }

        let practice = &mut config.practice;
        parse_into(&get, "SIGNSEE_MAX_SIGNS_PER_SESSION", &mut practice.max_signs_per_session);
        parse_into(&get, "SIGNSEE_XP_PER_SIGN", &mut practice.xp_per_sign);
        parse_into(&get, "SIGNSEE_CONFIDENCE_THRESHOLD", &mut practice.confidence_threshold);
        parse_into(&get, "SIGNSEE_COMPARISON_INTERVAL_MS", &mut practice.comparison_interval_ms);
        parse_into(&get, "SIGNSEE_SUCCESS_DISPLAY_MS", &mut practice.success_display_ms);
        parse_into(&get, "SIGNSEE_COMPARE_TIMEOUT_MS", &mut practice.compare_timeout_ms);

        if !(0.0..=1.0).contains(&practice.confidence_threshold) {
            warn!(
                "confidence threshold {} outside [0, 1]; using default",
                practice.confidence_threshold
            );
            practice.confidence_threshold = PracticeConfig::default().confidence_threshold;
        }

        if let Some(policy) = get("SIGNSEE_COMPARISON_FALLBACK") {
            match policy.to_ascii_lowercase().as_str() {
                "synthetic" => practice.fallback_policy = FallbackPolicy::SyntheticConfidence,
                "surface" => practice.fallback_policy = FallbackPolicy::Surface,
                other => warn!("unknown SIGNSEE_COMPARISON_FALLBACK '{other}'; keeping default"),
            }
        }

        config
    }
}

fn parse_into<T, G>(get: &G, key: &str, slot: &mut T)
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    if let Some(raw) = get(key) {
        match raw.parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => warn!("ignoring invalid {key}='{raw}'"),
        }
    }
}
