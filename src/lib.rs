//! Practice engine for the SignSee sign-language learning app.
//!
//! A learner holds a sign in front of the camera; hand landmarks are compared
//! against the target sign by the gesture service a few times a second and
//! turned into graded feedback, XP and session history.

pub mod camera;
pub mod comparison;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod practice;
pub mod progress;
pub mod settings;
pub mod store;
pub mod utils;

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};

use camera::{CameraDriver, CameraSource, DetectorHandle, DetectorLoader};
use comparison::{ComparisonService, FallbackComparison, GestureApiClient, PracticeController};
use config::AppConfig;
use db::Database;
use events::{BroadcastEvents, EventSink};
use practice::SessionRunner;
use progress::ProgressTracker;
use settings::SettingsStore;
use store::DataStore;

const STORE_TIMEOUT: Duration = Duration::from_secs(10);
const EVENT_CAPACITY: usize = 256;

pub fn init_logging() {
    // Reads RUST_LOG
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}

/// Long-lived services shared by every practice run.
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub settings: SettingsStore,
    pub store: DataStore,
    pub gestures: GestureApiClient,
    pub events: Arc<BroadcastEvents>,
    detector: OnceLock<DetectorHandle>,
}

impl AppState {
    /// Opens local storage under `config.data_dir` and finalizes sessions that
    /// were still running when the engine last exited.
    pub async fn bootstrap(config: AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("failed to create data directory {}", config.data_dir.display())
        })?;

        let db = Database::new(config.data_dir.join("signsee.sqlite3"))?;
        let recovered = recover_interrupted_sessions(&db).await?;
        if recovered > 0 {
            info!("marked {recovered} unfinished practice sessions as interrupted");
        }

        let settings = SettingsStore::new(config.data_dir.join("settings.json"))?;
        let store = DataStore::new(&config.store, STORE_TIMEOUT);
        let gestures = GestureApiClient::new(
            &config.backend.url,
            config.practice.compare_timeout(),
            config.practice.confidence_threshold,
        )
        .with_context(|| format!("invalid backend url {}", config.backend.url))?;

        Ok(Self {
            config,
            db,
            settings,
            store,
            gestures,
            events: Arc::new(BroadcastEvents::new(EVENT_CAPACITY)),
            detector: OnceLock::new(),
        })
    }

    pub fn user_id(&self) -> String {
        self.settings.user_id()
    }

    fn sink(&self) -> Arc<dyn EventSink> {
        self.events.clone()
    }

    /// Gesture service wrapped in the configured fallback policy.
    pub fn comparison_service(&self) -> Arc<dyn ComparisonService> {
        Arc::new(FallbackComparison::new(
            Arc::new(self.gestures.clone()),
            &self.config.practice,
        ))
    }

    /// The process-wide hand detector. The first loader handed in wins and
    /// every later controller shares what it loaded.
    pub fn detector(&self, loader: Arc<dyn DetectorLoader>) -> DetectorHandle {
        self.detector
            .get_or_init(|| DetectorHandle::new(loader, self.config.detector.clone()))
            .clone()
    }

    /// Signs offered when a session is started without an explicit list: the
    /// gesture service's list, or the built-in five when it has none.
    pub async fn practice_signs(&self) -> Vec<String> {
        match self.gestures.practice_signs().await {
            Ok(signs) if !signs.is_empty() => return signs,
            Ok(_) => info!("gesture service lists no practice signs; using built-in set"),
            Err(err) => warn!("failed to fetch practice signs, using built-in set: {err}"),
        }
        self.store
            .practice_signs()
            .into_iter()
            .map(|sign| sign.sign)
            .collect()
    }

    pub async fn progress_tracker(&self) -> ProgressTracker {
        ProgressTracker::load(&self.user_id(), self.store.clone(), self.sink()).await
    }

    pub fn practice_controller(
        &self,
        camera: Arc<dyn CameraSource>,
        detector: Arc<dyn DetectorLoader>,
    ) -> PracticeController {
        let driver = CameraDriver::new(
            camera,
            self.detector(detector),
            self.config.practice.metadata_timeout(),
        );
        PracticeController::new(
            driver,
            self.comparison_service(),
            self.sink(),
            self.config.practice.clone(),
            self.user_id(),
        )
        .with_history(self.db.clone())
    }

    pub async fn session_runner(
        &self,
        camera: Arc<dyn CameraSource>,
        detector: Arc<dyn DetectorLoader>,
    ) -> SessionRunner {
        SessionRunner::new(
            self.practice_controller(camera, detector),
            Arc::new(self.gestures.clone()),
            self.progress_tracker().await,
            self.db.clone(),
            self.sink(),
            self.config.practice.clone(),
            self.user_id(),
        )
    }
}

/// Marks every session left `Running` as `Interrupted`. Returns how many.
pub async fn recover_interrupted_sessions(db: &Database) -> Result<usize> {
    let sessions = db.get_incomplete_practice_sessions().await?;
    let now = Utc::now();
    for session in &sessions {
        warn!(
            "Recovered incomplete practice session {}; marking as Interrupted",
            session.id
        );
        db.mark_practice_session_interrupted(&session.id, now).await?;
    }
    Ok(sessions.len())
}
