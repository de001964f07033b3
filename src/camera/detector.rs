use std::sync::{Arc, Mutex};

use log::{error, info};
use tokio::sync::OnceCell;

use crate::{
    config::DetectorConfig,
    error::PracticeError,
    models::HandLandmarks,
};

use super::stream::VideoFrame;

/// Per-frame hand landmark detector.
pub trait HandDetector: Send {
    /// Zero or more hands, most confident first.
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<HandLandmarks>, PracticeError>;
}

/// Fetches and initialises a detector model. Blocking: may download weights.
pub trait DetectorLoader: Send + Sync {
    fn load(&self, config: &DetectorConfig) -> Result<Box<dyn HandDetector>, PracticeError>;
}

pub type SharedDetector = Arc<Mutex<Box<dyn HandDetector>>>;

/// Single owner of the process-wide detector.
///
/// The first caller triggers the load; everyone else awaits the same cell.
/// A failed load leaves the cell empty so the next call retries.
#[derive(Clone)]
pub struct DetectorHandle {
    cell: Arc<OnceCell<SharedDetector>>,
    loader: Arc<dyn DetectorLoader>,
    config: DetectorConfig,
}

impl DetectorHandle {
    pub fn new(loader: Arc<dyn DetectorLoader>, config: DetectorConfig) -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
            loader,
            config,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    /// Non-blocking access; `DetectorNotLoaded` while the model is loading.
    pub fn get(&self) -> Result<SharedDetector, PracticeError> {
        self.cell
            .get()
            .cloned()
            .ok_or(PracticeError::DetectorNotLoaded)
    }

    /// Resolves once the detector is loaded, starting the load if needed.
    pub async fn ready(&self) -> Result<SharedDetector, PracticeError> {
        let loader = self.loader.clone();
        let config = self.config.clone();
        self.cell
            .get_or_try_init(|| async move {
                info!(
                    "Loading hand detector (max hands {}, complexity {})",
                    config.max_num_hands, config.model_complexity
                );
                let detector = tokio::task::spawn_blocking(move || loader.load(&config))
                    .await
                    .map_err(|err| {
                        PracticeError::DetectorLoadFailure(format!("loader task failed: {err}"))
                    })?
                    .map_err(|err| {
                        error!("Hand detector failed to load: {err}");
                        match err {
                            PracticeError::DetectorLoadFailure(_) => err,
                            other => PracticeError::DetectorLoadFailure(other.to_string()),
                        }
                    })?;
                info!("Hand detector ready");
                Ok(Arc::new(Mutex::new(detector)))
            })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct NoHands;

    impl HandDetector for NoHands {
        fn detect(&mut self, _frame: &VideoFrame) -> Result<Vec<HandLandmarks>, PracticeError> {
            Ok(Vec::new())
        }
    }

    struct CountingLoader {
        loads: AtomicUsize,
        fail_first: bool,
    }

    impl DetectorLoader for CountingLoader {
        fn load(&self, _config: &DetectorConfig) -> Result<Box<dyn HandDetector>, PracticeError> {
            let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            if self.fail_first && attempt == 0 {
                return Err(PracticeError::NetworkFailure("cdn unreachable".into()));
            }
            Ok(Box::new(NoHands))
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_load() {
        let loader = Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
            fail_first: false,
        });
        let handle = DetectorHandle::new(loader.clone(), DetectorConfig::default());
        assert!(matches!(handle.get(), Err(PracticeError::DetectorNotLoaded)));

        let other = handle.clone();
        let (a, b) = tokio::join!(handle.ready(), other.ready());
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert!(handle.is_ready());
        assert!(handle.get().is_ok());
    }

    #[tokio::test]
    async fn failed_load_is_retried() {
        let loader = Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
            fail_first: true,
        });
        let handle = DetectorHandle::new(loader.clone(), DetectorConfig::default());

        let first = handle.ready().await;
        assert!(matches!(first, Err(PracticeError::DetectorLoadFailure(_))));
        assert!(!handle.is_ready());

        assert!(handle.ready().await.is_ok());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }
}
