use std::sync::Arc;

use chrono::NaiveDate;
use log::{info, warn};
use tokio::sync::Mutex;

use crate::{
    events::{EventSink, PracticeEvent},
    models::{Lesson, ModuleProgress, QuizResult, UserProgress},
    store::DataStore,
};

/// Local copy of the learner's progress. Every change is emitted and then
/// pushed to the data store; a failed push is logged and the local copy kept.
#[derive(Clone)]
pub struct ProgressTracker {
    progress: Arc<Mutex<UserProgress>>,
    store: DataStore,
    events: Arc<dyn EventSink>,
}

impl ProgressTracker {
    pub fn new(progress: UserProgress, store: DataStore, events: Arc<dyn EventSink>) -> Self {
        Self {
            progress: Arc::new(Mutex::new(progress)),
            store,
            events,
        }
    }

    /// Seeds the tracker from the store (remote row or built-in defaults).
    pub async fn load(user_id: &str, store: DataStore, events: Arc<dyn EventSink>) -> Self {
        let progress = store.user_progress(user_id).await;
        Self::new(progress, store, events)
    }

    pub async fn snapshot(&self) -> UserProgress {
        self.progress.lock().await.clone()
    }

    /// Credits one learned sign. Returns the updated progress.
    pub async fn award_sign(&self, xp: u64) -> UserProgress {
        let updated = {
            let mut progress = self.progress.lock().await;
            let levels = progress.add_xp(xp);
            progress.record_sign_learned();
            if levels > 0 {
                info!("{} reached level {}", progress.user_id, progress.level);
            }
            progress.clone()
        };
        self.publish(&updated).await;
        updated
    }

    /// Records a finished lesson and its XP reward. Repeat completions are
    /// ignored. Finishing the last lesson of `module_lessons` completes the
    /// module, which unlocks the next one.
    pub async fn complete_lesson(&self, lesson: &Lesson, module_lessons: &[Lesson]) -> UserProgress {
        let (updated, changed) = {
            let mut progress = self.progress.lock().await;
            let changed = progress.complete_lesson(&lesson.id);
            if changed {
                progress.add_xp(u64::from(lesson.xp_reward));
                if progress.complete_module_if_finished(lesson.module_id, module_lessons) {
                    info!(
                        "{} completed module {}; module {} unlocked",
                        progress.user_id,
                        lesson.module_id,
                        lesson.module_id + 1
                    );
                }
            }
            (progress.clone(), changed)
        };
        if changed {
            self.publish(&updated).await;
        }
        updated
    }

    /// Credits a graded module quiz. Every attempt earns its XP.
    pub async fn record_quiz(&self, result: &QuizResult) -> UserProgress {
        let updated = {
            let mut progress = self.progress.lock().await;
            let levels = progress.record_quiz(result);
            info!(
                "{} scored {}/{} on the module {} quiz ({})",
                progress.user_id,
                result.score,
                result.total,
                result.module_id,
                if result.passed { "passed" } else { "not passed" }
            );
            if levels > 0 {
                info!("{} reached level {}", progress.user_id, progress.level);
            }
            progress.clone()
        };
        self.publish(&updated).await;
        updated
    }

    pub async fn modules(&self, lessons: &[Lesson]) -> Vec<ModuleProgress> {
        self.progress.lock().await.module_progress(lessons)
    }

    pub async fn touch_streak(&self, today: NaiveDate) -> UserProgress {
        let (updated, changed) = {
            let mut progress = self.progress.lock().await;
            let before = progress.last_active_date;
            progress.touch_streak(today);
            (progress.clone(), before != progress.last_active_date)
        };
        if changed {
            self.publish(&updated).await;
        }
        updated
    }

    async fn publish(&self, progress: &UserProgress) {
        self.events.emit(PracticeEvent::ProgressUpdated(progress.clone()));
        if let Err(err) = self.store.upsert_progress(progress).await {
            warn!("failed to push progress for {}: {err:#}", progress.user_id);
        }
    }
}
