use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use futures::future::BoxFuture;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    comparison::{GestureApiClient, PracticeController, SuccessReport},
    config::PracticeConfig,
    db::{Database, PracticeSessionRecord, SessionStatus},
    error::PracticeError,
    events::{EventSink, PracticeEvent},
    models::{GestureRecognitionResult, PracticeGesture},
    progress::ProgressTracker,
};

use super::session::{PracticeSession, SessionSummary};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Reference gestures and result upload on the gesture service.
pub trait GestureLibrary: Send + Sync {
    fn practice_gestures<'a>(
        &'a self,
        sign: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PracticeGesture>, PracticeError>>;

    fn save_result<'a>(
        &'a self,
        user_id: &'a str,
        result: &'a GestureRecognitionResult,
    ) -> BoxFuture<'a, Result<(), PracticeError>>;
}

impl GestureLibrary for GestureApiClient {
    fn practice_gestures<'a>(
        &'a self,
        sign: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PracticeGesture>, PracticeError>> {
        Box::pin(GestureApiClient::practice_gestures(self, sign))
    }

    fn save_result<'a>(
        &'a self,
        user_id: &'a str,
        result: &'a GestureRecognitionResult,
    ) -> BoxFuture<'a, Result<(), PracticeError>> {
        Box::pin(self.save_gesture_result(user_id, result))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Skip,
    /// Restart the current sign, e.g. after a camera error.
    Retry,
    Cancel,
}

enum SignEnd {
    Matched(SuccessReport),
    NoGestures,
    Skipped,
    Cancelled,
}

pub struct SessionHandle {
    session_id: String,
    commands: mpsc::Sender<SessionCommand>,
    task: JoinHandle<Result<SessionSummary>>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// For signalling the session from another task.
    pub fn command_sender(&self) -> mpsc::Sender<SessionCommand> {
        self.commands.clone()
    }

    /// Returns false once the session has finished.
    pub async fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn skip(&self) -> bool {
        self.send(SessionCommand::Skip).await
    }

    pub async fn retry(&self) -> bool {
        self.send(SessionCommand::Retry).await
    }

    pub async fn cancel(&self) -> bool {
        self.send(SessionCommand::Cancel).await
    }

    pub async fn finished(self) -> Result<SessionSummary> {
        self.task.await.context("practice session task panicked")?
    }
}

/// Walks a practice session sign by sign on top of one [`PracticeController`].
pub struct SessionRunner {
    controller: PracticeController,
    library: Arc<dyn GestureLibrary>,
    progress: ProgressTracker,
    db: Database,
    events: Arc<dyn EventSink>,
    config: PracticeConfig,
    user_id: String,
}

impl SessionRunner {
    pub fn new(
        controller: PracticeController,
        library: Arc<dyn GestureLibrary>,
        progress: ProgressTracker,
        db: Database,
        events: Arc<dyn EventSink>,
        config: PracticeConfig,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            controller,
            library,
            progress,
            db,
            events,
            config,
            user_id: user_id.into(),
        }
    }

    pub fn controller(&self) -> &PracticeController {
        &self.controller
    }

    /// Records the session as running and starts it in the background.
    pub async fn spawn(self, signs: Vec<String>) -> Result<SessionHandle> {
        let session = self.begin(signs).await?;
        let session_id = session.id.clone();
        let (commands, rx) = mpsc::channel(8);
        let task = tokio::spawn(self.run(session, rx));
        Ok(SessionHandle {
            session_id,
            commands,
            task,
        })
    }

    async fn begin(&self, signs: Vec<String>) -> Result<PracticeSession> {
        let now = Utc::now();
        let session = PracticeSession::new(
            Uuid::new_v4().to_string(),
            self.user_id.clone(),
            signs,
            self.config.max_signs_per_session,
            now,
        );
        if session.is_empty() {
            bail!("no signs to practice");
        }

        let record = PracticeSessionRecord::running(
            session.id.clone(),
            session.user_id.clone(),
            session.signs(),
            now,
        );
        self.db
            .insert_practice_session(&record)
            .await
            .context("failed to record practice session")?;
        self.progress.touch_streak(now.date_naive()).await;

        log_info!(
            "practice session {} started with {} signs",
            session.id,
            session.len()
        );
        Ok(session)
    }

    async fn run(
        self,
        mut session: PracticeSession,
        mut commands: mpsc::Receiver<SessionCommand>,
    ) -> Result<SessionSummary> {
        let status = loop {
            let Some(sign) = session.current_sign().map(str::to_string) else {
                break SessionStatus::Completed;
            };

            match self.practice_sign(&session.id, &sign, &mut commands).await {
                SignEnd::Matched(report) => {
                    if session.handle_success(report.confidence, self.config.xp_per_sign) {
                        self.progress.award_sign(self.config.xp_per_sign).await;
                        self.upload(report).await;
                    }
                }
                SignEnd::NoGestures => session.mark_no_gestures(),
                SignEnd::Skipped => {
                    log_info!("'{sign}' skipped");
                    session.skip();
                }
                SignEnd::Cancelled => break SessionStatus::Cancelled,
            }

            self.checkpoint(&session).await;
            session.advance();
        };

        self.controller.stop().await;

        let ended_at = Utc::now();
        self.db
            .mark_practice_session_status(&session.id, status, Some(ended_at), ended_at)
            .await
            .with_context(|| format!("failed to close practice session {}", session.id))?;

        let summary = session.summary(status, ended_at);
        log_info!(
            "practice session {} {}: {} matched, {} skipped, {} xp",
            summary.session_id,
            status.as_str().to_lowercase(),
            summary.signs_completed,
            summary.signs_skipped,
            summary.xp_earned
        );
        self.events.emit(PracticeEvent::SessionCompleted(summary.clone()));
        Ok(summary)
    }

    async fn practice_sign(
        &self,
        session_id: &str,
        sign: &str,
        commands: &mut mpsc::Receiver<SessionCommand>,
    ) -> SignEnd {
        match self.library.practice_gestures(sign).await {
            Ok(gestures) if gestures.is_empty() => {
                let err = PracticeError::DataNotFound(sign.to_string());
                log_warn!("{}", err.user_message());
                return SignEnd::NoGestures;
            }
            Ok(gestures) => {
                log_info!("{} reference gestures for '{sign}'", gestures.len());
            }
            Err(err) => {
                log_warn!("gesture lookup for '{sign}' failed, practicing anyway: {err}");
            }
        }

        loop {
            let (done_tx, mut done_rx) = oneshot::channel::<SuccessReport>();
            let started = self
                .controller
                .start(sign, Some(session_id.to_string()), move |report| {
                    let _ = done_tx.send(report);
                })
                .await;
            if let Err(err) = started {
                log_error!("'{sign}' is waiting for retry: {}", err.user_message());
            }

            let command = tokio::select! {
                Ok(report) = &mut done_rx => {
                    self.controller.stop().await;
                    return SignEnd::Matched(report);
                }
                command = commands.recv() => command,
            };

            match command {
                Some(SessionCommand::Retry) => {
                    log_info!("retrying '{sign}'");
                    self.controller.try_again().await;
                }
                Some(SessionCommand::Skip) => {
                    self.controller.stop().await;
                    return SignEnd::Skipped;
                }
                Some(SessionCommand::Cancel) | None => {
                    self.controller.stop().await;
                    return SignEnd::Cancelled;
                }
            }
        }
    }

    async fn checkpoint(&self, session: &PracticeSession) {
        if let Err(err) = self
            .db
            .update_practice_session_progress(
                &session.id,
                session.signs_completed(),
                session.signs_skipped(),
                session.total_points(),
                Utc::now(),
            )
            .await
        {
            log_warn!("failed to checkpoint practice session {}: {err:#}", session.id);
        }
    }

    async fn upload(&self, report: SuccessReport) {
        let result = GestureRecognitionResult {
            detected: true,
            confidence: report.confidence,
            gesture: report.target_sign,
            landmarks: report.landmarks,
        };
        if let Err(err) = self.library.save_result(&self.user_id, &result).await {
            log_warn!("failed to upload result for '{}': {err}", result.gesture);
        }
    }
}
