use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use signsee_lib::{
    camera::{LandmarkRecording, ReplayCamera, ReplayDetectorLoader},
    config::AppConfig,
    events::PracticeEvent,
    init_logging,
    models::QuizResult,
    practice::SessionCommand,
    AppState,
};

#[derive(Parser, Debug)]
#[command(name = "signsee", about = "SignSee sign-language practice engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a practice session against a recorded landmark file
    Practice {
        /// JSON landmark recording to replay as the camera
        #[arg(long)]
        replay: PathBuf,

        /// Target signs, in order (default: the built-in practice set)
        #[arg(long = "sign")]
        signs: Vec<String>,
    },
    /// List signs, optionally for one category or matching a phrase
    Signs {
        #[arg(long)]
        category: Option<String>,

        /// Words or a phrase to look up, e.g. "thank you"
        #[arg(long, conflicts_with = "category")]
        search: Option<String>,
    },
    /// List lessons, optionally for one module
    Lessons {
        #[arg(long)]
        module: Option<u32>,
    },
    /// Show the learner's progress
    Progress,
    /// Show each module's status on the learning path
    Modules,
    /// Record a finished lesson and award its XP
    CompleteLesson { lesson_id: String },
    /// Show a module quiz, or grade answers to it
    Quiz {
        module: u32,

        /// Chosen option per question, in order, e.g. 0,2,1,3,0
        #[arg(long, value_delimiter = ',')]
        answers: Vec<usize>,
    },
    /// Show recent practice sessions, or the scored attempts behind them
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Scored attempts for one sign
        #[arg(long, conflicts_with = "session")]
        sign: Option<String>,

        /// Scored attempts recorded during one session
        #[arg(long)]
        session: Option<String>,
    },
    /// Show or change who is practicing
    Learner {
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: Option<String>,
    },
    /// Check that the gesture service is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let state = AppState::bootstrap(AppConfig::from_env()).await?;
    info!("SignSee starting up for {}", state.user_id());

    match cli.command {
        Command::Practice { replay, signs } => practice(&state, replay, signs).await,
        Command::Signs { category, search } => {
            let signs = match (category, search) {
                (_, Some(query)) => state.store.search_signs(&query).await,
                (Some(category), None) => state.store.signs_by_category(&category).await,
                (None, None) => state.store.signs().await,
            };
            print_json(&signs)
        }
        Command::Lessons { module } => {
            let lessons = match module {
                Some(module) => state.store.lessons_by_module(module).await,
                None => state.store.lessons().await,
            };
            print_json(&lessons)
        }
        Command::Progress => print_json(&state.progress_tracker().await.snapshot().await),
        Command::Modules => {
            let lessons = state.store.lessons().await;
            print_json(&state.progress_tracker().await.modules(&lessons).await)
        }
        Command::CompleteLesson { lesson_id } => {
            let lesson = state
                .store
                .lesson(&lesson_id)
                .await
                .ok_or_else(|| anyhow!("unknown lesson {lesson_id}"))?;
            let module_lessons = state.store.lessons_by_module(lesson.module_id).await;
            let progress = state
                .progress_tracker()
                .await
                .complete_lesson(&lesson, &module_lessons)
                .await;
            print_json(&progress)
        }
        Command::Quiz { module, answers } => {
            let questions = state.store.module_quiz(module);
            if questions.is_empty() {
                return Err(anyhow!("module {module} has no quiz"));
            }
            if answers.is_empty() {
                return print_json(&questions);
            }
            let result = QuizResult::from_answers(module, &questions, &answers);
            state.progress_tracker().await.record_quiz(&result).await;
            print_json(&result)
        }
        Command::History { limit, sign, session } => match (sign, session) {
            (Some(sign), _) => print_json(&state.db.list_practice_results(Some(&sign), limit).await?),
            (None, Some(session)) => print_json(&state.db.list_session_results(&session).await?),
            (None, None) => print_json(&state.db.list_practice_sessions(limit).await?),
        },
        Command::Learner { id, name } => {
            let mut learner = state.settings.learner();
            if id.is_none() && name.is_none() {
                return print_json(&learner);
            }
            if let Some(id) = id {
                learner.user_id = id;
            }
            if name.is_some() {
                learner.display_name = name;
            }
            state.settings.update_learner(learner.clone())?;
            info!("now practicing as {}", learner.user_id);
            print_json(&learner)
        }
        Command::Health => {
            let healthy = state.gestures.health().await;
            println!(
                "gesture service at {} is {}",
                state.config.backend.url,
                if healthy { "reachable" } else { "unreachable" }
            );
            Ok(())
        }
    }
}

async fn practice(state: &AppState, replay: PathBuf, signs: Vec<String>) -> Result<()> {
    let recording = Arc::new(LandmarkRecording::load(&replay)?);
    let signs = if signs.is_empty() {
        state.practice_signs().await
    } else {
        signs
    };

    let mut events = state.events.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(PracticeEvent::PracticeStateChanged(practice)) => {
                    if let Some(target) = &practice.target_sign {
                        println!("[{target}] {}", practice.feedback);
                    }
                }
                Ok(PracticeEvent::ProgressUpdated(progress)) => {
                    println!("level {} ({} xp to next level)", progress.level, progress.xp_to_next_level);
                }
                Ok(PracticeEvent::SessionCompleted(_)) | Err(RecvError::Closed) => break,
                Ok(PracticeEvent::GestureScored(_)) => {}
                Err(RecvError::Lagged(skipped)) => warn!("event printer skipped {skipped} events"),
            }
        }
    });

    let runner = state
        .session_runner(
            Arc::new(ReplayCamera::new(recording.clone())),
            Arc::new(ReplayDetectorLoader::new(recording)),
        )
        .await;
    let handle = runner.spawn(signs).await?;

    let commands = handle.command_sender();
    let session_id = handle.session_id().to_string();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("cancelling practice session {session_id}");
            let _ = commands.send(SessionCommand::Cancel).await;
        }
    });

    let summary = handle.finished().await?;
    let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;
    print_json(&summary)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{output}");
    Ok(())
}
