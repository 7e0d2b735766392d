//! Mentord CLI entry point

use std::fs;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::info;

use mentord::cli::{Cli, Command, MaterialCommand, QuizCommand, SessionCommand};
use mentord::config::Config;
use mentord::llm::create_client;
use mentord::prompts::{EmbeddedPrompts, FilePrompts, PromptProvider};
use mentord::tools::{Dispatcher, ToolRegistry};
use mentord::turn::{TurnConfig, TurnCoordinator, TurnEvent, transport};
use studystore::{StoreError, StudyStore};

fn setup_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(model = %config.llm.model, "mentord starting");

    let store = open_store(&config)?;

    match cli.command {
        Command::Session { command } => match command {
            SessionCommand::New { user, name } => cmd_session_new(&store, &user, &name),
            SessionCommand::List { user } => cmd_session_list(&store, &user),
            SessionCommand::Archive { session_id } => cmd_session_archive(&store, session_id),
        },
        Command::Chat { session_id, message, sse } => cmd_chat(&config, store, session_id, &message, sse).await,
        Command::Roadmap { session_id } => cmd_roadmap(&store, session_id),
        Command::Quiz { command } => match command {
            QuizCommand::Attempt { quiz_id, score } => cmd_quiz_attempt(&store, quiz_id, score),
        },
        Command::Material { command } => match command {
            MaterialCommand::Done { material_id } => {
                store.mark_material_completed(material_id)?;
                println!("Marked material {material_id} completed");
                Ok(())
            }
            MaterialCommand::Rate { material_id, rating } => {
                store.rate_material(material_id, rating)?;
                println!("Rated material {material_id}: {rating}/5");
                Ok(())
            }
        },
    }
}

fn open_store(config: &Config) -> Result<Arc<StudyStore>> {
    if let Some(parent) = config.storage.db_path.parent() {
        fs::create_dir_all(parent).context("Failed to create data directory")?;
    }
    let store = StudyStore::open(&config.storage.db_path)
        .with_context(|| format!("Failed to open store at {}", config.storage.db_path.display()))?;
    Ok(Arc::new(store))
}

fn cmd_session_new(store: &Arc<StudyStore>, user: &str, name: &str) -> Result<()> {
    let session = store.create_session(user, name, None)?;
    println!("Created session {} ({})", session.id, session.name);
    Ok(())
}

fn cmd_session_list(store: &Arc<StudyStore>, user: &str) -> Result<()> {
    let sessions = store.sessions_by_user(user)?;
    if sessions.is_empty() {
        println!("No sessions for user {user}");
        return Ok(());
    }
    for session in sessions {
        println!("{:>5}  {:<10} {}", session.id, session.status.to_string(), session.name);
    }
    Ok(())
}

fn cmd_session_archive(store: &Arc<StudyStore>, session_id: i64) -> Result<()> {
    let session = store.archive_session(session_id)?;
    println!("Archived session {}", session.id);
    Ok(())
}

async fn cmd_chat(config: &Config, store: Arc<StudyStore>, session_id: i64, message: &str, sse: bool) -> Result<()> {
    config.validate()?;

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let prompts: Arc<dyn PromptProvider> = match &config.prompts.dir {
        Some(dir) => Arc::new(FilePrompts::new(dir)),
        None => Arc::new(EmbeddedPrompts::new()),
    };
    let dispatcher = Dispatcher::new(ToolRegistry::standard());
    let coordinator = Arc::new(TurnCoordinator::new(
        store,
        llm,
        prompts,
        dispatcher,
        TurnConfig::from_config(config),
    ));

    let mut events = coordinator.submit_turn(session_id, message);
    let mut failed = false;
    while let Some(event) = events.recv().await {
        if sse {
            print!("{}", transport::sse_frame(&event));
            continue;
        }
        match &event {
            TurnEvent::ModelResponse { content, tool_calls } => {
                if !content.is_empty() {
                    println!("{}", content);
                }
                for call in tool_calls {
                    println!("{} {}", "→".cyan(), call.name.cyan());
                }
            }
            TurnEvent::ToolResult {
                tool, success, message, ..
            } => {
                if *success {
                    println!("{} {}: {}", "✓".green(), tool, message);
                } else {
                    println!("{} {}: {}", "✗".red(), tool, message);
                }
            }
            TurnEvent::Error { code, message } => {
                eprintln!("{} [{}] {}", "error".red().bold(), code, message);
                failed = true;
            }
            TurnEvent::Done { usage } => {
                println!(
                    "{}",
                    format!("done ({} in / {} out tokens)", usage.input_tokens, usage.output_tokens).dimmed()
                );
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_roadmap(store: &Arc<StudyStore>, session_id: i64) -> Result<()> {
    let Some(roadmap) = store.roadmap_by_session(session_id)? else {
        println!("No roadmap for session {session_id}");
        return Ok(());
    };

    println!("{} [{}]", roadmap.graduation_project_title.bold(), roadmap.status);
    println!("{}", roadmap.graduation_project);
    println!("Estimated: {} weeks", roadmap.total_estimated_weeks);
    println!();

    for goal in store.goals_by_roadmap(roadmap.id)? {
        println!(
            "{:>3}. {} (priority {}, {} h, {}% complete)",
            goal.goal_number, goal.title, goal.priority, goal.estimated_hours, goal.completion_percentage
        );
    }
    Ok(())
}

fn cmd_quiz_attempt(store: &Arc<StudyStore>, quiz_id: i64, score: f64) -> Result<()> {
    match store.create_quiz_attempt(quiz_id, score) {
        Ok(attempt) => {
            let verdict = if attempt.passed { "passed".green() } else { "failed".red() };
            println!(
                "Attempt {} of quiz {}: {:.1}% ({})",
                attempt.attempt_number, quiz_id, attempt.score_percentage, verdict
            );
            Ok(())
        }
        Err(StoreError::AttemptsExhausted { max_attempts, .. }) => {
            eprintln!("No attempts left: quiz {quiz_id} allows at most {max_attempts}");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
