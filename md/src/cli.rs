//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mentord - AI learning-session orchestrator
#[derive(Parser)]
#[command(
    name = "md",
    about = "AI learning mentor: phased roadmaps, materials, quizzes, and graduation projects",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Manage learning sessions
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Send one message to a session and stream the turn's events
    Chat {
        /// Session id
        session_id: i64,

        /// The message to send
        message: String,

        /// Print raw SSE frames instead of human-readable output
        #[arg(long)]
        sse: bool,
    },

    /// Show a session's roadmap and goals
    Roadmap {
        /// Session id
        session_id: i64,
    },

    /// Record a quiz attempt
    Quiz {
        #[command(subcommand)]
        command: QuizCommand,
    },

    /// Update learning material progress
    Material {
        #[command(subcommand)]
        command: MaterialCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand)]
pub enum SessionCommand {
    /// Create a new session
    New {
        /// Owning user id
        #[arg(short, long)]
        user: String,

        /// Display name
        #[arg(short, long, default_value = "Learning session")]
        name: String,
    },

    /// List a user's sessions
    List {
        /// Owning user id
        #[arg(short, long)]
        user: String,
    },

    /// Archive a session
    Archive {
        /// Session id
        session_id: i64,
    },
}

/// Quiz subcommands
#[derive(Subcommand)]
pub enum QuizCommand {
    /// Record one attempt at a quiz
    Attempt {
        /// Quiz id
        quiz_id: i64,

        /// Score as a percentage (0-100)
        #[arg(short, long)]
        score: f64,
    },
}

/// Material subcommands
#[derive(Subcommand)]
pub enum MaterialCommand {
    /// Mark a material as worked through
    Done {
        /// Material id
        material_id: i64,
    },

    /// Rate a material (1-5)
    Rate {
        /// Material id
        material_id: i64,

        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: u8,
    },
}
