//! CLI module for Pensum.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Pensum - Course Material Q&A with RAG
///
/// A local-first CLI tool for indexing course transcripts and asking
/// questions about them. The name "Pensum" comes from the Norwegian word
/// for "syllabus."
#[derive(Parser, Debug)]
#[command(name = "pensum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest course transcript files into the knowledge base
    Ingest {
        /// A course document or a folder of course documents
        path: String,

        /// Force re-indexing of courses that are already present
        #[arg(short, long)]
        force: bool,
    },

    /// Ask a question about your course materials
    Ask {
        /// The question to ask
        question: String,

        /// Session id for conversational context (from a previous ask)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start an interactive chat session
    Chat,

    /// Search course content directly, without the assistant
    Search {
        /// Search query
        query: String,

        /// Restrict to a course (partial names are matched)
        #[arg(long)]
        course: Option<String>,

        /// Restrict to a lesson number
        #[arg(long)]
        lesson: Option<u32>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a course outline (title, link, lesson list)
    Outline {
        /// Course title (partial names are matched)
        course: String,
    },

    /// List indexed courses
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "generation.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Show configuration file path
    Path,
}
