//! Pensum - Course Material Q&A with RAG
//!
//! A local-first CLI tool for indexing course transcripts and answering
//! questions about them with AI-generated, source-cited responses.
//!
//! The name "Pensum" comes from the Norwegian word for "syllabus."
//!
//! # Overview
//!
//! Pensum allows you to:
//! - Ingest structured course transcripts into a searchable vector database
//! - Ask questions and get AI-powered answers with course/lesson citations
//! - Let the model decide per question whether a search is needed
//! - Search course content semantically, filtered by course or lesson
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `document` - Course document parsing and chunk production
//! - `chunking` - Overlapping text segmentation
//! - `embedding` - Embedding generation
//! - `vector_store` - Dual-collection vector database abstraction
//! - `generation` - Chat completion abstraction with tool use
//! - `agent` - Search tool and the two-round tool-calling protocol
//! - `session` - Bounded per-session conversation history
//! - `orchestrator` - Query and ingestion coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use pensum::config::Settings;
//! use pensum::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     // Index a folder of course transcripts
//!     let report = orchestrator.load_course_folder("./docs").await?;
//!     println!("Indexed {} courses", report.courses_added);
//!
//!     // Ask a question
//!     let response = orchestrator.query(None, "What is covered in lesson 1?").await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod openai;
pub mod orchestrator;
pub mod session;
pub mod vector_store;

pub use error::{PensumError, Result};
