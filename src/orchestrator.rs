//! Query and ingestion coordination for Pensum.
//!
//! Composes the document processor, course index, tool-calling protocol and
//! session store into the two entry points callers use: `query` and
//! `load_course_folder`.

use crate::agent::{Source, ToolContext, ToolController};
use crate::chunking::ChunkingConfig;
use crate::config::{Prompts, Settings};
use crate::document::DocumentProcessor;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::generation::{Generator, OpenAIGenerator};
use crate::session::SessionStore;
use crate::vector_store::{
    CourseIndex, MemoryVectorStore, SqliteVectorStore, VectorStore,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Course file extensions accepted by folder ingestion.
const COURSE_FILE_EXTENSIONS: &[&str] = &["txt", "md"];

/// The main orchestrator for Pensum queries and ingestion.
pub struct Orchestrator {
    prompts: Prompts,
    processor: DocumentProcessor,
    index: Arc<CourseIndex>,
    tools: Arc<ToolContext>,
    controller: ToolController,
    sessions: SessionStore,
}

impl Orchestrator {
    /// Create a new orchestrator with default components from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "memory" => Arc::new(MemoryVectorStore::new()),
            _ => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
        };

        let generator: Arc<dyn Generator> = Arc::new(OpenAIGenerator::new(
            &settings.generation.model,
            settings.generation.max_tokens,
            settings.generation.temperature,
        ));

        Self::with_components(settings, prompts, store, embedder, generator)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let processor = DocumentProcessor::new(ChunkingConfig {
            chunk_size: settings.chunking.chunk_size,
            chunk_overlap: settings.chunking.chunk_overlap,
        })?;

        let index = Arc::new(
            CourseIndex::new(store, embedder).with_max_results(settings.search.max_results),
        );
        let tools = Arc::new(ToolContext::new(index.clone()));
        let controller = ToolController::new(generator, tools.clone());
        let sessions = SessionStore::new(settings.session.max_turns);

        Ok(Self {
            prompts,
            processor,
            index,
            tools,
            controller,
            sessions,
        })
    }

    /// Get a reference to the course index (for direct search).
    pub fn course_index(&self) -> Arc<CourseIndex> {
        self.index.clone()
    }

    /// Start a new conversation session.
    pub fn create_session(&self) -> String {
        self.sessions.create_session()
    }

    /// Drop a conversation session.
    pub fn clear_session(&self, session_id: &str) {
        self.sessions.clear_session(session_id);
    }

    /// Answer a question, optionally within a session.
    ///
    /// Runs the two-round tool protocol; the generator decides whether a
    /// search happens. Store and tool failures degrade to tool-less answers
    /// inside the protocol; only generator failures surface here.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn query(&self, session_id: Option<&str>, question: &str) -> Result<QueryResponse> {
        self.tools.reset_sources();

        let history = session_id.and_then(|id| self.sessions.format_history(id));
        let system = self.prompts.system_with_history(history.as_deref());

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.assistant.user, &vars);

        let answer = self.controller.run(&system, &user_prompt).await?;

        if let Some(id) = session_id {
            self.sessions.append(id, question, &answer);
        }

        let sources = self.tools.last_sources();
        self.tools.reset_sources();

        Ok(QueryResponse { answer, sources })
    }

    /// Parse and index a single course document.
    ///
    /// Returns the course title and how many chunks were added; an already
    /// indexed title is skipped unless `force` is set.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn add_course_document(
        &self,
        path: &Path,
        force: bool,
    ) -> Result<(String, usize, bool)> {
        let text = std::fs::read_to_string(path)?;
        let (course, chunks) = self.processor.process(&text)?;
        let report = self.index.add_course(&course, &chunks, force).await?;

        if report.skipped {
            info!("Course '{}' already indexed, skipping", course.title);
        }

        Ok((course.title, report.chunks_added, report.skipped))
    }

    /// Ingest every course file in a folder.
    ///
    /// A malformed file is reported and skipped, never fatal to the batch.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub async fn load_course_folder(&self, path: impl AsRef<Path>) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        let mut files: Vec<_> = std::fs::read_dir(path.as_ref())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| COURSE_FILE_EXTENSIONS.contains(&ext))
            })
            .collect();
        files.sort();

        for file in files {
            match self.add_course_document(&file, false).await {
                Ok((title, chunks_added, skipped)) => {
                    if !skipped {
                        report.courses_added += 1;
                        report.chunks_added += chunks_added;
                        info!("Ingested '{}' ({} chunks)", title, chunks_added);
                    }
                }
                Err(e) => {
                    warn!("Skipping {}: {}", file.display(), e);
                    report
                        .errors
                        .push(format!("{}: {}", file.display(), e));
                }
            }
        }

        Ok(report)
    }

    /// Course counts and titles for display.
    pub async fn analytics(&self) -> Result<CourseAnalytics> {
        Ok(CourseAnalytics {
            total_courses: self.index.course_count().await?,
            course_titles: self.index.course_titles().await?,
        })
    }
}

/// Answer plus the sources captured during one query.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    /// The generated answer.
    pub answer: String,
    /// Attributions from the search performed for this query, if any.
    pub sources: Vec<Source>,
}

/// Result of a folder ingestion batch.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Courses newly added (skipped ones not counted).
    pub courses_added: usize,
    /// Chunks newly added.
    pub chunks_added: usize,
    /// Per-file errors, in file order.
    pub errors: Vec<String>,
}

/// Course statistics for display.
#[derive(Debug, Clone)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}
