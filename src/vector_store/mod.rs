//! Dual-collection vector store abstraction for Pensum.
//!
//! The store holds two independent logical collections with the same
//! interface shape:
//!
//! - **catalog**: one entry per course, keyed by title. The embedded
//!   document is the title itself, used for fuzzy course-name resolution.
//! - **content**: one entry per chunk, keyed by (course title, chunk index),
//!   used for semantic content search.
//!
//! Backends implement the [`VectorStore`] trait; [`CourseIndex`] layers the
//! text-level operations (name resolution, filtered search, idempotent
//! ingestion) on top of a backend plus an embedder.

mod index;
mod memory;
mod sqlite;

pub use index::{CourseIndex, CourseOutline, IndexReport, SearchOutcome};
pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::document::{Course, CourseChunk, Lesson};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lesson metadata carried by a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSummary {
    pub number: u32,
    pub title: String,
    pub link: Option<String>,
}

impl From<&Lesson> for LessonSummary {
    fn from(lesson: &Lesson) -> Self {
        Self {
            number: lesson.number,
            title: lesson.title.clone(),
            link: lesson.link.clone(),
        }
    }
}

/// A course entry in the catalog collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Course title (storage key, embedded for name matching).
    pub title: String,
    pub instructor: Option<String>,
    pub link: Option<String>,
    /// Lesson metadata in document order.
    pub lessons: Vec<LessonSummary>,
    /// Embedding of the course title.
    pub embedding: Vec<f32>,
    /// When this course was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl CatalogEntry {
    /// Build a catalog entry from a parsed course and its title embedding.
    pub fn from_course(course: &Course, embedding: Vec<f32>) -> Self {
        Self {
            title: course.title.clone(),
            instructor: course.instructor.clone(),
            link: course.link.clone(),
            lessons: course.lessons.iter().map(LessonSummary::from).collect(),
            embedding,
            indexed_at: Utc::now(),
        }
    }

    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }
}

/// A chunk entry in the content collection.
///
/// Identity is (course title, chunk index); entries are immutable once
/// created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkEntry {
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub chunk_index: u32,
    /// Raw chunk text (without the retrieval prefix).
    pub content: String,
    /// Embedding of the prefixed chunk text.
    pub embedding: Vec<f32>,
    pub indexed_at: DateTime<Utc>,
}

impl ChunkEntry {
    /// Build a content entry from a chunk and its embedding.
    pub fn from_chunk(chunk: &CourseChunk, embedding: Vec<f32>) -> Self {
        Self {
            course_title: chunk.course_title.clone(),
            lesson_number: chunk.lesson_number,
            chunk_index: chunk.chunk_index,
            content: chunk.content.clone(),
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A catalog query match.
#[derive(Debug, Clone)]
pub struct CatalogMatch {
    pub title: String,
    pub score: f32,
}

/// A content query match.
#[derive(Debug, Clone)]
pub struct ChunkMatch {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub chunk_index: u32,
    pub score: f32,
}

/// Metadata filter for content queries.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    /// Canonical course title (already resolved).
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
}

impl ContentFilter {
    pub fn matches(&self, entry: &ChunkEntry) -> bool {
        if let Some(title) = &self.course_title {
            if entry.course_title != *title {
                return false;
            }
        }
        if let Some(lesson) = self.lesson_number {
            if entry.lesson_number != Some(lesson) {
                return false;
            }
        }
        true
    }
}

/// Trait for vector store backends.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace a catalog entry.
    async fn upsert_catalog(&self, entry: &CatalogEntry) -> Result<()>;

    /// Check whether a course title exists in the catalog.
    async fn catalog_contains(&self, title: &str) -> Result<bool>;

    /// Fetch a catalog entry by exact title.
    async fn get_catalog_entry(&self, title: &str) -> Result<Option<CatalogEntry>>;

    /// Nearest-neighbor query against the catalog collection.
    async fn query_catalog(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<CatalogMatch>>;

    /// All course titles in the catalog.
    async fn list_course_titles(&self) -> Result<Vec<String>>;

    /// Number of catalog entries.
    async fn course_count(&self) -> Result<usize>;

    /// Bulk insert or replace content entries.
    async fn upsert_chunks(&self, entries: &[ChunkEntry]) -> Result<usize>;

    /// Ranked query against the content collection.
    async fn query_content(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: &ContentFilter,
    ) -> Result<Vec<ChunkMatch>>;

    /// Number of content entries.
    async fn chunk_count(&self) -> Result<usize>;

    /// Remove a course from both collections. Returns the number of chunks
    /// removed.
    async fn delete_course(&self, title: &str) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Rank matches by score descending; ties fall back to chunk index order so
/// results are stable.
pub(crate) fn rank_chunk_matches(matches: &mut Vec<ChunkMatch>, limit: usize) {
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.course_title.cmp(&b.course_title))
            .then_with(|| a.chunk_index.cmp(&b.chunk_index))
    });
    matches.truncate(limit);
}
