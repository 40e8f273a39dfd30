//! Text-level course index over a vector store backend.
//!
//! [`CourseIndex`] pairs a [`VectorStore`] backend with an [`Embedder`] and
//! exposes the operations the rest of the system works in terms of: fuzzy
//! course-name resolution, filtered content search, and idempotent course
//! ingestion.

use super::{
    CatalogEntry, ChunkEntry, ChunkMatch, ContentFilter, LessonSummary, VectorStore,
};
use crate::document::{Course, CourseChunk};
use crate::embedding::Embedder;
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Default cap on content search results.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Outcome of a content search.
///
/// Failures that the generator should see as text (unknown course, empty
/// query) are structured variants here rather than errors, so the tool layer
/// can phrase them without the whole query failing.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// Ranked matches, possibly empty.
    Hits(Vec<ChunkMatch>),
    /// A course filter was given but nothing in the catalog resolved.
    NoCourseMatch { requested: String },
    /// The query text was empty or whitespace.
    EmptyQuery,
}

/// A course outline assembled from catalog metadata.
#[derive(Debug, Clone)]
pub struct CourseOutline {
    pub title: String,
    pub link: Option<String>,
    pub instructor: Option<String>,
    pub lessons: Vec<LessonSummary>,
}

/// Result of indexing one course.
#[derive(Debug, Clone, Copy)]
pub struct IndexReport {
    /// Number of chunks written to the content collection.
    pub chunks_added: usize,
    /// True when the course title was already cataloged and left untouched.
    pub skipped: bool,
}

/// Dual-collection index: course catalog for name resolution, content
/// chunks for semantic search.
pub struct CourseIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
}

impl CourseIndex {
    /// Create a new index over the given backend and embedder.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Set the maximum number of search results.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Index a course and its chunks into both collections.
    ///
    /// Ingestion is idempotent by title: a course already present in the
    /// catalog is skipped (existence check, not content diff) unless `force`
    /// is set, in which case the old rows are removed first.
    #[instrument(skip(self, course, chunks), fields(title = %course.title))]
    pub async fn add_course(
        &self,
        course: &Course,
        chunks: &[CourseChunk],
        force: bool,
    ) -> Result<IndexReport> {
        if self.store.catalog_contains(&course.title).await? {
            if !force {
                debug!("Course '{}' already indexed, skipping", course.title);
                return Ok(IndexReport {
                    chunks_added: 0,
                    skipped: true,
                });
            }
            self.store.delete_course(&course.title).await?;
        }

        let title_embedding = self.embedder.embed(&course.title).await?;
        self.store
            .upsert_catalog(&CatalogEntry::from_course(course, title_embedding))
            .await?;

        if chunks.is_empty() {
            return Ok(IndexReport {
                chunks_added: 0,
                skipped: false,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.embedding_text()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let entries: Vec<ChunkEntry> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| ChunkEntry::from_chunk(chunk, embedding))
            .collect();

        let added = self.store.upsert_chunks(&entries).await?;
        info!("Indexed course '{}' with {} chunks", course.title, added);

        Ok(IndexReport {
            chunks_added: added,
            skipped: false,
        })
    }

    /// Resolve a partial or fuzzy course name to its canonical title.
    ///
    /// Single nearest-neighbor query against the catalog with n=1; any
    /// non-empty result is accepted as the best match. There is no
    /// similarity cutoff, so a non-empty catalog always resolves to
    /// something.
    #[instrument(skip(self))]
    pub async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let embedding = self.embedder.embed(name).await?;
        let matches = self.store.query_catalog(&embedding, 1).await?;
        Ok(matches.into_iter().next().map(|m| m.title))
    }

    /// Search course content, optionally narrowed to a course and lesson.
    ///
    /// When a course name is given it is resolved against the catalog first;
    /// resolution failure yields [`SearchOutcome::NoCourseMatch`] rather
    /// than falling through to an unfiltered search.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<SearchOutcome> {
        if query.trim().is_empty() {
            return Ok(SearchOutcome::EmptyQuery);
        }

        let mut filter = ContentFilter {
            course_title: None,
            lesson_number,
        };

        if let Some(name) = course_name {
            match self.resolve_course_name(name).await? {
                Some(title) => {
                    debug!("Resolved course name '{}' to '{}'", name, title);
                    filter.course_title = Some(title);
                }
                None => {
                    return Ok(SearchOutcome::NoCourseMatch {
                        requested: name.to_string(),
                    });
                }
            }
        }

        let embedding = self.embedder.embed(query).await?;
        let matches = self
            .store
            .query_content(&embedding, self.max_results, &filter)
            .await?;

        Ok(SearchOutcome::Hits(matches))
    }

    /// Look up a course outline by (fuzzy) name.
    pub async fn get_course_outline(&self, name: &str) -> Result<Option<CourseOutline>> {
        let Some(title) = self.resolve_course_name(name).await? else {
            return Ok(None);
        };

        let Some(entry) = self.store.get_catalog_entry(&title).await? else {
            return Ok(None);
        };

        Ok(Some(CourseOutline {
            title: entry.title,
            link: entry.link,
            instructor: entry.instructor,
            lessons: entry.lessons,
        }))
    }

    /// Look up a lesson link by exact course title and lesson number.
    pub async fn get_lesson_link(&self, title: &str, lesson_number: u32) -> Result<Option<String>> {
        let Some(entry) = self.store.get_catalog_entry(title).await? else {
            return Ok(None);
        };

        Ok(entry
            .lessons
            .iter()
            .find(|l| l.number == lesson_number)
            .and_then(|l| l.link.clone()))
    }

    /// Number of indexed courses.
    pub async fn course_count(&self) -> Result<usize> {
        self.store.course_count().await
    }

    /// All indexed course titles.
    pub async fn course_titles(&self) -> Result<Vec<String>> {
        self.store.list_course_titles().await
    }

    /// Number of indexed chunks.
    pub async fn chunk_count(&self) -> Result<usize> {
        self.store.chunk_count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Lesson;
    use crate::embedding::testing::HashEmbedder;
    use crate::vector_store::MemoryVectorStore;

    fn sample_course(title: &str) -> Course {
        Course {
            title: title.to_string(),
            link: Some(format!("https://example.com/{}", title.to_lowercase())),
            instructor: Some("Jane Doe".to_string()),
            lessons: vec![Lesson {
                number: 1,
                title: "Basics".to_string(),
                link: Some("https://example.com/lesson1".to_string()),
                body: "lesson body".to_string(),
            }],
        }
    }

    fn sample_chunks(title: &str, count: u32) -> Vec<CourseChunk> {
        (0..count)
            .map(|i| CourseChunk {
                content: format!("chunk {} about {}", i, title),
                course_title: title.to_string(),
                lesson_number: Some(1),
                chunk_index: i,
            })
            .collect()
    }

    fn index() -> CourseIndex {
        CourseIndex::new(Arc::new(MemoryVectorStore::new()), Arc::new(HashEmbedder))
    }

    #[tokio::test]
    async fn test_reingest_is_noop() {
        let index = index();
        let course = sample_course("Intro to X");
        let chunks = sample_chunks("Intro to X", 3);

        let first = index.add_course(&course, &chunks, false).await.unwrap();
        assert!(!first.skipped);
        assert_eq!(first.chunks_added, 3);

        let second = index.add_course(&course, &chunks, false).await.unwrap();
        assert!(second.skipped);
        assert_eq!(second.chunks_added, 0);

        assert_eq!(index.course_count().await.unwrap(), 1);
        assert_eq!(index.chunk_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_force_reingest_replaces() {
        let index = index();
        let course = sample_course("Intro to X");

        index
            .add_course(&course, &sample_chunks("Intro to X", 5), false)
            .await
            .unwrap();
        let report = index
            .add_course(&course, &sample_chunks("Intro to X", 2), true)
            .await
            .unwrap();

        assert!(!report.skipped);
        assert_eq!(index.chunk_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_resolve_exact_title() {
        let index = index();
        index
            .add_course(&sample_course("Intro to X"), &[], false)
            .await
            .unwrap();
        index
            .add_course(&sample_course("Advanced Networking"), &[], false)
            .await
            .unwrap();

        let resolved = index.resolve_course_name("Intro to X").await.unwrap();
        assert_eq!(resolved.as_deref(), Some("Intro to X"));
    }

    #[tokio::test]
    async fn test_resolve_on_empty_catalog() {
        let index = index();
        assert_eq!(index.resolve_course_name("Anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_search_unknown_course_is_structured() {
        let index = index();
        // Empty catalog: any course filter fails resolution.
        let outcome = index
            .search("query", Some("Nonexistent Course"), None)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            SearchOutcome::NoCourseMatch { requested } if requested == "Nonexistent Course"
        ));
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let index = index();
        let outcome = index.search("   ", None, None).await.unwrap();
        assert!(matches!(outcome, SearchOutcome::EmptyQuery));
    }

    #[tokio::test]
    async fn test_search_filters_by_resolved_course() {
        let index = index();
        index
            .add_course(
                &sample_course("Intro to X"),
                &sample_chunks("Intro to X", 2),
                false,
            )
            .await
            .unwrap();
        index
            .add_course(
                &sample_course("Other Course"),
                &sample_chunks("Other Course", 2),
                false,
            )
            .await
            .unwrap();

        let outcome = index
            .search("chunk about Intro", Some("Intro to X"), None)
            .await
            .unwrap();

        let SearchOutcome::Hits(hits) = outcome else {
            panic!("expected hits");
        };
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.course_title == "Intro to X"));
    }

    #[tokio::test]
    async fn test_result_cap() {
        let index = index().with_max_results(2);
        index
            .add_course(
                &sample_course("Intro to X"),
                &sample_chunks("Intro to X", 10),
                false,
            )
            .await
            .unwrap();

        let outcome = index.search("chunk", None, None).await.unwrap();
        let SearchOutcome::Hits(hits) = outcome else {
            panic!("expected hits");
        };
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_outline_and_lesson_link() {
        let index = index();
        index
            .add_course(&sample_course("Intro to X"), &[], false)
            .await
            .unwrap();

        let outline = index
            .get_course_outline("Intro to X")
            .await
            .unwrap()
            .expect("outline should exist");
        assert_eq!(outline.title, "Intro to X");
        assert_eq!(outline.lessons.len(), 1);

        let link = index.get_lesson_link("Intro to X", 1).await.unwrap();
        assert_eq!(link.as_deref(), Some("https://example.com/lesson1"));
        assert_eq!(index.get_lesson_link("Intro to X", 9).await.unwrap(), None);
    }
}
