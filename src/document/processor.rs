//! Document-to-chunk processing.

use super::parser::parse_course_document;
use super::{Course, CourseChunk};
use crate::chunking::{split_with_overlap, ChunkingConfig};
use crate::error::Result;
use tracing::debug;

/// Turns raw course documents into a [`Course`] plus its ordered,
/// overlap-linked [`CourseChunk`]s.
///
/// Pure transformation: no side effects, errors are returned to the caller.
pub struct DocumentProcessor {
    config: ChunkingConfig,
}

impl DocumentProcessor {
    /// Create a processor with the given chunking configuration.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Parse a document and split its bodies into chunks.
    ///
    /// Chunk indices are per-course and strictly increasing in emission
    /// order: course-level preamble first, then lessons in document order.
    pub fn process(&self, document_text: &str) -> Result<(Course, Vec<CourseChunk>)> {
        let parsed = parse_course_document(document_text)?;
        let course = parsed.course;

        let mut chunks = Vec::new();
        let mut chunk_index = 0u32;

        let push_chunks = |body: &str, lesson_number: Option<u32>, chunks: &mut Vec<CourseChunk>, chunk_index: &mut u32| {
            for content in split_with_overlap(body, &self.config) {
                chunks.push(CourseChunk {
                    content,
                    course_title: course.title.clone(),
                    lesson_number,
                    chunk_index: *chunk_index,
                });
                *chunk_index += 1;
            }
        };

        if let Some(preamble) = &parsed.preamble {
            push_chunks(preamble, None, &mut chunks, &mut chunk_index);
        }

        for lesson in &course.lessons {
            if lesson.body.is_empty() {
                continue;
            }
            push_chunks(&lesson.body, Some(lesson.number), &mut chunks, &mut chunk_index);
        }

        debug!(
            "Processed course '{}': {} lessons, {} chunks",
            course.title,
            course.lessons.len(),
            chunks.len()
        );

        Ok((course, chunks))
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }
}
