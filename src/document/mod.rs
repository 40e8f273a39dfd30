//! Course document model and processing.
//!
//! A course document is a plain-text transcript with a labeled metadata
//! header followed by lesson sections. This module parses documents into
//! [`Course`] structures and produces the overlapping [`CourseChunk`]s that
//! get indexed for retrieval.

mod parser;
mod processor;

pub use parser::{parse_course_document, ParsedDocument};
pub use processor::DocumentProcessor;

use serde::{Deserialize, Serialize};

/// A course parsed from a transcript document.
///
/// Identity is the title; re-ingesting a known title is a no-op unless forced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Course title (unique storage key).
    pub title: String,
    /// Course link, if present in the header.
    pub link: Option<String>,
    /// Instructor name, if present in the header.
    pub instructor: Option<String>,
    /// Lessons in document order.
    pub lessons: Vec<Lesson>,
}

/// A lesson within a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson number (unique within a course, not necessarily contiguous).
    pub number: u32,
    /// Lesson title.
    pub title: String,
    /// Lesson link, if present.
    pub link: Option<String>,
    /// Raw text body of the lesson.
    pub body: String,
}

/// A bounded segment of course text, the unit of semantic retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    /// Raw chunk text (reconstructible slice of the source body).
    pub content: String,
    /// Owning course title.
    pub course_title: String,
    /// Owning lesson number; `None` for text preceding any lesson marker.
    pub lesson_number: Option<u32>,
    /// Position within the course, strictly increasing in emission order.
    pub chunk_index: u32,
}

impl CourseChunk {
    /// Text handed to the embedder: the raw content with a short contextual
    /// prefix identifying course and lesson. Used for retrieval relevance
    /// only, never for reconstruction.
    pub fn embedding_text(&self) -> String {
        match self.lesson_number {
            Some(n) => format!(
                "Course {} Lesson {} content: {}",
                self.course_title, n, self.content
            ),
            None => format!("Course {} content: {}", self.course_title, self.content),
        }
    }
}
