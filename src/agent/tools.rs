//! Tool definitions and execution against the course index.

use crate::error::{PensumError, Result};
use crate::generation::ToolDefinition;
use crate::vector_store::{ChunkMatch, CourseIndex, SearchOutcome};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Tools the generator can request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Semantic search over course content.
    SearchCourseContent {
        query: String,
        course_name: Option<String>,
        lesson_number: Option<u32>,
    },

    /// Course outline: title, link and the full lesson list.
    GetCourseOutline { course_name: String },
}

/// A source attribution captured from the last search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Display title, e.g. "Intro to X - Lesson 1".
    pub title: String,
    /// Lesson link, when the catalog knows one.
    pub url: Option<String>,
}

/// Tool execution context with access to the course index.
///
/// Keeps the attribution list from the most recent search so the caller can
/// surface citations; reset at the start of each new query.
pub struct ToolContext {
    index: Arc<CourseIndex>,
    last_sources: Mutex<Vec<Source>>,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(index: Arc<CourseIndex>) -> Self {
        Self {
            index,
            last_sources: Mutex::new(Vec::new()),
        }
    }

    /// Execute a tool call and return the result as text for the generator.
    pub async fn execute(&self, call: &ToolCall) -> Result<String> {
        match call {
            ToolCall::SearchCourseContent {
                query,
                course_name,
                lesson_number,
            } => {
                self.execute_search(query, course_name.as_deref(), *lesson_number)
                    .await
            }
            ToolCall::GetCourseOutline { course_name } => {
                self.execute_outline(course_name).await
            }
        }
    }

    /// Sources recorded by the most recent search.
    pub fn last_sources(&self) -> Vec<Source> {
        self.last_sources.lock().unwrap().clone()
    }

    /// Clear recorded sources.
    pub fn reset_sources(&self) {
        self.last_sources.lock().unwrap().clear();
    }

    async fn execute_search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<String> {
        let outcome = self.index.search(query, course_name, lesson_number).await?;

        match outcome {
            SearchOutcome::EmptyQuery => Ok("Search error: empty query.".to_string()),
            SearchOutcome::NoCourseMatch { requested } => {
                Ok(format!("No course found matching '{}'.", requested))
            }
            SearchOutcome::Hits(hits) if hits.is_empty() => {
                let mut message = String::from("No relevant content found");
                if let Some(course) = course_name {
                    message.push_str(&format!(" in course '{}'", course));
                }
                if let Some(lesson) = lesson_number {
                    message.push_str(&format!(" in lesson {}", lesson));
                }
                message.push('.');
                Ok(message)
            }
            SearchOutcome::Hits(hits) => {
                self.record_sources(&hits).await;
                Ok(format_hits(&hits))
            }
        }
    }

    async fn execute_outline(&self, course_name: &str) -> Result<String> {
        let Some(outline) = self.index.get_course_outline(course_name).await? else {
            return Ok(format!("No course found matching '{}'.", course_name));
        };

        let mut out = format!("Course: {}", outline.title);
        if let Some(link) = &outline.link {
            out.push_str(&format!("\nCourse Link: {}", link));
        }
        if let Some(instructor) = &outline.instructor {
            out.push_str(&format!("\nInstructor: {}", instructor));
        }
        out.push_str(&format!("\nLessons ({}):", outline.lessons.len()));
        for lesson in &outline.lessons {
            out.push_str(&format!("\nLesson {}: {}", lesson.number, lesson.title));
        }

        Ok(out)
    }

    /// Record deduplicated attributions, in result order, for citation
    /// display.
    async fn record_sources(&self, hits: &[ChunkMatch]) {
        let mut sources: Vec<Source> = Vec::new();

        for hit in hits {
            let title = match hit.lesson_number {
                Some(n) => format!("{} - Lesson {}", hit.course_title, n),
                None => hit.course_title.clone(),
            };
            if sources.iter().any(|s| s.title == title) {
                continue;
            }

            let url = match hit.lesson_number {
                Some(n) => self
                    .index
                    .get_lesson_link(&hit.course_title, n)
                    .await
                    .unwrap_or(None),
                None => None,
            };
            sources.push(Source { title, url });
        }

        debug!("Recorded {} sources from search", sources.len());
        *self.last_sources.lock().unwrap() = sources;
    }
}

/// Format search hits as plain text for the generator: course/lesson
/// attribution header plus chunk text, concatenated in result order.
fn format_hits(hits: &[ChunkMatch]) -> String {
    hits.iter()
        .map(|hit| {
            let header = match hit.lesson_number {
                Some(n) => format!("[{} - Lesson {}]", hit.course_title, n),
                None => format!("[{}]", hit.course_title),
            };
            format!("{}\n{}", header, hit.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Get the tool schemas described to the generator.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "search_course_content".to_string(),
            description: "Search course materials for specific content. \
                Use this for questions about course content or detailed educational materials."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial names are matched, e.g. 'MCP' or 'Intro')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "get_course_outline".to_string(),
            description: "Get a course outline: title, link, and the complete lesson list. \
                Use this for questions about course structure or what topics a course covers."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial names are matched)"
                    }
                },
                "required": ["course_name"]
            }),
        },
    ]
}

/// Parse a tool call from the generator's (name, JSON arguments) shape.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| PensumError::InvalidToolArguments(format!("invalid JSON: {}", e)))?;

    match name {
        "search_course_content" => {
            let query = args["query"]
                .as_str()
                .ok_or_else(|| {
                    PensumError::InvalidToolArguments("missing 'query' argument".to_string())
                })?
                .to_string();
            let course_name = args["course_name"].as_str().map(|s| s.to_string());
            let lesson_number = args["lesson_number"].as_u64().map(|n| n as u32);
            Ok(ToolCall::SearchCourseContent {
                query,
                course_name,
                lesson_number,
            })
        }
        "get_course_outline" => {
            let course_name = args["course_name"]
                .as_str()
                .ok_or_else(|| {
                    PensumError::InvalidToolArguments("missing 'course_name' argument".to_string())
                })?
                .to_string();
            Ok(ToolCall::GetCourseOutline { course_name })
        }
        _ => Err(PensumError::InvalidToolArguments(format!(
            "unknown tool: {}",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Course, CourseChunk, Lesson};
    use crate::embedding::testing::HashEmbedder;
    use crate::vector_store::MemoryVectorStore;

    async fn context_with_course() -> ToolContext {
        let index = Arc::new(CourseIndex::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(HashEmbedder),
        ));

        let course = Course {
            title: "Intro to X".to_string(),
            link: Some("https://example.com/x".to_string()),
            instructor: Some("Jane Doe".to_string()),
            lessons: vec![
                Lesson {
                    number: 1,
                    title: "Basics".to_string(),
                    link: Some("https://example.com/x/1".to_string()),
                    body: String::new(),
                },
                Lesson {
                    number: 2,
                    title: "More".to_string(),
                    link: None,
                    body: String::new(),
                },
            ],
        };
        let chunks = vec![
            CourseChunk {
                content: "Variables hold values.".to_string(),
                course_title: "Intro to X".to_string(),
                lesson_number: Some(1),
                chunk_index: 0,
            },
            CourseChunk {
                content: "Functions compute things.".to_string(),
                course_title: "Intro to X".to_string(),
                lesson_number: Some(2),
                chunk_index: 1,
            },
        ];

        index.add_course(&course, &chunks, false).await.unwrap();
        ToolContext::new(index)
    }

    #[test]
    fn test_parse_search_tool() {
        let call = parse_tool_call(
            "search_course_content",
            r#"{"query": "variables", "course_name": "Intro", "lesson_number": 1}"#,
        )
        .unwrap();
        match call {
            ToolCall::SearchCourseContent {
                query,
                course_name,
                lesson_number,
            } => {
                assert_eq!(query, "variables");
                assert_eq!(course_name.as_deref(), Some("Intro"));
                assert_eq!(lesson_number, Some(1));
            }
            _ => panic!("Expected SearchCourseContent"),
        }
    }

    #[test]
    fn test_parse_search_requires_query() {
        let err = parse_tool_call("search_course_content", r#"{"course_name": "X"}"#).unwrap_err();
        assert!(matches!(err, PensumError::InvalidToolArguments(_)));
    }

    #[test]
    fn test_parse_unknown_tool() {
        let err = parse_tool_call("delete_everything", "{}").unwrap_err();
        assert!(matches!(err, PensumError::InvalidToolArguments(_)));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_tool_call("search_course_content", "not json").unwrap_err();
        assert!(matches!(err, PensumError::InvalidToolArguments(_)));
    }

    #[test]
    fn test_tool_definitions_schema() {
        let definitions = tool_definitions();
        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions[0].name, "search_course_content");
        assert_eq!(definitions[0].parameters["required"][0], "query");
        assert_eq!(definitions[1].name, "get_course_outline");
    }

    #[tokio::test]
    async fn test_search_formats_results_and_records_sources() {
        let context = context_with_course().await;

        let result = context
            .execute(&ToolCall::SearchCourseContent {
                query: "Variables hold values".to_string(),
                course_name: None,
                lesson_number: None,
            })
            .await
            .unwrap();

        assert!(result.contains("[Intro to X - Lesson 1]"));
        assert!(result.contains("Variables hold values."));

        let sources = context.last_sources();
        assert!(!sources.is_empty());
        assert_eq!(sources[0].title, "Intro to X - Lesson 1");
        assert_eq!(sources[0].url.as_deref(), Some("https://example.com/x/1"));
    }

    #[tokio::test]
    async fn test_sources_deduplicated() {
        let context = context_with_course().await;

        // Both chunks match; each lesson contributes one source even if it
        // had multiple matching chunks.
        context
            .execute(&ToolCall::SearchCourseContent {
                query: "Variables Functions".to_string(),
                course_name: None,
                lesson_number: None,
            })
            .await
            .unwrap();

        let sources = context.last_sources();
        let titles: Vec<&str> = sources.iter().map(|s| s.title.as_str()).collect();
        let mut deduped = titles.clone();
        deduped.dedup();
        assert_eq!(titles, deduped);
    }

    #[tokio::test]
    async fn test_search_unknown_course_message() {
        let index = Arc::new(CourseIndex::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(HashEmbedder),
        ));
        let context = ToolContext::new(index);

        let result = context
            .execute(&ToolCall::SearchCourseContent {
                query: "anything".to_string(),
                course_name: Some("Ghost Course".to_string()),
                lesson_number: None,
            })
            .await
            .unwrap();

        assert_eq!(result, "No course found matching 'Ghost Course'.");
        assert!(context.last_sources().is_empty());
    }

    #[tokio::test]
    async fn test_empty_store_search_message() {
        let index = Arc::new(CourseIndex::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(HashEmbedder),
        ));
        let context = ToolContext::new(index);

        let result = context
            .execute(&ToolCall::SearchCourseContent {
                query: "anything".to_string(),
                course_name: None,
                lesson_number: Some(5),
            })
            .await
            .unwrap();

        assert_eq!(result, "No relevant content found in lesson 5.");
    }

    #[tokio::test]
    async fn test_outline_lists_lessons() {
        let context = context_with_course().await;

        let result = context
            .execute(&ToolCall::GetCourseOutline {
                course_name: "Intro to X".to_string(),
            })
            .await
            .unwrap();

        assert!(result.contains("Course: Intro to X"));
        assert!(result.contains("Course Link: https://example.com/x"));
        assert!(result.contains("Lessons (2):"));
        assert!(result.contains("Lesson 1: Basics"));
        assert!(result.contains("Lesson 2: More"));
    }

    #[tokio::test]
    async fn test_reset_sources() {
        let context = context_with_course().await;
        context
            .execute(&ToolCall::SearchCourseContent {
                query: "Variables".to_string(),
                course_name: None,
                lesson_number: None,
            })
            .await
            .unwrap();
        assert!(!context.last_sources().is_empty());

        context.reset_sources();
        assert!(context.last_sources().is_empty());
    }
}
