//! End-to-end tests for the query and ingestion flows, with mocked
//! embedding and generation backends.

use async_trait::async_trait;
use pensum::config::{Prompts, Settings};
use pensum::embedding::Embedder;
use pensum::error::Result;
use pensum::generation::{ChatMessage, Generator, GeneratorReply, ToolDefinition};
use pensum::orchestrator::Orchestrator;
use pensum::vector_store::MemoryVectorStore;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Deterministic embedder: character-frequency vectors, so identical texts
/// map to identical embeddings.
struct HashEmbedder;

fn hash_embedding(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; 64];
    for (i, c) in text.to_lowercase().chars().enumerate() {
        let bucket = (c as usize).wrapping_mul(31).wrapping_add(i % 7) % 64;
        v[bucket] += 1.0;
    }
    v
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(hash_embedding(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| hash_embedding(t)).collect())
    }

    fn dimensions(&self) -> usize {
        64
    }
}

/// Record of one generator invocation.
#[derive(Clone)]
struct GeneratorCall {
    tools_offered: bool,
    tool_results: Vec<String>,
}

/// Generator that requests the given search once, then answers with fixed
/// text, recording everything it was shown.
struct ScriptedGenerator {
    search_arguments: String,
    calls: Mutex<Vec<GeneratorCall>>,
}

impl ScriptedGenerator {
    fn new(search_arguments: &str) -> Self {
        Self {
            search_arguments: search_arguments.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<GeneratorCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        _system: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<GeneratorReply> {
        let tool_results = messages
            .iter()
            .filter_map(|m| match m {
                ChatMessage::ToolResult { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect();

        self.calls.lock().unwrap().push(GeneratorCall {
            tools_offered: tools.is_some(),
            tool_results,
        });

        if tools.is_some() {
            Ok(GeneratorReply::ToolUse {
                id: "call_1".to_string(),
                name: "search_course_content".to_string(),
                arguments: self.search_arguments.clone(),
            })
        } else {
            Ok(GeneratorReply::Answer("generated answer".to_string()))
        }
    }
}

fn orchestrator_with(generator: Arc<dyn Generator>) -> Orchestrator {
    Orchestrator::with_components(
        Settings::default(),
        Prompts::default(),
        Arc::new(MemoryVectorStore::new()),
        Arc::new(HashEmbedder),
        generator,
    )
    .unwrap()
}

fn write_course(dir: &Path, name: &str) {
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    writeln!(file, "Course Title: Intro to X").unwrap();
    writeln!(file, "Course Link: https://example.com/x").unwrap();
    writeln!(file, "Course Instructor: Jane Doe").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "Lesson 1: Variables").unwrap();
    writeln!(file, "Lesson Link: https://example.com/x/1").unwrap();
    writeln!(file, "Variables hold values and have types.").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "Lesson 2: Functions").unwrap();
    writeln!(file, "Functions take arguments and return results.").unwrap();
}

#[tokio::test]
async fn query_with_course_and_lesson_filter_cites_sources() {
    let generator = Arc::new(ScriptedGenerator::new(
        r#"{"query": "Variables hold values", "course_name": "Intro to X", "lesson_number": 1}"#,
    ));
    let orchestrator = orchestrator_with(generator.clone());

    let dir = tempfile::tempdir().unwrap();
    write_course(dir.path(), "intro.txt");
    let report = orchestrator.load_course_folder(dir.path()).await.unwrap();
    assert_eq!(report.courses_added, 1);
    assert!(report.errors.is_empty());

    let response = orchestrator
        .query(None, "What is in lesson 1 of Intro to X?")
        .await
        .unwrap();

    assert_eq!(response.answer, "generated answer");
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].title, "Intro to X - Lesson 1");
    assert_eq!(
        response.sources[0].url.as_deref(),
        Some("https://example.com/x/1")
    );

    // Exactly two rounds: tools offered, then withheld; the second round saw
    // the formatted search result.
    let calls = generator.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].tools_offered);
    assert!(!calls[1].tools_offered);
    assert_eq!(calls[1].tool_results.len(), 1);
    assert!(calls[1].tool_results[0].contains("[Intro to X - Lesson 1]"));
    assert!(calls[1].tool_results[0].contains("Variables hold values"));
}

#[tokio::test]
async fn query_against_empty_store_still_answers() {
    let generator = Arc::new(ScriptedGenerator::new(r#"{"query": "anything"}"#));
    let orchestrator = orchestrator_with(generator.clone());

    let response = orchestrator.query(None, "What is X?").await.unwrap();

    assert_eq!(response.answer, "generated answer");
    assert!(response.sources.is_empty());

    let calls = generator.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].tool_results[0].starts_with("No relevant content found"));
}

#[tokio::test]
async fn unknown_course_filter_degrades_to_no_course_result() {
    let generator = Arc::new(ScriptedGenerator::new(
        r#"{"query": "anything", "course_name": "Ghost Course"}"#,
    ));
    let orchestrator = orchestrator_with(generator.clone());

    let response = orchestrator.query(None, "question").await.unwrap();
    assert_eq!(response.answer, "generated answer");
    assert!(response.sources.is_empty());

    let calls = generator.calls();
    assert_eq!(
        calls[1].tool_results[0],
        "No course found matching 'Ghost Course'."
    );
}

#[tokio::test]
async fn session_history_is_bounded() {
    struct HistoryCollector {
        systems: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Generator for HistoryCollector {
        async fn generate(
            &self,
            system: &str,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> Result<GeneratorReply> {
            self.systems.lock().unwrap().push(system.to_string());
            Ok(GeneratorReply::Answer("ok".to_string()))
        }
    }

    let collector = Arc::new(HistoryCollector {
        systems: Mutex::new(Vec::new()),
    });
    let orchestrator = orchestrator_with(collector.clone());

    let session = orchestrator.create_session();
    for i in 0..5 {
        orchestrator
            .query(Some(&session), &format!("question number {}", i))
            .await
            .unwrap();
    }

    let systems = collector.systems.lock().unwrap();
    let last = systems.last().unwrap();

    // Default retention is 2 exchanges: the 5th query sees questions 2 and 3
    // in its history, and nothing older.
    assert!(last.contains("question number 2"));
    assert!(last.contains("question number 3"));
    assert!(!last.contains("question number 0"));
    assert!(!last.contains("question number 1"));
}

#[tokio::test]
async fn reingesting_folder_leaves_counts_unchanged() {
    let generator = Arc::new(ScriptedGenerator::new(r#"{"query": "q"}"#));
    let orchestrator = orchestrator_with(generator);

    let dir = tempfile::tempdir().unwrap();
    write_course(dir.path(), "intro.txt");

    let first = orchestrator.load_course_folder(dir.path()).await.unwrap();
    let second = orchestrator.load_course_folder(dir.path()).await.unwrap();

    assert_eq!(first.courses_added, 1);
    assert_eq!(second.courses_added, 0);
    assert_eq!(second.chunks_added, 0);

    let analytics = orchestrator.analytics().await.unwrap();
    assert_eq!(analytics.total_courses, 1);
}
