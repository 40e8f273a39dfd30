//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::vector_store::SearchOutcome;
use anyhow::Result;

/// Run the search command (direct index search, no assistant involved).
pub async fn run_search(
    query: &str,
    course: Option<String>,
    lesson: Option<u32>,
    limit: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(limit) = limit {
        settings.search.max_results = limit;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let index = orchestrator.course_index();

    let spinner = Output::spinner("Searching...");
    let outcome = index.search(query, course.as_deref(), lesson).await?;
    spinner.finish_and_clear();

    match outcome {
        SearchOutcome::EmptyQuery => {
            Output::error("Query must not be empty.");
        }
        SearchOutcome::NoCourseMatch { requested } => {
            Output::warning(&format!("No course found matching '{}'", requested));
        }
        SearchOutcome::Hits(hits) if hits.is_empty() => {
            Output::info("No matching content found.");
        }
        SearchOutcome::Hits(hits) => {
            Output::info(&format!("Found {} results:", hits.len()));
            for hit in &hits {
                Output::search_result(&hit.course_title, hit.lesson_number, hit.score, &hit.content);
            }
        }
    }

    Ok(())
}
