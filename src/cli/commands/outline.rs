//! Outline command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::PensumError;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the outline command.
pub async fn run_outline(course: &str, settings: Settings) -> Result<()> {
    // Name resolution embeds the query, so this needs the API key too.
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let index = orchestrator.course_index();

    let Some(outline) = index.get_course_outline(course).await? else {
        Output::error(&format!("No course found matching '{}'", course));
        return Err(PensumError::CourseNotFound(course.to_string()).into());
    };

    Output::header(&outline.title);
    if let Some(link) = &outline.link {
        Output::kv("Link", link);
    }
    if let Some(instructor) = &outline.instructor {
        Output::kv("Instructor", instructor);
    }
    Output::kv("Lessons", &outline.lessons.len().to_string());

    for lesson in &outline.lessons {
        Output::list_item(&format!("Lesson {}: {}", lesson.number, lesson.title));
    }

    Ok(())
}
