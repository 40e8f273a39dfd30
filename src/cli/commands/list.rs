//! List command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Browse) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let analytics = orchestrator.analytics().await?;

    if analytics.total_courses == 0 {
        Output::info("No courses indexed yet. Use 'pensum ingest <path>' to add some.");
        return Ok(());
    }

    Output::header(&format!("Indexed courses ({})", analytics.total_courses));
    for title in &analytics.course_titles {
        Output::list_item(title);
    }

    Ok(())
}
