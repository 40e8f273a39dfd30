//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(path: &str, force: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let path = Path::new(path);

    if path.is_dir() {
        if force {
            Output::warning("Folder ingestion is idempotent; --force only applies to single files");
        }
        let spinner = Output::spinner("Ingesting course folder...");
        let report = orchestrator.load_course_folder(path).await?;
        spinner.finish_and_clear();

        Output::success(&format!(
            "Ingested {} courses ({} chunks)",
            report.courses_added, report.chunks_added
        ));
        for error in &report.errors {
            Output::warning(error);
        }
    } else {
        let spinner = Output::spinner("Ingesting course document...");
        let (title, chunks_added, skipped) = orchestrator.add_course_document(path, force).await?;
        spinner.finish_and_clear();

        if skipped {
            Output::info(&format!(
                "Course '{}' is already indexed (use --force to re-index)",
                title
            ));
        } else {
            Output::success(&format!("Ingested '{}' ({} chunks)", title, chunks_added));
        }
    }

    Ok(())
}
