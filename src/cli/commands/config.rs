//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, mut settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(&settings)?;
            println!("{}", content);
        }

        ConfigAction::Path => {
            println!("{}", Settings::default_config_path().display());
        }

        ConfigAction::Set { key, value } => {
            set_value(&mut settings, key, value)?;
            settings.save()?;
            Output::success(&format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}

/// Apply a dotted-key assignment to the settings.
fn set_value(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "general.data_dir" => settings.general.data_dir = value.to_string(),
        "general.log_level" => settings.general.log_level = value.to_string(),
        "chunking.chunk_size" => settings.chunking.chunk_size = value.parse()?,
        "chunking.chunk_overlap" => settings.chunking.chunk_overlap = value.parse()?,
        "embedding.model" => settings.embedding.model = value.to_string(),
        "embedding.dimensions" => settings.embedding.dimensions = value.parse()?,
        "vector_store.provider" => settings.vector_store.provider = value.to_string(),
        "vector_store.sqlite_path" => settings.vector_store.sqlite_path = value.to_string(),
        "generation.model" => settings.generation.model = value.to_string(),
        "generation.max_tokens" => settings.generation.max_tokens = value.parse()?,
        "generation.temperature" => settings.generation.temperature = value.parse()?,
        "search.max_results" => settings.search.max_results = value.parse()?,
        "session.max_turns" => settings.session.max_turns = value.parse()?,
        _ => anyhow::bail!("Unknown configuration key: {}", key),
    }
    Ok(())
}
