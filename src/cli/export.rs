use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::records::RecordStore;
use crate::service;
use crate::settings::SettingsStore;

/// Writes the owner's data as JSON to `output`, or stdout.
pub async fn run(
    owner: &str,
    output: Option<&Path>,
    records: &dyn RecordStore,
    settings: &dyn SettingsStore,
) -> Result<()> {
    let bundle = service::export(owner, records, settings).await?;
    let json = serde_json::to_string_pretty(&bundle).context("Failed to serialize export")?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            info!(count = bundle.count, "Exported expenses to {}", path.display());
            println!("Exported {} expenses to {}", bundle.count, path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
