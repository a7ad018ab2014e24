use crate::models::{ItemOutcome, RunSummary};
use crate::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ManifestRow<'a> {
    filename: &'a str,
    status: &'a str,
    source: String,
    image_url: &'a str,
    bytes: Option<u64>,
    sha256: &'a str,
    detail: String,
}

/// Writes one CSV row per item of the run.
pub fn write_manifest(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for item in &summary.items {
        let (image_url, bytes, sha256, detail) = match &item.outcome {
            ItemOutcome::Skipped { bytes } => ("", Some(*bytes), "", "already present".to_string()),
            ItemOutcome::Downloaded { url, bytes, sha256 } => {
                (url.as_str(), Some(*bytes), sha256.as_str(), String::new())
            }
            ItemOutcome::Failed { reason } => ("", None, "", reason.to_string()),
        };
        writer.serialize(ManifestRow {
            filename: &item.task.filename,
            status: item.outcome.status_str(),
            source: item.task.source.describe(),
            image_url,
            bytes,
            sha256,
            detail,
        })?;
    }
    writer.flush()?;
    Ok(())
}
