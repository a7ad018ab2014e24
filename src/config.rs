use crate::models::DownloadTask;
use crate::search::SearchSettings;
use crate::writer::validate_filename;
use crate::{DownloadError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_OUTPUT_DIR: &str = "images";

/// JSON download list, e.g.
///
/// ```json
/// {
///   "output_dir": "images",
///   "products": [{ "url": "https://www.amazon.com/dp/B0CGY4X222", "filename": "lego-roses.jpg" }]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub output_dir: Option<String>,
    /// Overrides the per-source default size threshold for every entry.
    pub min_bytes: Option<u64>,
    /// Product pages to scrape.
    pub products: Vec<UrlEntry>,
    /// Direct image URLs.
    pub images: Vec<UrlEntry>,
    pub searches: Vec<SearchEntry>,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlEntry {
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub min_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEntry {
    pub query: String,
    pub filenames: Vec<String>,
    #[serde(default)]
    pub min_bytes: Option<u64>,
}

impl DownloadConfig {
    pub fn output_dir_or_default(&self) -> &str {
        self.output_dir
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_OUTPUT_DIR)
    }

    /// Flattens the config into tasks: products, then images, then one task
    /// per search filename.
    pub fn tasks(&self) -> Result<Vec<DownloadTask>> {
        let mut out = Vec::new();

        for entry in &self.products {
            validate_filename(&entry.filename)?;
            let task = DownloadTask::product_page(&entry.filename, entry.url.trim());
            out.push(self.apply_threshold(task, entry.min_bytes));
        }

        for entry in &self.images {
            validate_filename(&entry.filename)?;
            let task = DownloadTask::direct(&entry.filename, entry.url.trim());
            out.push(self.apply_threshold(task, entry.min_bytes));
        }

        for entry in &self.searches {
            for (rank, filename) in entry.filenames.iter().enumerate() {
                validate_filename(filename)?;
                let task = DownloadTask::search(filename, entry.query.trim(), rank);
                out.push(self.apply_threshold(task, entry.min_bytes));
            }
        }

        Ok(out)
    }

    fn apply_threshold(&self, task: DownloadTask, entry_min: Option<u64>) -> DownloadTask {
        match entry_min.or(self.min_bytes) {
            Some(min_bytes) => task.with_min_bytes(min_bytes),
            None => task,
        }
    }
}

pub fn load_config(path: &Path) -> Result<DownloadConfig> {
    if !path.is_file() {
        return Err(DownloadError::ConfigNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let parsed: DownloadConfig =
        serde_json::from_slice(&bytes).map_err(|e| DownloadError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(parsed)
}

pub fn save_config(path: &Path, config: &DownloadConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}
