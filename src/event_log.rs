use crate::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const EVENT_LOG_ROTATE_BYTES: u64 = 5 * 1024 * 1024;
const EVENT_LOG_MAX_BACKUPS: usize = 3;

/// Append-only JSON lines log of run events.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
    run_id: String,
}

impl EventLog {
    /// Prepares the log for a new run, rotating the previous file if it grew
    /// past the size limit.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        rotate_if_needed(&path, EVENT_LOG_ROTATE_BYTES)?;
        Ok(Self {
            path,
            run_id: Uuid::new_v4().to_string(),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, level: &str, event: &str, data: serde_json::Value) -> Result<()> {
        let line = serde_json::json!({
            "ts_ms": now_ms(),
            "run_id": self.run_id,
            "level": level,
            "event": event,
            "data": data
        })
        .to_string();

        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(format!("{line}\n").as_bytes())?;
        Ok(())
    }
}

fn rotate_if_needed(path: &Path, rotate_bytes: u64) -> Result<()> {
    let len = match std::fs::metadata(path) {
        Ok(m) => m.len(),
        Err(_) => return Ok(()),
    };

    if len < rotate_bytes {
        return Ok(());
    }

    rotate_file_backups(path, EVENT_LOG_MAX_BACKUPS)?;
    Ok(())
}

fn rotate_file_backups(path: &Path, max_backups: usize) -> std::io::Result<()> {
    for i in (1..=max_backups).rev() {
        let dst = path_with_suffix(path, &format!(".{i}"));
        let src = if i == 1 {
            path.to_path_buf()
        } else {
            path_with_suffix(path, &format!(".{}", i - 1))
        };

        if !src.exists() {
            continue;
        }

        if dst.exists() {
            let _ = std::fs::remove_file(&dst);
        }
        std::fs::rename(src, dst)?;
    }
    Ok(())
}

fn path_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let file_name = match path.file_name() {
        Some(n) => n.to_string_lossy().to_string(),
        None => suffix.to_string(),
    };
    path.with_file_name(format!("{file_name}{suffix}"))
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
