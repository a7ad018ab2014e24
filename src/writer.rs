use crate::{DownloadError, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Size of an already downloaded file when it is large enough to count as
/// done. Anything at or below `min_bytes` is treated as a leftover placeholder
/// and downloaded again.
pub fn existing_download(path: &Path, min_bytes: u64) -> Option<u64> {
    let meta = std::fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    let size = meta.len();
    (size > min_bytes).then_some(size)
}

/// Writes through a `.part` sibling so an interrupted run never leaves a
/// truncated file behind. Returns the SHA-256 of the bytes.
pub fn write_image(path: &Path, bytes: &[u8]) -> Result<String> {
    let tmp_path = path_with_suffix(path, ".part");
    std::fs::write(&tmp_path, bytes)?;
    if let Err(err) = replace_with(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(sha256_hex(bytes))
}

fn replace_with(tmp_path: &Path, path: &Path) -> std::io::Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    std::fs::rename(tmp_path, path)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Target names must stay inside the output directory.
pub fn validate_filename(name: &str) -> Result<()> {
    let trimmed = name.trim();
    let bad = trimmed.is_empty()
        || trimmed != name
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains('\0');
    if bad {
        return Err(DownloadError::InvalidFilename(name.to_string()));
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
