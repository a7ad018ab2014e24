use std::path::{Path, PathBuf};

/// Anchor for relative output directories: the config file's folder, or the
/// base dir given on the command line.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub base_dir: PathBuf,
}

impl RunPaths {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn for_config_file(config_path: &Path) -> Self {
        let base_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { base_dir }
    }

    pub fn current_dir() -> std::io::Result<Self> {
        Ok(Self {
            base_dir: std::env::current_dir()?,
        })
    }

    pub fn output_dir(&self, configured: &str) -> PathBuf {
        let configured = Path::new(configured.trim());
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.base_dir.join(configured)
        }
    }
}

/// Creates `path` if missing; `true` when it had to be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(path)?;
    Ok(true)
}
