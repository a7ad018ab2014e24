use thiserror::Error;

/// Placeholder GIFs served for missing product images are around 43 bytes.
pub const PRODUCT_MIN_BYTES: u64 = 100;
pub const DIRECT_MIN_BYTES: u64 = 1_000;
pub const SEARCH_MIN_BYTES: u64 = 5_000;

/// Where the image for a task comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSource {
    /// A configured image URL.
    Direct { url: String },
    /// A product page that has to be scraped for its image URL.
    ProductPage { url: String },
    /// The `rank`-th result (0-based) of an image search for `query`.
    Search { query: String, rank: usize },
}

impl TaskSource {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskSource::Direct { .. } => "direct",
            TaskSource::ProductPage { .. } => "product_page",
            TaskSource::Search { .. } => "search",
        }
    }

    pub fn default_min_bytes(&self) -> u64 {
        match self {
            TaskSource::Direct { .. } => DIRECT_MIN_BYTES,
            TaskSource::ProductPage { .. } => PRODUCT_MIN_BYTES,
            TaskSource::Search { .. } => SEARCH_MIN_BYTES,
        }
    }

    /// Human readable origin, used in logs and the run manifest.
    pub fn describe(&self) -> String {
        match self {
            TaskSource::Direct { url } | TaskSource::ProductPage { url } => url.clone(),
            TaskSource::Search { query, rank } => format!("search:{query}#{}", rank + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub filename: String,
    pub source: TaskSource,
    pub min_bytes: u64,
}

impl DownloadTask {
    pub fn direct(filename: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_source(filename, TaskSource::Direct { url: url.into() })
    }

    pub fn product_page(filename: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_source(filename, TaskSource::ProductPage { url: url.into() })
    }

    pub fn search(filename: impl Into<String>, query: impl Into<String>, rank: usize) -> Self {
        Self::with_source(
            filename,
            TaskSource::Search {
                query: query.into(),
                rank,
            },
        )
    }

    fn with_source(filename: impl Into<String>, source: TaskSource) -> Self {
        let min_bytes = source.default_min_bytes();
        Self {
            filename: filename.into(),
            source,
            min_bytes,
        }
    }

    pub fn with_min_bytes(mut self, min_bytes: u64) -> Self {
        self.min_bytes = min_bytes;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub status: u16,
    pub content: Vec<u8>,
}

impl FetchResult {
    /// Status 200 and a body strictly larger than `min_bytes`.
    pub fn is_accepted(&self, min_bytes: u64) -> bool {
        self.status == 200 && self.content.len() as u64 > min_bytes
    }

    /// Maps a rejected response to the reason it was rejected.
    pub fn rejection(&self, min_bytes: u64) -> Option<FailureReason> {
        if self.status != 200 {
            return Some(FailureReason::HttpStatus(self.status));
        }
        let bytes = self.content.len() as u64;
        if bytes <= min_bytes {
            return Some(FailureReason::TooSmall { bytes, min_bytes });
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub strategy: &'static str,
    /// Photographer credit for search results.
    pub credit: Option<String>,
}

impl Candidate {
    pub fn new(url: impl Into<String>, strategy: &'static str) -> Self {
        Self {
            url: url.into(),
            strategy,
            credit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("content too small ({bytes} bytes, need more than {min_bytes})")]
    TooSmall { bytes: u64, min_bytes: u64 },

    #[error("timeout")]
    Timeout,

    #[error("{0}")]
    Transport(String),

    #[error("no image found (page: {page_title})")]
    NoImageFound { page_title: String },

    #[error("not enough results")]
    NotEnoughResults,

    #[error("no valid URL for this photo")]
    NoPhotoUrl,

    #[error("search failed: {0}")]
    SearchFailed(String),

    #[error("write failed: {0}")]
    Write(String),
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::HttpStatus(_) => "http_status",
            FailureReason::TooSmall { .. } => "too_small",
            FailureReason::Timeout => "timeout",
            FailureReason::Transport(_) => "transport",
            FailureReason::NoImageFound { .. } => "no_image_found",
            FailureReason::NotEnoughResults => "not_enough_results",
            FailureReason::NoPhotoUrl => "no_photo_url",
            FailureReason::SearchFailed(_) => "search_failed",
            FailureReason::Write(_) => "write_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Skipped {
        bytes: u64,
    },
    Downloaded {
        url: String,
        bytes: u64,
        sha256: String,
    },
    Failed {
        reason: FailureReason,
    },
}

impl ItemOutcome {
    pub fn status_str(&self) -> &'static str {
        match self {
            ItemOutcome::Skipped { .. } => "skipped",
            ItemOutcome::Downloaded { .. } => "downloaded",
            ItemOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ItemReport {
    pub task: DownloadTask,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: Vec<String>,
    pub items: Vec<ItemReport>,
    /// First error returned by the event sink; the run carries on regardless.
    pub log_error: Option<String>,
}

impl RunSummary {
    pub fn record(&mut self, task: DownloadTask, outcome: ItemOutcome) {
        self.total += 1;
        match &outcome {
            ItemOutcome::Skipped { .. } => {
                self.succeeded += 1;
                self.skipped += 1;
            }
            ItemOutcome::Downloaded { .. } => self.succeeded += 1,
            ItemOutcome::Failed { .. } => self.failed.push(task.filename.clone()),
        }
        self.items.push(ItemReport { task, outcome });
    }
}
