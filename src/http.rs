use crate::models::{FailureReason, FetchResult};
use std::io::Read;
use std::time::Duration;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

pub const PAGE_TIMEOUT: Duration = Duration::from_secs(20);
pub const PRODUCT_IMAGE_TIMEOUT: Duration = Duration::from_secs(15);
pub const DIRECT_IMAGE_TIMEOUT: Duration = Duration::from_secs(30);
pub const SEARCH_API_TIMEOUT: Duration = Duration::from_secs(15);

const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;
const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// A single GET request. The browser `User-Agent` is applied by the agent,
/// everything else travels in `headers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            headers: vec![
                ("Accept-Language".to_string(), ACCEPT_LANGUAGE.to_string()),
                ("Accept".to_string(), ACCEPT_HTML.to_string()),
            ],
        }
    }

    /// Sets a header, replacing any existing value with the same name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Blocking HTTP GET. Non-2xx statuses are data, not errors; only transport
/// problems and timeouts come back as `Err`.
pub trait Fetcher {
    fn fetch(&self, request: &FetchRequest) -> std::result::Result<FetchResult, FailureReason>;
}

/// One agent for the whole run; the timeout is applied per request.
#[derive(Clone)]
pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl UreqFetcher {
    pub fn new() -> Self {
        Self {
            agent: build_http_agent(),
        }
    }
}

impl Default for UreqFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for UreqFetcher {
    fn fetch(&self, request: &FetchRequest) -> std::result::Result<FetchResult, FailureReason> {
        let mut builder = self
            .agent
            .get(request.url.as_str())
            .config()
            .timeout_global(Some(request.timeout.max(MIN_TIMEOUT)))
            .build();
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder.call().map_err(|err| failure_from_ureq(&err))?;
        let status = response.status().as_u16();

        let mut content = Vec::new();
        response
            .body_mut()
            .as_reader()
            .take(MAX_BODY_BYTES)
            .read_to_end(&mut content)
            .map_err(|err| failure_from_io(&err))?;

        Ok(FetchResult { status, content })
    }
}

fn build_http_agent() -> ureq::Agent {
    let mut config = ureq::Agent::config_builder();
    config = config
        .http_status_as_error(false)
        .timeout_global(Some(DIRECT_IMAGE_TIMEOUT))
        .user_agent(BROWSER_USER_AGENT);
    config.build().into()
}

fn failure_from_ureq(err: &ureq::Error) -> FailureReason {
    match err {
        ureq::Error::Timeout(_) => FailureReason::Timeout,
        ureq::Error::Io(io) => failure_from_io(io),
        other => FailureReason::Transport(other.to_string()),
    }
}

fn failure_from_io(err: &std::io::Error) -> FailureReason {
    if err.kind() == std::io::ErrorKind::TimedOut {
        FailureReason::Timeout
    } else {
        FailureReason::Transport(err.to_string())
    }
}

/// Keeps only `scheme://host/...`; search URLs carry query text.
pub fn redact_url_for_log(value: &str) -> String {
    match url::Url::parse(value) {
        Ok(uri) => {
            let scheme = uri.scheme();
            let authority = uri.host_str().unwrap_or("unknown-host");
            format!("{scheme}://{authority}/...")
        }
        Err(_) => "[invalid-url]".to_string(),
    }
}
