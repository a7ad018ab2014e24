use crate::http::{FetchRequest, Fetcher, SEARCH_API_TIMEOUT};
use crate::models::FailureReason;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.pexels.com/v1/search";
pub const DEFAULT_PER_PAGE: usize = 5;
pub const DEFAULT_ORIENTATION: &str = "landscape";
pub const API_KEY_ENV_VAR: &str = "PEXELS_API_KEY";

const ERROR_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub endpoint: String,
    /// Falls back to `PEXELS_API_KEY` when unset.
    pub api_key: Option<String>,
    pub per_page: usize,
    pub orientation: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            api_key: None,
            per_page: DEFAULT_PER_PAGE,
            orientation: DEFAULT_ORIENTATION.to_string(),
        }
    }
}

impl SearchSettings {
    pub fn resolved_api_key(&self) -> Option<String> {
        let from_config = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        from_config.or_else(|| {
            std::env::var(API_KEY_ENV_VAR)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub photographer: String,
    #[serde(default)]
    pub src: PhotoSources,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PhotoSources {
    #[serde(default)]
    pub large: String,
}

pub fn build_search_request(
    settings: &SearchSettings,
    api_key: &str,
    query: &str,
) -> std::result::Result<FetchRequest, FailureReason> {
    let per_page = settings.per_page.max(1).to_string();
    let url = Url::parse_with_params(
        &settings.endpoint,
        &[
            ("query", query),
            ("per_page", per_page.as_str()),
            ("orientation", settings.orientation.as_str()),
        ],
    )
    .map_err(|e| FailureReason::SearchFailed(format!("invalid search endpoint: {e}")))?;

    Ok(FetchRequest::new(url.to_string(), SEARCH_API_TIMEOUT)
        .with_header("Accept", "application/json")
        .with_header("Authorization", api_key))
}

/// Runs one search and returns the photos in API order. An empty result is
/// reported as a failure so every file waiting on the query fails alike.
pub fn search_photos<F: Fetcher + ?Sized>(
    fetcher: &F,
    settings: &SearchSettings,
    query: &str,
) -> std::result::Result<Vec<Photo>, FailureReason> {
    let Some(api_key) = settings.resolved_api_key() else {
        return Err(FailureReason::SearchFailed(format!(
            "api token missing; set {API_KEY_ENV_VAR} or search.api_key"
        )));
    };
    let request = build_search_request(settings, &api_key, query)?;
    let result = fetcher
        .fetch(&request)
        .map_err(|reason| FailureReason::SearchFailed(reason.to_string()))?;

    if result.status != 200 {
        let body = String::from_utf8_lossy(&result.content);
        let snippet: String = body.trim().chars().take(ERROR_SNIPPET_CHARS).collect();
        return Err(FailureReason::SearchFailed(format!(
            "HTTP {}: {snippet}",
            result.status
        )));
    }

    let photos = parse_search_response(&result.content)?;
    if photos.is_empty() {
        return Err(FailureReason::SearchFailed("no results".to_string()));
    }
    Ok(photos)
}

pub fn parse_search_response(bytes: &[u8]) -> std::result::Result<Vec<Photo>, FailureReason> {
    let parsed: SearchResponse = serde_json::from_slice(bytes)
        .map_err(|e| FailureReason::SearchFailed(format!("invalid json: {e}")))?;
    Ok(parsed.photos)
}
