use crate::http::{FetchRequest, Fetcher, PAGE_TIMEOUT};
use crate::models::{Candidate, FailureReason, TaskSource};
use crate::scrape;
use crate::search::{self, Photo, SearchSettings};
use scraper::Html;
use std::collections::HashMap;

pub const STRATEGY_DIRECT: &str = "direct";
pub const STRATEGY_SEARCH_LARGE: &str = "search[large]";

type SearchOutcome = std::result::Result<Vec<Photo>, FailureReason>;

/// The candidate to download plus the lower-ranked ones found alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub best: Candidate,
    pub fallbacks: Vec<Candidate>,
}

impl Resolution {
    fn single(best: Candidate) -> Self {
        Self {
            best,
            fallbacks: Vec::new(),
        }
    }
}

/// Turns a task source into the image URL to download.
///
/// Search responses are kept for the lifetime of the resolver so files
/// sharing a query cost a single API request.
pub struct Resolver<'a, F: Fetcher + ?Sized> {
    fetcher: &'a F,
    search: &'a SearchSettings,
    searches: HashMap<String, SearchOutcome>,
}

impl<'a, F: Fetcher + ?Sized> Resolver<'a, F> {
    pub fn new(fetcher: &'a F, search: &'a SearchSettings) -> Self {
        Self {
            fetcher,
            search,
            searches: HashMap::new(),
        }
    }

    pub fn has_searched(&self, query: &str) -> bool {
        self.searches.contains_key(query)
    }

    pub fn search_settings(&self) -> &SearchSettings {
        self.search
    }

    pub fn resolve(&mut self, source: &TaskSource) -> std::result::Result<Resolution, FailureReason> {
        match source {
            TaskSource::Direct { url } => Ok(Resolution::single(Candidate::new(
                url.clone(),
                STRATEGY_DIRECT,
            ))),
            TaskSource::ProductPage { url } => self.resolve_page(url),
            TaskSource::Search { query, rank } => self.resolve_search(query, *rank),
        }
    }

    fn resolve_page(&self, page_url: &str) -> std::result::Result<Resolution, FailureReason> {
        let page = self
            .fetcher
            .fetch(&FetchRequest::new(page_url, PAGE_TIMEOUT))?;
        if page.status != 200 {
            return Err(FailureReason::HttpStatus(page.status));
        }

        let html = String::from_utf8_lossy(&page.content);
        let document = Html::parse_document(&html);
        let mut candidates = scrape::find_image_candidates(&document, page_url).into_iter();
        let Some(best) = candidates.next() else {
            return Err(FailureReason::NoImageFound {
                page_title: scrape::page_title(&document),
            });
        };
        Ok(Resolution {
            best,
            fallbacks: candidates.collect(),
        })
    }

    fn resolve_search(
        &mut self,
        query: &str,
        rank: usize,
    ) -> std::result::Result<Resolution, FailureReason> {
        let fetcher = self.fetcher;
        let settings = self.search;
        let outcome = self
            .searches
            .entry(query.to_string())
            .or_insert_with(|| search::search_photos(fetcher, settings, query));

        let photos = outcome.as_ref().map_err(|reason| reason.clone())?;
        let Some(photo) = photos.get(rank) else {
            return Err(FailureReason::NotEnoughResults);
        };
        let url = photo.src.large.trim();
        if url.is_empty() {
            return Err(FailureReason::NoPhotoUrl);
        }

        let credit = Some(photo.photographer.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        Ok(Resolution::single(Candidate {
            url: url.to_string(),
            strategy: STRATEGY_SEARCH_LARGE,
            credit,
        }))
    }
}
