use crate::models::Candidate;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

const HIRES_CDN_HOSTS: &[&str] = &["m.media-amazon.com", "images-na.ssl-images-amazon.com"];
const PRODUCT_IMAGE_PATH_MARKER: &str = "m.media-amazon.com/images/I/";
const HIGHRES_SIZE_TOKEN: &str = "._SL1500_";
const TITLE_MAX_CHARS: usize = 60;

pub const STRATEGY_LANDING_HIRES: &str = "landingImage[data-old-hires]";
pub const STRATEGY_LANDING_SRC: &str = "landingImage[src]";
pub const STRATEGY_SCRIPT_HIRES: &str = "hiRes-script";
pub const STRATEGY_OG_IMAGE: &str = "og:image";
pub const STRATEGY_CDN_SCAN: &str = "media-amazon-scan";

/// Collects image candidates from a product page, best first.
///
/// Strategies, in priority order: the landing image's high-resolution
/// attribute, its plain `src`, a `"hiRes"` field inside a script block, the
/// Open Graph image, and the first product-CDN image anywhere on the page.
pub fn find_image_candidates(document: &Html, page_url: &str) -> Vec<Candidate> {
    let base_url = Url::parse(page_url).ok();
    let mut out: Vec<Candidate> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let mut push = |raw: &str, strategy: &'static str| {
        let Some(url) = resolve_url(raw, base_url.as_ref()) else {
            return;
        };
        if seen.insert(url.clone()) {
            out.push(Candidate::new(url, strategy));
        }
    };

    let selector_landing = Selector::parse("img#landingImage").expect("landing selector");
    if let Some(img) = document.select(&selector_landing).next() {
        if let Some(raw) = img.value().attr("data-old-hires") {
            push(raw, STRATEGY_LANDING_HIRES);
        }
        if let Some(raw) = img.value().attr("src") {
            push(raw, STRATEGY_LANDING_SRC);
        }
    }

    if let Some(raw) = find_script_hires(document) {
        push(&raw, STRATEGY_SCRIPT_HIRES);
    }

    let selector_og = Selector::parse(r#"meta[property="og:image"]"#).expect("og selector");
    if let Some(meta) = document.select(&selector_og).next() {
        if let Some(raw) = meta.value().attr("content") {
            push(raw, STRATEGY_OG_IMAGE);
        }
    }

    let selector_img = Selector::parse("img[src]").expect("img selector");
    if let Some(raw) = document
        .select(&selector_img)
        .filter_map(|img| img.value().attr("src"))
        .find(|src| src.contains(PRODUCT_IMAGE_PATH_MARKER))
    {
        push(raw, STRATEGY_CDN_SCAN);
    }

    out
}

fn find_script_hires(document: &Html) -> Option<String> {
    static HIRES_RE: OnceLock<Regex> = OnceLock::new();
    let selector_script = Selector::parse("script").expect("script selector");
    let hires_re =
        HIRES_RE.get_or_init(|| Regex::new(r#""hiRes"\s*:\s*"([^"]+)""#).expect("hiRes regex"));

    for script in document.select(&selector_script) {
        let text = script.text().collect::<String>();
        if !text.contains("\"hiRes\"") {
            continue;
        }
        let unescaped = text.replace("\\/", "/");
        for caps in hires_re.captures_iter(&unescaped) {
            let url = &caps[1];
            if HIRES_CDN_HOSTS.iter().any(|host| url.contains(host)) {
                return Some(url.to_string());
            }
        }
    }
    None
}

/// Page `<title>` for diagnostics, cut to 60 characters.
pub fn page_title(document: &Html) -> String {
    let selector_title = Selector::parse("title").expect("title selector");
    let Some(title) = document.select(&selector_title).next() else {
        return "unknown".to_string();
    };
    let text = title.text().collect::<String>();
    let trimmed: String = text.trim().chars().take(TITLE_MAX_CHARS).collect();
    format!("{trimmed}...")
}

/// Rewrites a thumbnail-size product image URL (`._SX38_`, `._SS40_`,
/// `._SCLZZZZZZZ_SX500_`) into its `._SL1500_` rendition. `None` when the URL
/// carries no recognised size token.
pub fn try_highres_url(img_url: &str) -> Option<String> {
    static SIZE_RE: OnceLock<Regex> = OnceLock::new();
    static SCALED_RE: OnceLock<Regex> = OnceLock::new();

    let size_re =
        SIZE_RE.get_or_init(|| Regex::new(r"\._[A-Z]{2}\d+_").expect("size token regex"));
    let highres = size_re.replace_all(img_url, HIGHRES_SIZE_TOKEN);
    if highres != img_url {
        return Some(highres.into_owned());
    }

    let scaled_re =
        SCALED_RE.get_or_init(|| Regex::new(r"\._SCLZ+_SX\d+_").expect("scaled token regex"));
    let highres = scaled_re.replace_all(img_url, HIGHRES_SIZE_TOKEN);
    if highres != img_url {
        return Some(highres.into_owned());
    }

    None
}

fn resolve_url(raw_url: &str, base_url: Option<&Url>) -> Option<String> {
    let raw_url = raw_url.trim();
    if raw_url.is_empty() {
        return None;
    }
    let lower = raw_url.to_ascii_lowercase();
    if lower.starts_with("data:") || lower.starts_with("javascript:") || lower.starts_with('#') {
        return None;
    }

    let mut joined = match base_url {
        Some(base) => base.join(raw_url).ok()?,
        None => Url::parse(raw_url).ok()?,
    };
    if !matches!(joined.scheme(), "http" | "https") {
        return None;
    }
    joined.set_fragment(None);
    Some(joined.to_string())
}
