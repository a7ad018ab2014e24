use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use blog_images::http::{FetchRequest, Fetcher, BROWSER_USER_AGENT, DIRECT_IMAGE_TIMEOUT};
use blog_images::models::{DownloadTask, FailureReason, FetchResult, ItemOutcome, RunSummary};
use blog_images::runner::run_downloads;
use blog_images::search::SearchSettings;
use blog_images::DownloadError;

#[derive(Default)]
struct ScriptedFetcher {
    responses: HashMap<String, std::result::Result<FetchResult, FailureReason>>,
    calls: RefCell<Vec<FetchRequest>>,
}

impl ScriptedFetcher {
    fn respond(mut self, url: &str, status: u16, body: &[u8]) -> Self {
        self.responses.insert(
            url.to_string(),
            Ok(FetchResult {
                status,
                content: body.to_vec(),
            }),
        );
        self
    }

    fn fail(mut self, url: &str, reason: FailureReason) -> Self {
        self.responses.insert(url.to_string(), Err(reason));
        self
    }

    fn call_urls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|r| r.url.clone()).collect()
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, request: &FetchRequest) -> std::result::Result<FetchResult, FailureReason> {
        self.calls.borrow_mut().push(request.clone());
        let key = request
            .url
            .split_once('?')
            .filter(|(base, _)| self.responses.contains_key(*base))
            .map(|(base, _)| base.to_string())
            .unwrap_or_else(|| request.url.clone());
        self.responses.get(&key).cloned().unwrap_or(Ok(FetchResult {
            status: 404,
            content: b"not found".to_vec(),
        }))
    }
}

fn run(
    fetcher: &ScriptedFetcher,
    tasks: &[DownloadTask],
    output_dir: &Path,
    search: &SearchSettings,
) -> (RunSummary, Vec<(String, serde_json::Value)>) {
    let mut events = Vec::new();
    let summary = run_downloads(fetcher, tasks, output_dir, search, |_level, event, data| {
        events.push((event.to_string(), data));
        Ok(())
    })
    .expect("run");
    (summary, events)
}

fn image_bytes(len: usize) -> Vec<u8> {
    let mut bytes = b"\xFF\xD8\xFF\xE0".to_vec();
    bytes.resize(len, 0x42);
    bytes
}

fn search_settings() -> SearchSettings {
    SearchSettings {
        endpoint: "https://api.example.com/v1/search".to_string(),
        api_key: Some("token".to_string()),
        ..SearchSettings::default()
    }
}

#[test]
fn existing_files_are_skipped_without_network_calls() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("present.jpg"), image_bytes(2_000)).expect("seed");
    std::fs::write(dir.path().join("product.jpg"), image_bytes(500)).expect("seed");

    let fetcher = ScriptedFetcher::default();
    let tasks = vec![
        DownloadTask::direct("present.jpg", "https://images.example.com/present.jpg"),
        DownloadTask::product_page("product.jpg", "https://shop.example.com/dp/1"),
        DownloadTask::search("searched.jpg", "couple", 0),
    ];
    std::fs::write(dir.path().join("searched.jpg"), image_bytes(6_000)).expect("seed");

    let (summary, events) = run(&fetcher, &tasks, dir.path(), &search_settings());

    assert!(fetcher.calls.borrow().is_empty(), "calls={:?}", fetcher.call_urls());
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.skipped, 3);
    assert!(summary.failed.is_empty());
    assert_eq!(
        events.iter().filter(|(e, _)| e == "item_skipped").count(),
        3
    );
}

#[test]
fn small_body_is_rejected_and_nothing_is_written() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = "https://images.example.com/tiny.jpg";
    let fetcher = ScriptedFetcher::default().respond(url, 200, &[0u8; 50]);
    let tasks = vec![DownloadTask::direct("tiny.jpg", url)];

    let (summary, _) = run(&fetcher, &tasks, dir.path(), &SearchSettings::default());

    assert_eq!(summary.failed, vec!["tiny.jpg".to_string()]);
    assert_eq!(
        summary.items[0].outcome,
        ItemOutcome::Failed {
            reason: FailureReason::TooSmall {
                bytes: 50,
                min_bytes: 1_000
            }
        }
    );
    assert!(!dir.path().join("tiny.jpg").exists());
    assert!(!dir.path().join("tiny.jpg.part").exists());
}

#[test]
fn direct_download_writes_bytes_and_counts_add_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ok_url = "https://images.example.com/ok.jpg";
    let missing_url = "https://images.example.com/missing.jpg";
    let slow_url = "https://images.example.com/slow.jpg";
    let body = image_bytes(1_500);
    let fetcher = ScriptedFetcher::default()
        .respond(ok_url, 200, &body)
        .respond(missing_url, 404, &image_bytes(5_000))
        .fail(slow_url, FailureReason::Timeout);

    let tasks = vec![
        DownloadTask::direct("ok.jpg", ok_url),
        DownloadTask::direct("missing.jpg", missing_url),
        DownloadTask::direct("slow.jpg", slow_url),
    ];
    let (summary, events) = run(&fetcher, &tasks, dir.path(), &SearchSettings::default());

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded + summary.failed.len(), summary.total);
    assert_eq!(summary.failed, vec!["missing.jpg".to_string(), "slow.jpg".to_string()]);
    assert_eq!(std::fs::read(dir.path().join("ok.jpg")).expect("read"), body);
    assert!(!dir.path().join("missing.jpg").exists());

    let calls = fetcher.calls.borrow();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| c.timeout == DIRECT_IMAGE_TIMEOUT));

    let failed_codes: Vec<&str> = events
        .iter()
        .filter(|(e, _)| e == "item_failed")
        .filter_map(|(_, d)| d.get("code").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(failed_codes, vec!["http_status", "timeout"]);
    assert_eq!(events.first().map(|(e, _)| e.as_str()), Some("run_started"));
    assert_eq!(events.last().map(|(e, _)| e.as_str()), Some("run_finished"));
}

#[test]
fn product_page_prefers_highres_rewrite_when_probe_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let page_url = "https://shop.example.com/dp/B0CGY4X222";
    let thumb = "https://m.media-amazon.com/images/I/81abc._SX38_.jpg";
    let highres = "https://m.media-amazon.com/images/I/81abc._SL1500_.jpg";
    let page = format!(
        r#"<html><head><title>Roses</title></head><body><img id="landingImage" src="{thumb}" /></body></html>"#
    );
    let big = image_bytes(40_000);
    let fetcher = ScriptedFetcher::default()
        .respond(page_url, 200, page.as_bytes())
        .respond(highres, 200, &big)
        .respond(thumb, 200, &image_bytes(900));

    let tasks = vec![DownloadTask::product_page("roses.jpg", page_url)];
    let (summary, events) = run(&fetcher, &tasks, dir.path(), &SearchSettings::default());

    assert!(summary.failed.is_empty());
    assert_eq!(fetcher.call_urls(), vec![page_url.to_string(), highres.to_string()]);
    assert_eq!(std::fs::read(dir.path().join("roses.jpg")).expect("read"), big);
    match &summary.items[0].outcome {
        ItemOutcome::Downloaded { url, bytes, .. } => {
            assert_eq!(url, highres);
            assert_eq!(*bytes, 40_000);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(events.iter().any(|(e, _)| e == "highres_selected"));
}

#[test]
fn product_page_falls_back_to_page_image_when_probe_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let page_url = "https://shop.example.com/dp/2";
    let thumb = "https://m.media-amazon.com/images/I/71x._SS40_.jpg";
    let highres = "https://m.media-amazon.com/images/I/71x._SL1500_.jpg";
    let page = format!(r#"<html><head><meta property="og:image" content="{thumb}"></head></html>"#);
    let fetcher = ScriptedFetcher::default()
        .respond(page_url, 200, page.as_bytes())
        .fail(highres, FailureReason::Transport("connection reset".to_string()))
        .respond(thumb, 200, &image_bytes(800));

    let tasks = vec![DownloadTask::product_page("thumb.jpg", page_url)];
    let (summary, events) = run(&fetcher, &tasks, dir.path(), &SearchSettings::default());

    assert!(summary.failed.is_empty());
    assert_eq!(
        fetcher.call_urls(),
        vec![page_url.to_string(), highres.to_string(), thumb.to_string()]
    );
    assert_eq!(
        std::fs::metadata(dir.path().join("thumb.jpg"))
            .expect("meta")
            .len(),
        800
    );
    let strategy = events
        .iter()
        .find(|(e, _)| e == "candidate_selected")
        .and_then(|(_, d)| d.get("strategy").and_then(|v| v.as_str()).map(str::to_string));
    assert_eq!(strategy.as_deref(), Some("og:image"));
}

#[test]
fn page_without_image_fails_with_title_and_run_continues() {
    let dir = tempfile::tempdir().expect("tempdir");
    let page_url = "https://shop.example.com/dp/captcha";
    let next_url = "https://images.example.com/next.jpg";
    let fetcher = ScriptedFetcher::default()
        .respond(
            page_url,
            200,
            b"<html><head><title>Robot Check</title></head><body></body></html>",
        )
        .respond(next_url, 200, &image_bytes(3_000));

    let tasks = vec![
        DownloadTask::product_page("blocked.jpg", page_url),
        DownloadTask::direct("next.jpg", next_url),
    ];
    let (summary, _) = run(&fetcher, &tasks, dir.path(), &SearchSettings::default());

    assert_eq!(summary.failed, vec!["blocked.jpg".to_string()]);
    assert_eq!(
        summary.items[0].outcome,
        ItemOutcome::Failed {
            reason: FailureReason::NoImageFound {
                page_title: "Robot Check...".to_string()
            }
        }
    );
    assert!(dir.path().join("next.jpg").exists());
}

#[test]
fn search_with_too_few_results_reports_not_enough_results() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = search_settings();
    let photo_url = "https://images.example.com/photos/1/large.jpeg";
    let api_body = format!(
        r#"{{"photos":[{{"photographer":"Ana","src":{{"large":"{photo_url}"}}}}]}}"#
    );
    let fetcher = ScriptedFetcher::default()
        .respond(&settings.endpoint, 200, api_body.as_bytes())
        .respond(photo_url, 200, &image_bytes(9_000));

    let tasks = vec![
        DownloadTask::search("a.jpg", "couple ice skating", 0),
        DownloadTask::search("b.jpg", "couple ice skating", 1),
        DownloadTask::search("c.jpg", "couple ice skating", 2),
    ];
    let (summary, events) = run(&fetcher, &tasks, dir.path(), &settings);

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, vec!["b.jpg".to_string(), "c.jpg".to_string()]);
    for item in &summary.items[1..] {
        assert_eq!(
            item.outcome,
            ItemOutcome::Failed {
                reason: FailureReason::NotEnoughResults
            }
        );
    }

    let calls = fetcher.calls.borrow();
    let api_calls: Vec<&FetchRequest> = calls
        .iter()
        .filter(|c| c.url.starts_with(&settings.endpoint))
        .collect();
    assert_eq!(api_calls.len(), 1);
    assert_eq!(api_calls[0].header("Authorization"), Some("token"));
    assert_eq!(
        events.iter().filter(|(e, _)| e == "search_requested").count(),
        1
    );
}

#[test]
fn failed_search_marks_every_pending_file_failed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = search_settings();
    let fetcher = ScriptedFetcher::default().respond(&settings.endpoint, 200, br#"{"photos":[]}"#);

    let tasks = vec![
        DownloadTask::search("a.jpg", "nothing matches", 0),
        DownloadTask::search("b.jpg", "nothing matches", 1),
    ];
    let (summary, _) = run(&fetcher, &tasks, dir.path(), &settings);

    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed.len(), 2);
    assert!(summary.items.iter().all(|item| matches!(
        item.outcome,
        ItemOutcome::Failed {
            reason: FailureReason::SearchFailed(_)
        }
    )));
    assert_eq!(fetcher.calls.borrow().len(), 1);
}

#[test]
fn browser_user_agent_looks_like_desktop_chrome() {
    assert!(BROWSER_USER_AGENT.starts_with("Mozilla/5.0 (Macintosh"));
    assert!(BROWSER_USER_AGENT.contains("Chrome/"));
}

#[test]
fn failing_event_sink_does_not_stop_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let urls = [
        "https://images.example.com/a.jpg",
        "https://images.example.com/b.jpg",
        "https://images.example.com/c.jpg",
    ];
    let fetcher = urls
        .iter()
        .fold(ScriptedFetcher::default(), |f, url| f.respond(url, 200, &image_bytes(5_000)));
    let tasks: Vec<DownloadTask> = ["a.jpg", "b.jpg", "c.jpg"]
        .iter()
        .zip(urls)
        .map(|(name, url)| DownloadTask::direct(*name, url))
        .collect();

    let mut seen = Vec::new();
    let summary = run_downloads(
        &fetcher,
        &tasks,
        dir.path(),
        &SearchSettings::default(),
        |_level, event, _data| {
            seen.push(event.to_string());
            if event == "item_downloaded" {
                return Err(DownloadError::Io(std::io::Error::other("disk full")));
            }
            Ok(())
        },
    )
    .expect("run keeps going");

    assert_eq!(summary.succeeded, 3);
    assert!(summary.failed.is_empty());
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        assert!(dir.path().join(name).exists(), "{name} missing");
    }
    assert!(summary
        .log_error
        .as_deref()
        .is_some_and(|err| err.contains("disk full")));
    assert_eq!(seen.iter().filter(|e| *e == "item_downloaded").count(), 3);
    assert_eq!(seen.last().map(String::as_str), Some("run_finished"));
}
