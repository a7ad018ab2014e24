use crate::http::{
    redact_url_for_log, FetchRequest, Fetcher, DIRECT_IMAGE_TIMEOUT, PRODUCT_IMAGE_TIMEOUT,
};
use crate::models::{
    Candidate, DownloadTask, FailureReason, FetchResult, ItemOutcome, RunSummary, TaskSource,
};
use crate::resolver::Resolver;
use crate::scrape::try_highres_url;
use crate::search::SearchSettings;
use crate::writer::{existing_download, write_image};
use crate::Result;
use std::path::Path;

/// A rewritten high-resolution URL only wins when it returns more than this.
const HIGHRES_PROBE_MIN_BYTES: u64 = 1_000;

type FetchOutcome = std::result::Result<(String, FetchResult), FailureReason>;

/// Forwards run events to the caller's `log_line`. A failing sink never stops
/// the run; the first error is kept for the summary.
struct EventSink<FLog> {
    log_line: FLog,
    first_error: Option<String>,
}

impl<FLog> EventSink<FLog>
where
    FLog: FnMut(&str, &str, serde_json::Value) -> Result<()>,
{
    fn new(log_line: FLog) -> Self {
        Self {
            log_line,
            first_error: None,
        }
    }

    fn emit(&mut self, level: &str, event: &str, data: serde_json::Value) {
        if let Err(err) = (self.log_line)(level, event, data) {
            if self.first_error.is_none() {
                self.first_error = Some(err.to_string());
            }
        }
    }
}

/// Downloads every task in order, one at a time.
///
/// Per-item problems (HTTP errors, tiny bodies, timeouts, pages without an
/// image) are recorded in the summary and never stop the run, and neither do
/// errors from `log_line`. `Err` is only returned when the output directory
/// cannot be created.
pub fn run_downloads<F, FLog>(
    fetcher: &F,
    tasks: &[DownloadTask],
    output_dir: &Path,
    search: &SearchSettings,
    log_line: FLog,
) -> Result<RunSummary>
where
    F: Fetcher + ?Sized,
    FLog: FnMut(&str, &str, serde_json::Value) -> Result<()>,
{
    std::fs::create_dir_all(output_dir)?;

    let mut sink = EventSink::new(log_line);
    sink.emit(
        "info",
        "run_started",
        serde_json::json!({
            "output_dir": output_dir.to_string_lossy(),
            "total": tasks.len(),
        }),
    );

    let mut resolver = Resolver::new(fetcher, search);
    let mut summary = RunSummary::default();

    for (index, task) in tasks.iter().enumerate() {
        sink.emit(
            "info",
            "item_started",
            serde_json::json!({
                "index": index + 1,
                "total": tasks.len(),
                "filename": task.filename,
                "source": task.source.kind(),
            }),
        );

        let outcome = process_task(fetcher, &mut resolver, task, output_dir, &mut sink);
        match &outcome {
            ItemOutcome::Skipped { bytes } => sink.emit(
                "info",
                "item_skipped",
                serde_json::json!({ "filename": task.filename, "bytes": bytes }),
            ),
            ItemOutcome::Downloaded { url, bytes, sha256 } => sink.emit(
                "info",
                "item_downloaded",
                serde_json::json!({
                    "filename": task.filename,
                    "url": url,
                    "bytes": bytes,
                    "sha256": sha256,
                }),
            ),
            ItemOutcome::Failed { reason } => sink.emit(
                "warn",
                "item_failed",
                serde_json::json!({
                    "filename": task.filename,
                    "code": reason.code(),
                    "error": reason.to_string(),
                }),
            ),
        }

        summary.record(task.clone(), outcome);
    }

    sink.emit(
        "info",
        "run_finished",
        serde_json::json!({
            "total": summary.total,
            "succeeded": summary.succeeded,
            "skipped": summary.skipped,
            "failed": summary.failed,
        }),
    );

    summary.log_error = sink.first_error;
    Ok(summary)
}

fn process_task<F, FLog>(
    fetcher: &F,
    resolver: &mut Resolver<'_, F>,
    task: &DownloadTask,
    output_dir: &Path,
    sink: &mut EventSink<FLog>,
) -> ItemOutcome
where
    F: Fetcher + ?Sized,
    FLog: FnMut(&str, &str, serde_json::Value) -> Result<()>,
{
    let target = output_dir.join(&task.filename);
    if let Some(bytes) = existing_download(&target, task.min_bytes) {
        return ItemOutcome::Skipped { bytes };
    }

    if let TaskSource::Search { query, .. } = &task.source {
        if !resolver.has_searched(query) {
            sink.emit(
                "info",
                "search_requested",
                serde_json::json!({
                    "query": query,
                    "endpoint": redact_url_for_log(&resolver.search_settings().endpoint),
                }),
            );
        }
    }

    let resolution = match resolver.resolve(&task.source) {
        Ok(resolution) => resolution,
        Err(reason) => return ItemOutcome::Failed { reason },
    };
    let best = resolution.best;

    sink.emit(
        "info",
        "candidate_selected",
        serde_json::json!({
            "filename": task.filename,
            "strategy": best.strategy,
            "url": best.url,
            "credit": best.credit,
            "fallbacks": resolution.fallbacks.len(),
        }),
    );

    let fetched = match &task.source {
        TaskSource::ProductPage { .. } => fetch_product_image(fetcher, &best, task, sink),
        TaskSource::Direct { .. } | TaskSource::Search { .. } => fetcher
            .fetch(&FetchRequest::new(best.url.as_str(), DIRECT_IMAGE_TIMEOUT))
            .map(|result| (best.url.clone(), result)),
    };
    let (url, result) = match fetched {
        Ok(value) => value,
        Err(reason) => return ItemOutcome::Failed { reason },
    };

    if let Some(reason) = result.rejection(task.min_bytes) {
        return ItemOutcome::Failed { reason };
    }

    match write_image(&target, &result.content) {
        Ok(sha256) => ItemOutcome::Downloaded {
            url,
            bytes: result.content.len() as u64,
            sha256,
        },
        Err(err) => ItemOutcome::Failed {
            reason: FailureReason::Write(err.to_string()),
        },
    }
}

/// Tries the `._SL1500_` rendition first and keeps its bytes when the probe
/// succeeds; otherwise downloads the candidate as found on the page.
fn fetch_product_image<F, FLog>(
    fetcher: &F,
    candidate: &Candidate,
    task: &DownloadTask,
    sink: &mut EventSink<FLog>,
) -> FetchOutcome
where
    F: Fetcher + ?Sized,
    FLog: FnMut(&str, &str, serde_json::Value) -> Result<()>,
{
    if let Some(highres) = try_highres_url(&candidate.url) {
        let probe = FetchRequest::new(highres.as_str(), PRODUCT_IMAGE_TIMEOUT);
        if let Ok(result) = fetcher.fetch(&probe) {
            if result.is_accepted(HIGHRES_PROBE_MIN_BYTES.max(task.min_bytes)) {
                sink.emit(
                    "info",
                    "highres_selected",
                    serde_json::json!({ "filename": task.filename, "url": highres }),
                );
                return Ok((highres, result));
            }
        }
    }

    let request = FetchRequest::new(candidate.url.as_str(), PRODUCT_IMAGE_TIMEOUT);
    fetcher
        .fetch(&request)
        .map(|result| (candidate.url.clone(), result))
}
