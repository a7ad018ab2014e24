use std::path::PathBuf;

use blog_images::catalog::{self, DEFAULT_PRESET, PRESETS};
use blog_images::config::{self, DownloadConfig};
use blog_images::event_log::EventLog;
use blog_images::http::UreqFetcher;
use blog_images::paths::{self, RunPaths};
use blog_images::{manifest, runner, DownloadError};

const RULE_WIDTH: usize = 60;

fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return Ok(());
    }

    let mut config_path: Option<PathBuf> = None;
    let mut preset_name: Option<String> = None;
    let mut base_dir: Option<PathBuf> = None;
    let mut log_file: Option<PathBuf> = None;
    let mut manifest_path: Option<PathBuf> = None;
    let mut export_path: Option<PathBuf> = None;
    let mut list_presets = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--preset" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--preset requires a value".to_string())?;
                preset_name = Some(v.to_string());
            }
            "--base-dir" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--base-dir requires a value".to_string())?;
                base_dir = Some(PathBuf::from(v));
            }
            "--log-file" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--log-file requires a value".to_string())?;
                log_file = Some(PathBuf::from(v));
            }
            "--manifest" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--manifest requires a value".to_string())?;
                manifest_path = Some(PathBuf::from(v));
            }
            "--export" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--export requires a value".to_string())?;
                export_path = Some(PathBuf::from(v));
            }
            "--list-presets" => list_presets = true,
            other if other.starts_with("--") => {
                return Err(format!("unknown arg: {other} (try --help)"))
            }
            other => {
                if config_path.is_some() {
                    return Err(format!("unexpected extra argument: {other}"));
                }
                config_path = Some(PathBuf::from(other));
            }
        }
        i += 1;
    }

    if list_presets {
        for info in PRESETS {
            println!("{:<20} {}", info.name, info.description);
        }
        return Ok(());
    }

    if config_path.is_some() && preset_name.is_some() {
        return Err("pass either a config file or --preset, not both".to_string());
    }

    let (config, run_paths) = match &config_path {
        Some(path) => {
            let config = config::load_config(path).map_err(|e| match e {
                DownloadError::ConfigNotFound(p) => {
                    format!("Config file not found: {}", p.to_string_lossy())
                }
                other => other.to_string(),
            })?;
            (config, RunPaths::for_config_file(path))
        }
        None => {
            let name = preset_name.as_deref().unwrap_or(DEFAULT_PRESET);
            let config = catalog::preset(name).map_err(|e| format!("{e} (try --list-presets)"))?;
            let run_paths = match base_dir {
                Some(dir) => RunPaths::new(dir),
                None => RunPaths::current_dir().map_err(|e| e.to_string())?,
            };
            (config, run_paths)
        }
    };

    if let Some(path) = export_path {
        config::save_config(&path, &config).map_err(|e| e.to_string())?;
        println!("Config written: {}", path.to_string_lossy());
        return Ok(());
    }

    let tasks = config.tasks().map_err(|e| e.to_string())?;
    if tasks.is_empty() {
        println!("No download entries defined!");
        println!("Either pick a preset with entries or pass a JSON file.");
        println!("Usage: blog_images [products.json]");
        return Err(DownloadError::NoEntries.to_string());
    }

    let output_dir = run_paths.output_dir(config.output_dir_or_default());
    if paths::ensure_dir(&output_dir).map_err(|e| e.to_string())? {
        println!("  Created folder: {}", output_dir.to_string_lossy());
    }

    print_banner(&config, &output_dir, tasks.len());

    let mut event_log = match log_file {
        Some(path) => Some(EventLog::open(path).map_err(|e| e.to_string())?),
        None => None,
    };

    let fetcher = UreqFetcher::new();
    let summary = runner::run_downloads(
        &fetcher,
        &tasks,
        &output_dir,
        &config.search,
        |level, event, data| {
            render_event(event, &data);
            let failed = match &event_log {
                Some(log) => log
                    .append(level, event, data)
                    .err()
                    .map(|err| (log.path().to_path_buf(), err)),
                None => None,
            };
            if let Some((path, err)) = failed {
                eprintln!(
                    "WARNING: event log disabled, append to {} failed: {err}",
                    path.to_string_lossy()
                );
                event_log = None;
            }
            Ok(())
        },
    )
    .map_err(|e| e.to_string())?;

    if let Some(err) = &summary.log_error {
        eprintln!("WARNING: event log error: {err}");
    }

    if let Some(path) = manifest_path {
        manifest::write_manifest(&path, &summary).map_err(|e| e.to_string())?;
        println!("Manifest:   {}", path.to_string_lossy());
    }

    println!("{}", "=".repeat(RULE_WIDTH));
    println!(
        "RESULT: {}/{} succeeded ({} already present)",
        summary.succeeded, summary.total, summary.skipped
    );
    if !summary.failed.is_empty() {
        println!("FAILED:");
        for name in &summary.failed {
            println!("  - {name}");
        }
    }
    println!("{}", "=".repeat(RULE_WIDTH));

    Ok(())
}

fn print_banner(config: &DownloadConfig, output_dir: &std::path::Path, count: usize) {
    println!();
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("Blog image downloader");
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("Target dir: {}", output_dir.to_string_lossy());
    println!("Items:      {count}");
    if !config.searches.is_empty() {
        println!("Search API: {}", config.search.endpoint);
    }
    println!("{}", "=".repeat(RULE_WIDTH));
    println!();
}

fn render_event(event: &str, data: &serde_json::Value) {
    let text = |key: &str| data.get(key).and_then(|v| v.as_str()).unwrap_or("");
    let number = |key: &str| data.get(key).and_then(|v| v.as_u64()).unwrap_or(0);

    match event {
        "item_started" => {
            println!(
                "[{}/{}] {}",
                number("index"),
                number("total"),
                text("filename")
            );
        }
        "item_skipped" => {
            println!(
                "        SKIP  already present ({} bytes)",
                group_digits(number("bytes"))
            );
            println!();
        }
        "search_requested" => println!("        Searching: '{}'", text("query")),
        "candidate_selected" => match data.get("credit").and_then(|v| v.as_str()) {
            Some(credit) => println!("        Source: {} (by {credit})", text("strategy")),
            None => println!("        Source: {}", text("strategy")),
        },
        "highres_selected" => println!("        High-res: yes"),
        "item_downloaded" => {
            println!("        OK ({} bytes)", group_digits(number("bytes")));
            println!();
        }
        "item_failed" => {
            println!("        FAILED: {}", text("error"));
            println!();
        }
        _ => {}
    }
}

fn group_digits(value: u64) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (idx, ch) in raw.chars().enumerate() {
        if idx > 0 && (raw.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn print_help() {
    println!(
        r#"blog_images

Downloads stock photos and product images for blog articles. Files that are
already present (and larger than the size threshold) are skipped, so re-running
is the retry mechanism.

Usage:
  blog_images products.json
  blog_images --preset date-ideas-final
  blog_images --preset date-ideas-search --base-dir ../blog

Options:
  --preset <name>      Use a built-in list instead of a config file (default: products)
  --base-dir <path>    Folder that a preset's relative output dir is resolved against (default: cwd)
  --log-file <path>    Append JSON lines run events to <path>
  --manifest <path>    Write a CSV report with one row per item
  --export <path>      Write the selected config/preset as JSON and exit
  --list-presets       List the built-in presets

Config file:
  {{ "output_dir": "images",
    "products": [{{ "url": "https://www.amazon.com/dp/ASIN", "filename": "name.jpg" }}],
    "images":   [{{ "url": "https://images.pexels.com/...", "filename": "name.jpg" }}],
    "searches": [{{ "query": "couple picnic", "filenames": ["a.jpg", "b.jpg"] }}] }}

  The search API token is read from search.api_key or PEXELS_API_KEY.
"#
    );
}
