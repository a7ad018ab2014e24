pub mod catalog;
pub mod config;
mod error;
pub mod event_log;
pub mod http;
pub mod manifest;
pub mod models;
pub mod paths;
pub mod resolver;
pub mod runner;
pub mod scrape;
pub mod search;
pub mod writer;

pub use error::{DownloadError, Result};
