use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Single GET, no retries. Any non-2xx status is an error.
pub fn fetch(client: &Client, url: &str) -> Result<String, FetchError> {
    println!("Fetching page: {}", url);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message(url.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = get_text(client, url);
    spinner.finish_and_clear();

    let body = result?;
    info!(bytes = body.len(), "Fetched {}", url);
    Ok(body)
}

fn get_text(client: &Client, url: &str) -> Result<String, FetchError> {
    let failed = |source| FetchError::Request {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().map_err(failed)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status,
            url: url.to_string(),
        });
    }
    response.text().map_err(failed)
}

/// Load a saved listing page from disk.
pub fn read_file(path: &Path) -> Result<String, FetchError> {
    println!("Reading page: {}", path.display());
    let body = std::fs::read_to_string(path).map_err(|source| FetchError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    info!(bytes = body.len(), "Read {}", path.display());
    Ok(body)
}
