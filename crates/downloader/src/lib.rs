mod errors;

use std::path::{Path, PathBuf};

pub use errors::{DownloaderError, Result};
use reqwest::StatusCode;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use wallhaven_core::FetchResult;

/// writes every successfully fetched body into `directory`.
///
/// each file is named after the last path segment of its url. nothing stops
/// the batch early: every write is attempted first. the first 404 is then
/// returned if there was one, otherwise the first transport or io error.
pub async fn save_all<I>(results: I, directory: impl AsRef<Path>) -> Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = wallhaven_core::Result<FetchResult>>,
{
    let directory = directory.as_ref();
    ensure_dir(directory).await?;

    let mut saved = Vec::new();
    let mut first_not_found = None;
    let mut first_other = None;

    for result in results {
        let result = match result {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "image fetch failed");
                first_other.get_or_insert(DownloaderError::Fetch(err));
                continue;
            }
        };

        match result.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                warn!(url = %result.url(), "image not found");
                first_not_found.get_or_insert(DownloaderError::NotFound {
                    url: result.url().to_string(),
                });
                continue;
            }
            status => {
                debug!(url = %result.url(), %status, "skipping image without content");
                continue;
            }
        }

        let Some(body) = result.body() else {
            debug!(url = %result.url(), content_type = ?result.content_type(), "skipping response without body");
            continue;
        };

        let output = directory.join(filename_from_url(result.url()));
        match write_file(&output, body.as_bytes()).await {
            Ok(()) => {
                info!(path = %output.display(), "saved image");
                saved.push(output);
            }
            Err(err) => {
                warn!(error = %err, "writing image failed");
                first_other.get_or_insert(err);
            }
        }
    }

    match first_not_found.or(first_other) {
        Some(err) => Err(err),
        None => Ok(saved),
    }
}

/// last non-empty path segment of `url`.
pub fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "wallpaper".to_string())
}

async fn write_file(output: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(output)
        .await
        .map_err(|source| DownloaderError::Io {
            context: format!("creating output file {}", output.display()),
            source,
        })?;

    file.write_all(bytes)
        .await
        .map_err(|source| DownloaderError::Io {
            context: format!("writing output file {}", output.display()),
            source,
        })?;

    file.flush().await.map_err(|source| DownloaderError::Io {
        context: format!("flushing output file {}", output.display()),
        source,
    })
}

async fn ensure_dir(directory: &Path) -> Result<()> {
    if directory.as_os_str().is_empty() {
        return Ok(());
    }

    tokio::fs::create_dir_all(directory)
        .await
        .map_err(|source| DownloaderError::Io {
            context: format!("creating output directory {}", directory.display()),
            source,
        })
}
