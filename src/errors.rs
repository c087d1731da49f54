use thiserror::Error;

use wallhaven_core::CoreError;
use wallhaven_downloader::DownloaderError;

pub type Result<T> = std::result::Result<T, WallhavenError>;

#[derive(Debug, Error)]
pub enum WallhavenError {
    #[error("failed to parse wallhaven base URL {0:?}")]
    BaseUrl(String),

    #[error("failed building reqwest client: {0}")]
    BuildClient(#[source] reqwest::Error),

    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("download failed: {0}")]
    Download(#[from] DownloaderError),

    #[error("HTTP request failed while {context}: {source}")]
    Request {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to extract _token from the login form")]
    MissingToken,

    #[error("wallpaper is blocked for this session: {url}")]
    WallpaperBlocked { url: String },

    #[error("wallpaper not found: {url}")]
    WallpaperNotFound { url: String },

    #[error("user not found: {url}")]
    UserNotFound { url: String },

    #[error("{context} returned {status}")]
    UnexpectedStatus {
        context: String,
        status: reqwest::StatusCode,
    },

    #[error("{record} page is missing required field `{field}`")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}
