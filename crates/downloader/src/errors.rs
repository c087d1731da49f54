use thiserror::Error;

use wallhaven_core::CoreError;

pub type Result<T> = std::result::Result<T, DownloaderError>;

#[derive(Debug, Error)]
pub enum DownloaderError {
    #[error("image not found: {url}")]
    NotFound { url: String },

    #[error("fetching image failed: {0}")]
    Fetch(#[from] CoreError),

    #[error("io error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}
