use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid value {value:?} for search parameter `{name}`")]
    InvalidChoice { name: &'static str, value: String },

    #[error("unrecognized route {route:?}; expected a search or user route")]
    InvalidRoute { route: String },

    #[error("failed building reqwest client: {0}")]
    BuildClient(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body from {url}: {source}")]
    ResponseBody {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetch task for {url} did not complete: {message}")]
    Task { url: String, message: String },
}

impl CoreError {
    /// url of the request this error belongs to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Request { url, .. } | Self::ResponseBody { url, .. } | Self::Task { url, .. } => {
                Some(url)
            }
            _ => None,
        }
    }
}
