pub mod errors;
pub mod fetch;
pub mod params;
pub mod pool;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use errors::{CoreError, Result};
pub use fetch::{Body, DEFAULT_USER_AGENT, FetchResult, HttpFetcher, PageFetch};
pub use params::{
    Categories, Params, Purity, RouteKind, SearchOptions, SearchParameter, encode,
    encode_for_route,
};
pub use pool::{Batch, DEFAULT_MAX_CONCURRENCY, FetchPool};
pub use session::AuthSession;
