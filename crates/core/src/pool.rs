use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::errors::{CoreError, Result};
use crate::fetch::{FetchResult, PageFetch};
use crate::params::Params;

/// number of requests a pool keeps in flight unless told otherwise.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// outcome of [`FetchPool::fetch_many`].
///
/// asking for exactly one url goes straight to the fetcher and yields
/// [`Batch::Single`]; any other number of urls yields [`Batch::Many`] in
/// completion order.
#[derive(Debug)]
pub enum Batch {
    Single(Result<FetchResult>),
    Many(Vec<Result<FetchResult>>),
}

impl Batch {
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(results) => results.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_single(&self) -> bool {
        matches!(self, Self::Single(_))
    }

    /// flattens either shape into a list.
    pub fn into_vec(self) -> Vec<Result<FetchResult>> {
        match self {
            Self::Single(result) => vec![result],
            Self::Many(results) => results,
        }
    }
}

/// fans page fetches out over tokio tasks, at most `max_concurrency` at a time.
#[derive(Debug)]
pub struct FetchPool<F> {
    fetcher: Arc<F>,
    max_concurrency: usize,
}

impl<F> Clone for FetchPool<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            max_concurrency: self.max_concurrency,
        }
    }
}

impl<F: PageFetch> FetchPool<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// sets the concurrency cap; values below 1 are treated as 1.
    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// fetches a single url directly, bypassing the pool.
    pub async fn fetch(&self, url: &str, params: &Params) -> Result<FetchResult> {
        self.fetcher.fetch(url, params).await
    }

    /// fetches every url and returns once all of them have finished.
    ///
    /// failures never abort the batch: each url gets its own entry, either a
    /// [`FetchResult`] carrying whatever status came back or an error naming the url.
    pub async fn fetch_many<I, S>(&self, urls: I) -> Batch
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut urls = urls.into_iter().map(Into::into).collect::<Vec<String>>();

        if urls.len() == 1 {
            let url = urls.remove(0);
            return Batch::Single(self.fetch(&url, &Params::new()).await);
        }

        debug!(
            count = urls.len(),
            max_concurrency = self.max_concurrency,
            "fetching batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(urls.len());

        for url in urls {
            let fetcher = self.fetcher.clone();
            let semaphore = semaphore.clone();
            let task_url = url.clone();

            let handle = tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");
                fetcher.fetch(&task_url, &Params::new()).await
            });
            pending.insert(handle.id(), url);
        }

        let mut results = Vec::with_capacity(pending.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    pending.remove(&id);
                    results.push(result);
                }
                Err(err) => {
                    let url = pending.remove(&err.id()).unwrap_or_default();
                    warn!(%url, error = %err, "fetch task failed");
                    results.push(Err(CoreError::Task {
                        url,
                        message: err.to_string(),
                    }));
                }
            }
        }

        Batch::Many(results)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use reqwest::StatusCode;

    use super::*;
    use crate::fetch::{Body, HttpFetcher};
    use crate::testing::{Reply, serve};

    /// in-memory fetcher that records how many calls overlap.
    #[derive(Default)]
    struct Recorder {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl PageFetch for Recorder {
        async fn fetch(&self, url: &str, _params: &Params) -> Result<FetchResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(20)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.ends_with("/panic") {
                panic!("fetcher blew up");
            }

            let status = if url.ends_with("/missing") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::OK
            };
            Ok(FetchResult::new(
                url,
                status,
                Some("text/html".into()),
                Some(Body::Text(url.to_string())),
            ))
        }
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("http://example.test/{i}")).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fills_but_never_exceeds_concurrency_cap() {
        let pool = FetchPool::new(Recorder::default());
        let batch = pool.fetch_many(urls(10)).await;

        assert!(!batch.is_single());
        let results = batch.into_vec();
        assert_eq!(results.len(), 10);
        // every fetch sleeps, so the cap is reached and never passed
        assert_eq!(pool.fetcher().peak.load(Ordering::SeqCst), DEFAULT_MAX_CONCURRENCY);

        let got = results
            .iter()
            .map(|r| r.as_ref().unwrap().url().to_string())
            .collect::<HashSet<_>>();
        assert_eq!(got, urls(10).into_iter().collect::<HashSet<_>>());
    }

    #[tokio::test]
    async fn custom_cap_is_respected() {
        let pool = FetchPool::new(Recorder::default()).max_concurrency(2);
        let results = pool.fetch_many(urls(7)).await.into_vec();
        assert_eq!(results.len(), 7);
        assert_eq!(pool.fetcher().peak.load(Ordering::SeqCst), 2);
        assert_eq!(pool.fetcher().calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn zero_cap_is_clamped() {
        let pool = FetchPool::new(Recorder::default()).max_concurrency(0);
        assert_eq!(pool.concurrency(), 1);
        let results = pool.fetch_many(urls(3)).await.into_vec();
        assert_eq!(results.len(), 3);
        assert_eq!(pool.fetcher().peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn single_url_is_fetched_directly() {
        let pool = FetchPool::new(Recorder::default());
        let batch = pool.fetch_many(["http://example.test/one"]).await;
        match batch {
            Batch::Single(Ok(result)) => assert_eq!(result.url(), "http://example.test/one"),
            other => panic!("expected a single result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_input_yields_empty_batch() {
        let pool = FetchPool::new(Recorder::default());
        let batch = pool.fetch_many(Vec::<String>::new()).await;
        assert!(batch.is_empty());
        assert!(!batch.is_single());
        assert_eq!(pool.fetcher().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_do_not_abort_the_batch() {
        let pool = FetchPool::new(Recorder::default());
        let batch = pool
            .fetch_many([
                "http://example.test/a",
                "http://example.test/missing",
                "http://example.test/panic",
                "http://example.test/b",
            ])
            .await;
        let results = batch.into_vec();
        assert_eq!(results.len(), 4);

        let ok = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .filter(|r| r.is_ok())
            .count();
        assert_eq!(ok, 2);

        let missing = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .find(|r| r.status() == StatusCode::NOT_FOUND)
            .expect("404 entry present");
        assert_eq!(missing.url(), "http://example.test/missing");

        let failed = results
            .iter()
            .find_map(|r| r.as_ref().err())
            .expect("panicked task is reported");
        assert!(matches!(failed, CoreError::Task { .. }));
        assert_eq!(failed.url(), Some("http://example.test/panic"));
    }

    #[tokio::test]
    async fn http_batch_correlates_results_to_urls() {
        let (addr, _) = serve(|request| {
            if request.path().ends_with("gone") {
                Reply::status(404)
            } else {
                Reply::html(request.target.clone())
            }
        })
        .await;
        let pool = FetchPool::new(HttpFetcher::with_session(Arc::default()).unwrap());
        let mut wanted = (0..6)
            .map(|i| format!("http://{addr}/w/{i}"))
            .collect::<Vec<_>>();
        wanted.push(format!("http://{addr}/w/gone"));

        let results = pool.fetch_many(wanted.clone()).await.into_vec();
        assert_eq!(results.len(), wanted.len());
        for result in results {
            let result = result.unwrap();
            assert!(wanted.contains(&result.url().to_string()));
            if result.is_ok() {
                let path = result.url().trim_start_matches(&format!("http://{addr}"));
                assert_eq!(result.text(), Some(path));
            } else {
                assert_eq!(result.status(), StatusCode::NOT_FOUND);
            }
        }
    }
}
