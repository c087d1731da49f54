use std::future::Future;
use std::sync::Arc;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::errors::{CoreError, Result};
use crate::params::Params;
use crate::session::AuthSession;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// decoded response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// html page text.
    Text(String),
    /// raw image bytes.
    Bytes(Vec<u8>),
}

impl Body {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }
}

/// normalized outcome of one GET request.
///
/// the body is only ever present for a `200 OK` response with an html, jpeg or
/// png content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    url: String,
    status: StatusCode,
    content_type: Option<String>,
    body: Option<Body>,
}

impl FetchResult {
    /// builds a result; any body offered with a non-200 status is dropped.
    pub fn new(
        url: impl Into<String>,
        status: StatusCode,
        content_type: Option<String>,
        body: Option<Body>,
    ) -> Self {
        let body = body.filter(|_| status == StatusCode::OK);
        Self {
            url: url.into(),
            status,
            content_type,
            body,
        }
    }

    /// final url of the response.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// page text, when the response was a 200 html page.
    pub fn text(&self) -> Option<&str> {
        self.body.as_ref().and_then(Body::as_text)
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn into_body(self) -> Option<Body> {
        self.body
    }
}

/// what kind of body a content type is read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Text,
    Bytes,
}

fn body_kind(content_type: &str) -> Option<BodyKind> {
    match content_type {
        "text/html" => Some(BodyKind::Text),
        "image/jpeg" | "image/png" => Some(BodyKind::Bytes),
        _ => None,
    }
}

/// strips parameters such as `; charset=utf-8` from a content-type header.
fn media_type(header: &str) -> String {
    header
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// something that can perform a single page fetch.
///
/// [`HttpFetcher`] is the real implementation; the pool is generic over this so
/// it can be driven by anything that produces [`FetchResult`]s.
pub trait PageFetch: Send + Sync + 'static {
    fn fetch(&self, url: &str, params: &Params)
    -> impl Future<Output = Result<FetchResult>> + Send;
}

/// performs authenticated GET requests with a fixed session.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    session: Arc<AuthSession>,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(client: Client, session: Arc<AuthSession>) -> Self {
        Self {
            client,
            session,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// builds a fetcher around a fresh reqwest client.
    pub fn with_session(session: Arc<AuthSession>) -> Result<Self> {
        let client = Client::builder().build().map_err(CoreError::BuildClient)?;
        Ok(Self::new(client, session))
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,image/*;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        if let Ok(v) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, v);
        }

        // session headers override the defaults
        headers.extend(self.session.header_map());
        headers
    }

    async fn get(&self, url: &str, params: &Params) -> Result<FetchResult> {
        let response = self
            .client
            .get(url)
            .headers(self.headers())
            .query(params)
            .send()
            .await
            .map_err(|source| CoreError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let final_url = response.url().to_string();
        debug!(%url, %status, "fetched page");

        if status != StatusCode::OK {
            return Ok(FetchResult::new(final_url, status, None, None));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(media_type);

        let body = match content_type.as_deref().and_then(body_kind) {
            Some(BodyKind::Text) => Some(Body::Text(response.text().await.map_err(|source| {
                CoreError::ResponseBody {
                    url: final_url.clone(),
                    source,
                }
            })?)),
            Some(BodyKind::Bytes) => Some(Body::Bytes(
                response
                    .bytes()
                    .await
                    .map_err(|source| CoreError::ResponseBody {
                        url: final_url.clone(),
                        source,
                    })?
                    .to_vec(),
            )),
            None => {
                debug!(%url, content_type = ?content_type, "ignoring body of unrecognized content type");
                None
            }
        };

        Ok(FetchResult::new(final_url, status, content_type, body))
    }
}

impl PageFetch for HttpFetcher {
    fn fetch(
        &self,
        url: &str,
        params: &Params,
    ) -> impl Future<Output = Result<FetchResult>> + Send {
        self.get(url, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, Seen, serve};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0, 1, 2, 3];

    async fn fetcher() -> (HttpFetcher, std::net::SocketAddr, Seen) {
        let (addr, seen) = serve(|request| match request.path() {
            "/page" => Reply::new(200, "text/html; charset=utf-8", "<html>hi</html>"),
            "/image.png" => Reply::new(200, "image/png", PNG),
            "/image.jpg" => Reply::new(200, "IMAGE/JPEG", PNG),
            "/data" => Reply::new(200, "application/json", "{}"),
            "/forbidden" => Reply::new(403, "text/html", "<html>no</html>"),
            _ => Reply::new(404, "text/html", "<html>missing</html>"),
        })
        .await;
        let session = AuthSession::new()
            .with_cookies([("remember", "token")])
            .with_headers([("x-test", "yes")]);
        let fetcher = HttpFetcher::with_session(Arc::new(session)).unwrap();
        (fetcher, addr, seen)
    }

    #[test]
    fn media_type_strips_parameters() {
        assert_eq!(media_type("text/html; charset=UTF-8"), "text/html");
        assert_eq!(media_type(" Image/PNG "), "image/png");
    }

    #[test]
    fn body_is_dropped_for_non_ok_status() {
        let result = FetchResult::new(
            "http://x/y",
            StatusCode::NOT_FOUND,
            Some("text/html".into()),
            Some(Body::Text("gone".into())),
        );
        assert!(result.body().is_none());
        assert!(!result.is_ok());
    }

    #[tokio::test]
    async fn html_is_read_as_text() {
        let (fetcher, addr, _) = fetcher().await;
        let result = fetcher
            .fetch(&format!("http://{addr}/page"), &Params::new())
            .await
            .unwrap();
        assert_eq!(result.status(), StatusCode::OK);
        assert_eq!(result.content_type(), Some("text/html"));
        assert_eq!(result.text(), Some("<html>hi</html>"));
    }

    #[tokio::test]
    async fn images_are_read_as_bytes() {
        let (fetcher, addr, _) = fetcher().await;
        for path in ["image.png", "image.jpg"] {
            let result = fetcher
                .fetch(&format!("http://{addr}/{path}"), &Params::new())
                .await
                .unwrap();
            assert_eq!(result.body(), Some(&Body::Bytes(PNG.to_vec())));
            assert!(result.text().is_none());
        }
    }

    #[tokio::test]
    async fn unrecognized_content_type_has_no_body() {
        let (fetcher, addr, _) = fetcher().await;
        let result = fetcher
            .fetch(&format!("http://{addr}/data"), &Params::new())
            .await
            .unwrap();
        assert_eq!(result.status(), StatusCode::OK);
        assert_eq!(result.content_type(), Some("application/json"));
        assert!(result.body().is_none());
    }

    #[tokio::test]
    async fn error_statuses_are_returned_not_raised() {
        let (fetcher, addr, _) = fetcher().await;
        for (path, status) in [
            ("forbidden", StatusCode::FORBIDDEN),
            ("nothing", StatusCode::NOT_FOUND),
        ] {
            let result = fetcher
                .fetch(&format!("http://{addr}/{path}"), &Params::new())
                .await
                .unwrap();
            assert_eq!(result.status(), status);
            assert!(result.body().is_none());
            assert!(result.content_type().is_none());
        }
    }

    #[tokio::test]
    async fn session_and_params_are_sent() {
        let (fetcher, addr, seen) = fetcher().await;
        let params: Params = [("page".to_string(), "2".to_string())].into();
        fetcher
            .fetch(&format!("http://{addr}/page"), &params)
            .await
            .unwrap();

        let seen = seen.lock().await;
        let request = &seen[0];
        assert_eq!(request.method, "GET");
        assert_eq!(request.path(), "/page");
        assert_eq!(request.query(), "page=2");
        assert_eq!(request.header("cookie").as_deref(), Some("remember=token"));
        assert_eq!(request.header("x-test").as_deref(), Some("yes"));
    }

    #[tokio::test]
    async fn transport_failure_names_the_url() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::with_session(Arc::default()).unwrap();
        let url = format!("http://{addr}/page");
        let err = fetcher.fetch(&url, &Params::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::Request { .. }));
        assert_eq!(err.url(), Some(url.as_str()));
    }
}
