use std::collections::BTreeMap;

use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

/// cookie and header state attached to every request a client makes.
///
/// an empty cookie set means anonymous browsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    cookies: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
}

impl AuthSession {
    /// creates an anonymous session with no cookies or headers.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookies<I, K, V>(mut self, cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.cookies = cookies
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// parses a raw `name=value; name2=value2` cookie header string.
    pub fn with_cookie_str(self, cookies: &str) -> Self {
        let pairs = cookies
            .split(';')
            .map(str::trim)
            .filter_map(|piece| piece.split_once('='))
            .filter(|(name, _)| !name.trim().is_empty())
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect::<Vec<_>>();
        self.with_cookies(pairs)
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// true once the session carries cookies, i.e. after a successful login.
    pub fn is_authenticated(&self) -> bool {
        !self.cookies.is_empty()
    }

    /// renders the cookies as a single `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// builds the header map sent with each request.
    ///
    /// entries that are not valid http header names or values are skipped.
    pub fn header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => debug!(header = %name, "skipping invalid session header"),
            }
        }

        if let Some(cookie) = self.cookie_header()
            && let Ok(v) = HeaderValue::from_str(&cookie)
        {
            headers.insert(COOKIE, v);
        }

        headers
    }
}
