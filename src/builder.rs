use std::collections::BTreeMap;

use wallhaven_core::{AuthSession, DEFAULT_MAX_CONCURRENCY, DEFAULT_USER_AGENT};

use crate::prelude::*;

pub struct WallhavenBuilder {
    base_url: String,
    credentials: Option<(String, String)>,
    cookies: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    max_concurrency: usize,
    user_agent: String,
}

impl Default for WallhavenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WallhavenBuilder {
    /// creates a builder for an anonymous client against the public site.
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            credentials: None,
            cookies: BTreeMap::new(),
            headers: BTreeMap::new(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// sets the site base url every route is built from.
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// username and password used by [`WallhavenBuilder::connect`] to log in.
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some((username.to_string(), password.to_string()));
        self
    }

    /// seeds the session from a raw cookie header string, e.g. one exported
    /// from a browser.
    pub fn cookies_str(mut self, cookies: &str) -> Self {
        let parsed = AuthSession::new().with_cookie_str(cookies);
        self.cookies.extend(parsed.cookies().clone());
        self
    }

    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    /// extra header sent with every page request.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// caps how many pages are fetched at once by batch operations.
    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// builds a [`WallhavenClient`] without logging in.
    pub fn build(&self) -> Result<WallhavenClient> {
        let session = AuthSession::new()
            .with_cookies(self.cookies.clone())
            .with_headers(self.headers.clone());

        WallhavenClient::with_options(
            Routes::new(&self.base_url)?,
            session,
            &self.user_agent,
            self.max_concurrency,
        )
    }

    /// builds the client and, when credentials were given, logs in.
    ///
    /// a rejected login is not an error: the client simply stays anonymous.
    pub async fn connect(&self) -> Result<WallhavenClient> {
        let mut client = self.build()?;
        if let Some((username, password)) = &self.credentials {
            client.login(username, password).await?;
        }
        Ok(client)
    }
}
