use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client as ReqwestClient, StatusCode};
use scraper::Html;
use tracing::{debug, info, warn};

use wallhaven_core::{
    AuthSession, Batch, DEFAULT_MAX_CONCURRENCY, DEFAULT_USER_AGENT, FetchPool, FetchResult,
    HttpFetcher, Params, SearchOptions, encode_for_route,
};
use wallhaven_downloader::{DownloaderError, save_all};

use crate::errors::{Result, WallhavenError};
use crate::html::first_attr;
use crate::routes::Routes;
use crate::user::User;
use crate::wallpaper::{Wallpaper, preview_links};

/// listing results fetched per search for anonymous sessions.
pub const ANONYMOUS_LIMIT: usize = 24;
/// listing results fetched per search once logged in.
pub const AUTHENTICATED_LIMIT: usize = 64;

pub struct WallhavenClient {
    routes: Routes,
    client: ReqwestClient,
    no_redirect_client: ReqwestClient,
    session: Arc<AuthSession>,
    pool: FetchPool<HttpFetcher>,
    user_agent: String,
    max_concurrency: usize,
}

impl WallhavenClient {
    /// creates an anonymous client for the public site.
    pub fn new() -> Result<Self> {
        Self::with_options(
            Routes::default(),
            AuthSession::new(),
            DEFAULT_USER_AGENT,
            DEFAULT_MAX_CONCURRENCY,
        )
    }

    pub(crate) fn with_options(
        routes: Routes,
        session: AuthSession,
        user_agent: &str,
        max_concurrency: usize,
    ) -> Result<Self> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(WallhavenError::BuildClient)?;

        let no_redirect_client = ReqwestClient::builder()
            .redirect(Policy::none())
            .build()
            .map_err(WallhavenError::BuildClient)?;

        let session = Arc::new(session);
        let pool = Self::build_pool(&client, &session, user_agent, max_concurrency);

        Ok(Self {
            routes,
            client,
            no_redirect_client,
            session,
            pool,
            user_agent: user_agent.to_string(),
            max_concurrency,
        })
    }

    fn build_pool(
        client: &ReqwestClient,
        session: &Arc<AuthSession>,
        user_agent: &str,
        max_concurrency: usize,
    ) -> FetchPool<HttpFetcher> {
        let fetcher =
            HttpFetcher::new(client.clone(), session.clone()).with_user_agent(user_agent);
        FetchPool::new(fetcher).max_concurrency(max_concurrency)
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// fetches one page with this client's session.
    pub async fn fetch(&self, url: &str, params: &Params) -> Result<FetchResult> {
        Ok(self.pool.fetch(url, params).await?)
    }

    /// fetches many pages, a bounded number at a time.
    ///
    /// a single url is fetched directly and comes back as [`Batch::Single`].
    pub async fn fetch_many<I, S>(&self, urls: I) -> Batch
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pool.fetch_many(urls).await
    }

    fn login_headers(&self) -> HeaderMap {
        let mut headers = self.session.header_map();
        if let Ok(v) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, v);
        }
        if let Ok(v) = HeaderValue::from_str(self.routes.base()) {
            headers.insert(REFERER, v);
        }
        if let Ok(v) = HeaderValue::from_str(self.routes.base().trim_end_matches('/')) {
            headers.insert(ORIGIN, v);
        }
        headers
    }

    /// reads the csrf token from the login form on the front page.
    async fn login_token(&self) -> Result<String> {
        let page = self.fetch(self.routes.base(), &Params::new()).await?;
        if !page.is_ok() {
            return Err(WallhavenError::UnexpectedStatus {
                context: "loading the login form".to_string(),
                status: page.status(),
            });
        }

        let doc = Html::parse_document(page.text().unwrap_or_default());
        first_attr(&doc, "#login > input", "value")
            .or_else(|| first_attr(&doc, "input[name=\"_token\"]", "value"))
            .ok_or(WallhavenError::MissingToken)
    }

    /// logs in and keeps the returned cookies for every later request.
    ///
    /// wrong credentials are not reported as an error: when the site hands back
    /// no cookies the session is left as it was and `false` is returned.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<bool> {
        info!(%username, "logging in");
        let token = self.login_token().await?;
        debug!("extracted login token");

        let login = self.routes.login();
        let response = self
            .no_redirect_client
            .post(&login)
            .headers(self.login_headers())
            .form(&[
                ("_token", token.as_str()),
                ("username", username),
                ("password", password),
            ])
            .send()
            .await
            .map_err(|source| WallhavenError::Request {
                context: format!("posting login form to {login}"),
                source,
            })?;

        let status = response.status();
        let cookies = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect::<BTreeMap<_, _>>();
        drop(response);

        if cookies.is_empty() {
            warn!(%username, %status, "login returned no cookies; staying anonymous");
            return Ok(false);
        }

        let session = (*self.session).clone().with_cookies(cookies);
        self.session = Arc::new(session);
        self.pool = Self::build_pool(
            &self.client,
            &self.session,
            &self.user_agent,
            self.max_concurrency,
        );

        info!(%username, "logged in");
        Ok(true)
    }

    /// fetches and parses one wallpaper page.
    pub async fn wallpaper(&self, id: &str) -> Result<Wallpaper> {
        let page = self.fetch(&self.routes.wallpaper(id), &Params::new()).await?;
        Self::wallpaper_from(page)
    }

    fn wallpaper_from(page: FetchResult) -> Result<Wallpaper> {
        match page.status() {
            StatusCode::OK => match page.text() {
                Some(text) => Wallpaper::from_html(text, page.url()),
                None => Err(WallhavenError::MissingField {
                    record: "wallpaper",
                    field: "page",
                }),
            },
            StatusCode::FORBIDDEN => Err(WallhavenError::WallpaperBlocked {
                url: page.url().to_string(),
            }),
            StatusCode::NOT_FOUND => Err(WallhavenError::WallpaperNotFound {
                url: page.url().to_string(),
            }),
            status => Err(WallhavenError::UnexpectedStatus {
                context: format!("wallpaper page {}", page.url()),
                status,
            }),
        }
    }

    /// fetches and parses a user profile.
    pub async fn user(&self, username: &str) -> Result<User> {
        let page = self.fetch(&self.routes.user(username), &Params::new()).await?;

        match page.status() {
            StatusCode::OK => User::from_html(page.text().unwrap_or_default()),
            StatusCode::NOT_FOUND => Err(WallhavenError::UserNotFound {
                url: page.url().to_string(),
            }),
            status => Err(WallhavenError::UnexpectedStatus {
                context: format!("user page {}", page.url()),
                status,
            }),
        }
    }

    /// searches wallpapers and fetches up to `count` of the matches.
    ///
    /// without an explicit count, anonymous sessions get at most
    /// [`ANONYMOUS_LIMIT`] results and logged-in ones [`AUTHENTICATED_LIMIT`].
    pub async fn search(
        &self,
        options: &SearchOptions,
        count: Option<usize>,
    ) -> Result<Vec<Wallpaper>> {
        self.listing(&self.routes.search(), options, count).await
    }

    /// wallpapers uploaded by `username`.
    pub async fn user_uploads(
        &self,
        username: &str,
        options: &SearchOptions,
        count: Option<usize>,
    ) -> Result<Vec<Wallpaper>> {
        self.listing(&self.routes.user_uploads(username), options, count)
            .await
    }

    /// most recently added wallpapers.
    pub async fn latest(
        &self,
        options: &SearchOptions,
        count: Option<usize>,
    ) -> Result<Vec<Wallpaper>> {
        let options = options.clone().sorting("date_added").order("desc");
        self.search(&options, count).await
    }

    pub async fn random(
        &self,
        options: &SearchOptions,
        count: Option<usize>,
    ) -> Result<Vec<Wallpaper>> {
        let options = options.clone().sorting("random");
        self.search(&options, count).await
    }

    /// wallpapers in the session's favorites, or in one favorites collection.
    pub async fn favorites(
        &self,
        collection: Option<&str>,
        options: &SearchOptions,
        count: Option<usize>,
    ) -> Result<Vec<Wallpaper>> {
        self.listing(&self.routes.favorites(collection), options, count)
            .await
    }

    fn limit(&self, count: Option<usize>) -> usize {
        match count.filter(|c| *c > 0) {
            Some(count) => count,
            None if self.is_authenticated() => AUTHENTICATED_LIMIT,
            None => ANONYMOUS_LIMIT,
        }
    }

    async fn listing(
        &self,
        route: &str,
        options: &SearchOptions,
        count: Option<usize>,
    ) -> Result<Vec<Wallpaper>> {
        let params = encode_for_route(route, options)?;
        let limit = self.limit(count);

        let listing = self.fetch(route, &params).await?;
        if listing.status() == StatusCode::NOT_FOUND && route.contains("/user/") {
            return Err(WallhavenError::UserNotFound {
                url: listing.url().to_string(),
            });
        }

        let Some(page) = listing.text() else {
            warn!(%route, status = %listing.status(), "listing page has no content");
            return Ok(Vec::new());
        };

        let mut urls = preview_links(page, listing.url());
        urls.truncate(limit);
        debug!(%route, found = urls.len(), limit, "fetching listing results");

        if urls.is_empty() {
            return Ok(Vec::new());
        }

        let mut wallpapers = Vec::with_capacity(urls.len());
        for result in self.fetch_many(urls).await.into_vec() {
            let page = match result {
                Ok(page) => page,
                Err(err) => {
                    warn!(error = %err, "skipping wallpaper that failed to fetch");
                    continue;
                }
            };

            if !page.is_ok() {
                warn!(url = %page.url(), status = %page.status(), "skipping wallpaper");
                continue;
            }

            match Self::wallpaper_from(page) {
                Ok(wallpaper) => wallpapers.push(wallpaper),
                Err(err) => warn!(error = %err, "skipping unparsable wallpaper page"),
            }
        }

        Ok(wallpapers)
    }

    /// downloads the full-size images of `wallpapers` into `directory`
    /// (the working directory when `None`).
    ///
    /// every image is attempted; a 404 is reported afterwards as
    /// [`WallhavenError::WallpaperNotFound`].
    pub async fn download(
        &self,
        wallpapers: &[Wallpaper],
        directory: Option<&Path>,
    ) -> Result<Vec<PathBuf>> {
        let directory = match directory {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().map_err(|source| DownloaderError::Io {
                context: "resolving the working directory".to_string(),
                source,
            })?,
        };

        let urls = wallpapers
            .iter()
            .map(|w| w.image_url.clone())
            .collect::<Vec<_>>();
        info!(count = urls.len(), directory = %directory.display(), "downloading wallpapers");

        let results = self.fetch_many(urls).await.into_vec();
        save_all(results, &directory).await.map_err(|err| match err {
            DownloaderError::NotFound { url } => WallhavenError::WallpaperNotFound { url },
            other => other.into(),
        })
    }
}
