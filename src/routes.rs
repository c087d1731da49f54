use std::fmt::Display;

use reqwest::Url;

use crate::errors::{Result, WallhavenError};

pub const BASE_URL: &str = "https://alpha.wallhaven.cc";

/// url templates for every site resource, rooted at one base url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    base: Url,
}

impl Routes {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base).map_err(|_| WallhavenError::BaseUrl(base.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(WallhavenError::BaseUrl(base.to_string()));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &str {
        self.base.as_str()
    }

    fn join<I, S>(&self, segments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.push(segment.as_ref());
            }
        }
        url.into()
    }

    pub fn login(&self) -> String {
        self.join(["auth", "login"])
    }

    pub fn search(&self) -> String {
        self.join(["search"])
    }

    /// site page for the latest listing. listed for completeness: the client
    /// queries latest uploads through [`Routes::search`] with date sorting.
    pub fn latest(&self) -> String {
        self.join(["latest"])
    }

    /// site page for a random listing. listed for completeness: the client
    /// queries it through [`Routes::search`] with random sorting.
    pub fn random(&self) -> String {
        self.join(["random"])
    }

    pub fn wallpaper(&self, id: impl Display) -> String {
        self.join(["wallpaper".to_string(), id.to_string()])
    }

    /// legacy full-size image location. listed for completeness: downloads use
    /// the image url parsed from each wallpaper page.
    pub fn image(&self, image_name: &str) -> String {
        self.join(["wallpapers", "full", image_name])
    }

    pub fn user(&self, username: &str) -> String {
        self.join(["user", username])
    }

    pub fn user_uploads(&self, username: &str) -> String {
        self.join(["user", username, "uploads"])
    }

    /// the signed-in user's favorites, or one favorites collection.
    pub fn favorites(&self, collection: Option<&str>) -> String {
        match collection {
            Some(id) => self.join(["favorites", id]),
            None => self.join(["favorites"]),
        }
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            base: Url::parse(BASE_URL).expect("default base url is valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_route_templates() {
        let routes = Routes::default();
        assert_eq!(routes.base(), "https://alpha.wallhaven.cc/");
        assert_eq!(routes.login(), "https://alpha.wallhaven.cc/auth/login");
        assert_eq!(routes.search(), "https://alpha.wallhaven.cc/search");
        assert_eq!(routes.latest(), "https://alpha.wallhaven.cc/latest");
        assert_eq!(routes.random(), "https://alpha.wallhaven.cc/random");
        assert_eq!(routes.wallpaper(94), "https://alpha.wallhaven.cc/wallpaper/94");
        assert_eq!(
            routes.image("wallhaven-94.jpg"),
            "https://alpha.wallhaven.cc/wallpapers/full/wallhaven-94.jpg"
        );
        assert_eq!(routes.user("alice"), "https://alpha.wallhaven.cc/user/alice");
        assert_eq!(
            routes.user_uploads("alice"),
            "https://alpha.wallhaven.cc/user/alice/uploads"
        );
        assert_eq!(routes.favorites(None), "https://alpha.wallhaven.cc/favorites");
        assert_eq!(
            routes.favorites(Some("7")),
            "https://alpha.wallhaven.cc/favorites/7"
        );
    }

    #[test]
    fn base_with_path_is_extended() {
        let routes = Routes::new("http://127.0.0.1:8080/mirror/").unwrap();
        assert_eq!(routes.search(), "http://127.0.0.1:8080/mirror/search");
    }

    #[test]
    fn segments_are_escaped() {
        let routes = Routes::default();
        assert_eq!(
            routes.user("a b/c"),
            "https://alpha.wallhaven.cc/user/a%20b%2Fc"
        );
    }

    #[test]
    fn rejects_bad_base() {
        assert!(matches!(
            Routes::new("not a url"),
            Err(WallhavenError::BaseUrl(_))
        ));
        assert!(matches!(
            Routes::new("mailto:someone@example.com"),
            Err(WallhavenError::BaseUrl(_))
        ));
    }
}
