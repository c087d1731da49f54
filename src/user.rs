use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, WallhavenError};
use crate::html::{children, first_text, selector, text};

/// public profile parsed from a `user/{name}` page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub group: Option<String>,
    pub joined: Option<String>,
    pub last_active: Option<String>,
    pub profile_views: Option<String>,
    pub uploads: Option<String>,
    pub favorites: Option<String>,
    pub forum_posts: Option<String>,
    pub comments: Option<String>,
}

impl User {
    pub fn from_html(page: &str) -> Result<Self> {
        let doc = Html::parse_document(page);

        let username = first_text(&doc, "#user h1 a").ok_or(WallhavenError::MissingField {
            record: "user",
            field: "username",
        })?;

        let mut user = User {
            username,
            group: first_text(&doc, "#user h4"),
            joined: None,
            last_active: None,
            profile_views: None,
            uploads: None,
            favorites: None,
            forum_posts: None,
            comments: None,
        };

        let lists = selector("#profile-content .datalist");
        for list in doc.select(&lists).take(2) {
            for pair in children(list).chunks(2) {
                if let [name, value] = pair {
                    user.apply(&profile_key(*name), profile_value(*value));
                }
            }
        }

        Ok(user)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn apply(&mut self, key: &str, value: String) {
        let slot = match key {
            "joined" => &mut self.joined,
            "last_active" => &mut self.last_active,
            "profile_views" => &mut self.profile_views,
            "uploads" => &mut self.uploads,
            "favorites" => &mut self.favorites,
            "forum_posts" => &mut self.forum_posts,
            "comments" => &mut self.comments,
            _ => return,
        };
        *slot = Some(value);
    }
}

/// `Last Active` -> `last_active`
fn profile_key(el: ElementRef<'_>) -> String {
    text(el).replace(' ', "_").to_lowercase()
}

/// timestamps carry their value in a `datetime` attribute.
fn profile_value(el: ElementRef<'_>) -> String {
    children(el)
        .first()
        .and_then(|child| child.value().attr("datetime"))
        .map(str::to_string)
        .unwrap_or_else(|| text(el))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::user_page;

    #[test]
    fn parses_profile() {
        let user = User::from_html(&user_page("alice")).unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.group.as_deref(), Some("Member"));
        assert_eq!(user.joined.as_deref(), Some("2014-01-02T00:00:00+00:00"));
        assert_eq!(user.last_active.as_deref(), Some("2019-05-05T10:00:00+00:00"));
        assert_eq!(user.profile_views.as_deref(), Some("1,337"));
        assert_eq!(user.uploads.as_deref(), Some("12"));
        assert_eq!(user.forum_posts.as_deref(), Some("3"));
        assert_eq!(user.comments, None);
    }

    #[test]
    fn username_is_required() {
        let err = User::from_html("<html><body><div id=\"user\"></div></body></html>").unwrap_err();
        assert!(matches!(
            err,
            WallhavenError::MissingField {
                record: "user",
                field: "username"
            }
        ));
    }

    #[test]
    fn serializes_to_json() {
        let user = User::from_html(&user_page("bob")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&user.to_json().unwrap()).unwrap();
        assert_eq!(json["username"], "bob");
        assert_eq!(json["uploads"], "12");
    }
}
