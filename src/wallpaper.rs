use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, WallhavenError};
use crate::html::{children, first, first_attr, first_text, resolve, selector, text};

/// a tag attached to a wallpaper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Option<String>,
    pub alias: String,
}

/// wallpaper details parsed from a `wallpaper/{id}` page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallpaper {
    /// short link to the wallpaper page.
    pub url: String,
    /// full-size image url.
    pub image_url: String,
    pub source: Option<String>,
    /// resolution like `1920x1080`.
    pub resolution: String,
    /// palette hex codes, e.g. `#424153`.
    pub colors: Vec<String>,
    pub tags: Vec<Tag>,
    pub purity: Option<String>,
    /// uploader name.
    pub user: Option<String>,
    /// upload timestamp as found in the page.
    pub added: Option<String>,
    pub category: Option<String>,
    pub size: Option<String>,
    pub views: Option<String>,
    pub favorites: Option<String>,
}

impl Wallpaper {
    /// parses a wallpaper page fetched from `page_url`.
    pub fn from_html(page: &str, page_url: &str) -> Result<Self> {
        let doc = Html::parse_document(page);

        let url = first_attr(&doc, "#wallpaper-short-url-copy", "value")
            .ok_or_else(|| missing("url"))?;
        let image_url = first_attr(&doc, "#wallpaper", "src")
            .map(|src| resolve(page_url, &src))
            .ok_or_else(|| missing("image_url"))?;
        let resolution = first_text(&doc, ".showcase-resolution")
            .map(|r| r.split_whitespace().collect::<String>())
            .ok_or_else(|| missing("resolution"))?;

        let mut wallpaper = Wallpaper {
            url,
            image_url,
            source: source(&doc),
            resolution,
            colors: colors(&doc),
            tags: tags(&doc),
            purity: purity(&doc),
            user: None,
            added: None,
            category: None,
            size: None,
            views: None,
            favorites: None,
        };
        wallpaper.apply_properties(&doc);

        Ok(wallpaper)
    }

    /// wallpaper id, taken from the last segment of the short link.
    pub fn id(&self) -> Option<&str> {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// fills the sidebar properties; unknown entries are ignored.
    fn apply_properties(&mut self, doc: &Html) {
        let Some(list) = first(doc, "#showcase-sidebar dl") else {
            return;
        };

        for pair in children(list).chunks(2) {
            let [name, value] = pair else {
                continue;
            };

            match text(*name).to_lowercase().as_str() {
                "uploader" => {
                    let parts = children(*value);
                    self.user = parts.first().map(|el| text(*el)).filter(|t| !t.is_empty());
                    self.added = parts
                        .iter()
                        .find_map(|el| el.value().attr("datetime"))
                        .map(str::to_string);
                }
                "favorites" => {
                    let shown = children(*value).first().copied().unwrap_or(*value);
                    self.favorites = Some(text(shown));
                }
                "category" => self.category = Some(text(*value)),
                "size" => self.size = Some(text(*value)),
                "views" => self.views = Some(text(*value)),
                _ => {}
            }
        }
    }
}

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[0-9a-fA-F]{3,8}").expect("hex color regex must compile"));

fn missing(field: &'static str) -> WallhavenError {
    WallhavenError::MissingField {
        record: "wallpaper",
        field,
    }
}

fn source(doc: &Html) -> Option<String> {
    first(doc, ".showcase-source")
        .and_then(|el| children(el).first().map(|child| text(*child)))
        .filter(|t| !t.is_empty())
}

fn colors(doc: &Html) -> Vec<String> {
    let Some(palette) = first(doc, ".color-palette") else {
        return Vec::new();
    };

    children(palette)
        .into_iter()
        .filter_map(|el| el.value().attr("style"))
        .filter_map(|style| HEX_COLOR_RE.find(style).map(|m| m.as_str().to_string()))
        .collect()
}

fn tags(doc: &Html) -> Vec<Tag> {
    let Some(list) = first(doc, "#tags") else {
        return Vec::new();
    };

    children(list)
        .into_iter()
        .map(|item| Tag {
            id: item.value().attr("data-tag-id").map(str::to_string),
            alias: children(item)
                .first()
                .map(|name| text(*name))
                .unwrap_or_else(|| text(item)),
        })
        .collect()
}

/// label of the checked purity radio button.
fn purity(doc: &Html) -> Option<String> {
    let fieldset = first(doc, "#wallpaper-purity-form fieldset")?;

    children(fieldset).chunks(2).find_map(|pair| match pair {
        [button, label] if button.value().attr("checked").is_some() => Some(text(*label)),
        _ => None,
    })
}

/// detail page links found on a listing page.
pub(crate) fn preview_links(page: &str, page_url: &str) -> Vec<String> {
    let doc = Html::parse_document(page);
    doc.select(&selector("a.preview"))
        .filter_map(|a| a.value().attr("href"))
        .map(|href| resolve(page_url, href))
        .collect()
}
