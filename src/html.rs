//! small helpers over `scraper` shared by the page parsers.

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

/// whitespace-trimmed text content of an element.
pub(crate) fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

pub(crate) fn first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    doc.select(&selector(css)).next()
}

pub(crate) fn first_text(doc: &Html, css: &str) -> Option<String> {
    first(doc, css).map(text).filter(|t| !t.is_empty())
}

pub(crate) fn first_attr(doc: &Html, css: &str, attr: &str) -> Option<String> {
    first(doc, css)
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

/// direct element children, skipping text and comment nodes.
pub(crate) fn children(el: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap).collect()
}

/// resolves `href` against the url of the page it was found on.
pub(crate) fn resolve(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}
