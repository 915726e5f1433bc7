//! Article extraction from fetched HTML pages.
//!
//! Extraction is best-effort: every element matching the container selector
//! becomes exactly one [`ArticleRecord`], and a missing title or description
//! becomes an empty string instead of an error.

use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::crawl::types::ArticleRecord;

pub const DEFAULT_ARTICLE_SELECTOR: &str = "article";
pub const DEFAULT_TITLE_SELECTOR: &str = "h2 a";
pub const DEFAULT_DESCRIPTION_SELECTOR: &str = "p";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid {role} selector {selector:?}: {reason}")]
pub struct SelectorError {
    pub role: &'static str,
    pub selector: String,
    pub reason: String,
}

/// CSS selectors describing where articles live in a page.
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    article: Selector,
    title: Selector,
    description: Selector,
}

impl ArticleExtractor {
    pub fn new(article: &str, title: &str, description: &str) -> Result<Self, SelectorError> {
        Ok(Self {
            article: parse_selector("article", article)?,
            title: parse_selector("title", title)?,
            description: parse_selector("description", description)?,
        })
    }

    /// Extract one record per article container in `html`.
    /// `origin` is the URL the page was served from; its host becomes `source`.
    pub fn extract(&self, html: &str, origin: &Url) -> Vec<ArticleRecord> {
        let document = Html::parse_document(html);
        let source = origin.host_str().unwrap_or_default();

        document
            .select(&self.article)
            .map(|article| {
                ArticleRecord::new(
                    first_text(article, &self.title),
                    first_text(article, &self.description),
                    source,
                )
            })
            .collect()
    }
}

impl Default for ArticleExtractor {
    fn default() -> Self {
        Self {
            article: default_selector(DEFAULT_ARTICLE_SELECTOR),
            title: default_selector(DEFAULT_TITLE_SELECTOR),
            description: default_selector(DEFAULT_DESCRIPTION_SELECTOR),
        }
    }
}

fn parse_selector(role: &'static str, raw: &str) -> Result<Selector, SelectorError> {
    Selector::parse(raw).map_err(|e| SelectorError {
        role,
        selector: raw.to_string(),
        reason: e.to_string(),
    })
}

// Only ever called with the compile-time defaults above.
fn default_selector(raw: &'static str) -> Selector {
    match Selector::parse(raw) {
        Ok(s) => s,
        Err(e) => unreachable!("built-in selector {raw:?} must parse: {e}"),
    }
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|el| normalize_text(&el.text().collect::<String>()))
        .unwrap_or_default()
}

/// Collapse whitespace runs (newlines, tabs, nbsp) into single spaces and trim.
pub fn normalize_text(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| match Regex::new(r"\s+") {
        Ok(re) => re,
        Err(e) => unreachable!("whitespace regex must compile: {e}"),
    });
    re_ws.replace_all(s, " ").trim().to_string()
}
