//! HTML `<head>` metadata extraction.
//!
//! Pages are hand-authored, so everything the tooling knows about a page comes
//! from its head section:
//!
//! ```html
//! <head>
//!   <title>First Post</title>
//!   <meta name="description" content="...">
//!   <link rel="canonical" href="https://example.com/blog/first-post.html">
//!   <meta property="og:type" content="article">
//!   <meta property="article:published_time" content="2024-03-05T10:00:00Z">
//!   <meta name="twitter:card" content="summary">
//! </head>
//! ```
//!
//! Parsing is two steps. [`parse_head`] collects raw attributes into a
//! [`HeadMeta`] without judging them; the linter works on that. Then
//! [`PageRecord::from_head`] applies the required-field rules for the page's
//! kind and either produces a complete record or lists what is missing.
//!
//! ## Publish dates
//!
//! `article:published_time` accepts, in order:
//!
//! - RFC 3339 (`2024-03-05T10:00:00Z`, `2024-03-05T10:00:00+02:00`)
//! - Minute precision with offset (`2024-03-05T10:00+02:00`, `2024-03-05T10:00Z`)
//! - Local date-time without offset, read as UTC (`2024-03-05T10:00:00`, `2024-03-05T10:00`)
//! - Bare date, read as midnight UTC (`2024-03-05`)
//!
//! Anything else is malformed. No guessing, so feed ordering is never ambiguous.

use crate::types::{Field, FieldIssue, OgType, PageKind, PageRecord, SocialCard};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no <head> element")]
    MissingHead,
}

static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head[\s/>]").expect("head regex must compile"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head title").expect("title selector must parse"));
static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head meta").expect("meta selector must parse"));
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head link").expect("link selector must parse"));

/// Attribute map of one tag. Names are lower-cased, values entity-decoded.
pub type Attributes = BTreeMap<String, String>;

/// Everything collected from a page's `<head>`, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadMeta {
    /// Trimmed, whitespace-collapsed `<title>` text; `None` if absent.
    pub title: Option<String>,
    pub metas: Vec<Attributes>,
    pub links: Vec<Attributes>,
}

impl HeadMeta {
    /// Content of the first `<meta name=…>` with non-empty content.
    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.find_meta(|m| attr(m, "name") == Some(name))
    }

    /// Content of the first `<meta property=…>` with non-empty content.
    pub fn by_property(&self, property: &str) -> Option<&str> {
        self.find_meta(|m| attr(m, "property") == Some(property))
    }

    /// Twitter tags are written both ways in the wild; accept either.
    pub fn by_name_or_property(&self, key: &str) -> Option<&str> {
        self.find_meta(|m| attr(m, "name") == Some(key) || attr(m, "property") == Some(key))
    }

    /// `href` of the first `<link rel="canonical">` with a non-empty href.
    pub fn canonical(&self) -> Option<&str> {
        self.links
            .iter()
            .filter(|l| {
                attr(l, "rel").is_some_and(|rel| {
                    rel.split_ascii_whitespace()
                        .any(|token| token.eq_ignore_ascii_case("canonical"))
                })
            })
            .find_map(|l| attr(l, "href").filter(|h| !h.is_empty()))
    }

    /// Title, if present and non-empty.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    /// Declared `og:type`, if recognized.
    pub fn og_type(&self) -> Option<OgType> {
        self.by_property("og:type").and_then(OgType::parse)
    }

    /// `article:published_time`: `None` if absent, `Some(Err)` if unparseable.
    pub fn published(&self) -> Option<Result<DateTime<FixedOffset>, String>> {
        self.by_property("article:published_time")
            .map(parse_published)
    }

    fn social_card(&self) -> SocialCard {
        let owned = |v: Option<&str>| v.map(String::from);
        SocialCard {
            og_title: owned(self.by_property("og:title")),
            og_description: owned(self.by_property("og:description")),
            og_url: owned(self.by_property("og:url")),
            og_image: owned(self.by_property("og:image")),
            twitter_card: owned(self.by_name_or_property("twitter:card")),
            twitter_title: owned(self.by_name_or_property("twitter:title")),
            twitter_description: owned(self.by_name_or_property("twitter:description")),
            twitter_image: owned(self.by_name_or_property("twitter:image")),
        }
    }

    fn find_meta(&self, pred: impl Fn(&Attributes) -> bool) -> Option<&str> {
        self.metas
            .iter()
            .filter(|m| pred(m))
            .find_map(|m| attr(m, "content").filter(|c| !c.is_empty()))
    }
}

fn attr<'a>(attrs: &'a Attributes, key: &str) -> Option<&'a str> {
    attrs.get(key).map(|v| v.trim())
}

/// Parse the head section of an HTML document.
///
/// The HTML parser itself never fails, so the only hard error is a document
/// with no `<head>` at all. That is reported rather than silently yielding
/// an empty record.
pub fn parse_head(source: &str) -> Result<HeadMeta, ParseError> {
    if !HEAD_OPEN.is_match(source) {
        return Err(ParseError::MissingHead);
    }

    let document = Html::parse_document(source);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()));

    Ok(HeadMeta {
        title,
        metas: document.select(&META_SELECTOR).map(attributes).collect(),
        links: document.select(&LINK_SELECTOR).map(attributes).collect(),
    })
}

/// Read and parse a page from disk. Non-UTF-8 content is an I/O error.
pub fn read_head(path: &Path) -> Result<HeadMeta, ParseError> {
    let source = std::fs::read_to_string(path)?;
    parse_head(&source)
}

fn attributes(el: ElementRef<'_>) -> Attributes {
    el.value()
        .attrs()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse an `article:published_time` value. See the module docs for formats.
pub fn parse_published(value: &str) -> Result<DateTime<FixedOffset>, String> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }
    let zoned = match value.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => value.to_string(),
    };
    if let Ok(dt) = DateTime::parse_from_str(&zoned, "%Y-%m-%dT%H:%M%:z") {
        return Ok(dt);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive).into());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or("invalid date")?;
        return Ok(Utc.from_utc_datetime(&midnight).into());
    }
    Err(format!("unrecognized date {value:?}"))
}

impl PageRecord {
    /// Build a complete record, or list every field that prevents it.
    ///
    /// Every kind needs a title, a meta description and a canonical link.
    /// Articles additionally need a parseable `article:published_time`.
    /// Other kinds keep a publish date only when it parses.
    pub fn from_head(
        path: &str,
        kind: PageKind,
        url: String,
        modified: NaiveDate,
        head: &HeadMeta,
    ) -> Result<PageRecord, Vec<FieldIssue>> {
        let mut issues = Vec::new();

        let title = head.title();
        if title.is_none() {
            issues.push(FieldIssue::missing(Field::Title));
        }
        let description = head.by_name("description");
        if description.is_none() {
            issues.push(FieldIssue::missing(Field::Description));
        }
        let canonical = head.canonical();
        if canonical.is_none() {
            issues.push(FieldIssue::missing(Field::Canonical));
        }

        let published = match (kind, head.published()) {
            (PageKind::Article, None) => {
                issues.push(FieldIssue::missing(Field::Published));
                None
            }
            (PageKind::Article, Some(Err(detail))) => {
                issues.push(FieldIssue::malformed(Field::Published, detail));
                None
            }
            (_, parsed) => parsed.and_then(Result::ok),
        };

        match (title, description, canonical) {
            (Some(title), Some(description), Some(canonical)) if issues.is_empty() => {
                Ok(PageRecord {
                    path: path.to_string(),
                    kind,
                    url,
                    title: title.to_string(),
                    description: description.to_string(),
                    canonical: canonical.to_string(),
                    og_type: head.og_type(),
                    published,
                    modified,
                    social: head.social_card(),
                })
            }
            _ => Err(issues),
        }
    }
}
