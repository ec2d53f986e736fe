//! Shared types used by the parser, linter, and generator.
//!
//! A [`PageRecord`] is derived, never stored: every run rebuilds it from the
//! `<head>` of the page's HTML, which stays the single source of truth.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use std::fmt;

/// What a page is, inferred from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Site or blog landing page. Expects `og:type` = `website`.
    Index,
    /// Blog post. Expects `og:type` = `article` and a publish date.
    Article,
    /// Anything else.
    Page,
}

/// The two `og:type` values this site uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OgType {
    Article,
    Website,
}

impl OgType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "article" => Some(Self::Article),
            "website" => Some(Self::Website),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Website => "website",
        }
    }
}

/// Open Graph / Twitter Card fields controlling social previews.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SocialCard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_image: Option<String>,
}

/// Structured metadata for one HTML page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecord {
    /// Site-relative path, e.g. `blog/first-post.html`.
    pub path: String,
    pub kind: PageKind,
    /// Absolute URL derived from the path and the base URL.
    pub url: String,
    pub title: String,
    pub description: String,
    /// `<link rel="canonical">` href.
    pub canonical: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_type: Option<OgType>,
    /// `article:published_time`; always present on articles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<FixedOffset>>,
    /// File modification date (UTC), used for sitemap `<lastmod>`.
    pub modified: NaiveDate,
    pub social: SocialCard,
}

/// Fields a page record can be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Field {
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "description")]
    Description,
    #[serde(rename = "canonical")]
    Canonical,
    #[serde(rename = "article:published_time")]
    Published,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Title => "<title>",
            Field::Description => "meta description",
            Field::Canonical => "canonical link",
            Field::Published => "article:published_time",
        })
    }
}

/// Why a field could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "problem", content = "detail", rename_all = "lowercase")]
pub enum Problem {
    Missing,
    Malformed(String),
}

/// One reason a page record could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: Field,
    #[serde(flatten)]
    pub problem: Problem,
}

impl FieldIssue {
    pub fn missing(field: Field) -> Self {
        Self {
            field,
            problem: Problem::Missing,
        }
    }

    pub fn malformed(field: Field, detail: impl Into<String>) -> Self {
        Self {
            field,
            problem: Problem::Malformed(detail.into()),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            Problem::Missing => write!(f, "missing {}", self.field),
            Problem::Malformed(detail) => write!(f, "malformed {}: {detail}", self.field),
        }
    }
}
