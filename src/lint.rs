//! SEO and social meta-tag linting.
//!
//! Each page is checked against a fixed rule set. Which rules bite depends on
//! the page kind from [`crate::scan::classify`]:
//!
//! | Rule | Index | Article | Page |
//! |------|-------|---------|------|
//! | `title`, `description`, `canonical` | ✓ | ✓ | ✓ |
//! | `og:title`, `og:description`, `og:type` present | ✓ | ✓ | ✓ |
//! | `og:type` = `website` | ✓ | | |
//! | `og:type` = `article` | | ✓ | |
//! | `og:url` absolute (when present) | ✓ | ✓ | ✓ |
//! | `twitter:card` present and known | ✓ | ✓ | ✓ |
//! | `article:published_time` | | ✓ | when `og:type` = `article` |
//!
//! When a base URL is known, the hosts of `canonical` and `og:url` must match
//! it. Without one, only absoluteness is checked.
//!
//! A file that cannot be read or has no `<head>` yields a single `document`
//! violation and no other checks.

use crate::config::SiteConfig;
use crate::meta::{self, HeadMeta, ParseError};
use crate::scan::{self, SiteFile};
use crate::types::PageKind;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

const TWITTER_CARDS: &[&str] = &["summary", "summary_large_image", "app", "player"];

/// Lint rule identifiers, displayed as the tag or attribute they check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rule {
    #[serde(rename = "document")]
    Document,
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "description")]
    Description,
    #[serde(rename = "canonical")]
    Canonical,
    #[serde(rename = "og:title")]
    OgTitle,
    #[serde(rename = "og:description")]
    OgDescription,
    #[serde(rename = "og:type")]
    OgType,
    #[serde(rename = "og:url")]
    OgUrl,
    #[serde(rename = "twitter:card")]
    TwitterCard,
    #[serde(rename = "article:published_time")]
    PublishedTime,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rule::Document => "document",
            Rule::Title => "title",
            Rule::Description => "description",
            Rule::Canonical => "canonical",
            Rule::OgTitle => "og:title",
            Rule::OgDescription => "og:description",
            Rule::OgType => "og:type",
            Rule::OgUrl => "og:url",
            Rule::TwitterCard => "twitter:card",
            Rule::PublishedTime => "article:published_time",
        })
    }
}

/// One failed check on one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Site-relative path.
    pub file: String,
    pub rule: Rule,
    pub message: String,
}

/// Result of linting a set of files.
#[derive(Debug, Default, Serialize)]
pub struct LintReport {
    pub files_checked: usize,
    pub violations: Vec<Violation>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of distinct files with at least one violation.
    pub fn failing_files(&self) -> usize {
        let mut files: Vec<&str> = self.violations.iter().map(|v| v.file.as_str()).collect();
        files.dedup();
        files.len()
    }
}

/// Lint every file. Violations are grouped by file, in file order.
pub fn lint_files(files: &[SiteFile], config: &SiteConfig, base_url: Option<&str>) -> LintReport {
    let violations = files
        .par_iter()
        .map(|file| {
            let kind = scan::classify(&file.rel, config);
            match meta::read_head(&file.path) {
                Ok(head) => lint_head(&file.rel, &head, kind, base_url),
                Err(err) => vec![document_violation(&file.rel, &err)],
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    LintReport {
        files_checked: files.len(),
        violations,
    }
}

fn document_violation(file: &str, err: &ParseError) -> Violation {
    Violation {
        file: file.to_string(),
        rule: Rule::Document,
        message: format!("Could not parse page: {err}"),
    }
}

/// Apply every rule to one parsed head.
pub fn lint_head(
    file: &str,
    head: &HeadMeta,
    kind: PageKind,
    base_url: Option<&str>,
) -> Vec<Violation> {
    let mut found: Vec<(Rule, String)> = Vec::new();

    if head.title().is_none() {
        found.push((Rule::Title, "Missing <title>".into()));
    }
    if head.by_name("description").is_none() {
        found.push((Rule::Description, "Missing meta description".into()));
    }
    check_canonical(head, base_url, &mut found);
    check_open_graph(head, kind, base_url, &mut found);
    check_twitter_card(head, &mut found);
    check_published(head, kind, &mut found);

    found
        .into_iter()
        .map(|(rule, message)| Violation {
            file: file.to_string(),
            rule,
            message,
        })
        .collect()
}

fn check_canonical(head: &HeadMeta, base_url: Option<&str>, found: &mut Vec<(Rule, String)>) {
    let Some(href) = head.canonical() else {
        found.push((Rule::Canonical, "Missing canonical link".into()));
        return;
    };
    if !is_absolute(href) {
        found.push((Rule::Canonical, "Canonical link should be absolute URL".into()));
    } else if !host_matches(href, base_url) {
        found.push((
            Rule::Canonical,
            "Canonical link host should match site base URL".into(),
        ));
    }
}

fn check_open_graph(
    head: &HeadMeta,
    kind: PageKind,
    base_url: Option<&str>,
    found: &mut Vec<(Rule, String)>,
) {
    if head.by_property("og:title").is_none() {
        found.push((Rule::OgTitle, "Missing og:title".into()));
    }
    if head.by_property("og:description").is_none() {
        found.push((Rule::OgDescription, "Missing og:description".into()));
    }

    match (head.by_property("og:type"), kind) {
        (None, _) => found.push((Rule::OgType, "Missing og:type".into())),
        (Some(value), PageKind::Article) if value != "article" => found.push((
            Rule::OgType,
            "og:type should be 'article' for blog posts".into(),
        )),
        (Some(value), PageKind::Index) if value != "website" => found.push((
            Rule::OgType,
            "og:type should be 'website' for index pages".into(),
        )),
        _ => {}
    }

    if let Some(url) = head.by_property("og:url") {
        if !is_absolute(url) {
            found.push((Rule::OgUrl, "og:url should be absolute URL".into()));
        } else if !host_matches(url, base_url) {
            found.push((Rule::OgUrl, "og:url host should match site base URL".into()));
        }
    }
}

fn check_twitter_card(head: &HeadMeta, found: &mut Vec<(Rule, String)>) {
    match head.by_name_or_property("twitter:card") {
        None => found.push((Rule::TwitterCard, "Missing twitter:card".into())),
        Some(value) if !TWITTER_CARDS.contains(&value.to_ascii_lowercase().as_str()) => {
            found.push((
                Rule::TwitterCard,
                format!("twitter:card should be one of {}", TWITTER_CARDS.join(", ")),
            ))
        }
        Some(_) => {}
    }
}

fn check_published(head: &HeadMeta, kind: PageKind, found: &mut Vec<(Rule, String)>) {
    let declares_article = head.by_property("og:type") == Some("article");
    let required = match kind {
        PageKind::Article => true,
        PageKind::Page => declares_article,
        PageKind::Index => false,
    };

    match head.published() {
        None if required => found.push((
            Rule::PublishedTime,
            if kind == PageKind::Article {
                "Missing article:published_time for blog post".into()
            } else {
                "Missing article:published_time for og:type 'article'".into()
            },
        )),
        Some(Err(detail)) => found.push((
            Rule::PublishedTime,
            format!("article:published_time is not a valid date: {detail}"),
        )),
        _ => {}
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Authority part of an absolute URL (`host[:port]`), lower-cased.
fn host_of(url: &str) -> Option<String> {
    let rest = url.split_once("://")?.1;
    let authority = rest.split(['/', '?', '#']).next()?;
    let authority = authority.rsplit('@').next()?;
    Some(authority.to_ascii_lowercase())
}

fn host_matches(url: &str, base_url: Option<&str>) -> bool {
    match base_url {
        Some(base) => host_of(url) == host_of(base),
        None => true,
    }
}
