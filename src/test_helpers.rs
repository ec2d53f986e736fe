//! Shared test utilities for the site-meta test suite.
//!
//! Provides the fixture site copy and small HTML page builders whose tags can
//! be selectively omitted.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let files = find_html_files(tmp.path(), &SiteConfig::default()).unwrap();
//! assert!(rel_paths(&files).contains(&"blog/first-post.html"));
//!
//! // A complete article head, minus its publish date
//! let html = article_html(&["article:published_time"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::scan::SiteFile;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate (generate writes into the site
/// root) without affecting other tests or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// Relative paths in scan order.
pub fn rel_paths(files: &[SiteFile]) -> Vec<&str> {
    files.iter().map(|f| f.rel.as_str()).collect()
}

// =========================================================================
// Page builders
// =========================================================================

/// Build a page from `(key, tag)` pairs, leaving out every key in `omit`.
fn page(tags: &[(&str, &str)], omit: &[&str]) -> String {
    let head: Vec<&str> = tags
        .iter()
        .filter(|(key, _)| !omit.contains(key))
        .map(|(_, tag)| *tag)
        .collect();
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"utf-8\">\n    {}\n</head>\n<body>\n    <p>Body</p>\n</body>\n</html>\n",
        head.join("\n    ")
    )
}

/// A blog post with every tag the linter checks.
///
/// Omit keys: `title`, `description`, `canonical`, `og:title`,
/// `og:description`, `og:type`, `og:url`, `twitter:card`,
/// `article:published_time`.
pub fn article_html(omit: &[&str]) -> String {
    page(
        &[
            ("title", "<title>A Post</title>"),
            ("description", r#"<meta name="description" content="About things">"#),
            (
                "canonical",
                r#"<link rel="canonical" href="https://example.com/blog/a-post.html">"#,
            ),
            ("og:title", r#"<meta property="og:title" content="A Post">"#),
            (
                "og:description",
                r#"<meta property="og:description" content="About things">"#,
            ),
            ("og:type", r#"<meta property="og:type" content="article">"#),
            (
                "og:url",
                r#"<meta property="og:url" content="https://example.com/blog/a-post.html">"#,
            ),
            ("twitter:card", r#"<meta name="twitter:card" content="summary">"#),
            (
                "article:published_time",
                r#"<meta property="article:published_time" content="2024-03-05T10:00:00Z">"#,
            ),
        ],
        omit,
    )
}

/// A site landing page: `og:type` website, no publish date.
pub fn index_html(omit: &[&str]) -> String {
    page(
        &[
            ("title", "<title>Example Site</title>"),
            ("description", r#"<meta name="description" content="Notes and posts">"#),
            ("canonical", r#"<link rel="canonical" href="https://example.com/">"#),
            ("og:title", r#"<meta property="og:title" content="Example Site">"#),
            (
                "og:description",
                r#"<meta property="og:description" content="Notes and posts">"#,
            ),
            ("og:type", r#"<meta property="og:type" content="website">"#),
            ("og:url", r#"<meta property="og:url" content="https://example.com/">"#),
            ("twitter:card", r#"<meta name="twitter:card" content="summary">"#),
        ],
        omit,
    )
}
