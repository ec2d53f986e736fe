//! Site discovery: which HTML files exist, what kind of page each one is,
//! and which absolute URL it is served at.
//!
//! ## Directory Structure
//!
//! ```text
//! site/                            # Site root
//! ├── config.toml                  # Optional configuration
//! ├── index.html                   # Index page → https://example.com/
//! ├── about.html                   # Plain page → https://example.com/about.html
//! ├── blog/
//! │   ├── index.html               # Index page → https://example.com/blog/
//! │   ├── template.html            # Plain page (excluded from articles)
//! │   └── first-post.html          # Article
//! ├── assets/                      # Skipped (scan.skip_dirs)
//! └── .drafts/                     # Skipped (hidden)
//! ```
//!
//! ## Classification
//!
//! - **Index**: `index.html` at the root or directly in the blog directory
//! - **Article**: any other `.html` under the blog directory whose file name is
//!   not in `blog.exclude`
//! - **Page**: everything else
//!
//! Paths are handled as site-relative, forward-slash strings so classification
//! and URLs come out the same on every platform.

use crate::config::SiteConfig;
use crate::types::PageKind;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Site root not found: {0}")]
    RootNotFound(PathBuf),
}

/// One discovered HTML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFile {
    /// Filesystem path as found on disk.
    pub path: PathBuf,
    /// Site-relative path with forward slashes, e.g. `blog/first-post.html`.
    pub rel: String,
}

/// Walk the site root and return every HTML file, sorted by relative path.
///
/// Hidden directories and those named in `scan.skip_dirs` are never entered.
/// Symlinked `.html` files are listed when they point at a regular file;
/// symlinked directories are not followed.
pub fn find_html_files(root: &Path, config: &SiteConfig) -> Result<Vec<SiteFile>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e, config));

    for entry in walker {
        let entry = entry?;
        if entry.path().is_file() && is_html(entry.path()) {
            let rel = relative_path(entry.path(), root);
            log::debug!("discovered {rel}");
            files.push(SiteFile {
                path: entry.into_path(),
                rel,
            });
        }
    }

    files.sort_by(|a, b| a.rel.cmp(&b.rel));
    Ok(files)
}

/// Resolve explicit lint targets: files are taken as-is (if `.html`),
/// directories are walked with the usual skip rules. Result is sorted and
/// de-duplicated by relative path.
pub fn collect_targets(
    targets: &[PathBuf],
    root: &Path,
    config: &SiteConfig,
) -> Result<Vec<SiteFile>, ScanError> {
    let canonical_root = root.canonicalize()?;
    let mut files = Vec::new();

    for target in targets {
        if target.is_dir() {
            let canonical = target.canonicalize()?;
            for found in find_html_files(&canonical, config)? {
                files.push(SiteFile {
                    rel: relative_path(&found.path, &canonical_root),
                    path: found.path,
                });
            }
        } else if target.is_file() && is_html(target) {
            let canonical = target.canonicalize()?;
            files.push(SiteFile {
                rel: relative_path(&canonical, &canonical_root),
                path: target.clone(),
            });
        } else {
            log::warn!("ignoring {}: not an HTML file or directory", target.display());
        }
    }

    files.sort_by(|a, b| a.rel.cmp(&b.rel));
    files.dedup_by(|a, b| a.rel == b.rel);
    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry, config: &SiteConfig) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || config.scan.skip_dirs.iter().any(|d| d == name.as_ref())
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("html"))
        .unwrap_or(false)
}

/// Site-relative forward-slash path. Falls back to the full path when
/// `path` is not under `root`.
pub fn relative_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Classify a page by its site-relative path.
pub fn classify(rel: &str, config: &SiteConfig) -> PageKind {
    let blog_dir = config.blog.dir.trim_matches('/');
    let blog_index = format!("{blog_dir}/index.html");
    if rel == "index.html" || rel == blog_index {
        return PageKind::Index;
    }

    match rel.strip_prefix(blog_dir).and_then(|r| r.strip_prefix('/')) {
        Some(inside) => {
            let name = inside.rsplit('/').next().unwrap_or(inside);
            if config.blog.exclude.iter().any(|ex| ex == name) {
                PageKind::Page
            } else {
                PageKind::Article
            }
        }
        None => PageKind::Page,
    }
}

/// Absolute URL a site-relative path is served at.
///
/// `index.html` files map to their directory URL with a trailing slash;
/// everything else maps to itself under the base URL.
pub fn path_to_url(rel: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if rel == "index.html" {
        return format!("{base}/");
    }
    match rel.strip_suffix("/index.html") {
        Some(dir) => format!("{base}/{dir}/"),
        None => format!("{base}/{rel}"),
    }
}

/// File modification date in UTC.
pub fn modified_date(path: &Path) -> Result<NaiveDate, ScanError> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified).date_naive())
}
