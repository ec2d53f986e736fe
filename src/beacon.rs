//! Analytics beacon injection.
//!
//! Adds the Cloudflare Web Analytics `<script>` to every page, immediately
//! before the closing `</head>`:
//!
//! ```html
//!     <meta name="twitter:card" content="summary">
//!     <script defer src="https://static.cloudflareinsights.com/beacon.min.js" data-cf-beacon="{&quot;token&quot;:&quot;…&quot;}"></script>
//! </head>
//! ```
//!
//! The edit is textual, not a DOM rewrite, so the rest of each hand-written
//! file stays byte-identical. Pages already referencing the beacon source are
//! left alone, which makes re-running safe.
//!
//! ## Placement
//!
//! - The *last* `</head>` wins (case-insensitive, whitespace inside the tag
//!   tolerated).
//! - When `</head>` starts its own line, the snippet goes on a new line above
//!   it with the same indentation. Otherwise it goes directly before the tag.
//! - The inserted line ends with the file's newline style (`\r\n`, `\r` or `\n`).
//! - Files without `</head>` are reported and not touched.
//! - Files that cannot be read as UTF-8 text are reported and skipped; the
//!   run carries on with the remaining pages.

use crate::config::SiteConfig;
use crate::scan::{self, ScanError};
use maud::html;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeaconError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("No beacon token: pass --token or set beacon.token in config.toml")]
    MissingToken,
}

static CLOSING_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</\s*head\s*>").expect("closing head regex must compile"));

/// Outcome of one injection run.
#[derive(Debug, Default)]
pub struct BeaconReport {
    pub processed: usize,
    /// Files that received the snippet, site-relative.
    pub updated: Vec<String>,
    /// Files that already referenced the beacon.
    pub already_present: usize,
    /// Files with no `</head>` to anchor on.
    pub without_head: Vec<String>,
    /// Files that could not be read, with the reason.
    pub unreadable: Vec<(String, String)>,
}

/// Render the `<script>` tag for `src` and `token`.
pub fn render_snippet(src: &str, token: &str) -> String {
    let data = serde_json::json!({ "token": token }).to_string();
    html! {
        script defer src=(src) data-cf-beacon=(data) {}
    }
    .into_string()
}

/// Newline style of a document: `\r\n` if present anywhere, then `\r`,
/// then `\n`.
fn detect_newline(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else if text.contains('\r') {
        "\r"
    } else {
        "\n"
    }
}

/// Beacon source without its scheme, so `http:`, `https:` and
/// protocol-relative references all count as present.
fn source_marker(src: &str) -> &str {
    src.split_once("//").map(|(_, rest)| rest).unwrap_or(src)
}

/// Insert `snippet` before the last `</head>`.
///
/// Returns `None` when nothing should change: either `src` is already
/// referenced or there is no `</head>`.
pub fn insert_before_closing_head(html: &str, snippet: &str, src: &str) -> Option<String> {
    if html.contains(source_marker(src)) {
        return None;
    }

    let closing = CLOSING_HEAD.find_iter(html).last()?;
    let tag_start = closing.start();

    let line_start = html[..tag_start]
        .rfind(['\n', '\r'])
        .map(|i| i + 1)
        .unwrap_or(0);
    let prefix = &html[line_start..tag_start];
    let indent_len = prefix
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(prefix.len());
    let indent = &prefix[..indent_len];
    let newline = detect_newline(html);

    let mut out = String::with_capacity(html.len() + snippet.len() + indent.len() * 2 + 2);
    if indent_len == prefix.len() {
        // `</head>` opens its line: new line above it, same indentation.
        out.push_str(&html[..line_start]);
        out.push_str(indent);
        out.push_str(snippet);
        out.push_str(newline);
        out.push_str(&html[line_start..]);
    } else {
        out.push_str(&html[..tag_start]);
        out.push_str(snippet);
        out.push_str(&html[tag_start..]);
    }
    Some(out)
}

/// Inject the beacon into every HTML file under `root`.
///
/// `token` overrides `beacon.token` from the config; one of the two is required.
pub fn inject(
    root: &Path,
    config: &SiteConfig,
    token: Option<&str>,
) -> Result<BeaconReport, BeaconError> {
    let token = token
        .or(config.beacon.token.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(BeaconError::MissingToken)?;
    let snippet = render_snippet(&config.beacon.src, token);

    let mut report = BeaconReport::default();
    for file in scan::find_html_files(root, config)? {
        report.processed += 1;
        let text = match fs::read_to_string(&file.path) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("{}: {err}, beacon not added", file.rel);
                report.unreadable.push((file.rel, err.to_string()));
                continue;
            }
        };

        if text.contains(source_marker(&config.beacon.src)) {
            report.already_present += 1;
            continue;
        }
        match insert_before_closing_head(&text, &snippet, &config.beacon.src) {
            Some(updated) => {
                fs::write(&file.path, updated)?;
                log::debug!("injected beacon into {}", file.rel);
                report.updated.push(file.rel);
            }
            None => {
                log::warn!("{}: no </head>, beacon not added", file.rel);
                report.without_head.push(file.rel);
            }
        }
    }

    Ok(report)
}
