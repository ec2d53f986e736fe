//! # Site Meta
//!
//! SEO and social metadata tooling for a hand-written static site. The HTML
//! pages are the only source of truth: there is no front-matter, no database
//! and no separate content index. Everything here is derived from the tags
//! each page already carries in its `<head>`.
//!
//! # Architecture: Derive, Don't Store
//!
//! ```text
//! site/**/*.html ──scan──▶ SiteFile ──meta──▶ HeadMeta ──┬──▶ lint     → violations
//!                                                        └──▶ PageRecord ─▶ generate → sitemap.xml
//!                                                                                      robots.txt
//!                                                                                      blog/rss.xml
//! ```
//!
//! Every command re-reads the pages. Nothing is cached between runs, so an
//! edit to a page is reflected the next time any command runs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.toml` loading over stock defaults, validation, base URL resolution |
//! | [`scan`] | HTML discovery, page classification (index / article / page), path → URL |
//! | [`meta`] | `<head>` extraction and publish-date parsing; builds [`types::PageRecord`] |
//! | [`types`] | Shared records: `PageRecord`, `PageKind`, `FieldIssue` |
//! | [`lint`] | Per-kind meta tag rules and violation reports |
//! | [`generate`] | Sitemap, robots.txt and RSS rendering with atomic writes |
//! | [`beacon`] | Idempotent analytics `<script>` injection before `</head>` |
//! | [`theme`] | Light/dark toggle state machine and its HTML |
//! | [`output`] | CLI output formatting for every command |
//!
//! # Design Decisions
//!
//! ## Two-Step Parsing
//!
//! [`meta::parse_head`] collects raw attributes without judging them, and
//! [`types::PageRecord`] is only built once the required fields are known to
//! be present. The linter works on the raw head, so it can report every
//! problem on a page at once. The generator works on records, so it never has
//! to deal with half-filled data.
//!
//! ## Path-Derived URLs
//!
//! Sitemap and feed URLs come from the file's location, not from its
//! canonical tag. A wrong canonical is a lint violation; it never silently
//! changes what gets published.
//!
//! ## Deterministic Output
//!
//! Parsing runs on a rayon pool, but results are collected in path order and
//! the feed is sorted by publish instant (then URL) afterwards. Output does
//! not depend on thread scheduling or directory iteration order.

pub mod beacon;
pub mod config;
pub mod generate;
pub mod lint;
pub mod meta;
pub mod output;
pub mod scan;
pub mod theme;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
