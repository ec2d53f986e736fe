//! Sitemap, robots.txt, and RSS feed generation.
//!
//! Walks the site, parses every page's head, and renders three artifacts:
//!
//! ```text
//! site/
//! ├── sitemap.xml        # one <url> per HTML file
//! ├── robots.txt         # allow-all + Sitemap: reference
//! └── blog/
//!     └── rss.xml        # one <item> per complete article, newest first
//! ```
//!
//! ## Failure Model
//!
//! - A page that cannot be parsed (unreadable, not UTF-8, no `<head>`) is
//!   reported and left out of the feed. It still gets a sitemap entry, since
//!   the sitemap only needs its path and modification date.
//! - An article missing a title, description, canonical link or a parseable
//!   publish date is handled per `generate.on_missing`:
//!   `skip` leaves it out of the feed with a warning, `fail` aborts the run.
//!   Other page kinds never enter the feed, so the policy does not apply to them.
//! - A missing base URL is rejected by the caller before this module runs.
//!
//! All three documents are rendered in memory before anything is written.
//! Each is then staged as a hidden temporary sibling; only once all three are
//! staged are they renamed into place. If staging fails, the staged files are
//! removed and the previous artifacts are left untouched.
//!
//! ## Ordering
//!
//! Feed items are sorted by publish instant, newest first. Equal instants fall
//! back to URL order, so output never depends on scan or thread order.

use crate::config::{MissingFieldPolicy, SiteConfig};
use crate::meta;
use crate::scan::{self, ScanError, SiteFile};
use crate::types::{FieldIssue, PageKind, PageRecord};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("{} article(s) missing required fields: {}", .0.len(), incomplete_summary(.0))]
    IncompleteArticles(Vec<IncompletePage>),
}

fn incomplete_summary(pages: &[IncompletePage]) -> String {
    pages
        .iter()
        .map(|p| p.path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A page whose record could not be built, with the reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompletePage {
    pub path: String,
    pub issues: Vec<FieldIssue>,
}

/// Why a scanned page has no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PageProblem {
    /// Unreadable or head-less document.
    Unparseable { error: String },
    /// Parsed, but missing fields its kind requires.
    Incomplete { issues: Vec<FieldIssue> },
}

/// One HTML file after parsing.
#[derive(Debug, Clone)]
pub struct ScannedPage {
    pub path: String,
    pub kind: PageKind,
    pub url: String,
    pub modified: NaiveDate,
    pub record: Result<PageRecord, PageProblem>,
}

/// Summary of a generation run, for CLI output.
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub sitemap_path: PathBuf,
    pub robots_path: PathBuf,
    pub feed_path: PathBuf,
    pub sitemap_urls: usize,
    /// Feed item titles in feed order.
    pub feed_items: Vec<String>,
    /// Articles left out of the feed under the `skip` policy.
    pub skipped: Vec<IncompletePage>,
    /// Pages that could not be parsed at all: (path, error).
    pub unparseable: Vec<(String, String)>,
}

/// Parse every file into a [`ScannedPage`], in input order.
pub fn collect_pages(
    files: &[SiteFile],
    config: &SiteConfig,
    base_url: &str,
) -> Result<Vec<ScannedPage>, ScanError> {
    files
        .par_iter()
        .map(|file| -> Result<ScannedPage, ScanError> {
            let kind = scan::classify(&file.rel, config);
            let url = scan::path_to_url(&file.rel, base_url);
            let modified = scan::modified_date(&file.path)?;
            let record = match meta::read_head(&file.path) {
                Ok(head) => PageRecord::from_head(&file.rel, kind, url.clone(), modified, &head)
                    .map_err(|issues| PageProblem::Incomplete { issues }),
                Err(err) => Err(PageProblem::Unparseable {
                    error: err.to_string(),
                }),
            };
            Ok(ScannedPage {
                path: file.rel.clone(),
                kind,
                url,
                modified,
                record,
            })
        })
        .collect()
}

/// Run the full generation: scan, parse, render, write.
pub fn generate(
    root: &Path,
    config: &SiteConfig,
    base_url: &str,
) -> Result<GenerateReport, GenerateError> {
    let files = scan::find_html_files(root, config)?;
    let pages = collect_pages(&files, config, base_url)?;

    let mut articles: Vec<&PageRecord> = Vec::new();
    let mut incomplete: Vec<IncompletePage> = Vec::new();
    let mut unparseable = Vec::new();

    for page in &pages {
        match &page.record {
            Ok(record) if page.kind == PageKind::Article => articles.push(record),
            Ok(_) => {}
            Err(PageProblem::Unparseable { error }) => {
                log::warn!("{}: could not parse page: {error}", page.path);
                unparseable.push((page.path.clone(), error.clone()));
            }
            Err(PageProblem::Incomplete { issues }) if page.kind == PageKind::Article => {
                incomplete.push(IncompletePage {
                    path: page.path.clone(),
                    issues: issues.clone(),
                });
            }
            Err(PageProblem::Incomplete { issues }) => {
                log::debug!("{}: incomplete metadata ({} issues)", page.path, issues.len());
            }
        }
    }

    if !incomplete.is_empty() && config.generate.on_missing == MissingFieldPolicy::Fail {
        return Err(GenerateError::IncompleteArticles(incomplete));
    }
    for page in &incomplete {
        let reasons: Vec<String> = page.issues.iter().map(ToString::to_string).collect();
        log::warn!("{}: left out of feed: {}", page.path, reasons.join(", "));
    }

    sort_feed(&mut articles);

    let sitemap = render_sitemap(&pages);
    let robots = render_robots(base_url, &config.output.sitemap);
    let rss = render_rss(&articles, config, base_url, Utc::now().into());

    let report = GenerateReport {
        sitemap_path: root.join(&config.output.sitemap),
        robots_path: root.join(&config.output.robots),
        feed_path: root.join(&config.output.feed),
        sitemap_urls: pages.len(),
        feed_items: articles.iter().map(|a| a.title.clone()).collect(),
        skipped: incomplete,
        unparseable,
    };

    write_all_atomically(&[
        (&report.sitemap_path, &sitemap),
        (&report.robots_path, &robots),
        (&report.feed_path, &rss),
    ])?;

    Ok(report)
}

/// Newest first; equal instants ordered by URL.
pub fn sort_feed(articles: &mut [&PageRecord]) {
    articles.sort_by(|a, b| b.published.cmp(&a.published).then_with(|| a.url.cmp(&b.url)));
}

fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(text)
}

/// Render `sitemap.xml`, one `<url>` per page.
pub fn render_sitemap(pages: &[ScannedPage]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for page in pages {
        xml.push_str(&format!(
            "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n  </url>\n",
            escape(&page.url),
            page.modified.format("%Y-%m-%d"),
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Render `robots.txt`: allow everything and point at the sitemap.
pub fn render_robots(base_url: &str, sitemap_path: &str) -> String {
    format!(
        "User-agent: *\nDisallow:\n\nSitemap: {}/{}\n",
        base_url.trim_end_matches('/'),
        sitemap_path.trim_start_matches('/'),
    )
}

fn rfc2822(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

/// Render the RSS 2.0 feed. `articles` must already be in feed order.
///
/// `lastBuildDate` is the newest publish date, or `now` for an empty feed.
pub fn render_rss(
    articles: &[&PageRecord],
    config: &SiteConfig,
    base_url: &str,
    now: DateTime<FixedOffset>,
) -> String {
    let base = base_url.trim_end_matches('/');
    let blog_link = format!("{base}/{}/", config.blog.dir.trim_matches('/'));
    let self_link = format!("{base}/{}", config.output.feed.trim_start_matches('/'));
    let last_build = articles
        .iter()
        .filter_map(|a| a.published)
        .max()
        .unwrap_or(now);

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n  <channel>\n",
    );
    xml.push_str(&format!("    <title>{}</title>\n", escape(&config.feed.title)));
    xml.push_str(&format!("    <link>{}</link>\n", escape(&blog_link)));
    xml.push_str(&format!(
        "    <description>{}</description>\n",
        escape(&config.feed.description)
    ));
    xml.push_str(&format!(
        "    <language>{}</language>\n",
        escape(&config.feed.language)
    ));
    xml.push_str(&format!(
        "    <lastBuildDate>{}</lastBuildDate>\n",
        rfc2822(&last_build)
    ));
    xml.push_str(&format!(
        "    <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\" />\n",
        escape(&self_link)
    ));

    for article in articles {
        let Some(published) = &article.published else {
            continue;
        };
        let link = escape(&article.url);
        xml.push_str("    <item>\n");
        xml.push_str(&format!("      <title>{}</title>\n", escape(&article.title)));
        xml.push_str(&format!("      <link>{link}</link>\n"));
        xml.push_str(&format!("      <guid isPermaLink=\"true\">{link}</guid>\n"));
        xml.push_str(&format!("      <pubDate>{}</pubDate>\n", rfc2822(published)));
        xml.push_str(&format!(
            "      <description>{}</description>\n",
            escape(&article.description)
        ));
        xml.push_str("    </item>\n");
    }

    xml.push_str("  </channel>\n</rss>\n");
    xml
}

/// Hidden sibling used while staging `path`: `dir/.name.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp"))
}

/// Write `contents` to the temp sibling of `path`, creating parent dirs.
fn stage(path: &Path, contents: &str) -> std::io::Result<PathBuf> {
    if path.is_dir() {
        return Err(std::io::Error::other(format!(
            "{} is a directory",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    if let Err(err) = fs::write(&tmp, contents) {
        discard(&[tmp]);
        return Err(err);
    }
    Ok(tmp)
}

fn discard(staged: &[PathBuf]) {
    for tmp in staged {
        if let Err(err) = fs::remove_file(tmp) {
            log::debug!("could not remove {}: {err}", tmp.display());
        }
    }
}

/// Stage every file, then rename them all into place.
///
/// Nothing is renamed until every file is staged, so a staging failure
/// leaves all destinations as they were. Leftover temp files are removed on
/// any failure.
fn write_all_atomically(files: &[(&PathBuf, &String)]) -> std::io::Result<()> {
    let mut staged = Vec::with_capacity(files.len());
    for (path, contents) in files {
        match stage(path, contents) {
            Ok(tmp) => staged.push(tmp),
            Err(err) => {
                discard(&staged);
                return Err(err);
            }
        }
    }

    for (i, ((path, _), tmp)) in files.iter().zip(&staged).enumerate() {
        if let Err(err) = fs::rename(tmp, path) {
            discard(&staged[i..]);
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::types::{Field, SocialCard};

    const BASE: &str = "https://example.com";

    fn record(url: &str, title: &str, published: &str) -> PageRecord {
        PageRecord {
            path: url.trim_start_matches(BASE).trim_start_matches('/').to_string(),
            kind: PageKind::Article,
            url: url.to_string(),
            title: title.to_string(),
            description: format!("About {title}"),
            canonical: url.to_string(),
            og_type: None,
            published: Some(meta::parse_published(published).unwrap()),
            modified: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            social: SocialCard::default(),
        }
    }

    fn now() -> DateTime<FixedOffset> {
        meta::parse_published("2030-01-01T00:00:00Z").unwrap()
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    #[test]
    fn feed_is_newest_first() {
        let a = record("https://example.com/blog/a.html", "A", "2024-01-10");
        let b = record("https://example.com/blog/b.html", "B", "2024-03-01T08:00:00Z");
        let c = record("https://example.com/blog/c.html", "C", "2023-12-31");
        let mut articles = vec![&a, &b, &c];
        sort_feed(&mut articles);
        let titles: Vec<&str> = articles.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A", "C"]);
    }

    #[test]
    fn feed_orders_by_instant_across_offsets() {
        // 10:00+02:00 is 08:00Z, earlier than 09:00Z
        let a = record("https://example.com/blog/a.html", "A", "2024-03-05T10:00:00+02:00");
        let b = record("https://example.com/blog/b.html", "B", "2024-03-05T09:00:00Z");
        let mut articles = vec![&a, &b];
        sort_feed(&mut articles);
        assert_eq!(articles[0].title, "B");
    }

    #[test]
    fn feed_ties_break_by_url() {
        let z = record("https://example.com/blog/z.html", "Z", "2024-01-01");
        let a = record("https://example.com/blog/a.html", "A", "2024-01-01");
        let mut articles = vec![&z, &a];
        sort_feed(&mut articles);
        assert_eq!(articles[0].title, "A");
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    #[test]
    fn robots_references_sitemap() {
        assert_eq!(
            render_robots("https://example.com/", "sitemap.xml"),
            "User-agent: *\nDisallow:\n\nSitemap: https://example.com/sitemap.xml\n"
        );
    }

    #[test]
    fn rss_item_carries_all_fields() {
        let a = record("https://example.com/blog/a.html", "Fish & Chips", "2024-03-05T10:00:00Z");
        let rss = render_rss(&[&a], &SiteConfig::default(), BASE, now());
        assert!(rss.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\""));
        assert!(rss.contains("<title>Fish &amp; Chips</title>"));
        assert!(rss.contains("<link>https://example.com/blog/a.html</link>"));
        assert!(rss.contains(
            "<guid isPermaLink=\"true\">https://example.com/blog/a.html</guid>"
        ));
        assert!(rss.contains("<pubDate>Tue, 05 Mar 2024 10:00:00 +0000</pubDate>"));
        assert!(rss.contains("<description>About Fish &amp; Chips</description>"));
    }

    #[test]
    fn rss_channel_uses_config_and_base_url() {
        let mut config = SiteConfig::default();
        config.feed.title = "Field Notes".to_string();
        config.feed.language = "nl".to_string();
        let rss = render_rss(&[], &config, BASE, now());
        assert!(rss.contains("<title>Field Notes</title>"));
        assert!(rss.contains("<link>https://example.com/blog/</link>"));
        assert!(rss.contains("<language>nl</language>"));
        assert!(rss.contains(
            "<atom:link href=\"https://example.com/blog/rss.xml\" rel=\"self\" type=\"application/rss+xml\" />"
        ));
        assert!(rss.contains("<lastBuildDate>Tue, 01 Jan 2030 00:00:00 +0000</lastBuildDate>"));
        assert!(!rss.contains("<item>"));
    }

    #[test]
    fn rss_last_build_date_is_newest_article() {
        let a = record("https://example.com/blog/a.html", "A", "2024-01-10");
        let b = record("https://example.com/blog/b.html", "B", "2024-03-01T08:00:00Z");
        let rss = render_rss(&[&b, &a], &SiteConfig::default(), BASE, now());
        assert!(rss.contains("<lastBuildDate>Fri, 01 Mar 2024 08:00:00 +0000</lastBuildDate>"));
    }

    #[test]
    fn sitemap_lists_each_page_once() {
        let tmp = setup_fixtures();
        let config = SiteConfig::default();
        let files = scan::find_html_files(tmp.path(), &config).unwrap();
        let pages = collect_pages(&files, &config, BASE).unwrap();
        let xml = render_sitemap(&pages);

        assert_eq!(xml.matches("<url>").count(), files.len());
        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<loc>https://example.com/blog/</loc>"));
        assert!(xml.contains("<loc>https://example.com/blog/first-post.html</loc>"));
        for loc in xml.lines().filter(|l| l.contains("<loc>")) {
            assert!(loc.trim().starts_with("<loc>https://example.com/"), "{loc}");
        }
    }

    // =========================================================================
    // End-to-end over fixtures
    // =========================================================================

    #[test]
    fn generate_writes_all_artifacts() {
        let tmp = setup_fixtures();
        let report = generate(tmp.path(), &SiteConfig::default(), BASE).unwrap();

        let sitemap = fs::read_to_string(tmp.path().join("sitemap.xml")).unwrap();
        let robots = fs::read_to_string(tmp.path().join("robots.txt")).unwrap();
        let rss = fs::read_to_string(tmp.path().join("blog/rss.xml")).unwrap();

        assert_eq!(sitemap.matches("<url>").count(), report.sitemap_urls);
        assert!(robots.contains("Sitemap: https://example.com/sitemap.xml"));
        assert_eq!(report.feed_items, vec!["Second Post", "First Post"]);

        let second = rss.find("Second Post").unwrap();
        let first = rss.find("First Post").unwrap();
        assert!(second < first);

        // No temp files left behind
        assert!(!tmp.path().join(".sitemap.xml.tmp").exists());
    }

    #[test]
    fn skip_policy_leaves_incomplete_article_out() {
        let tmp = setup_fixtures();
        let report = generate(tmp.path(), &SiteConfig::default(), BASE).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, "blog/third-post.html");
        assert_eq!(
            report.skipped[0].issues,
            vec![FieldIssue::missing(Field::Published)]
        );
        let rss = fs::read_to_string(tmp.path().join("blog/rss.xml")).unwrap();
        assert!(!rss.contains("Third Post"));
    }

    #[test]
    fn fail_policy_aborts_without_writing() {
        let tmp = setup_fixtures();
        let mut config = SiteConfig::default();
        config.generate.on_missing = MissingFieldPolicy::Fail;

        let result = generate(tmp.path(), &config, BASE);
        match result {
            Err(GenerateError::IncompleteArticles(pages)) => {
                assert_eq!(pages.len(), 1);
                assert_eq!(pages[0].path, "blog/third-post.html");
            }
            other => panic!("expected IncompleteArticles, got {other:?}"),
        }
        assert!(!tmp.path().join("sitemap.xml").exists());
        assert!(!tmp.path().join("robots.txt").exists());
        assert!(!tmp.path().join("blog/rss.xml").exists());
    }

    #[test]
    fn unparseable_page_stays_in_sitemap() {
        let tmp = setup_fixtures();
        fs::write(tmp.path().join("broken.html"), "<p>no head</p>").unwrap();
        let report = generate(tmp.path(), &SiteConfig::default(), BASE).unwrap();

        assert_eq!(report.unparseable.len(), 1);
        assert_eq!(report.unparseable[0].0, "broken.html");
        let sitemap = fs::read_to_string(tmp.path().join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<loc>https://example.com/broken.html</loc>"));
    }

    #[test]
    fn non_utf8_page_is_unparseable_but_listed() {
        let tmp = setup_fixtures();
        fs::write(tmp.path().join("latin1.html"), b"\xff\xfe<head>").unwrap();
        let report = generate(tmp.path(), &SiteConfig::default(), BASE).unwrap();

        assert_eq!(report.unparseable.len(), 1);
        assert_eq!(report.unparseable[0].0, "latin1.html");
        assert_eq!(report.feed_items, vec!["Second Post", "First Post"]);
        let sitemap = fs::read_to_string(tmp.path().join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<loc>https://example.com/latin1.html</loc>"));
    }

    #[test]
    fn blocked_feed_path_leaves_every_artifact_untouched() {
        let tmp = setup_fixtures();
        fs::write(tmp.path().join("sitemap.xml"), "previous sitemap").unwrap();
        fs::create_dir_all(tmp.path().join("blog/rss.xml/x")).unwrap();

        let result = generate(tmp.path(), &SiteConfig::default(), BASE);
        assert!(matches!(result, Err(GenerateError::Io(_))), "{result:?}");

        assert_eq!(
            fs::read_to_string(tmp.path().join("sitemap.xml")).unwrap(),
            "previous sitemap"
        );
        assert!(!tmp.path().join("robots.txt").exists());
        assert!(tmp.path().join("blog/rss.xml/x").is_dir());
        for leftover in [".sitemap.xml.tmp", ".robots.txt.tmp", "blog/.rss.xml.tmp"] {
            assert!(!tmp.path().join(leftover).exists(), "{leftover} left behind");
        }
    }

    #[test]
    fn staging_failure_discards_earlier_temp_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ok = tmp.path().join("ok.txt");
        let blocked = tmp.path().join("blocked");
        fs::create_dir_all(blocked.join("inner")).unwrap();
        let ok_contents = "ok".to_string();
        let blocked_contents = "x".to_string();

        let result = write_all_atomically(&[(&ok, &ok_contents), (&blocked, &blocked_contents)]);

        assert!(result.is_err());
        assert!(!ok.exists());
        assert!(!tmp.path().join(".ok.txt.tmp").exists());
        assert!(!tmp.path().join(".blocked.tmp").exists());
    }

    #[test]
    fn output_paths_follow_config() {
        let tmp = setup_fixtures();
        let mut config = SiteConfig::default();
        config.output.feed = "feeds/all.xml".to_string();
        config.output.sitemap = "maps/sitemap.xml".to_string();
        generate(tmp.path(), &config, BASE).unwrap();

        assert!(tmp.path().join("feeds/all.xml").exists());
        let robots = fs::read_to_string(tmp.path().join("robots.txt")).unwrap();
        assert!(robots.contains("Sitemap: https://example.com/maps/sitemap.xml"));
    }
}
