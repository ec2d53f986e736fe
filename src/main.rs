use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use site_meta::{beacon, config, generate, lint, output, scan, theme};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn version_string() -> &'static str {
    let tagged = env!("SITE_META_TAGGED");
    if tagged == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("SITE_META_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "site-meta")]
#[command(about = "SEO metadata tooling for hand-written static sites")]
#[command(long_about = "\
SEO metadata tooling for hand-written static sites

The HTML pages are the source of truth. Every command reads the <head> of
each page and derives what it needs from the tags already there.

Site structure:

  site/
  ├── config.toml                  # Optional, see 'site-meta gen-config'
  ├── index.html                   # Index page (og:type website)
  ├── about.html                   # Plain page
  └── blog/
      ├── index.html               # Index page (og:type website)
      ├── template.html            # Excluded from the feed
      └── first-post.html          # Article (og:type article + published_time)

Generated files:

  sitemap.xml      one <url> per HTML page
  robots.txt       allow-all, points at the sitemap
  blog/rss.xml     complete articles, newest first

Base URL (first available wins):
  --base-url  →  SITE_BASE_URL  →  base_url in config.toml")]
#[command(version = version_string())]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (defaults to <root>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Absolute site URL, e.g. https://example.com
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write sitemap.xml, robots.txt and the RSS feed
    Generate,
    /// Check SEO and social meta tags; exits 1 on violations
    Lint {
        /// Files or directories to check (defaults to the whole site)
        paths: Vec<PathBuf>,
    },
    /// Add the analytics beacon script before </head> in every page
    InjectBeacon {
        /// Beacon token (overrides beacon.token in config.toml)
        #[arg(long)]
        token: Option<String>,
    },
    /// Print the parsed metadata of every page as JSON
    Inspect,
    /// Print the theme toggle button and its bootstrap script
    ThemeSnippet {
        /// Theme the button is rendered for before the script runs
        #[arg(long, value_enum, default_value_t = ThemeArg::Light)]
        theme: ThemeArg,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for theme::Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => theme::Theme::Light,
            ThemeArg::Dark => theme::Theme::Dark,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_logging(cli.verbose)?;

    match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(ExitCode::SUCCESS);
        }
        Command::ThemeSnippet { theme } => {
            output::print_theme_snippet((*theme).into());
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.root.join("config.toml"));
    let site_config = config::load_config(&config_path)?;
    let env_base_url = std::env::var(config::BASE_URL_ENV).ok();
    let flag_base_url = cli.base_url.as_deref();

    match &cli.command {
        Command::Generate => {
            let base_url = site_config.require_base_url(flag_base_url, env_base_url.as_deref())?;
            log::info!("generating for {base_url}");
            let report = generate::generate(&cli.root, &site_config, &base_url)?;
            output::print_generate_report(&report, &cli.root);
        }
        Command::Lint { paths } => {
            let base_url = site_config.resolve_base_url(flag_base_url, env_base_url.as_deref())?;
            if base_url.is_none() {
                log::info!("no base URL configured; skipping host checks");
            }
            let files = if paths.is_empty() {
                scan::find_html_files(&cli.root, &site_config)?
            } else {
                scan::collect_targets(paths, &cli.root, &site_config)?
            };
            let report = lint::lint_files(&files, &site_config, base_url.as_deref());
            output::print_lint_report(&report);
            if !report.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::InjectBeacon { token } => {
            let report = beacon::inject(&cli.root, &site_config, token.as_deref())?;
            output::print_beacon_report(&report);
        }
        Command::Inspect => {
            let base_url = site_config
                .resolve_base_url(flag_base_url, env_base_url.as_deref())?
                .unwrap_or_default();
            inspect(&cli.root, &site_config, &base_url)?;
        }
        Command::ThemeSnippet { .. } | Command::GenConfig => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// `RUST_LOG` wins over the default level when set.
fn init_logging(verbose: bool) -> Result<(), log::SetLoggerError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).env().init()
}

/// Without a base URL the records carry site-absolute paths (`/about.html`).
fn inspect(
    root: &Path,
    site_config: &config::SiteConfig,
    base_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let files = scan::find_html_files(root, site_config)?;
    let pages = generate::collect_pages(&files, site_config, base_url)?;
    println!("{}", output::format_inspect(&pages)?);
    Ok(())
}
