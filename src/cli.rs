//! CLI argument parsing via clap.

use clap::Parser;
use errand::build_info;
use std::path::PathBuf;

/// One storefront page served from a local HTML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMapping {
    pub url: String,
    pub path: PathBuf,
}

fn parse_page_mapping(raw: &str) -> Result<PageMapping, String> {
    let (url, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected URL=PATH, got `{raw}`"))?;
    let url = url.trim();
    let path = path.trim();
    if url.is_empty() || path.is_empty() {
        return Err(format!("expected URL=PATH, got `{raw}`"));
    }
    reqwest::Url::parse(url).map_err(|err| format!("invalid page URL `{url}`: {err}"))?;
    Ok(PageMapping {
        url: url.to_string(),
        path: PathBuf::from(path),
    })
}

/// Shopping agent for web storefronts. Reads a page, acts on it, asks when unsure.
#[derive(Debug, Parser)]
#[command(name = "errand", version, after_help = build_info::HELP_BUILD_METADATA)]
pub struct Args {
    /// What you want done, e.g. "order a margherita from the closest pizza place".
    pub prompt: String,

    /// Path to config file (default: ./errand.toml or ~/.config/errand/errand.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Override model name.
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Send model requests through this relay instead of calling the provider.
    #[arg(long = "backend-url")]
    pub backend_url: Option<String>,

    /// Serve a page from disk. Repeatable; the first one is the start page.
    #[arg(long = "page", value_name = "URL=PATH", value_parser = parse_page_mapping)]
    pub pages: Vec<PageMapping>,

    /// Shop on the built-in Pizza Town storefront.
    #[arg(long = "demo", conflicts_with = "pages")]
    pub demo: bool,

    /// Override the step cap for this run.
    #[arg(long = "max-iterations")]
    pub max_iterations: Option<usize>,

    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable color output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}
