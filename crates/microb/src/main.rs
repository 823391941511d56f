//! microb CLI - OSINT collection pipeline.
//!
//! Provides commands for:
//! - engine commands (`crt-sh`, `certspotter`, ...): fetch keys from stdin into the cache
//! - `extract-domains`, `unique-lines`: line filters from stdin to stdout
//! - `clean`: remove expired cache entries
//! - `import`: convert cached responses into graph record batches

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use microb_engines::{
    AlienVault, BinaryEdge, CertSpotter, CommonCrawl, CrtSh, GoogleSearch, WebArchive,
};
use microb_pipeline::normalize_host;
use tracing_subscriber::EnvFilter;

use commands::{CleanArgs, ExtractDomainsArgs, FetchArgs, ImportArgs, query_key, unique_lines};
use error::CliError;
use output::Output;

/// microb - OSINT collection pipeline.
#[derive(Parser)]
#[command(name = "microb", version, about)]
struct Cli {
    /// Show debug logs.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch certificate transparency entries from crt.sh.
    CrtSh(FetchArgs),
    /// Fetch certificate issuances from `CertSpotter`.
    Certspotter(FetchArgs),
    /// Fetch archived URLs from the Wayback Machine CDX API.
    WebArchive(FetchArgs),
    /// Fetch passive DNS records from `AlienVault` OTX.
    Alienvault(FetchArgs),
    /// Fetch captures from every Common Crawl index.
    Commoncrawl(FetchArgs),
    /// Fetch subdomains from `BinaryEdge`.
    BinaryEdge(FetchArgs),
    /// Run each line as a Google Custom Search query.
    GoogleSearch(FetchArgs),
    /// Print the hostname of every line.
    ExtractDomains(ExtractDomainsArgs),
    /// Print every distinct line once, in input order.
    UniqueLines,
    /// Remove expired cache entries.
    Clean(CleanArgs),
    /// Convert cached responses into graph record batches (NDJSON).
    Import(ImportArgs),
}

impl Commands {
    fn execute(self) -> Result<(), CliError> {
        match self {
            Self::CrtSh(args) => args.run(normalize_host, |agent, _| Ok(CrtSh::new(agent))),
            Self::Certspotter(args) => {
                args.run(normalize_host, |agent, _| Ok(CertSpotter::new(agent)))
            }
            Self::WebArchive(args) => {
                args.run(normalize_host, |agent, _| Ok(WebArchive::new(agent)))
            }
            Self::Alienvault(args) => {
                args.run(normalize_host, |agent, _| Ok(AlienVault::new(agent)))
            }
            Self::Commoncrawl(args) => {
                args.run(normalize_host, |agent, _| Ok(CommonCrawl::new(agent)))
            }
            Self::BinaryEdge(args) => args.run(normalize_host, |agent, config| {
                Ok(BinaryEdge::new(agent, config.binaryedge_api_key()?))
            }),
            Self::GoogleSearch(args) => args.run(query_key, |agent, config| {
                let (api_key, engine_id) = config.google_credentials()?;
                Ok(GoogleSearch::new(agent, api_key, engine_id))
            }),
            Self::ExtractDomains(args) => args.execute(),
            Self::UniqueLines => unique_lines(),
            Self::Clean(args) => args.execute(),
            Self::Import(args) => args.execute(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables DEBUG, --quiet limits to ERROR, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.command.execute() {
        output.error(&format!("Error: {err}"));
        std::process::exit(err.exit_code());
    }
}
