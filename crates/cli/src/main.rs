//! hollowbeak entry point.
//!
//! Extracts URLs from text and resolves a page title for each through an
//! ordered chain of fetchers. Logging goes to stderr; stdout carries
//! only the rendered result.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hollowbeak_client::{DEFAULT_FETCHER_ORDER, UrlGrammar};
use hollowbeak_core::{AppConfig, TitleCache};

mod pipeline;
mod render;

use pipeline::{InputSource, RunOptions};

#[derive(Parser)]
#[command(name = "hollowbeak", version, about = "Extract URLs from text and resolve their page titles")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace, -vvv everything)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract URLs from the given text and print each with its title
    Fetch(FetchArgs),

    /// Print the title cache file location
    CachePath,

    /// Print version information
    Version,
}

#[derive(Args)]
struct FetchArgs {
    /// Text to scan; multiple arguments are joined with newlines
    text: Vec<String>,

    /// Read the source text from a file instead
    #[arg(long, conflicts_with = "text")]
    input: Option<PathBuf>,

    /// Output format: markdown, html, or space
    #[arg(long, default_value = "markdown")]
    output: String,

    /// Fetcher variant; repeat to define the fallback order
    /// (default: history, scripted, http)
    #[arg(long = "fetcher", value_name = "NAME")]
    fetchers: Vec<String>,

    /// Skip the title cache entirely for this run
    #[arg(long)]
    no_cache: bool,

    /// Also match scheme-less domain tokens like example.com/path
    #[arg(long)]
    relaxed: bool,

    /// Override the fetch timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Override how many days cached titles stay valid
    #[arg(long)]
    cache_ttl_days: Option<i64>,
}

/// Map `-v` counts to filter directives. The binary's own events carry
/// targets rooted at the bin crate name, `hollowbeak`.
fn filter_directives(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "info,hollowbeak=debug,hollowbeak_client=debug,hollowbeak_core=debug",
        2 => "info,hollowbeak=trace,hollowbeak_client=trace,hollowbeak_core=trace",
        _ => "trace",
    }
}

fn init_tracing(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(verbosity)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Command::Fetch(args) => {
            let mut app = AppConfig::load()?;
            if let Some(timeout_ms) = args.timeout_ms {
                app.timeout_ms = timeout_ms;
            }
            if let Some(ttl_days) = args.cache_ttl_days {
                app.cache_ttl_days = ttl_days;
            }
            app.validate()?;

            let input = match args.input {
                Some(path) => InputSource::File(path),
                None => InputSource::Args(args.text),
            };
            let fetchers = if args.fetchers.is_empty() {
                DEFAULT_FETCHER_ORDER.iter().map(|s| s.to_string()).collect()
            } else {
                args.fetchers
            };
            let grammar = if args.relaxed { UrlGrammar::Relaxed } else { UrlGrammar::Strict };

            let opts = RunOptions { input, output: args.output, fetchers, no_cache: args.no_cache, grammar };
            pipeline::run(&app, &opts).await?;
        }
        Command::CachePath => {
            let app = AppConfig::load()?;
            let path = match app.cache_path {
                Some(path) => path,
                None => TitleCache::default_path()?,
            };
            println!("{}", path.display());
        }
        Command::Version => {
            println!("hollowbeak {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
