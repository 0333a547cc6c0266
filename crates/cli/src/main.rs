// ABOUTME: CLI for resolving link pill metadata with linkpill-meta.
// ABOUTME: Resolves one or more URLs concurrently and prints titles, favicons and authors as JSON.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use linkpill_meta::{normalize, FaviconStrategy, LinkMetadata, Resolver};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Resolve link titles, favicons and authors and output JSON.
#[derive(Parser, Debug)]
#[command(name = "linkpill")]
#[command(about = "Resolve link pill metadata and print JSON", long_about = None)]
#[command(version)]
struct Args {
    /// URLs to resolve. A missing scheme defaults to https.
    #[arg(required = true)]
    urls: Vec<String>,

    /// Maximum number of simultaneous page fetches.
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Byte cap for each page fetch.
    #[arg(long = "max-bytes", default_value_t = 51200)]
    max_bytes: usize,

    /// Embed favicons as data: URIs instead of returning their URLs.
    #[arg(long = "inline-favicons")]
    inline_favicons: bool,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Print elapsed time in ms to stderr
    #[arg(long)]
    timing: bool,

    /// Verbosity when RUST_LOG is unset (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize, Debug)]
struct Entry {
    url: String,
    normalized: String,
    #[serde(flatten)]
    meta: LinkMetadata,
    /// True when the lookup succeeded and the result is held in the cache.
    cached: bool,
}

fn init_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let strategy = if args.inline_favicons {
        FaviconStrategy::Inline
    } else {
        FaviconStrategy::Candidate
    };
    let resolver = Resolver::builder()
        .max_concurrency(args.concurrency)
        .timeout(Duration::from_secs(args.timeout))
        .max_page_bytes(args.max_bytes)
        .favicon_strategy(strategy)
        .build()?;

    let start = Instant::now();
    let results = resolver.resolve_many(args.urls.as_slice()).await;
    let elapsed = start.elapsed();

    let entries: Vec<Entry> = args
        .urls
        .iter()
        .zip(results)
        .map(|(url, meta)| Entry {
            url: url.clone(),
            normalized: normalize(url),
            cached: resolver.get_cached(url).is_some(),
            meta,
        })
        .collect();

    let output = if entries.len() == 1 {
        serde_json::to_value(&entries[0])?
    } else {
        serde_json::to_value(&entries)?
    };

    if args.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    Ok(())
}
