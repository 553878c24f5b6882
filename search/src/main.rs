use anyhow::Result;
use clap::Parser;
use search::{load_context, report, run_search, SearchArgs};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Find files containing a literal string using a prebuilt n-gram index", long_about = None)]
struct Args {
    /// Text to search for
    query: String,
    /// Directory the index was built from
    #[arg(long)]
    source: PathBuf,
    /// Directory holding the index files
    #[arg(long, default_value = ".")]
    index_dir: PathBuf,
    /// N-gram length for query lookups; defaults to the index's minimum
    #[arg(long)]
    gram_len: Option<usize>,
    /// Print results as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let ctx = load_context(&SearchArgs { source: args.source, index_dir: args.index_dir, gram_len: args.gram_len })?;

    let outcome = run_search(&ctx, &args.query);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report(&ctx, &args.query, &outcome))?);
        return Ok(());
    }
    if outcome.candidates.is_empty() {
        println!("no results");
        return Ok(());
    }
    println!("Found {} candidate files. Verifying...", outcome.candidates.len());
    for failure in &outcome.failures {
        eprintln!("Error verifying file {}: {}", failure.path.display(), failure.reason);
    }
    println!("Found {} files containing exact matches", outcome.matches.len());
    for path in &outcome.matches {
        println!("{}", path.display());
    }
    Ok(())
}
