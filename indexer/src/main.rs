use anyhow::Result;
use clap::{Parser, Subcommand};
use indexer::{run_build, BuildArgs};
use ngram_core::discover::DEFAULT_EXTENSIONS;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a character n-gram index over a directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every eligible file under a directory
    Build {
        /// Directory to index
        input: PathBuf,
        /// Where the decoder, index and meta files are written
        #[arg(long, default_value = ".")]
        output: PathBuf,
        /// Skip files larger than this many MiB
        #[arg(long, default_value_t = 1)]
        max_size_mib: u64,
        #[arg(long, default_value_t = 4)]
        min_gram: usize,
        #[arg(long, default_value_t = 10)]
        max_gram: usize,
        /// File extension to include (repeatable)
        #[arg(long = "ext")]
        extensions: Vec<String>,
        /// Index files regardless of extension
        #[arg(long, default_value_t = false, conflicts_with = "extensions")]
        all_extensions: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, max_size_mib, min_gram, max_gram, extensions, all_extensions } => {
            let extensions = if all_extensions {
                Vec::new()
            } else if extensions.is_empty() {
                DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
            } else {
                extensions
            };
            let args = BuildArgs { input, output, max_size_mib, min_gram, max_gram, extensions };

            println!("Searching for files in: {}", args.input.display());
            println!("N-gram range: [{}, {}]", args.min_gram, args.max_gram);
            let summary = run_build(&args)?;
            let Some(paths) = summary.paths else {
                println!("No files found matching criteria. Exiting.");
                return Ok(());
            };
            println!("Found {} files to index.", summary.files);
            for skipped in &summary.skipped {
                println!("Skipped {}: {}", skipped.path.display(), skipped.reason);
            }
            println!("Index generated with {} unique n-grams.", summary.num_grams);
            println!("Saved decoder to {}", paths.decoder().display());
            println!("Saved index to {}", paths.index().display());
            Ok(())
        }
    }
}
