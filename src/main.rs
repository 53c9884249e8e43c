mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use corpus_search::Config;

#[derive(Parser)]
#[command(name = "corpus-search")]
#[command(about = "Semantic passage search with context windows and place maps", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Config file (default: corpus-search.toml)")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Vectorize the corpus into a serialized batch
    Vectorize {
        #[arg(long, help = "Corpus file (.jsonl, .json or plain text)")]
        corpus: Option<PathBuf>,
        #[arg(long, help = "Column holding the passage text")]
        column: Option<String>,
        #[arg(long, short, help = "Where to write the serialized batch")]
        output: Option<PathBuf>,
        #[arg(long, short, help = "No progress bar")]
        quiet: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Find the passages closest to a query (prompts when QUERY is omitted)
    Search {
        query: Option<String>,
        #[arg(long, help = "Corpus file the batch was built from")]
        corpus: Option<PathBuf>,
        #[arg(long, help = "Column holding the passage text")]
        column: Option<String>,
        #[arg(long, help = "Serialized batch to search")]
        artifact: Option<PathBuf>,
        #[arg(long, short = 'n', help = "Number of results")]
        entries: Option<usize>,
        #[arg(long, short, help = "Rows of context before and after each match")]
        context: Option<usize>,
        #[arg(long, help = "Geocode places in each context and draw a map")]
        map: bool,
        #[arg(long, value_name = "LABEL=COLUMN", help = "Metadata column to show with each result")]
        show: Vec<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show serialized batch status
    Status {
        #[arg(long, help = "Serialized batch to inspect")]
        artifact: Option<PathBuf>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Look up one place name in the gazetteer
    Geocode {
        place: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Vectorize {
            corpus,
            column,
            output,
            quiet,
            json,
        } => commands::vectorize::run(&config, corpus, column, output, quiet, json),
        Commands::Search {
            query,
            corpus,
            column,
            artifact,
            entries,
            context,
            map,
            show,
            json,
        } => commands::search::run(
            &config,
            commands::search::SearchArgs {
                query,
                corpus,
                column,
                artifact,
                entries,
                context,
                map,
                show,
                json,
            },
        ),
        Commands::Status { artifact, json } => commands::status::run(&config, artifact, json),
        Commands::Geocode { place, json } => commands::geocode::run(&config, &place, json),
    }
}
