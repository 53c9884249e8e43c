//! Vectorize command - build the serialized batch

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use corpus_search::search::vectorize_batch;
use corpus_search::{Config, Corpus, HtpVectorizer};

pub fn run(
    config: &Config,
    corpus_path: Option<PathBuf>,
    column: Option<String>,
    output: Option<PathBuf>,
    quiet: bool,
    json: bool,
) -> Result<()> {
    let corpus_path = corpus_path.unwrap_or_else(|| config.corpus.path.clone());
    let column = column.unwrap_or_else(|| config.corpus.text_column.clone());
    let output = output.unwrap_or_else(|| config.artifact.path.clone());

    let corpus = Corpus::load(&corpus_path, &column)
        .with_context(|| format!("Failed to load corpus {}", corpus_path.display()))?;

    if !json {
        println!(
            "{} Vectorizing {} passages from {}",
            "→".dimmed(),
            corpus.len().to_string().cyan(),
            corpus_path.display()
        );
    }

    let start = std::time::Instant::now();
    let show_progress = !quiet && !json && std::io::stderr().is_terminal();
    let model = HtpVectorizer::new();
    let info = vectorize_batch(&corpus.texts(), &model, &output, show_progress)
        .context("Vectorization failed")?;
    let duration_ms = start.elapsed().as_millis();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "path": info.path.display().to_string(),
                "documents": info.document_count,
                "entities": info.entity_count,
                "model": info.fingerprint,
                "size_bytes": info.size_bytes,
                "duration_ms": duration_ms,
            })
        );
    } else {
        println!(
            "{} Vectorized {} passages in {:.2}s",
            "✓".green().bold(),
            info.document_count.to_string().cyan(),
            duration_ms as f64 / 1000.0
        );
        println!("  {} {} entity mentions", "→".dimmed(), info.entity_count);
        println!("  {} Batch saved to: {}", "→".dimmed(), info.path.display());
    }

    Ok(())
}
