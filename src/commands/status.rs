//! Status command - summarize the serialized batch

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use corpus_search::search::inspect_batch;
use corpus_search::{Config, HtpVectorizer, Vectorizer};

pub fn run(config: &Config, artifact: Option<PathBuf>, json: bool) -> Result<()> {
    let artifact = artifact.unwrap_or_else(|| config.artifact.path.clone());

    if !artifact.exists() {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "exists": false,
                    "path": artifact.display().to_string(),
                    "error": "Serialized batch not found"
                })
            );
        } else {
            println!(
                "{} Serialized batch not found. Run {} first.",
                "!".yellow().bold(),
                "corpus-search vectorize".cyan()
            );
        }
        return Ok(());
    }

    let info = inspect_batch(&artifact)?;
    let model = HtpVectorizer::new();
    let compatible = info.is_compatible(&model);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "exists": true,
                "path": info.path.display().to_string(),
                "documents": info.document_count,
                "entities": info.entity_count,
                "model": info.fingerprint,
                "compatible": compatible,
                "created_at": info.created_at,
                "file_size_bytes": info.size_bytes,
            })
        );
        return Ok(());
    }

    println!("{}", "Batch Status".bold());
    println!();
    println!(
        "  {} {} documents",
        "→".dimmed(),
        info.document_count.to_string().cyan()
    );
    println!(
        "  {} {} entity mentions",
        "→".dimmed(),
        info.entity_count.to_string().cyan()
    );
    if compatible {
        println!("  {} Model: {}", "→".dimmed(), info.fingerprint);
    } else {
        println!(
            "  {} Model: {} (current model is {}; re-run vectorize)",
            "✗".red(),
            info.fingerprint,
            model.fingerprint()
        );
    }
    println!(
        "  {} Size: {:.2} KB",
        "→".dimmed(),
        info.size_bytes as f64 / 1024.0
    );
    let created = chrono::DateTime::from_timestamp(info.created_at, 0)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    println!("  {} Created: {}", "→".dimmed(), created);

    Ok(())
}
