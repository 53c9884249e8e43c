//! Search command - rank, context, optional place maps

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use corpus_search::render::{render_json, render_results, MapRenderer, SvgMapRenderer};
use corpus_search::search::FieldSpec;
use corpus_search::{Config, Corpus, Gazetteer, GeoNames, HtpVectorizer, SearchOptions, SearchSession};

pub struct SearchArgs {
    pub query: Option<String>,
    pub corpus: Option<PathBuf>,
    pub column: Option<String>,
    pub artifact: Option<PathBuf>,
    pub entries: Option<usize>,
    pub context: Option<usize>,
    pub map: bool,
    pub show: Vec<String>,
    pub json: bool,
}

pub fn run(config: &Config, args: SearchArgs) -> Result<()> {
    let query = match args.query {
        Some(q) => q,
        None => prompt_query()?,
    };
    let query = query.trim();
    if query.is_empty() {
        bail!("Empty search term");
    }

    let corpus_path = args.corpus.unwrap_or_else(|| config.corpus.path.clone());
    let column = args.column.unwrap_or_else(|| config.corpus.text_column.clone());
    let artifact = args.artifact.unwrap_or_else(|| config.artifact.path.clone());

    let corpus = Corpus::load(&corpus_path, &column)
        .with_context(|| format!("Failed to load corpus {}", corpus_path.display()))?;
    let session = SearchSession::open(corpus, &artifact, HtpVectorizer::new())
        .with_context(|| format!("Failed to open serialized batch {}", artifact.display()))?;

    let options = SearchOptions {
        entries: args.entries.unwrap_or(config.search.entries),
        context_size: args.context.unwrap_or(config.search.context_size),
        fields: args.show.iter().map(|s| FieldSpec::parse(s)).collect(),
        exclusions: config.exclusions.to_set(),
    };

    let (gazetteer, renderer) = if args.map {
        let gazetteer = GeoNames::from_config(&config.gazetteer)?;
        (Some(gazetteer), Some(SvgMapRenderer::from_config(&config.map)))
    } else {
        (None, None)
    };

    let report = session.search(
        query,
        &options,
        gazetteer.as_ref().map(|g| g as &dyn Gazetteer),
    )?;
    let renderer = renderer.as_ref().map(|r| r as &dyn MapRenderer);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        render_json(&mut out, &report, renderer)?;
    } else {
        render_results(&mut out, &report, renderer)?;
    }

    Ok(())
}

/// Interactive entry point: one free-text prompt on stdin.
fn prompt_query() -> Result<String> {
    print!("Enter search term: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
