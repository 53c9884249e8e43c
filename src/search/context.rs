//! Context windows around a matched row.
//!
//! The window of `w` around row `i` is rows `i-w ..= i+w`, clipped to the
//! corpus. Each row appears once, in corpus order.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use super::vectorizer::AnnotatedDocument;
use crate::core::corpus::Corpus;
use crate::error::{Error, Result};

/// Mention count per entity text.
pub type EntityCounts = BTreeMap<String, usize>;

/// Rows `index - window ..= index + window`, clipped to the corpus.
pub fn window_rows(index: usize, window: usize, len: usize) -> Result<RangeInclusive<usize>> {
    if index >= len {
        return Err(Error::RowOutOfRange { index, len });
    }
    let first = index.saturating_sub(window);
    let last = index.saturating_add(window).min(len - 1);
    Ok(first..=last)
}

/// Newline-joined text of the window around `index`.
pub fn build_context(index: usize, window: usize, corpus: &Corpus) -> Result<String> {
    let rows = window_rows(index, window, corpus.len())?;
    let lines: Vec<&str> = rows
        .filter_map(|row| corpus.passage(row))
        .map(|p| p.text.as_str())
        .collect();
    Ok(lines.join("\n"))
}

/// Entity mentions across the window around `index`.
pub fn collect_entities(
    index: usize,
    window: usize,
    documents: &[AnnotatedDocument],
) -> Result<EntityCounts> {
    let rows = window_rows(index, window, documents.len())?;
    let mut counts = EntityCounts::new();
    for doc in &documents[rows] {
        for entity in doc.entity_texts() {
            *counts.entry(entity.to_string()).or_insert(0) += 1;
        }
    }
    Ok(counts)
}
