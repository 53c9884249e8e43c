use std::cmp::Ordering;

use serde::Serialize;

use super::vectorizer::{AnnotatedDocument, Vectorizer};
use crate::error::Result;

/// A ranked row: corpus index and similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Match {
    pub index: usize,
    pub score: f32,
}

/// Queries containing whitespace are vectorized as phrases, anything else
/// is looked up as a single token.
pub fn query_vector(query: &str, vectorizer: &dyn Vectorizer) -> Result<Vec<f32>> {
    if query.contains(char::is_whitespace) {
        Ok(vectorizer.annotate(query)?.vector)
    } else {
        vectorizer.lexeme(query)
    }
}

/// Score every document against the query and keep the `top_k` best.
///
/// Always returns `min(top_k, documents.len())` matches, highest score
/// first; equal scores keep corpus order.
pub fn rank(
    query: &str,
    documents: &[AnnotatedDocument],
    top_k: usize,
    vectorizer: &dyn Vectorizer,
) -> Result<Vec<Match>> {
    let query_vec = query_vector(query, vectorizer)?;
    Ok(rank_vector(&query_vec, documents, top_k))
}

/// `rank` for an already computed query vector.
pub fn rank_vector(query_vec: &[f32], documents: &[AnnotatedDocument], top_k: usize) -> Vec<Match> {
    let mut matches: Vec<Match> = documents
        .iter()
        .enumerate()
        .map(|(index, doc)| Match {
            index,
            score: doc.similarity(query_vec),
        })
        .collect();

    matches.sort_by(|a, b| descending_score(a.score, b.score));
    matches.truncate(top_k);

    for m in &matches {
        tracing::debug!(index = m.index, score = m.score, "ranked match");
    }
    matches
}

/// NaN sorts after every real score.
fn descending_score(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::vectorizer::HtpVectorizer;

    fn doc(vector: Vec<f32>) -> AnnotatedDocument {
        AnnotatedDocument {
            text: String::new(),
            vector,
            entities: Vec::new(),
        }
    }

    #[test]
    fn test_rank_vector_sorted_and_truncated() {
        let docs = vec![
            doc(vec![0.0, 1.0]),
            doc(vec![1.0, 0.0]),
            doc(vec![1.0, 1.0]),
            doc(vec![-1.0, 0.0]),
        ];
        let matches = rank_vector(&[1.0, 0.0], &docs, 3);
        let indices: Vec<usize> = matches.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![1, 2, 0]);
        assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_top_k_larger_than_corpus_returns_all() {
        let docs = vec![doc(vec![0.0, 1.0]), doc(vec![1.0, 0.0])];
        let matches = rank_vector(&[1.0, 0.0], &docs, 10);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].index, 1);
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let docs = vec![doc(vec![1.0, 0.0]), doc(vec![0.0, 0.0]), doc(vec![1.0, 0.0])];
        let matches = rank_vector(&[1.0, 0.0], &docs, 3);
        let indices: Vec<usize> = matches.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 2, 1]);
    }

    #[test]
    fn test_nan_scores_sort_last() {
        let mut scores = vec![f32::NAN, 0.2, 0.9];
        scores.sort_by(|a, b| descending_score(*a, *b));
        assert_eq!(&scores[..2], &[0.9, 0.2]);
        assert!(scores[2].is_nan());
    }

    #[test]
    fn test_single_word_and_phrase_queries() -> Result<()> {
        let model = HtpVectorizer::new();
        let corpus = ["Paris is lovely.", "Lyon is industrial.", "The weather was bad."];
        let docs = model.annotate_batch(&corpus)?;

        let matches = rank("weather", &docs, 1, &model)?;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].index, 2);

        let matches = rank("bad weather", &docs, 3, &model)?;
        assert_eq!(matches[0].index, 2);
        assert_eq!(matches.len(), 3);
        Ok(())
    }
}
