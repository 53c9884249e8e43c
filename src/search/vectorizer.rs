//! Vectorizer capability and the annotated documents it produces.

use serde::{Deserialize, Serialize};

use super::embedding::{cosine_similarity, EmbeddingModel, EMBEDDING_DIM};
use crate::core::entities::{extract_entities, EntitySpan};
use crate::error::{Error, Result};

/// A vectorized, entity-tagged passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    pub text: String,
    pub vector: Vec<f32>,
    pub entities: Vec<EntitySpan>,
}

impl AnnotatedDocument {
    pub fn similarity(&self, other: &[f32]) -> f32 {
        cosine_similarity(&self.vector, other)
    }

    pub fn entity_texts(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.text.as_str())
    }
}

/// Text-annotation model.
///
/// `fingerprint` identifies the vocabulary: documents are only comparable
/// with vectors produced under the same fingerprint.
pub trait Vectorizer {
    fn fingerprint(&self) -> String;

    fn annotate(&self, text: &str) -> Result<AnnotatedDocument>;

    /// Single-token vocabulary lookup.
    fn lexeme(&self, word: &str) -> Result<Vec<f32>>;

    /// Annotate in order. The first failing passage aborts the batch and is
    /// reported by its position in `texts`.
    fn annotate_batch(&self, texts: &[&str]) -> Result<Vec<AnnotatedDocument>> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| {
                self.annotate(text).map_err(|e| Error::Vectorize {
                    index,
                    reason: match e {
                        Error::Vectorize { reason, .. } => reason,
                        other => other.to_string(),
                    },
                })
            })
            .collect()
    }
}

/// Built-in model: HTP vectors plus capitalisation-based entity spans.
#[derive(Default)]
pub struct HtpVectorizer {
    model: EmbeddingModel,
}

impl HtpVectorizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Vectorizer for HtpVectorizer {
    fn fingerprint(&self) -> String {
        format!("htp-v1-{}x{}", EMBEDDING_DIM, self.model.num_moduli())
    }

    fn annotate(&self, text: &str) -> Result<AnnotatedDocument> {
        Ok(AnnotatedDocument {
            text: text.to_string(),
            vector: self.model.embed(text),
            entities: extract_entities(text),
        })
    }

    fn lexeme(&self, word: &str) -> Result<Vec<f32>> {
        Ok(self.model.embed_token(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingVectorizer;

    impl Vectorizer for FailingVectorizer {
        fn fingerprint(&self) -> String {
            "failing".to_string()
        }

        fn annotate(&self, text: &str) -> Result<AnnotatedDocument> {
            if text.contains("bad") {
                return Err(Error::Corpus("model rejected input".to_string()));
            }
            if text.contains("odd") {
                // Models know nothing about batch positions.
                return Err(Error::Vectorize {
                    index: 999,
                    reason: "unsupported script".to_string(),
                });
            }
            HtpVectorizer::new().annotate(text)
        }

        fn lexeme(&self, word: &str) -> Result<Vec<f32>> {
            HtpVectorizer::new().lexeme(word)
        }
    }

    #[test]
    fn test_annotate_tags_entities() {
        let doc = HtpVectorizer::new().annotate("Lyon is industrial.").unwrap();
        assert_eq!(doc.entity_texts().collect::<Vec<_>>(), vec!["Lyon"]);
        assert_eq!(doc.vector.len(), EMBEDDING_DIM);
        assert!((doc.similarity(&doc.vector) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_batch_preserves_order() {
        let texts = ["Paris is lovely.", "Lyon is industrial."];
        let docs = HtpVectorizer::new().annotate_batch(&texts).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].text, texts[0]);
        assert_eq!(docs[1].text, texts[1]);
    }

    #[test]
    fn test_batch_aborts_on_first_failure() {
        let texts = ["fine", "bad one", "also bad"];
        let err = FailingVectorizer.annotate_batch(&texts).unwrap_err();
        match err {
            Error::Vectorize { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_batch_reports_position_not_model_index() {
        let texts = ["fine", "fine", "odd one"];
        match FailingVectorizer.annotate_batch(&texts).unwrap_err() {
            Error::Vectorize { index, reason } => {
                assert_eq!(index, 2);
                assert_eq!(reason, "unsupported script");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
