//! Search session - combines corpus, serialized batch and vectorizer
//!
//! rank -> context -> (optional) geocode. Nothing here mutates the corpus:
//! every search returns a fresh `SearchReport`.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use super::batch::load_batch;
use super::context::{build_context, collect_entities, EntityCounts};
use super::ranker::rank;
use super::vectorizer::{AnnotatedDocument, Vectorizer};
use crate::core::corpus::Corpus;
use crate::error::{Error, Result};
use crate::geo::{geocode_context, Gazetteer, GeocodedPoint};

/// A metadata column to show with every hit, under a display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub label: String,
    pub column: String,
}

impl FieldSpec {
    /// Parse `LABEL=COLUMN`; a bare `COLUMN` is its own label.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('=') {
            Some((label, column)) => Self {
                label: label.trim().to_string(),
                column: column.trim().to_string(),
            },
            None => Self {
                label: spec.trim().to_string(),
                column: spec.trim().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub entries: usize,
    pub context_size: usize,
    pub fields: Vec<FieldSpec>,
    pub exclusions: HashSet<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            entries: 5,
            context_size: 2,
            fields: Vec::new(),
            exclusions: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldValue {
    pub label: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub index: usize,
    pub score: f32,
    pub fields: Vec<FieldValue>,
    pub context: String,
    pub entities: EntityCounts,
    /// Present only when the search was run with a gazetteer.
    pub points: Option<Vec<GeocodedPoint>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

pub struct SearchSession<V: Vectorizer> {
    vectorizer: V,
    corpus: Corpus,
    documents: Vec<AnnotatedDocument>,
}

impl<V: Vectorizer> SearchSession<V> {
    /// Pair a corpus with its documents. Alignment is positional, so the
    /// counts must agree.
    pub fn new(corpus: Corpus, documents: Vec<AnnotatedDocument>, vectorizer: V) -> Result<Self> {
        if corpus.len() != documents.len() {
            return Err(Error::MisalignedBatch {
                documents: documents.len(),
                passages: corpus.len(),
            });
        }
        Ok(Self {
            vectorizer,
            corpus,
            documents,
        })
    }

    /// Load the serialized batch for `corpus` from `artifact`.
    pub fn open(corpus: Corpus, artifact: &Path, vectorizer: V) -> Result<Self> {
        let documents = load_batch(artifact, &vectorizer)?;
        Self::new(corpus, documents, vectorizer)
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn documents(&self) -> &[AnnotatedDocument] {
        &self.documents
    }

    /// Run one query. With a gazetteer every hit also carries the geocoded
    /// places of its context window.
    pub fn search(
        &self,
        query: &str,
        options: &SearchOptions,
        gazetteer: Option<&dyn Gazetteer>,
    ) -> Result<SearchReport> {
        let matches = rank(query, &self.documents, options.entries, &self.vectorizer)?;
        tracing::info!(query, hits = matches.len(), "search complete");

        let mut hits = Vec::with_capacity(matches.len());
        for m in matches {
            let context = build_context(m.index, options.context_size, &self.corpus)?;
            let entities = collect_entities(m.index, options.context_size, &self.documents)?;
            let points = match gazetteer {
                Some(g) => Some(geocode_context(g, &entities, &options.exclusions)?),
                None => None,
            };

            hits.push(SearchHit {
                index: m.index,
                score: m.score,
                fields: self.field_values(m.index, &options.fields),
                context,
                entities,
                points,
            });
        }

        Ok(SearchReport {
            query: query.to_string(),
            hits,
        })
    }

    fn field_values(&self, index: usize, fields: &[FieldSpec]) -> Vec<FieldValue> {
        fields
            .iter()
            .map(|f| FieldValue {
                label: f.label.clone(),
                value: self.corpus.metadata(index, &f.column),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::corpus::Passage;
    use crate::search::vectorizer::HtpVectorizer;

    fn session() -> SearchSession<HtpVectorizer> {
        let model = HtpVectorizer::new();
        let corpus = Corpus::from_texts(["Paris is lovely.", "Lyon is industrial.", "The weather was bad."]);
        let documents = model.annotate_batch(&corpus.texts()).unwrap();
        SearchSession::new(corpus, documents, model).unwrap()
    }

    #[test]
    fn test_field_spec_parse() {
        assert_eq!(
            FieldSpec::parse("Book=book_title"),
            FieldSpec {
                label: "Book".to_string(),
                column: "book_title".to_string()
            }
        );
        assert_eq!(FieldSpec::parse("chapter").label, "chapter");
    }

    #[test]
    fn test_weather_scenario() {
        let options = SearchOptions {
            entries: 1,
            context_size: 1,
            ..SearchOptions::default()
        };
        let report = session().search("weather", &options, None).unwrap();

        assert_eq!(report.hits.len(), 1);
        let hit = &report.hits[0];
        assert_eq!(hit.index, 2);
        assert_eq!(hit.context, "Lyon is industrial.\nThe weather was bad.");
        assert_eq!(hit.entities.get("Lyon"), Some(&1));
        assert!(hit.points.is_none());
    }

    #[test]
    fn test_misaligned_batch_rejected() {
        let model = HtpVectorizer::new();
        let documents = model.annotate_batch(&["only one"]).unwrap();
        let corpus = Corpus::from_texts(["one", "two"]);
        let err = SearchSession::new(corpus, documents, model).err().unwrap();
        assert!(matches!(
            err,
            Error::MisalignedBatch {
                documents: 1,
                passages: 2
            }
        ));
    }

    #[test]
    fn test_fields_are_copied_from_corpus() {
        let model = HtpVectorizer::new();
        let mut passage = Passage::new("The weather was bad.");
        passage
            .metadata
            .insert("book".to_string(), serde_json::json!("Twenty Years After"));
        let corpus = Corpus::from_passages(vec![passage]);
        let documents = model.annotate_batch(&corpus.texts()).unwrap();
        let session = SearchSession::new(corpus, documents, model).unwrap();

        let options = SearchOptions {
            fields: vec![FieldSpec::parse("Book=book"), FieldSpec::parse("chapter")],
            ..SearchOptions::default()
        };
        let report = session.search("weather", &options, None).unwrap();
        let fields = &report.hits[0].fields;
        assert_eq!(fields[0].value.as_deref(), Some("Twenty Years After"));
        assert_eq!(fields[1].value, None);
    }
}
