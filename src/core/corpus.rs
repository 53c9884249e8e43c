use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One row of the corpus: the passage text plus whatever other columns the
/// source file carried.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub text: String,
    pub metadata: Map<String, Value>,
}

impl Passage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Map::new(),
        }
    }

    /// Metadata value rendered for display. Strings are shown bare, anything
    /// else as its JSON text.
    pub fn field(&self, column: &str) -> Option<String> {
        match self.metadata.get(column)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Ordered, read-only passage table. Row order defines adjacency.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    passages: Vec<Passage>,
}

impl Corpus {
    /// Load a corpus file.
    ///
    /// `.jsonl` is one object per line, `.json` an array of objects; any
    /// other extension is read as plain text with one passage per
    /// non-blank line.
    pub fn load(path: &Path, text_column: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Corpus(format!("{}: {}", path.display(), e)))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("jsonl") => Self::parse_jsonl(&content, text_column),
            Some("json") => Self::parse_json(&content, text_column),
            _ => Ok(Self::from_texts(
                content.lines().map(str::trim).filter(|l| !l.is_empty()),
            )),
        }
    }

    /// In-memory corpus without metadata.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            passages: texts.into_iter().map(Passage::new).collect(),
        }
    }

    pub fn from_passages(passages: Vec<Passage>) -> Self {
        Self { passages }
    }

    fn parse_jsonl(content: &str, text_column: &str) -> Result<Self> {
        let mut passages = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line)
                .map_err(|e| Error::Corpus(format!("line {}: {}", line_no + 1, e)))?;
            passages.push(row_to_passage(value, text_column, passages.len())?);
        }
        Ok(Self { passages })
    }

    fn parse_json(content: &str, text_column: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| Error::Corpus(e.to_string()))?;
        let rows = match value {
            Value::Array(rows) => rows,
            _ => return Err(Error::Corpus("expected a JSON array of rows".to_string())),
        };

        let passages = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| row_to_passage(row, text_column, i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { passages })
    }

    /// Number of passages.
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Passage at row `index`.
    pub fn passage(&self, index: usize) -> Option<&Passage> {
        self.passages.get(index)
    }

    /// All passages in row order.
    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// Display value of `column` for row `index`, if both exist.
    pub fn metadata(&self, index: usize, column: &str) -> Option<String> {
        self.passage(index)?.field(column)
    }

    /// Passage texts in row order, as fed to the vectorizer.
    pub fn texts(&self) -> Vec<&str> {
        self.passages.iter().map(|p| p.text.as_str()).collect()
    }
}

fn row_to_passage(row: Value, text_column: &str, index: usize) -> Result<Passage> {
    let mut metadata = match row {
        Value::Object(map) => map,
        _ => return Err(Error::Corpus(format!("row {} is not an object", index))),
    };

    let text = match metadata.remove(text_column) {
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(Error::Corpus(format!(
                "row {}: column '{}' is not a string",
                index, text_column
            )))
        }
        None => {
            return Err(Error::Corpus(format!(
                "row {}: missing column '{}'",
                index, text_column
            )))
        }
    };

    Ok(Passage { text, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_jsonl_keeps_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        fs::write(
            &path,
            "{\"sentence\": \"Paris is lovely.\", \"book\": \"Vicomte\", \"chapter\": 3}\n\n{\"sentence\": \"Lyon is industrial.\", \"book\": \"Vicomte\", \"chapter\": 4}\n",
        )
        .unwrap();

        let corpus = Corpus::load(&path, "sentence").unwrap();
        assert_eq!(corpus.len(), 2);
        let first = corpus.passage(0).unwrap();
        assert_eq!(first.text, "Paris is lovely.");
        assert_eq!(first.field("book").as_deref(), Some("Vicomte"));
        assert_eq!(first.field("chapter").as_deref(), Some("3"));
        assert_eq!(first.field("missing"), None);
        assert_eq!(corpus.metadata(1, "book").as_deref(), Some("Vicomte"));
        assert_eq!(corpus.metadata(9, "book"), None);
    }

    #[test]
    fn test_load_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        fs::write(&path, r#"[{"text": "a"}, {"text": "b"}, {"text": "c"}]"#).unwrap();

        let corpus = Corpus::load(&path, "text").unwrap();
        assert_eq!(corpus.texts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_load_plain_text_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        fs::write(&path, "First line.\n\n  Second line.  \n").unwrap();

        let corpus = Corpus::load(&path, "text").unwrap();
        assert_eq!(corpus.texts(), vec!["First line.", "Second line."]);
    }

    #[test]
    fn test_missing_text_column_names_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        fs::write(&path, "{\"text\": \"ok\"}\n{\"body\": \"wrong\"}\n").unwrap();

        let err = Corpus::load(&path, "text").unwrap_err();
        match err {
            Error::Corpus(msg) => assert!(msg.contains("row 1")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
