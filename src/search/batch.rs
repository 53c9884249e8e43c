//! Serialized batch: every annotated document of a corpus in one file.
//!
//! Layout: `[magic "CSB1"][bincode payload][u32 CRC32 BE of payload]`.
//! Documents are stored positionally; row `i` of the corpus is document `i`.
//! Any change to the corpus or the model requires re-running the batch.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use super::vectorizer::{AnnotatedDocument, Vectorizer};
use crate::error::{Error, Result};

const BATCH_MAGIC: &[u8; 4] = b"CSB1";
const CHUNK_SIZE: usize = 64;

#[derive(Serialize, Deserialize)]
struct BatchPayload {
    fingerprint: String,
    created_at: i64,
    documents: Vec<AnnotatedDocument>,
}

/// What a write or an inspection reports about an artifact.
#[derive(Debug, Clone, Serialize)]
pub struct BatchInfo {
    pub path: PathBuf,
    pub fingerprint: String,
    pub created_at: i64,
    pub document_count: usize,
    pub entity_count: usize,
    pub size_bytes: u64,
}

impl BatchInfo {
    /// Whether `vectorizer` can load this batch.
    pub fn is_compatible(&self, vectorizer: &dyn Vectorizer) -> bool {
        self.fingerprint == vectorizer.fingerprint()
    }
}

/// Vectorize every passage and write the batch to `path`.
pub fn vectorize_batch(
    passages: &[&str],
    vectorizer: &dyn Vectorizer,
    path: &Path,
    show_progress: bool,
) -> Result<BatchInfo> {
    let bar = if show_progress {
        let bar = ProgressBar::new(passages.len() as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} passages ({eta})")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut documents = Vec::with_capacity(passages.len());
    for (chunk_no, chunk) in passages.chunks(CHUNK_SIZE).enumerate() {
        let offset = chunk_no * CHUNK_SIZE;
        let annotated = vectorizer.annotate_batch(chunk).map_err(|e| match e {
            Error::Vectorize { index, reason } => Error::Vectorize {
                index: offset + index,
                reason,
            },
            other => other,
        })?;
        bar.inc(chunk.len() as u64);
        documents.extend(annotated);
    }
    bar.finish_and_clear();

    let payload = BatchPayload {
        fingerprint: vectorizer.fingerprint(),
        created_at: chrono::Utc::now().timestamp(),
        documents,
    };
    let size_bytes = write_payload(&payload, path)?;

    tracing::info!(
        documents = payload.documents.len(),
        bytes = size_bytes,
        path = %path.display(),
        "wrote serialized batch"
    );

    Ok(BatchInfo {
        path: path.to_path_buf(),
        entity_count: payload.documents.iter().map(|d| d.entities.len()).sum(),
        document_count: payload.documents.len(),
        fingerprint: payload.fingerprint,
        created_at: payload.created_at,
        size_bytes,
    })
}

/// Read the batch back, one document per original passage, in order.
pub fn load_batch(path: &Path, vectorizer: &dyn Vectorizer) -> Result<Vec<AnnotatedDocument>> {
    let payload = read_payload(path)?;

    let expected = vectorizer.fingerprint();
    if payload.fingerprint != expected {
        return Err(Error::IncompatibleVocabulary {
            expected,
            found: payload.fingerprint,
        });
    }

    tracing::info!(
        documents = payload.documents.len(),
        path = %path.display(),
        "loaded serialized batch"
    );
    Ok(payload.documents)
}

/// Header summary without checking the model.
pub fn inspect_batch(path: &Path) -> Result<BatchInfo> {
    let size_bytes = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let payload = read_payload(path)?;

    Ok(BatchInfo {
        path: path.to_path_buf(),
        entity_count: payload.documents.iter().map(|d| d.entities.len()).sum(),
        document_count: payload.documents.len(),
        fingerprint: payload.fingerprint,
        created_at: payload.created_at,
        size_bytes,
    })
}

fn write_payload(payload: &BatchPayload, path: &Path) -> Result<u64> {
    let bytes = bincode::serialize(payload).map_err(|e| Error::ArtifactCorrupt(e.to_string()))?;
    let crc = crc32fast::hash(&bytes);

    let mut output = Vec::with_capacity(bytes.len() + 8);
    output.extend_from_slice(BATCH_MAGIC);
    output.extend_from_slice(&bytes);
    output.extend_from_slice(&crc.to_be_bytes());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    // Atomic write: temp file, then rename
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    fs::write(&tmp_path, &output)?;
    fs::rename(&tmp_path, path)?;

    Ok(output.len() as u64)
}

fn read_payload(path: &Path) -> Result<BatchPayload> {
    if !path.exists() {
        return Err(Error::ArtifactMissing(path.to_path_buf()));
    }
    let raw = fs::read(path)?;

    if raw.len() < BATCH_MAGIC.len() + 4 || &raw[..BATCH_MAGIC.len()] != BATCH_MAGIC {
        return Err(Error::ArtifactCorrupt(format!(
            "{} is not a serialized batch",
            path.display()
        )));
    }

    let (body, crc_bytes) = raw[BATCH_MAGIC.len()..].split_at(raw.len() - BATCH_MAGIC.len() - 4);
    let stored_crc = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    let computed_crc = crc32fast::hash(body);
    if stored_crc != computed_crc {
        return Err(Error::ArtifactCorrupt(format!(
            "CRC32 mismatch: expected {:#010x}, got {:#010x}",
            stored_crc, computed_crc
        )));
    }
    tracing::debug!("batch CRC32 verified: {:#010x}", stored_crc);

    bincode::deserialize(body).map_err(|e| Error::ArtifactCorrupt(e.to_string()))
}
