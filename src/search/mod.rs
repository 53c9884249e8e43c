//! Semantic passage search
//!
//! vectorize once -> serialized batch -> rank -> context window

pub mod batch;
pub mod context;
pub mod embedding;
pub mod engine;
pub mod ranker;
pub mod vectorizer;

pub use batch::{inspect_batch, load_batch, vectorize_batch, BatchInfo};
pub use context::{build_context, collect_entities, EntityCounts};
pub use engine::{FieldSpec, SearchHit, SearchOptions, SearchReport, SearchSession};
pub use ranker::{rank, Match};
pub use vectorizer::{AnnotatedDocument, HtpVectorizer, Vectorizer};
