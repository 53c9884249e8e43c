//! corpus-search library
//!
//! Semantic passage search over a literary corpus, with context windows and
//! place-name mapping.
//!
//! # Modules
//!
//! - `core`: Corpus loading and entity spans
//! - `search`: Vectorizer, serialized batch, ranking and context windows
//! - `geo`: Gazetteer client and context geocoding
//! - `render`: Terminal/JSON output and SVG maps

pub mod config;
pub mod core;
pub mod error;
pub mod geo;
pub mod render;
pub mod search;

// Re-exports for convenience
pub use config::Config;
pub use core::corpus::{Corpus, Passage};
pub use core::entities::{extract_entities, EntitySpan};
pub use error::{Error, Result};
pub use geo::{geocode, geocode_context, Gazetteer, GeoNames, GeocodedPoint};
pub use search::{
    build_context, collect_entities, load_batch, rank, vectorize_batch, AnnotatedDocument,
    HtpVectorizer, Match, SearchOptions, SearchSession, Vectorizer,
};
