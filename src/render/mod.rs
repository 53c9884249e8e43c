//! Human-facing output: result listings and place maps.

pub mod map;
pub mod results;

pub use map::{render_map, MapRenderer, SvgMapRenderer};
pub use results::{render_json, render_results};
