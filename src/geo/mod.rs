//! Place-name geocoding against an external gazetteer.

pub mod gazetteer;
pub mod geocoder;

pub use gazetteer::{Coordinates, Gazetteer, GazetteerTransport, GeoNames, HttpTransport};
pub use geocoder::{geocode, geocode_context, GeocodedPoint};
