pub mod geocode;
pub mod search;
pub mod status;
pub mod vectorize;
