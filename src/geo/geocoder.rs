use std::collections::HashSet;

use serde::Serialize;

use super::gazetteer::{Coordinates, Gazetteer};
use crate::error::Result;
use crate::search::context::EntityCounts;

/// A resolved place from a context window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodedPoint {
    pub place: String,
    pub latitude: f64,
    pub longitude: f64,
    pub mentions: usize,
}

/// Coordinates for one place name, `None` when the gazetteer has no match.
pub fn geocode(gazetteer: &dyn Gazetteer, place_name: &str) -> Result<Option<Coordinates>> {
    gazetteer.lookup(place_name)
}

/// Geocode every entity not in `exclusions`; unresolved names are dropped.
///
/// Points come back most-mentioned first, then by name. A gazetteer outage
/// aborts the whole call.
pub fn geocode_context(
    gazetteer: &dyn Gazetteer,
    entities: &EntityCounts,
    exclusions: &HashSet<String>,
) -> Result<Vec<GeocodedPoint>> {
    let mut points = Vec::new();

    for (place, &mentions) in entities {
        if place.trim().is_empty() || exclusions.contains(place) {
            tracing::debug!(place = %place, "skipping excluded entity");
            continue;
        }

        match geocode(gazetteer, place)? {
            Some(coords) => points.push(GeocodedPoint {
                place: place.clone(),
                latitude: coords.latitude,
                longitude: coords.longitude,
                mentions,
            }),
            None => tracing::debug!(place = %place, "no gazetteer match"),
        }
    }

    points.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.place.cmp(&b.place)));
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct StubGazetteer {
        places: HashMap<&'static str, Coordinates>,
        asked: RefCell<Vec<String>>,
    }

    impl StubGazetteer {
        fn new() -> Self {
            let mut places = HashMap::new();
            places.insert("Paris", Coordinates { latitude: 48.85, longitude: 2.35 });
            places.insert("Blois", Coordinates { latitude: 47.59, longitude: 1.33 });
            places.insert("Athos", Coordinates { latitude: 40.16, longitude: 24.33 });
            Self {
                places,
                asked: RefCell::new(Vec::new()),
            }
        }
    }

    impl Gazetteer for StubGazetteer {
        fn lookup(&self, place_name: &str) -> Result<Option<Coordinates>> {
            self.asked.borrow_mut().push(place_name.to_string());
            Ok(self.places.get(place_name).copied())
        }
    }

    struct DownGazetteer;

    impl Gazetteer for DownGazetteer {
        fn lookup(&self, _place_name: &str) -> Result<Option<Coordinates>> {
            Err(Error::GazetteerUnavailable("connection refused".to_string()))
        }
    }

    fn counts(pairs: &[(&str, usize)]) -> EntityCounts {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_geocode_paris() {
        let coords = geocode(&StubGazetteer::new(), "Paris").unwrap();
        assert_eq!(coords, Some(Coordinates { latitude: 48.85, longitude: 2.35 }));
        assert_eq!(geocode(&StubGazetteer::new(), "Xyzzyplace").unwrap(), None);
    }

    #[test]
    fn test_exclusions_win_over_mention_count() {
        let gazetteer = StubGazetteer::new();
        let entities = counts(&[("Athos", 40), ("Paris", 2), ("Blois", 5), ("Nowhere", 1)]);
        let exclusions = HashSet::from(["Athos".to_string()]);

        let points = geocode_context(&gazetteer, &entities, &exclusions).unwrap();
        let places: Vec<&str> = points.iter().map(|p| p.place.as_str()).collect();
        assert_eq!(places, vec!["Blois", "Paris"]);
        assert_eq!(points[0].mentions, 5);
        assert!(!gazetteer.asked.borrow().contains(&"Athos".to_string()));
    }

    #[test]
    fn test_outage_is_not_an_empty_result() {
        let entities = counts(&[("Paris", 1)]);
        let err = geocode_context(&DownGazetteer, &entities, &HashSet::new()).unwrap_err();
        assert!(matches!(err, Error::GazetteerUnavailable(_)));
    }
}
