//! Place-name lookup.
//!
//! The optimizer only ever sees coordinates; names are resolved here first.
//! `Gazetteer` is an offline lookup table loaded from a `name,lat,lng` CSV.

use crate::error::GeocodeError;
use crate::instance::Point;
use serde::Deserialize;
use std::path::Path;

/// Resolves a free-text place name to its best-matching coordinates
pub trait Geocoder {
    fn locate(&self, name: &str) -> Result<Point, GeocodeError>;
}

#[derive(Debug, Clone, Deserialize)]
struct GazetteerRow {
    name: String,
    lat: f64,
    lng: f64,
}

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    point: Point,
}

/// In-memory table of named places
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    entries: Vec<Entry>,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, point: Point) {
        self.entries.push(Entry { key: normalize(name), point });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a gazetteer from a CSV file with a `name,lat,lng` header
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, GeocodeError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| GeocodeError::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_reader(reader)
    }

    fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self, GeocodeError> {
        let mut gazetteer = Gazetteer::new();
        for (i, row) in reader.deserialize::<GazetteerRow>().enumerate() {
            // header is line 1
            let row = row.map_err(|e| GeocodeError::Load(format!("row {}: {}", i + 2, e)))?;
            gazetteer.insert(&row.name, Point::new(row.lat, row.lng));
        }
        log::debug!("loaded gazetteer with {} places", gazetteer.len());
        Ok(gazetteer)
    }
}

impl Geocoder for Gazetteer {
    /// Exact match first, then prefix, then substring; first entry wins within a tier
    fn locate(&self, name: &str) -> Result<Point, GeocodeError> {
        let query = normalize(name);
        if query.is_empty() {
            return Err(GeocodeError::NotFound(name.to_string()));
        }

        self.entries
            .iter()
            .find(|e| e.key == query)
            .or_else(|| self.entries.iter().find(|e| e.key.starts_with(&query)))
            .or_else(|| self.entries.iter().find(|e| e.key.contains(&query)))
            .map(|e| e.point)
            .ok_or_else(|| GeocodeError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Gazetteer {
        let data = "name,lat,lng\nNew Delhi,28.6139,77.2090\nDelhi Cantonment,28.5900,77.1300\nMumbai,19.0760,72.8777\nNavi Mumbai,19.0330,73.0297\n";
        Gazetteer::from_reader(csv::Reader::from_reader(data.as_bytes())).unwrap()
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let g = sample();
        assert_eq!(g.locate("  mumbai ").unwrap(), Point::new(19.0760, 72.8777));
    }

    #[test]
    fn test_prefix_then_substring() {
        let g = sample();
        assert_eq!(g.locate("Delhi").unwrap(), Point::new(28.5900, 77.1300));
        assert_eq!(g.locate("navi").unwrap(), Point::new(19.0330, 73.0297));
        assert_eq!(g.locate("ew del").unwrap(), Point::new(28.6139, 77.2090));
    }

    #[test]
    fn test_not_found_carries_name() {
        let g = sample();
        match g.locate("Atlantis") {
            Err(GeocodeError::NotFound(name)) => assert_eq!(name, "Atlantis"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(g.locate("   ").is_err());
    }

    #[test]
    fn test_from_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.csv");
        std::fs::write(&path, "name,lat,lng\nParis,48.8566,2.3522\n").unwrap();
        let g = Gazetteer::from_csv(&path).unwrap();
        assert_eq!(g.len(), 1);

        std::fs::write(&path, "name,lat,lng\nParis,north,2.3522\n").unwrap();
        assert!(matches!(Gazetteer::from_csv(&path), Err(GeocodeError::Load(_))));
    }
}
