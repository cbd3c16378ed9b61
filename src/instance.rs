//! Module for representing route-sequencing instances.
//!
//! A point set is supplied once per optimization and never mutated. Points are
//! identified by their position in the input, so duplicate coordinates remain
//! distinct stops. Distances are planar Euclidean over the raw coordinate
//! values; `haversine_km` exists only for human-facing reporting.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use serde::{Deserialize, Deserializer, Serialize};

/// Mean Earth radius used for reporting distances in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Self {
        Point { lat, lng }
    }

    /// Both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Planar Euclidean distance over raw coordinate values
    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        let dlat = self.lat - other.lat;
        let dlng = self.lng - other.lng;
        (dlat * dlat + dlng * dlng).sqrt()
    }
}

impl From<(f64, f64)> for Point {
    fn from((lat, lng): (f64, f64)) -> Self {
        Point { lat, lng }
    }
}

/// Great-circle distance in kilometres (display only, never used as fitness)
pub fn haversine_km(a: &Point, b: &Point) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Total great-circle length of an ordered list of points
pub fn path_length_km(points: &[Point]) -> f64 {
    points.windows(2).map(|w| haversine_km(&w[0], &w[1])).sum()
}

/// Total planar length of an ordered list of points (open path)
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// An input record that may or may not carry usable coordinates.
///
/// Missing, null, non-numeric and non-finite values all deserialize to `None`
/// so that one bad record never fails a whole request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub lng: Option<f64>,
    /// Optional label, carried for display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl LocationRecord {
    pub fn new(lat: f64, lng: f64) -> Self {
        LocationRecord { lat: Some(lat), lng: Some(lng), name: None }
    }

    /// The coordinate pair, if both fields are present
    pub fn point(&self) -> Option<Point> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Point::new(lat, lng)),
            _ => None,
        }
    }
}

impl From<Point> for LocationRecord {
    fn from(p: Point) -> Self {
        LocationRecord::new(p.lat, p.lng)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Other(serde::de::IgnoredAny),
}

fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawCoordinate> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawCoordinate::Number(v)) if v.is_finite() => Some(v),
        _ => None,
    })
}

/// Keep only records with both coordinates, in input order
pub fn usable_points(records: &[LocationRecord]) -> Vec<Point> {
    records.iter().filter_map(LocationRecord::point).collect()
}

/// Read location records from a `.json` (array of objects) or `.csv` (`lat,lng` header) file
pub fn load_locations<P: AsRef<Path>>(path: P) -> Result<Vec<LocationRecord>, String> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let file = File::open(path)
        .map_err(|e| format!("Cannot open file: {}", e))?;

    if is_json {
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| format!("Invalid location JSON: {}", e))
    } else {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(file);
        let mut records = Vec::new();
        for row in reader.deserialize() {
            let record: LocationRecord = row.map_err(|e| format!("Read error: {}", e))?;
            records.push(record);
        }
        Ok(records)
    }
}

/// A set of points to sequence, with a precomputed distance matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteInstance {
    /// Name of the instance
    pub name: String,
    /// Number of points
    pub dimension: usize,
    /// Points in input order
    pub points: Vec<Point>,
    /// Precomputed distance matrix
    #[serde(skip)]
    pub distance_matrix: Vec<Vec<f64>>,
}

impl RouteInstance {
    pub fn new(name: &str, points: Vec<Point>) -> Self {
        let distance_matrix = Self::compute_distance_matrix(&points);
        RouteInstance {
            name: name.to_string(),
            dimension: points.len(),
            points,
            distance_matrix,
        }
    }

    pub fn from_points(points: &[Point]) -> Self {
        Self::new("points", points.to_vec())
    }

    /// Load the usable points of a location file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let records = load_locations(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "points".to_string());
        Ok(Self::new(&name, usable_points(&records)))
    }

    /// Compute Euclidean distance matrix
    fn compute_distance_matrix(points: &[Point]) -> Vec<Vec<f64>> {
        let n = points.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let d = points[i].distance(&points[j]);
                matrix[i][j] = d;
                matrix[j][i] = d;
            }
        }

        matrix
    }

    /// Get the distance between two points by index
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distance_matrix[i][j]
    }

    /// Total open-path length of a route: N-1 edges, no closing edge.
    ///
    /// Panics if the route references an index outside the instance.
    pub fn route_length(&self, route: &[usize]) -> f64 {
        route.windows(2).map(|w| self.distance(w[0], w[1])).sum()
    }

    /// Map a route of indices back to coordinates
    pub fn route_points(&self, route: &[usize]) -> Vec<Point> {
        route.iter().map(|&i| self.points[i]).collect()
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let mut distances: Vec<f64> = Vec::new();
        for i in 0..self.dimension {
            for j in i + 1..self.dimension {
                distances.push(self.distance(i, j));
            }
        }
        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);

        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lng = f64::INFINITY;
        let mut max_lng = f64::NEG_INFINITY;
        for p in &self.points {
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
            min_lng = min_lng.min(p.lng);
            max_lng = max_lng.max(p.lng);
        }

        InstanceStatistics {
            name: self.name.clone(),
            dimension: self.dimension,
            min_lat,
            max_lat,
            min_lng,
            max_lng,
            avg_distance,
            max_distance,
        }
    }
}

/// Statistics about a point set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    pub avg_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Points: {}", self.dimension)?;
        if self.dimension > 0 {
            writeln!(f, "  Latitude range: {:.6} .. {:.6}", self.min_lat, self.max_lat)?;
            writeln!(f, "  Longitude range: {:.6} .. {:.6}", self.min_lng, self.max_lng)?;
        }
        writeln!(f, "  Avg distance: {:.4}", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.4}", self.max_distance)
    }
}
