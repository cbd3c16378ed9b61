//! Solution representation for route sequencing.
//!
//! A route is an ordering of point indices that must be a permutation of
//! `0..n`. This module holds the permutation check and the solution record
//! returned by the heuristics.

use crate::instance::{Point, RouteInstance};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Check that `route` contains every index of `0..n` exactly once
pub fn is_permutation(route: &[usize], n: usize) -> bool {
    if route.len() != n {
        return false;
    }

    let mut seen = vec![false; n];
    for &idx in route {
        if idx >= n || seen[idx] {
            return false;
        }
        seen[idx] = true;
    }
    true
}

/// An ordered visit sequence over a `RouteInstance`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// The route as a sequence of point indices
    pub route: Vec<usize>,
    /// Total open-path length
    pub cost: f64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            route: Vec::new(),
            cost: f64::INFINITY,
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Create a solution from a route
    pub fn from_route(instance: &RouteInstance, route: Vec<usize>, algorithm: &str) -> Self {
        let cost = instance.route_length(&route);
        Solution {
            route,
            cost,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Check if all points are visited exactly once
    pub fn is_complete(&self, instance: &RouteInstance) -> bool {
        is_permutation(&self.route, instance.dimension)
    }

    /// Coordinates in visiting order
    pub fn points(&self, instance: &RouteInstance) -> Vec<Point> {
        instance.route_points(&self.route)
    }

    /// Distance of each leg along the route
    pub fn leg_distances(&self, instance: &RouteInstance) -> Vec<f64> {
        self.route.windows(2).map(|w| instance.distance(w[0], w[1])).collect()
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.4}", self.cost)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Route: {:?}", self.route)
    }
}

/// Write an ordered list of coordinates as CSV with a `Latitude,Longitude` header
pub fn export_route_csv<W: Write>(route: &[Point], out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["Latitude", "Longitude"])?;
    for p in route {
        writer.write_record([p.lat.to_string(), p.lng.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Save a route to `.csv` or `.json` depending on the file extension
pub fn save_route_file<P: AsRef<Path>>(route: &[Point], path: P) -> Result<(), String> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .map_err(|e| format!("Cannot create {:?}: {}", path, e))?;

    let is_csv = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        export_route_csv(route, file).map_err(|e| format!("CSV write error: {}", e))
    } else {
        serde_json::to_writer_pretty(file, route).map_err(|e| format!("JSON write error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_creation() {
        let sol = Solution::new();
        assert!(sol.route.is_empty());
        assert_eq!(sol.cost, f64::INFINITY);
    }

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[2, 0, 1], 3));
        assert!(is_permutation(&[], 0));
        assert!(!is_permutation(&[0, 0, 1], 3));
        assert!(!is_permutation(&[0, 1], 3));
        assert!(!is_permutation(&[0, 1, 3], 3));
    }

    #[test]
    fn test_from_route_and_legs() {
        let instance = RouteInstance::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(0.0, 3.0),
            Point::new(4.0, 3.0),
        ]);
        let sol = Solution::from_route(&instance, vec![0, 1, 2], "manual");
        assert!(sol.is_complete(&instance));
        assert!((sol.cost - 7.0).abs() < 1e-10);
        assert_eq!(sol.leg_distances(&instance), vec![3.0, 4.0]);
        assert_eq!(sol.points(&instance)[2], Point::new(4.0, 3.0));
    }

    #[test]
    fn test_export_route_csv() {
        let mut buf = Vec::new();
        export_route_csv(&[Point::new(1.0, 2.5), Point::new(-3.0, 4.0)], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Latitude,Longitude\n1,2.5\n-3,4\n");
    }
}
