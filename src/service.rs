//! Request/response boundary.
//!
//! Turns coordinate-bearing records into optimized routes, saves and lists
//! named routes, and renders every outcome (success or tagged error) as a JSON
//! body. The optimizer never depends on anything in here.

use crate::error::RouteError;
use crate::geocode::Geocoder;
use crate::instance::{path_length, path_length_km, usable_points, LocationRecord, Point};
use crate::optimizer::RouteOptimizer;
use crate::store::{RouteStore, SavedRoute, DEFAULT_ROUTE_NAME};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizeRequest {
    #[serde(default)]
    pub locations: Vec<LocationRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub route: Vec<Point>,
    /// Planar length over raw coordinates, the quantity being minimised
    pub total_distance: f64,
    /// Great-circle length, for display
    pub total_distance_km: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveRouteRequest {
    #[serde(default)]
    pub route: Vec<Point>,
    #[serde(default)]
    pub route_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRouteResponse {
    pub status: String,
    pub name: String,
    pub route_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRoutesResponse {
    pub routes: Vec<SavedRoute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl From<&RouteError> for ErrorResponse {
    fn from(err: &RouteError) -> Self {
        ErrorResponse {
            error: ErrorBody {
                kind: err.kind().to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Render a result as the JSON body a client receives
pub fn respond<T: Serialize>(result: &Result<T, RouteError>) -> Value {
    match result {
        Ok(body) => serde_json::to_value(body)
            .unwrap_or_else(|e| json!({ "error": { "kind": "internal", "message": e.to_string() } })),
        Err(err) => json!(ErrorResponse::from(err)),
    }
}

/// Filter malformed records and check enough points remain
pub fn prepare_points(records: &[LocationRecord]) -> Result<Vec<Point>, RouteError> {
    if records.len() < 2 {
        return Err(RouteError::InsufficientPoints { found: records.len() });
    }

    let points = usable_points(records);
    if points.len() < 2 {
        return Err(RouteError::MalformedPoint {
            dropped: records.len() - points.len(),
            remaining: points.len(),
        });
    }

    if points.len() < records.len() {
        log::debug!("dropped {} malformed location records", records.len() - points.len());
    }
    Ok(points)
}

pub struct RouteService {
    optimizer: RouteOptimizer,
    store: RouteStore,
    geocoder: Option<Box<dyn Geocoder + Send + Sync>>,
}

impl RouteService {
    pub fn new(optimizer: RouteOptimizer, store: RouteStore) -> Self {
        RouteService {
            optimizer,
            store,
            geocoder: None,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Box<dyn Geocoder + Send + Sync>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn optimizer(&self) -> &RouteOptimizer {
        &self.optimizer
    }

    pub fn store(&self) -> &RouteStore {
        &self.store
    }

    pub fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse, RouteError> {
        let points = prepare_points(&request.locations)?;
        Ok(self.optimize_points(&points))
    }

    /// Geocode every name (failing on the first miss), then optimize
    pub fn optimize_places(&self, names: &[String]) -> Result<OptimizeResponse, RouteError> {
        let points = self.resolve_places(names)?;
        if points.len() < 2 {
            return Err(RouteError::InsufficientPoints { found: points.len() });
        }
        Ok(self.optimize_points(&points))
    }

    pub fn resolve_places(&self, names: &[String]) -> Result<Vec<Point>, RouteError> {
        let geocoder = self
            .geocoder
            .as_ref()
            .ok_or_else(|| RouteError::Geocoder("no gazetteer configured".to_string()))?;

        names
            .iter()
            .map(|name| geocoder.locate(name).map_err(RouteError::from))
            .collect()
    }

    fn optimize_points(&self, points: &[Point]) -> OptimizeResponse {
        let route = self.optimizer.optimize(points);
        OptimizeResponse {
            total_distance: path_length(&route),
            total_distance_km: path_length_km(&route),
            route,
        }
    }

    pub fn save_route(&self, request: &SaveRouteRequest) -> Result<SaveRouteResponse, RouteError> {
        if request.route.is_empty() {
            return Err(RouteError::InvalidRoute("route must contain at least one point".to_string()));
        }
        if let Some(i) = request.route.iter().position(|p| !p.is_finite()) {
            return Err(RouteError::InvalidRoute(format!("point {} has a non-finite coordinate", i + 1)));
        }

        let name = request
            .route_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_ROUTE_NAME);

        let mut record = SavedRoute::new(name, request.route.clone());
        record.saved_at = Some(chrono::Utc::now().to_rfc3339());
        self.store.append(&record)?;

        log::info!("saved route '{}' with {} points", name, record.route.len());
        Ok(SaveRouteResponse {
            status: "saved".to_string(),
            name: name.to_string(),
            route_length: record.route.len(),
        })
    }

    pub fn list_routes(&self) -> Result<ListRoutesResponse, RouteError> {
        Ok(ListRoutesResponse {
            routes: self.store.list()?,
        })
    }
}
