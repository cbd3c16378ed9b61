//! Route Sequencer Library
//!
//! Orders a set of geographic points into a short open path (visit every point
//! once, no return to the start) using a genetic algorithm.
//!
//! # Features
//!
//! - Genetic algorithm with elitism, pool selection and prefix crossover
//! - Random-order and nearest-neighbour baselines
//! - Request/response service with an append-only route store
//! - Offline place-name lookup
//! - Benchmarking and SVG/PNG rendering
//!
//! # Example
//!
//! ```no_run
//! use route_sequencer::heuristics::genetic::GAConfig;
//! use route_sequencer::instance::Point;
//! use route_sequencer::optimizer::RouteOptimizer;
//!
//! let optimizer = RouteOptimizer::new(GAConfig { seed: Some(42), ..Default::default() }).unwrap();
//! let stops = vec![
//!     Point::new(28.6139, 77.2090),
//!     Point::new(19.0760, 72.8777),
//!     Point::new(12.9716, 77.5946),
//!     Point::new(22.5726, 88.3639),
//! ];
//!
//! let route = optimizer.optimize(&stops);
//! println!("Visit order: {:?}", route);
//! ```

pub mod benchmark;
pub mod config;
pub mod error;
pub mod geocode;
pub mod heuristics;
pub mod instance;
pub mod optimizer;
pub mod service;
pub mod solution;
pub mod store;
pub mod visualization;

pub use error::{ConfigError, RouteError};
pub use heuristics::genetic::GAConfig;
pub use instance::{Point, RouteInstance};
pub use optimizer::RouteOptimizer;
pub use solution::Solution;
