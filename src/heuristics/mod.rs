//! Heuristics module for route sequencing.
//!
//! The genetic algorithm does the sequencing; the construction heuristics are
//! baselines for benchmarking it.

pub mod construction;
pub mod genetic;

pub use construction::*;
pub use genetic::*;
