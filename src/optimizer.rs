//! Route optimizer facade.
//!
//! Handles the trivial sizes directly and runs the genetic algorithm for
//! everything else. The configuration is validated once, when the optimizer is
//! built; after that an optimization call cannot fail.

use crate::error::ConfigError;
use crate::heuristics::genetic::{GAConfig, GeneticAlgorithm, ValidatedConfig};
use crate::instance::{Point, RouteInstance};
use crate::solution::Solution;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct RouteOptimizer {
    config: ValidatedConfig,
}

impl RouteOptimizer {
    pub fn new(config: GAConfig) -> Result<Self, ConfigError> {
        Ok(RouteOptimizer { config: config.validate()? })
    }

    pub fn config(&self) -> &GAConfig {
        &self.config
    }

    /// Order `points` to approximately minimise open-path length.
    ///
    /// - 0 or 1 points: empty result
    /// - 2 points: input unchanged
    /// - otherwise: best route found by the genetic algorithm
    ///
    /// With a configured seed every call is reproducible; without one each call
    /// draws a fresh generator from OS entropy.
    pub fn optimize(&self, points: &[Point]) -> Vec<Point> {
        let mut rng = self.fresh_rng();
        self.optimize_with_rng(points, &mut rng)
    }

    /// Same as [`optimize`](Self::optimize) with a caller-supplied generator
    pub fn optimize_with_rng<R: Rng + ?Sized>(&self, points: &[Point], rng: &mut R) -> Vec<Point> {
        match points.len() {
            0 | 1 => Vec::new(),
            2 => points.to_vec(),
            _ => {
                let instance = RouteInstance::from_points(points);
                let solution = self.optimize_solution(&instance, rng);
                solution.points(&instance)
            }
        }
    }

    /// Run the genetic algorithm on a prepared instance
    pub fn optimize_solution<R: Rng + ?Sized>(&self, instance: &RouteInstance, rng: &mut R) -> Solution {
        let mut ga = GeneticAlgorithm::new(instance, &self.config, rng);
        ga.run()
    }

    fn fresh_rng(&self) -> ChaCha8Rng {
        match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::path_length;
    use proptest::prelude::*;
    use rand::Rng;

    fn seeded(seed: u64) -> RouteOptimizer {
        RouteOptimizer::new(GAConfig { seed: Some(seed), ..Default::default() }).unwrap()
    }

    fn sorted(points: &[Point]) -> Vec<(u64, u64)> {
        let mut keys: Vec<(u64, u64)> = points
            .iter()
            .map(|p| (p.lat.to_bits(), p.lng.to_bits()))
            .collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn test_rejects_invalid_config() {
        let err = RouteOptimizer::new(GAConfig { pool_size: 1, ..Default::default() });
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_trivial_sizes() {
        let optimizer = seeded(1);
        assert!(optimizer.optimize(&[]).is_empty());
        assert!(optimizer.optimize(&[Point::new(3.0, 4.0)]).is_empty());

        let two = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert_eq!(optimizer.optimize(&two), two.to_vec());
    }

    #[test]
    fn test_unit_square() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
        ];
        let route = seeded(42).optimize(&square);
        assert_eq!(route.len(), 4);
        assert!((path_length(&route) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_points_are_kept() {
        let points = [
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 0.0),
        ];
        let route = seeded(3).optimize(&points);
        assert_eq!(sorted(&route), sorted(&points));
    }

    #[test]
    fn test_seeded_optimizer_is_deterministic() {
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let points: Vec<Point> = (0..20)
            .map(|_| Point::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)))
            .collect();

        let optimizer = seeded(2024);
        assert_eq!(optimizer.optimize(&points), optimizer.optimize(&points));
        assert_eq!(seeded(2024).optimize(&points), optimizer.optimize(&points));
    }

    #[test]
    fn test_beats_median_random_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let points: Vec<Point> = (0..15)
            .map(|_| Point::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0)))
            .collect();
        let instance = RouteInstance::from_points(&points);

        let mut random_costs: Vec<f64> = (0..50)
            .map(|_| {
                let route = crate::heuristics::genetic::random_route(points.len(), &mut rng);
                instance.route_length(&route)
            })
            .collect();
        random_costs.sort_by(|a, b| a.total_cmp(b));
        let median = random_costs[25];

        let route = seeded(9).optimize(&points);
        assert!(path_length(&route) <= median);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_output_is_permutation_of_input(
            coords in prop::collection::vec((-90.0f64..90.0, -180.0f64..180.0), 0..12),
            seed in any::<u64>(),
        ) {
            let points: Vec<Point> = coords.into_iter().map(Point::from).collect();
            let optimizer = RouteOptimizer::new(GAConfig { generations: 5, ..Default::default() }).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let route = optimizer.optimize_with_rng(&points, &mut rng);

            if points.len() < 2 {
                prop_assert!(route.is_empty());
            } else {
                prop_assert_eq!(sorted(&route), sorted(&points));
            }
        }
    }
}
