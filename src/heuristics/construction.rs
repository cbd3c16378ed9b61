use crate::heuristics::genetic::random_route;
use crate::instance::RouteInstance;
use crate::solution::Solution;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &RouteInstance) -> Solution;
    fn name(&self) -> &str;
}

/// Uniformly random visiting order.
///
/// Serves as the quality baseline: a useful sequencer must beat the median of
/// many of these.
pub struct RandomOrderHeuristic {
    pub seed: u64,
}

impl RandomOrderHeuristic {
    pub fn new(seed: u64) -> Self {
        RandomOrderHeuristic { seed }
    }
}

impl ConstructionHeuristic for RandomOrderHeuristic {
    fn construct(&self, instance: &RouteInstance) -> Solution {
        let start = std::time::Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let route = random_route(instance.dimension, &mut rng);

        let mut solution = Solution::from_route(instance, route, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        "RandomOrder"
    }
}

/// Nearest Neighbor Heuristic
///
/// Builds an open path by repeatedly moving to the nearest unvisited point.
pub struct NearestNeighborHeuristic {
    pub start: usize,
    pub randomized: bool,
    pub seed: u64,
}

impl NearestNeighborHeuristic {
    pub fn new() -> Self {
        NearestNeighborHeuristic {
            start: 0,
            randomized: false,
            seed: 42,
        }
    }

    pub fn from_start(start: usize) -> Self {
        NearestNeighborHeuristic {
            start,
            ..Self::new()
        }
    }

    /// Pick among the three nearest candidates instead of always the closest
    pub fn randomized(seed: u64) -> Self {
        NearestNeighborHeuristic {
            start: 0,
            randomized: true,
            seed,
        }
    }

    fn find_nearest(
        &self,
        instance: &RouteInstance,
        current: usize,
        visited: &[bool],
        rng: &mut ChaCha8Rng,
    ) -> Option<usize> {
        let mut candidates: Vec<(usize, f64)> = (0..instance.dimension)
            .filter(|&n| !visited[n])
            .map(|n| (n, instance.distance(current, n)))
            .collect();

        if candidates.is_empty() {
            return None;
        }

        candidates.sort_by_key(|&(_, d)| OrderedFloat(d));

        if self.randomized && candidates.len() > 1 {
            let top_k = candidates.len().min(3);
            let idx = rng.gen_range(0..top_k);
            Some(candidates[idx].0)
        } else {
            Some(candidates[0].0)
        }
    }
}

impl Default for NearestNeighborHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for NearestNeighborHeuristic {
    fn construct(&self, instance: &RouteInstance) -> Solution {
        let start = std::time::Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        if instance.dimension == 0 {
            return Solution::from_route(instance, Vec::new(), self.name());
        }

        let first = self.start.min(instance.dimension - 1);
        let mut route = Vec::with_capacity(instance.dimension);
        let mut visited = vec![false; instance.dimension];
        route.push(first);
        visited[first] = true;

        let mut current = first;
        while let Some(next) = self.find_nearest(instance, current, &visited, &mut rng) {
            route.push(next);
            visited[next] = true;
            current = next;
        }

        let mut solution = Solution::from_route(instance, route, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        if self.randomized {
            "NearestNeighbor-Randomized"
        } else {
            "NearestNeighbor"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Point;

    fn line() -> RouteInstance {
        RouteInstance::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(0.0, 3.0),
            Point::new(0.0, 1.0),
            Point::new(0.0, 2.0),
        ])
    }

    #[test]
    fn test_nearest_neighbor_follows_line() {
        let instance = line();
        let sol = NearestNeighborHeuristic::new().construct(&instance);
        assert_eq!(sol.route, vec![0, 2, 3, 1]);
        assert!((sol.cost - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_nearest_neighbor_randomized_is_complete() {
        let instance = line();
        let sol = NearestNeighborHeuristic::randomized(7).construct(&instance);
        assert!(sol.is_complete(&instance));
        assert_eq!(sol.route[0], 0);
    }

    #[test]
    fn test_random_order_is_seeded() {
        let instance = line();
        let a = RandomOrderHeuristic::new(1).construct(&instance);
        let b = RandomOrderHeuristic::new(1).construct(&instance);
        assert!(a.is_complete(&instance));
        assert_eq!(a.route, b.route);
    }
}
