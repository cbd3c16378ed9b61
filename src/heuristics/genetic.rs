//! Genetic Algorithm for open-path route sequencing.
//!
//! Recombination-only evolution over a fixed number of generations:
//! - random permutation seeding
//! - stable fitness ranking with elitism
//! - parent pairs drawn from the top of the ranking
//! - prefix-splice crossover that always yields a permutation
//!
//! There is no mutation and no early stopping. Every run is driven by the
//! random generator handed to [`GeneticAlgorithm::new`], so a seeded generator
//! gives bit-identical results.

use crate::error::ConfigError;
use crate::instance::RouteInstance;
use crate::solution::{is_permutation, Solution};
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Deref;
use std::path::Path;
use std::time::Instant;

/// Individual in the genetic algorithm population
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    /// The route representation
    pub route: Vec<usize>,
    /// Open-path length, lower is better. `INFINITY` until evaluated.
    pub fitness: f64,
}

impl Individual {
    pub fn new(route: Vec<usize>, instance: &RouteInstance) -> Self {
        let fitness = instance.route_length(&route);
        Individual { route, fitness }
    }

    /// An offspring that has not been scored yet
    pub fn unevaluated(route: Vec<usize>) -> Self {
        Individual { route, fitness: f64::INFINITY }
    }

    pub fn evaluate(&mut self, instance: &RouteInstance) {
        self.fitness = instance.route_length(&self.route);
    }
}

/// Where the generation loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seeding,
    Evaluating,
    Selecting,
    Breeding,
    Done,
}

/// Genetic Algorithm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GAConfig {
    /// Number of generations (always run in full)
    pub generations: usize,
    /// Population size
    pub population_size: usize,
    /// Elite count (best individuals carried over unchanged)
    pub elite_count: usize,
    /// Size of the parent pool taken from the top of the ranking
    pub pool_size: usize,
    /// Parent pairs tried per offspring before falling back to the best individual
    pub max_crossover_retries: usize,
    /// Random seed. `None` draws from OS entropy on every run.
    pub seed: Option<u64>,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            generations: 100,
            population_size: 50,
            elite_count: 10,
            pool_size: 20,
            max_crossover_retries: 10,
            seed: None,
        }
    }
}

impl GAConfig {
    /// Check the relations between the tunables.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        if self.pool_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "pool_size must be at least 2 to form parent pairs (got {})",
                self.pool_size
            )));
        }
        if self.population_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "population_size must be at least 2 (got {})",
                self.population_size
            )));
        }
        if self.elite_count > self.population_size {
            return Err(ConfigError::Invalid(format!(
                "elite_count ({}) cannot exceed population_size ({})",
                self.elite_count, self.population_size
            )));
        }
        if self.generations == 0 {
            return Err(ConfigError::Invalid("generations must be at least 1".to_string()));
        }
        if self.max_crossover_retries == 0 {
            return Err(ConfigError::Invalid(
                "max_crossover_retries must be at least 1".to_string(),
            ));
        }
        Ok(ValidatedConfig(self.clone()))
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

/// A `GAConfig` whose invariants have been checked
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig(GAConfig);

impl ValidatedConfig {
    /// Parent pool actually used: never larger than the population
    pub fn effective_pool_size(&self) -> usize {
        self.0.pool_size.min(self.0.population_size)
    }

    pub fn into_inner(self) -> GAConfig {
        self.0
    }
}

impl Deref for ValidatedConfig {
    type Target = GAConfig;

    fn deref(&self) -> &GAConfig {
        &self.0
    }
}

/// Uniformly random permutation of `0..n`
pub fn random_route<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut route: Vec<usize> = (0..n).collect();
    route.shuffle(rng);
    route
}

/// Prefix-splice crossover.
///
/// The child is the first `n / 2` entries of `a` followed by every entry of
/// `b` not already in that prefix, in `b`'s order. When `a` and `b` are
/// permutations of the same index set the child is one too.
pub fn prefix_crossover(a: &[usize], b: &[usize]) -> Vec<usize> {
    let half = a.len() / 2;
    let prefix: HashSet<usize> = a[..half].iter().copied().collect();

    let mut child = Vec::with_capacity(a.len());
    child.extend_from_slice(&a[..half]);
    child.extend(b.iter().copied().filter(|x| !prefix.contains(x)));
    child
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm<'a, R: Rng> {
    config: &'a ValidatedConfig,
    instance: &'a RouteInstance,
    population: Vec<Individual>,
    rng: R,
    generation: usize,
    phase: Phase,
    best_history: Vec<f64>,
    crossover_rejections: usize,
}

impl<'a, R: Rng> GeneticAlgorithm<'a, R> {
    pub fn new(instance: &'a RouteInstance, config: &'a ValidatedConfig, rng: R) -> Self {
        GeneticAlgorithm {
            config,
            instance,
            population: Vec::with_capacity(config.population_size),
            rng,
            generation: 0,
            phase: Phase::Seeding,
            best_history: Vec::with_capacity(config.generations),
            crossover_rejections: 0,
        }
    }

    /// Seed the population with independent random permutations
    pub fn initialize_population(&mut self) {
        self.phase = Phase::Seeding;
        self.generation = 0;
        self.best_history.clear();

        let n = self.instance.dimension;
        self.population = (0..self.config.population_size)
            .map(|_| Individual::unevaluated(random_route(n, &mut self.rng)))
            .collect();
    }

    /// Score every individual from scratch
    fn evaluate(&mut self) {
        self.phase = Phase::Evaluating;
        for individual in &mut self.population {
            individual.evaluate(self.instance);
        }
    }

    /// Stable ascending sort by fitness
    fn rank(&mut self) {
        self.phase = Phase::Selecting;
        self.population.sort_by_key(|ind| OrderedFloat(ind.fitness));
    }

    /// Two distinct positions from the parent pool
    fn select_parents(&mut self) -> (usize, usize) {
        let pool = self.config.effective_pool_size().min(self.population.len());
        let picks = index::sample(&mut self.rng, pool, 2);
        (picks.index(0), picks.index(1))
    }

    /// Produce one valid child, retrying with fresh parents if the splice
    /// ever yields a non-permutation.
    fn offspring(&mut self) -> Option<Vec<usize>> {
        let n = self.instance.dimension;
        for _ in 0..self.config.max_crossover_retries {
            let (i, j) = self.select_parents();
            let child = prefix_crossover(&self.population[i].route, &self.population[j].route);
            if is_permutation(&child, n) {
                return Some(child);
            }
            self.crossover_rejections += 1;
        }
        None
    }

    /// Build the next generation: elites first, then offspring.
    ///
    /// Only valid permutations enter the next generation. An elite that is not
    /// one is dropped, and a slot whose retries run out gets a fresh random route.
    fn breed(&mut self) {
        self.phase = Phase::Breeding;
        let size = self.config.population_size;
        let n = self.instance.dimension;

        let mut next: Vec<Individual> = Vec::with_capacity(size);
        next.extend(
            self.population
                .iter()
                .take(self.config.elite_count)
                .filter(|ind| is_permutation(&ind.route, n))
                .cloned(),
        );

        while next.len() < size {
            match self.offspring() {
                Some(child) => next.push(Individual::unevaluated(child)),
                None => {
                    log::warn!(
                        "[GA] crossover retries exhausted at generation {}; seeding a random route",
                        self.generation
                    );
                    next.push(Individual::unevaluated(random_route(n, &mut self.rng)));
                }
            }
        }

        self.population = next;
        self.generation += 1;
    }

    /// Run the genetic algorithm
    pub fn run(&mut self) -> Solution {
        let start = Instant::now();

        self.initialize_population();

        while self.generation < self.config.generations {
            self.evaluate();
            self.rank();

            let best = self.population[0].fitness;
            self.best_history.push(best);
            log::debug!(
                "[GA] Gen {}  Best cost {:.6}  Diversity {:.2}",
                self.generation,
                best,
                self.population_diversity()
            );

            self.breed();
        }

        self.evaluate();
        self.rank();
        self.phase = Phase::Done;

        let route = self.population[0].route.clone();
        let mut solution = Solution::from_route(self.instance, route, "GeneticAlgorithm");
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(self.generation);

        log::info!(
            "[GA] {} points, {} generations x {} individuals: best cost {:.6} in {:.3}s",
            self.instance.dimension,
            self.generation,
            self.config.population_size,
            solution.cost,
            solution.computation_time
        );
        if self.crossover_rejections > 0 {
            log::warn!("[GA] {} crossover children were rejected", self.crossover_rejections);
        }

        solution
    }

    /// Current population, in the order of the last ranking
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Best fitness seen at the start of each generation
    pub fn best_history(&self) -> &[f64] {
        &self.best_history
    }

    /// Get current generation
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Get population diversity (average number of differing positions between individuals)
    pub fn population_diversity(&self) -> f64 {
        if self.population.len() < 2 {
            return 0.0;
        }

        let mut total_diff = 0.0;
        let mut count = 0;

        for i in 0..self.population.len().min(20) {
            for j in i + 1..self.population.len().min(20) {
                let diff = self.population[i].route.iter()
                    .zip(self.population[j].route.iter())
                    .filter(|(a, b)| a != b)
                    .count();
                total_diff += diff as f64;
                count += 1;
            }
        }

        if count > 0 {
            total_diff / count as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Point;
    use proptest::prelude::*;
    use rand::Rng;
    use rand_chacha::ChaCha8Rng;

    fn unit_square() -> RouteInstance {
        RouteInstance::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
        ])
    }

    fn scattered(n: usize, seed: u64) -> RouteInstance {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let points: Vec<Point> = (0..n)
            .map(|_| Point::new(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
            .collect();
        RouteInstance::from_points(&points)
    }

    #[test]
    fn test_prefix_crossover_example() {
        let child = prefix_crossover(&[0, 1, 2, 3, 4], &[4, 3, 2, 1, 0]);
        assert_eq!(child, vec![0, 1, 4, 3, 2]);
    }

    #[test]
    fn test_prefix_crossover_small_sizes() {
        assert_eq!(prefix_crossover(&[0], &[0]), vec![0]);
        assert_eq!(prefix_crossover(&[1, 0], &[0, 1]), vec![1, 0]);
        assert_eq!(prefix_crossover(&[], &[]), Vec::<usize>::new());
    }

    #[test]
    fn test_prefix_crossover_rejects_non_permutation_parent() {
        // A malformed parent can only be caught by the validity check
        let child = prefix_crossover(&[0, 1, 2, 3], &[0, 1, 1, 1]);
        assert!(!is_permutation(&child, 4));
    }

    proptest! {
        #[test]
        fn prop_crossover_child_is_permutation(n in 1usize..60, seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let a = random_route(n, &mut rng);
            let b = random_route(n, &mut rng);
            let child = prefix_crossover(&a, &b);
            prop_assert!(is_permutation(&child, n));
            prop_assert_eq!(&child[..n / 2], &a[..n / 2]);
        }
    }

    #[test]
    fn test_breed_replaces_invalid_parents() {
        let instance = unit_square();
        let config = GAConfig { population_size: 4, elite_count: 1, ..Default::default() }
            .validate()
            .unwrap();
        let mut ga = GeneticAlgorithm::new(&instance, &config, ChaCha8Rng::seed_from_u64(6));
        ga.initialize_population();
        for individual in &mut ga.population {
            individual.route = vec![0, 0, 1, 1];
        }

        ga.evaluate();
        ga.rank();
        ga.breed();

        assert!(ga.crossover_rejections > 0);
        assert_eq!(ga.population().len(), 4);
        assert!(ga.population().iter().all(|ind| is_permutation(&ind.route, 4)));
        assert_eq!(ga.current_generation(), 1);
    }

    #[test]
    fn test_config_validation() {
        assert!(GAConfig::default().validate().is_ok());

        let bad = [
            GAConfig { pool_size: 1, ..Default::default() },
            GAConfig { population_size: 1, elite_count: 0, ..Default::default() },
            GAConfig { elite_count: 51, ..Default::default() },
            GAConfig { generations: 0, ..Default::default() },
            GAConfig { max_crossover_retries: 0, ..Default::default() },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "{:?} should be rejected",
                config
            );
        }

        // A pool larger than the population is clamped, not rejected
        let small = GAConfig { population_size: 8, elite_count: 2, ..Default::default() }
            .validate()
            .unwrap();
        assert_eq!(small.effective_pool_size(), 8);
    }

    #[test]
    fn test_config_from_toml() {
        let config = GAConfig::from_toml_str("generations = 5\nseed = 7\n").unwrap();
        assert_eq!(config.generations, 5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.population_size, 50);
        assert!(GAConfig::from_toml_str("generations = \"many\"").is_err());
    }

    #[test]
    fn test_random_route_is_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for n in [2, 5, 31] {
            assert!(is_permutation(&random_route(n, &mut rng), n));
        }
    }

    #[test]
    fn test_genetic_algorithm_unit_square() {
        let instance = unit_square();
        let config = GAConfig::default().validate().unwrap();
        let mut ga = GeneticAlgorithm::new(&instance, &config, ChaCha8Rng::seed_from_u64(42));
        let solution = ga.run();

        assert!(solution.is_complete(&instance));
        assert!((solution.cost - 3.0).abs() < 1e-9, "cost {}", solution.cost);
        assert_eq!(solution.iterations, Some(100));
        assert_eq!(ga.phase(), Phase::Done);
    }

    #[test]
    fn test_population_size_and_elitism() {
        let instance = scattered(25, 11);
        let config = GAConfig { generations: 30, ..Default::default() }.validate().unwrap();
        let mut ga = GeneticAlgorithm::new(&instance, &config, ChaCha8Rng::seed_from_u64(5));
        let solution = ga.run();

        assert_eq!(ga.population().len(), 50);
        assert!(ga.population().iter().all(|ind| is_permutation(&ind.route, 25)));
        assert_eq!(ga.best_history().len(), 30);
        for w in ga.best_history().windows(2) {
            assert!(w[1] <= w[0] + 1e-12, "best cost regressed: {:?}", w);
        }
        assert!(solution.cost <= ga.best_history()[29] + 1e-12);
    }

    #[test]
    fn test_parents_are_distinct_and_from_pool() {
        let instance = scattered(10, 1);
        let config = GAConfig::default().validate().unwrap();
        let mut ga = GeneticAlgorithm::new(&instance, &config, ChaCha8Rng::seed_from_u64(9));
        ga.initialize_population();
        for _ in 0..500 {
            let (i, j) = ga.select_parents();
            assert_ne!(i, j);
            assert!(i < 20 && j < 20);
        }
    }

    #[test]
    fn test_population_smaller_than_pool() {
        let instance = scattered(12, 2);
        let config = GAConfig { population_size: 4, elite_count: 1, ..Default::default() }
            .validate()
            .unwrap();
        let mut ga = GeneticAlgorithm::new(&instance, &config, ChaCha8Rng::seed_from_u64(4));
        let solution = ga.run();
        assert!(solution.is_complete(&instance));
        assert_eq!(ga.population().len(), 4);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let instance = scattered(30, 8);
        let config = GAConfig::default().validate().unwrap();

        let a = GeneticAlgorithm::new(&instance, &config, ChaCha8Rng::seed_from_u64(123)).run();
        let b = GeneticAlgorithm::new(&instance, &config, ChaCha8Rng::seed_from_u64(123)).run();
        assert_eq!(a.route, b.route);
        assert_eq!(a.cost.to_bits(), b.cost.to_bits());
    }
}
