//! Benchmarking for the route sequencer.
//!
//! Runs the genetic algorithm alongside the two baselines (random order and
//! nearest neighbour) over several seeds, then aggregates, exports and reports
//! the results.

use crate::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic, RandomOrderHeuristic};
use crate::instance::RouteInstance;
use crate::optimizer::RouteOptimizer;
use crate::solution::Solution;

use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Result of running a single algorithm once on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Number of points
    pub dimension: usize,
    /// Seed of this run
    pub seed: u64,
    /// Open-path length
    pub cost: f64,
    /// Computation time in seconds
    pub time: f64,
    /// Generations run (GA only)
    pub iterations: Option<usize>,
}

/// Aggregated statistics for one algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    pub runs: usize,
    pub mean_cost: f64,
    pub median_cost: f64,
    pub std_cost: f64,
    pub best_cost: f64,
    pub worst_cost: f64,
    pub avg_time: f64,
}

#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeds per algorithm
    pub num_runs: usize,
    /// Random permutations drawn per run for the random-order baseline
    pub random_samples: usize,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            random_samples: 50,
            show_progress: true,
        }
    }
}

pub struct Benchmark {
    config: BenchmarkConfig,
    optimizer: RouteOptimizer,
    results: Vec<AlgorithmResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig, optimizer: RouteOptimizer) -> Self {
        Benchmark {
            config,
            optimizer,
            results: Vec::new(),
        }
    }

    /// Run every algorithm `num_runs` times on `instance`
    pub fn run_on_instance(&mut self, instance: &RouteInstance) {
        log::info!(
            "Running benchmark on instance: {} (n={}, runs={})",
            instance.name,
            instance.dimension,
            self.config.num_runs
        );

        let progress = self.progress_bar(self.config.num_runs as u64);

        for run in 0..self.config.num_runs {
            let seed = run as u64;
            progress.set_message(format!("seed {}", seed));

            let ga = self.run_genetic(instance, seed);
            self.record(instance, seed, &ga);

            let random = self.run_random_baseline(instance, seed);
            self.record(instance, seed, &random);

            let nn = NearestNeighborHeuristic::new().construct(instance);
            self.record(instance, seed, &nn);

            progress.inc(1);
        }

        progress.finish_and_clear();
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
            bar.set_style(style.progress_chars("=> "));
        }
        bar
    }

    fn run_genetic(&self, instance: &RouteInstance, seed: u64) -> Solution {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        if instance.dimension < 3 {
            // nothing to search; report the input order
            let route: Vec<usize> = (0..instance.dimension).collect();
            return Solution::from_route(instance, route, "GeneticAlgorithm");
        }
        self.optimizer.optimize_solution(instance, &mut rng)
    }

    /// Median over `random_samples` random orders, as a single result
    fn run_random_baseline(&self, instance: &RouteInstance, seed: u64) -> Solution {
        let start = std::time::Instant::now();
        let samples = self.config.random_samples.max(1);

        let mut draws: Vec<Solution> = (0..samples as u64)
            .map(|i| RandomOrderHeuristic::new(seed.wrapping_mul(1_000_003).wrapping_add(i)).construct(instance))
            .collect();
        draws.sort_by(|a, b| a.cost.total_cmp(&b.cost));

        let mut median = draws.swap_remove(samples / 2);
        median.algorithm = "RandomOrder".to_string();
        median.computation_time = start.elapsed().as_secs_f64();
        median
    }

    fn record(&mut self, instance: &RouteInstance, seed: u64, solution: &Solution) {
        self.results.push(AlgorithmResult {
            algorithm: solution.algorithm.clone(),
            instance: instance.name.clone(),
            dimension: instance.dimension,
            seed,
            cost: solution.cost,
            time: solution.computation_time,
            iterations: solution.iterations,
        });
    }

    /// Per-algorithm statistics, best mean cost first
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut by_algorithm: BTreeMap<&str, Vec<&AlgorithmResult>> = BTreeMap::new();
        for result in &self.results {
            by_algorithm.entry(result.algorithm.as_str()).or_default().push(result);
        }

        let mut statistics: Vec<AlgorithmStatistics> = by_algorithm
            .into_iter()
            .map(|(algorithm, results)| {
                let costs: Vec<f64> = results.iter().map(|r| r.cost).collect();
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();

                let std_cost = if costs.len() > 1 { costs.iter().std_dev() } else { 0.0 };

                AlgorithmStatistics {
                    algorithm: algorithm.to_string(),
                    runs: results.len(),
                    mean_cost: costs.iter().mean(),
                    median_cost: Data::new(costs.clone()).median(),
                    std_cost,
                    best_cost: costs.iter().cloned().fold(f64::INFINITY, f64::min),
                    worst_cost: costs.iter().cloned().fold(0.0, f64::max),
                    avg_time: times.iter().mean(),
                }
            })
            .collect();

        statistics.sort_by(|a, b| a.mean_cost.total_cmp(&b.mean_cost));
        statistics
    }

    /// Export raw results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        for result in &self.results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export aggregated statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("      Route Sequencer Benchmark\n");
        report.push_str("========================================\n\n");

        report.push_str(&"-".repeat(84));
        report.push('\n');
        report.push_str(&format!(
            "{:<14} {:>6} {:>12} {:>12} {:>10} {:>12} {:>12}\n",
            "Algorithm", "Runs", "Mean", "Median", "Std", "Best", "Avg Time"
        ));
        report.push_str(&"-".repeat(84));
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<14} {:>6} {:>12.4} {:>12.4} {:>10.4} {:>12.4} {:>11.4}s\n",
                stat.algorithm,
                stat.runs,
                stat.mean_cost,
                stat.median_cost,
                stat.std_cost,
                stat.best_cost,
                stat.avg_time
            ));
        }

        report.push_str(&"-".repeat(84));
        report.push('\n');

        if let Some(best) = self
            .results
            .iter()
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
        {
            report.push_str(&format!(
                "\nBest route: {:.4} ({}, seed {})\n",
                best.cost, best.algorithm, best.seed
            ));
        }

        report
    }

    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::genetic::GAConfig;
    use crate::instance::Point;

    fn grid(n: usize) -> RouteInstance {
        let points = (0..n)
            .map(|i| Point::new((i / 4) as f64, ((i % 4) * 7 % 4) as f64))
            .collect();
        RouteInstance::new("grid", points)
    }

    fn quiet(runs: usize) -> Benchmark {
        let optimizer = RouteOptimizer::new(GAConfig {
            generations: 30,
            ..Default::default()
        })
        .unwrap();
        Benchmark::new(
            BenchmarkConfig {
                num_runs: runs,
                random_samples: 21,
                show_progress: false,
            },
            optimizer,
        )
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
        assert_eq!(config.random_samples, 50);
    }

    #[test]
    fn test_records_three_algorithms_per_run() {
        let mut bench = quiet(3);
        bench.run_on_instance(&grid(12));

        assert_eq!(bench.results().len(), 9);
        let stats = bench.compute_statistics();
        assert_eq!(stats.len(), 3);
        for stat in &stats {
            assert_eq!(stat.runs, 3);
            assert!(stat.best_cost <= stat.median_cost && stat.median_cost <= stat.worst_cost);
        }
    }

    #[test]
    fn test_genetic_beats_random_median() {
        let mut bench = quiet(2);
        bench.run_on_instance(&grid(12));
        let stats = bench.compute_statistics();

        let mean = |name: &str| stats.iter().find(|s| s.algorithm == name).unwrap().mean_cost;
        assert!(mean("GeneticAlgorithm") < mean("RandomOrder"));
    }

    #[test]
    fn test_single_run_has_zero_spread() {
        let mut bench = quiet(1);
        bench.run_on_instance(&grid(8));
        for stat in bench.compute_statistics() {
            assert_eq!(stat.std_cost, 0.0);
            assert_eq!(stat.best_cost, stat.worst_cost);
        }
    }

    #[test]
    fn test_exports_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut bench = quiet(1);
        bench.run_on_instance(&grid(6));

        let results = dir.path().join("results.csv");
        let stats = dir.path().join("statistics.csv");
        bench.export_to_csv(&results).unwrap();
        bench.export_statistics_csv(&stats).unwrap();

        let raw = std::fs::read_to_string(&results).unwrap();
        assert!(raw.starts_with("algorithm,instance,dimension,seed,cost,time,iterations"));
        assert_eq!(raw.lines().count(), 4);
        assert!(std::fs::read_to_string(&stats).unwrap().contains("median_cost"));

        let report = bench.generate_report();
        assert!(report.contains("NearestNeighbor"));
        assert!(report.contains("Best route"));
    }
}
