//! Route Sequencer - Command Line Interface
//!
//! Orders geographic stops into a short open path, and saves, lists and
//! benchmarks routes.

use clap::{Parser, Subcommand};
use route_sequencer::benchmark::{Benchmark, BenchmarkConfig};
use route_sequencer::config::AppConfig;
use route_sequencer::error::ConfigError;
use route_sequencer::geocode::{Gazetteer, Geocoder};
use route_sequencer::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic};
use route_sequencer::instance::{load_locations, path_length, path_length_km, RouteInstance};
use route_sequencer::optimizer::RouteOptimizer;
use route_sequencer::service::{respond, OptimizeRequest, OptimizeResponse, RouteService, SaveRouteRequest};
use route_sequencer::solution::save_route_file;
use route_sequencer::store::RouteStore;
use route_sequencer::visualization::Visualizer;

use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "route-sequencer")]
#[command(version = "1.0")]
#[command(about = "Sequence geographic stops into a short open route")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Random seed (overrides the configuration file)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Number of generations
    #[arg(long, global = true)]
    generations: Option<usize>,

    /// Population size
    #[arg(long, global = true)]
    population_size: Option<usize>,

    /// Route log file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Gazetteer CSV (`name,lat,lng`)
    #[arg(long, global = true)]
    gazetteer: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize the visiting order of a set of locations
    Optimize {
        /// Location file (.csv with lat,lng columns or .json array of {lat, lng})
        #[arg(short, long, conflicts_with = "place")]
        input: Option<PathBuf>,

        /// Place name to geocode (repeatable)
        #[arg(short, long = "place")]
        place: Vec<String>,

        /// Save the optimized route under this name
        #[arg(long)]
        save: Option<String>,

        /// Write the route to a .csv or .json file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render the route to an .svg or .png file
        #[arg(long)]
        visualize: Option<PathBuf>,

        /// Print the JSON response body instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// List saved routes
    List {
        #[arg(long)]
        json: bool,
    },

    /// Look up the coordinates of place names
    Geocode {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Analyze a location file
    Analyze {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compare the genetic algorithm with the baselines
    Benchmark {
        #[arg(short, long)]
        input: PathBuf,

        /// Number of seeds per algorithm
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    let optimizer = match RouteOptimizer::new(config.optimizer.clone()) {
        Ok(optimizer) => optimizer,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    let outcome = match cli.command {
        Commands::Optimize { input, place, save, output, visualize, json } => {
            build_service(&config, optimizer).and_then(|service| {
                optimize_route(&service, input.as_deref(), &place, save, output, visualize, json)
            })
        }
        Commands::List { json } => {
            build_service(&config, optimizer).and_then(|service| list_routes(&service, json))
        }
        Commands::Geocode { names } => geocode_names(&config, &names),
        Commands::Analyze { input } => analyze_locations(&input, &optimizer),
        Commands::Benchmark { input, runs, output, no_progress } => {
            run_benchmark(&input, runs, &output, !no_progress, optimizer)
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// File configuration with command-line overrides applied
fn load_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    if let Some(seed) = cli.seed {
        config.optimizer.seed = Some(seed);
    }
    if let Some(generations) = cli.generations {
        config.optimizer.generations = generations;
    }
    if let Some(population_size) = cli.population_size {
        config.optimizer.population_size = population_size;
    }
    if let Some(store) = &cli.store {
        config.storage.path = store.clone();
    }
    if let Some(gazetteer) = &cli.gazetteer {
        config.geocoding.gazetteer = Some(gazetteer.clone());
    }

    Ok(config)
}

fn load_gazetteer(config: &AppConfig) -> Result<Option<Gazetteer>, String> {
    match &config.geocoding.gazetteer {
        Some(path) => Gazetteer::from_csv(path).map(Some).map_err(|e| e.to_string()),
        None => Ok(None),
    }
}

fn build_service(config: &AppConfig, optimizer: RouteOptimizer) -> Result<RouteService, String> {
    let service = RouteService::new(optimizer, RouteStore::new(config.storage.path.clone()));
    Ok(match load_gazetteer(config)? {
        Some(gazetteer) => service.with_geocoder(Box::new(gazetteer)),
        None => service,
    })
}

fn print_json(value: &serde_json::Value) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

fn optimize_route(
    service: &RouteService,
    input: Option<&Path>,
    places: &[String],
    save: Option<String>,
    output: Option<PathBuf>,
    visualize: Option<PathBuf>,
    json: bool,
) -> Result<(), String> {
    let start = Instant::now();

    let result = if !places.is_empty() {
        service.optimize_places(places)
    } else if let Some(path) = input {
        let locations = load_locations(path)?;
        service.optimize(&OptimizeRequest { locations })
    } else {
        return Err("either --input or --place is required".to_string());
    };

    if json {
        print_json(&respond(&result))?;
    }
    let response = result.map_err(|e| e.to_string())?;

    if !json {
        print_summary(&response, start.elapsed().as_secs_f64());
    }

    if let Some(name) = save {
        let request = SaveRouteRequest {
            route: response.route.clone(),
            route_name: Some(name),
        };
        let saved = service.save_route(&request).map_err(|e| e.to_string())?;
        if !json {
            println!("\nRoute '{}' saved to {:?}", saved.name, service.store().path());
        }
    }

    if let Some(out_path) = output {
        save_route_file(&response.route, &out_path)?;
        if !json {
            println!("Route written to {:?}", out_path);
        }
    }

    if let Some(viz_path) = visualize {
        render_route("Optimized route", &response, &viz_path)?;
    }

    Ok(())
}

fn print_summary(response: &OptimizeResponse, elapsed: f64) {
    println!("========== Optimized Route ==========");
    for (i, p) in response.route.iter().enumerate() {
        println!("  {:>3}. ({:.6}, {:.6})", i + 1, p.lat, p.lng);
    }
    println!("Stops: {}", response.route.len());
    println!("Path length: {:.6}", response.total_distance);
    println!("Great-circle distance: {:.2} km", response.total_distance_km);
    println!("Time: {:.4}s", elapsed);
}

fn render_route(title: &str, response: &OptimizeResponse, path: &Path) -> Result<(), String> {
    let viz = Visualizer::new();
    let svg = viz.generate_svg(title, &response.route);
    let legs = viz.generate_leg_chart_svg(title, &response.route);

    let is_png = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("png"))
        .unwrap_or(false);

    if is_png {
        match viz.save_png(&svg, path) {
            Ok(()) => println!("Visualization saved to {:?}", path),
            Err(e) => {
                let svg_path = path.with_extension("svg");
                viz.save_svg(&svg, &svg_path).map_err(|e| e.to_string())?;
                println!("PNG conversion failed ({}). Saved SVG to {:?}", e, svg_path);
            }
        }
    } else {
        viz.save_svg(&svg, path).map_err(|e| e.to_string())?;
        println!("Visualization saved to {:?}", path);
    }

    let legs_path = path.with_extension("legs.svg");
    viz.save_svg(&legs, &legs_path).map_err(|e| e.to_string())?;
    println!("Leg chart saved to {:?}", legs_path);

    Ok(())
}

fn list_routes(service: &RouteService, json: bool) -> Result<(), String> {
    let result = service.list_routes();
    if json {
        print_json(&respond(&result))?;
    }
    let listing = result.map_err(|e| e.to_string())?;
    if json {
        return Ok(());
    }

    if listing.routes.is_empty() {
        println!("No saved routes in {:?}", service.store().path());
        return Ok(());
    }

    for (i, saved) in listing.routes.iter().enumerate() {
        println!(
            "{:>3}. {} ({} stops, {:.2} km){}",
            i + 1,
            saved.name,
            saved.route.len(),
            path_length_km(&saved.route),
            saved
                .saved_at
                .as_deref()
                .map(|t| format!("  saved {}", t))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn geocode_names(config: &AppConfig, names: &[String]) -> Result<(), String> {
    let gazetteer = load_gazetteer(config)?
        .ok_or_else(|| "no gazetteer configured (use --gazetteer or [geocoding] gazetteer)".to_string())?;

    let mut missing = 0;
    for name in names {
        match gazetteer.locate(name) {
            Ok(p) => println!("{}: {:.6}, {:.6}", name, p.lat, p.lng),
            Err(e) => {
                eprintln!("{}", e);
                missing += 1;
            }
        }
    }

    if missing > 0 {
        return Err(format!("{} of {} names not found", missing, names.len()));
    }
    Ok(())
}

fn analyze_locations(path: &Path, optimizer: &RouteOptimizer) -> Result<(), String> {
    let records = load_locations(path)?;
    let instance = RouteInstance::from_file(path)?;

    println!("========== Location Analysis ==========\n");
    println!("{}", instance.statistics());
    println!("Records: {} ({} malformed)", records.len(), records.len() - instance.dimension);

    if instance.dimension < 3 {
        println!("\nNothing to optimize with fewer than 3 usable points.");
        return Ok(());
    }

    let input_order: Vec<usize> = (0..instance.dimension).collect();
    let nn = NearestNeighborHeuristic::new().construct(&instance);
    let ga_route = optimizer.optimize(&instance.points);

    println!("\nQuick Solution Estimates:");
    println!(
        "  Input order:      {:.6} ({:.2} km)",
        instance.route_length(&input_order),
        path_length_km(&instance.points)
    );
    println!(
        "  Nearest Neighbor: {:.6} ({:.2} km)",
        nn.cost,
        path_length_km(&nn.points(&instance))
    );
    println!(
        "  Genetic:          {:.6} ({:.2} km)",
        path_length(&ga_route),
        path_length_km(&ga_route)
    );

    Ok(())
}

fn run_benchmark(
    input: &Path,
    runs: usize,
    output: &Path,
    show_progress: bool,
    optimizer: RouteOptimizer,
) -> Result<(), String> {
    let instance = RouteInstance::from_file(input)?;
    println!("Loaded {} ({} points)", instance.name, instance.dimension);

    std::fs::create_dir_all(output).map_err(|e| format!("Cannot create {:?}: {}", output, e))?;

    let config = BenchmarkConfig {
        num_runs: runs,
        random_samples: optimizer.config().population_size,
        show_progress,
    };
    let mut benchmark = Benchmark::new(config, optimizer);
    benchmark.run_on_instance(&instance);

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path).map_err(|e| e.to_string())?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path).map_err(|e| e.to_string())?;
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report).map_err(|e| e.to_string())?;
    println!("Report saved to {:?}", report_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_and_place_conflict() {
        let both = Cli::try_parse_from(["route-sequencer", "optimize", "--input", "stops.csv", "--place", "Paris"]);
        assert!(both.is_err());

        let places = Cli::try_parse_from(["route-sequencer", "optimize", "-p", "Paris", "-p", "Lyon"]).unwrap();
        match places.command {
            Commands::Optimize { input, place, .. } => {
                assert!(input.is_none());
                assert_eq!(place, vec!["Paris".to_string(), "Lyon".to_string()]);
            }
            _ => panic!("expected optimize"),
        }
    }
}
