use clap::Parser;
use route_sequencer::config::AppConfig;
use route_sequencer::store::RouteStore;
use route_sequencer::visualization::Visualizer;
use std::fs;
use std::path::PathBuf;

/// Render every saved route to SVG (and PNG when a converter is available)
#[derive(Parser)]
#[command(name = "render-routes")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Route log file (overrides the configuration file)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "renders")]
    out_dir: PathBuf,

    /// Also convert each SVG to PNG
    #[arg(long)]
    png: bool,
}

fn file_stem(index: usize, name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{:03}_{}", index + 1, slug.trim_matches('_'))
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = match AppConfig::load_or_default(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };
    let store = RouteStore::new(args.store.unwrap_or(config.storage.path));

    let routes = match store.list() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to read {:?}: {}", store.path(), e);
            std::process::exit(1);
        }
    };
    if routes.is_empty() {
        println!("No saved routes in {:?}", store.path());
        return;
    }

    if let Err(e) = fs::create_dir_all(&args.out_dir) {
        eprintln!("Failed to create {:?}: {}", args.out_dir, e);
        std::process::exit(1);
    }

    let viz = Visualizer::new();
    for (i, saved) in routes.iter().enumerate() {
        let svg = viz.generate_svg(&saved.name, &saved.route);
        let svg_path = args.out_dir.join(format!("{}.svg", file_stem(i, &saved.name)));
        if let Err(e) = viz.save_svg(&svg, &svg_path) {
            eprintln!("Failed to write {:?}: {}", svg_path, e);
            continue;
        }
        println!("Rendered '{}' -> {:?}", saved.name, svg_path);

        if args.png {
            let png_path = svg_path.with_extension("png");
            match viz.save_png(&svg, &png_path) {
                Ok(()) => println!("Converted {:?}", png_path),
                Err(e) => eprintln!("Failed to convert {:?}: {}", svg_path, e),
            }
        }
    }
}
