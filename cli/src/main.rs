use clap::{Parser, Subcommand, ValueEnum};
use eda_common::characterization::Characterization;
use eda_common::fabric::TileCoord;
use eda_common::util::config::Config;
use eda_common::util::logger;
use eda_lookahead::{Estimator, LookaheadError};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the lookahead tables and write the cache file.
    Build,
    /// Estimate the delay between two tiles.
    Query {
        #[arg(long, value_name = "X,Y")]
        from: TileCoord,
        #[arg(long, value_name = "X,Y")]
        to: TileCoord,
        /// Print the chosen decomposition as well.
        #[arg(long)]
        explain: bool,
    },
    /// Print straight-line delays for distances 0..=max.
    Sweep {
        #[arg(long, value_enum, default_value_t = AxisArg::H)]
        axis: AxisArg,
        #[arg(long, default_value_t = 24)]
        max: u32,
    },
    /// Print table statistics.
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
enum AxisArg {
    #[value(alias = "horizontal")]
    H,
    #[value(alias = "vertical")]
    V,
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let config = if args.config.exists() {
        log::info!("Loading configuration from {:?}", args.config);
        let config_str = std::fs::read_to_string(&args.config)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?
    } else {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            args.config
        );
        Config::default()
    };

    let command = args.command.unwrap_or(Commands::Stats);

    match command {
        Commands::Build => {
            let estimator = build_estimator(&config)?;
            write_cache(&estimator, &config.input.cache_file)?;
        }
        Commands::Query { from, to, explain } => {
            let estimator = load_or_build(&config)?;
            if explain {
                let estimate = estimator
                    .explain(from, to)
                    .map_err(|e| anyhow::anyhow!("Query {} -> {} failed: {}", from, to, e))?;
                print!("{}", estimate);
            } else {
                let delay = estimator
                    .estimate_delay(from, to)
                    .map_err(|e| anyhow::anyhow!("Query {} -> {} failed: {}", from, to, e))?;
                println!("{}", delay);
            }
        }
        Commands::Sweep { axis, max } => {
            let estimator = load_or_build(&config)?;
            let origin = TileCoord::new(0, 0);
            for d in 0..=max {
                let sink = match axis {
                    AxisArg::H => TileCoord::new(d, 0),
                    AxisArg::V => TileCoord::new(0, d),
                };
                match estimator.estimate_delay(origin, sink) {
                    Ok(delay) => println!("{:>4} {:>8}", d, delay),
                    Err(e) => println!("{:>4} {:>8}  ({})", d, "-", e),
                }
            }
        }
        Commands::Stats => {
            let estimator = load_or_build(&config)?;
            let stats = estimator.stats();
            let lookahead = estimator.config();
            println!(
                "tables:      {} x {} (detour budget {})",
                lookahead.table_width, lookahead.table_height, lookahead.detour_budget
            );
            println!("cells:       {}", stats.cells);
            println!("unreachable: {}", stats.unreachable);
            println!("vertices:    {}", stats.vertices);
            println!("edges:       {}", stats.edges);
            println!();
            for entry in estimator.hierarchy().entries() {
                let next: Vec<&str> = entry.next.iter().map(|g| g.name()).collect();
                println!(
                    "{:<12} {:<7} len {:>2} -> {}",
                    entry.group.name(),
                    format!("{:?}", entry.group.delay_class()),
                    entry.group.length(),
                    next.join(", ")
                );
            }
        }
    }

    Ok(())
}

fn load_characterization(config: &Config) -> anyhow::Result<Characterization> {
    let Some(path) = &config.input.fabric_file else {
        log::info!("No fabric file configured. Using the reference fabric.");
        return Ok(Characterization::reference());
    };
    log::info!("Loading fabric characterization from {}", path);
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read fabric file '{}': {}", path, e))?;
    toml::from_str(&text).map_err(|e| anyhow::anyhow!("Invalid fabric TOML in '{}': {}", path, e))
}

fn build_estimator(config: &Config) -> anyhow::Result<Estimator> {
    let characterization = load_characterization(config)?;
    Estimator::build(&characterization, &config.lookahead)
        .map_err(|e| anyhow::anyhow!("Failed to build lookahead: {}", e))
}

/// Reuses the cache file when it decodes and matches the configuration.
fn load_or_build(config: &Config) -> anyhow::Result<Estimator> {
    let path = Path::new(&config.input.cache_file);
    if path.exists() {
        let bytes = std::fs::read(path)?;
        match Estimator::deserialize(&bytes) {
            Ok(estimator) if estimator.config() == &config.lookahead => {
                log::info!("Loaded lookahead from {:?}", path);
                return Ok(estimator);
            }
            Ok(_) => log::warn!("Cache {:?} was built with other settings. Rebuilding.", path),
            Err(LookaheadError::Serialization(e)) => {
                log::warn!("Cache {:?} is unusable ({}). Rebuilding.", path, e)
            }
            Err(e) => return Err(anyhow::anyhow!(e)),
        }
    }
    let estimator = build_estimator(config)?;
    write_cache(&estimator, &config.input.cache_file)?;
    Ok(estimator)
}

fn write_cache(estimator: &Estimator, path_str: &str) -> anyhow::Result<()> {
    prepare_output_dir(path_str)?;
    let bytes = estimator
        .serialize()
        .map_err(|e| anyhow::anyhow!("Failed to encode lookahead: {}", e))?;
    std::fs::write(path_str, &bytes)?;
    log::info!("Wrote {} bytes to {}", bytes.len(), path_str);
    Ok(())
}

fn prepare_output_dir(path_str: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path_str).parent()
        && !parent.exists()
        && !parent.as_os_str().is_empty()
    {
        log::info!("Creating output directory: {:?}", parent);
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
