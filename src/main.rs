use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use skycast::config::SkycastConfig;
use skycast::current::CurrentWeatherService;
use skycast::error::SkycastError;
use skycast::models::CurrentReport;
use skycast::{cache, web};

#[derive(Parser)]
#[command(
    name = "skycast",
    version,
    about = "Current weather lookup and display for the terminal and browser"
)]
struct Cli {
    /// Path to a config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show current conditions for a place (the default command)
    Weather {
        /// City name, postal code, or "lat,lon"; omit for the default location
        #[arg(long)]
        location: Option<String>,

        /// Emit the report as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
    /// List geocoding candidates for a name
    Search {
        /// Place name to search for
        name: String,
    },
    /// Serve the JSON API and the display page
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<SkycastError>() {
            Some(skycast_err) => eprintln!("{}", skycast_err.user_message()),
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = SkycastConfig::load_from_path(cli.config.clone())?;
    init_logging(&config, cli.verbose);

    debug!("Using config from: {:?}", cli.config.or_else(SkycastConfig::get_config_path));
    debug!("Cache location: {}", config.cache_dir().display());
    debug!("Log level: {}", config.logging.level);

    init_cache(&config);

    match cli.command.unwrap_or(Command::Weather {
        location: None,
        json: false,
    }) {
        Command::Weather { location, json } => {
            let service = CurrentWeatherService::new(&config)?;
            let report = service.lookup(location.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Command::Search { name } => {
            let service = CurrentWeatherService::new(&config)?;
            let candidates = service.search(&name).await?;
            if candidates.is_empty() {
                println!("No results found for '{name}'");
            } else {
                for candidate in candidates {
                    println!("{}", candidate.summary());
                }
            }
        }
        Command::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            web::run(&config).await?;
        }
    }

    Ok(())
}

fn print_report(report: &CurrentReport) {
    let reading = &report.reading;
    let glyph = match reading.icon_name(report.location.latitude, report.location.longitude) {
        "sun" => "☀",
        "moon" => "☾",
        _ => "☁",
    };
    println!("{}", report.location.label());
    println!(
        "{}  {}  {}",
        glyph,
        reading.format_temperature(),
        reading.condition().description()
    );
    println!(
        "rain {:.1} mm   cloud cover {}%",
        reading.rain_mm, reading.cloud_cover_pct
    );
    println!("observed {}", reading.format_observed());
}

fn init_logging(config: &SkycastConfig, verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Open the persistent cache. A broken cache degrades to uncached lookups
/// rather than blocking the display.
fn init_cache(config: &SkycastConfig) {
    let dir = config.cache_dir();
    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!("Failed to create cache directory {}: {}", dir.display(), e);
        return;
    }
    if let Err(e) = cache::init(&dir) {
        warn!("Failed to open cache database: {}", e);
    }
}
