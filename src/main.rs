//! Tripboard - interactive travel itinerary viewer
//!
//! CLI commands:
//! - view: Launch the native viewer
//! - list: Print days and items to stdout
//! - route: Print the derived external route link per day
//! - fetch: Download a schedule document to disk

mod config;
mod filter;
mod gui;
mod links;
mod logging;
mod map;
mod schedule;
mod spy;
mod view;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tripboard")]
#[command(about = "Interactive travel itinerary viewer with per-day maps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to tripboard.yaml config
    #[arg(short, long, default_value = "tripboard.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the native viewer
    View {
        /// Schedule document to load, overriding the config
        #[arg(long)]
        schedule: Option<PathBuf>,
    },

    /// List days and their items
    List {
        /// Filter items by category (move, stay, food, sight, free)
        #[arg(short = 'k', long)]
        category: Option<String>,
    },

    /// Print the external multi-stop route link per day
    Route {
        /// Only this day id
        #[arg(long)]
        day: Option<String>,
    },

    /// Download a schedule document
    Fetch {
        /// Endpoint to fetch from, overriding SCHEDULE_URL / config
        #[arg(long)]
        url: Option<String>,

        /// Where to write the normalized document
        #[arg(short, long, default_value = "schedule.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let secrets = config::Secrets::load();
    logging::init_logging(&secrets.log_dir);
    tracing::info!("Tripboard starting up");

    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        tracing::info!("Loading config from {:?}", cli.config);
        config::Config::load(&cli.config)?
    } else {
        tracing::warn!("Config file not found: {:?}, using defaults", cli.config);
        config::Config::default()
    };
    if let Some(url) = &secrets.schedule_url {
        config.schedule_url = Some(url.clone());
    }

    match cli.command {
        Commands::View { schedule } => {
            let days = load_days(&config, schedule.as_deref()).await;
            tracing::info!("Loaded plan: {} days", days.len());
            gui::run_viewer(config, days)?;
        }

        Commands::List { category } => {
            let days = load_days(&config, None).await;
            list_days(&days, category.as_deref());
        }

        Commands::Route { day } => {
            let days = load_days(&config, None).await;
            print_routes(&days, day.as_deref());
        }

        Commands::Fetch { url, output } => {
            let url = url
                .or_else(|| config.schedule_url.clone())
                .ok_or_else(|| anyhow::anyhow!("No schedule URL given (--url or SCHEDULE_URL)"))?;
            let days = schedule::fetch(&url).await;
            if days.is_empty() {
                anyhow::bail!("Fetched an empty schedule from {}", url);
            }
            std::fs::write(&output, serde_json::to_string_pretty(&days)?)?;
            println!("Saved {} days to {:?}", days.len(), output);
        }
    }

    Ok(())
}

/// Load the day list: explicit path, then configured URL, then local file.
/// Every path degrades to an empty plan rather than failing.
async fn load_days(config: &config::Config, path: Option<&std::path::Path>) -> Vec<schedule::Day> {
    if let Some(path) = path {
        return schedule::load_file(path);
    }
    if let Some(url) = &config.schedule_url {
        return schedule::fetch(url).await;
    }
    schedule::load_file(&config.schedule)
}

/// Print days and items, optionally filtered to one category
fn list_days(days: &[schedule::Day], category: Option<&str>) {
    if days.is_empty() {
        println!("No itinerary loaded");
        return;
    }

    for day in days {
        println!("## {} {}", day.date, day.title);
        for item in &day.items {
            if let Some(cat) = category {
                if item.category.as_str() != cat {
                    continue;
                }
            }
            println!("  {:>5}  [{}] {}", item.time, item.category.as_str(), item.text);
        }
        let points = day.valid_points().count();
        if points > 0 {
            println!("  ({} map points)", points);
        }
        println!();
    }
}

/// Print the derived route link for each (or one) day
fn print_routes(days: &[schedule::Day], only: Option<&str>) {
    for day in days {
        if let Some(id) = only {
            if day.id != id {
                continue;
            }
        }
        let points: Vec<_> = day.valid_points().cloned().collect();
        match links::route_url(&points) {
            Some(url) => println!("{}: {}", day.id, url),
            None => println!("{}: (no route)", day.id),
        }
    }
}
