#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tools for the environmental report severity map.
//!
//! Loads locations and reports from the reporting API (`ECOWATCH_API_URL`),
//! renders the severity markers, and prints or exports them. Can also
//! start the map server.

mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ecowatch_client::ApiClient;
use ecowatch_map::{MapConfig, MapRenderer, render_page};
use ecowatch_severity_models::SeverityFilter;

#[derive(Parser)]
#[command(name = "ecowatch", about = "Environmental report severity map tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the map and print or export its markers
    Markers {
        /// Show only one tier (`Low`, `Medium`, `High`, `Critical`) or `All`
        #[arg(long, default_value = "All")]
        severity: SeverityFilter,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the detail view of one location
    Location {
        /// Location id
        id: i64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Start the map server
    Serve,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Plain-text table of visible markers
    Table,
    /// `GeoJSON` feature collection of all markers
    Geojson,
    /// Standalone Leaflet page
    Html,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Markers {
            severity,
            format,
            output,
        } => {
            let renderer = load_renderer(severity).await?;
            let text = match format {
                Format::Table => output::marker_table(renderer.visible_markers()),
                Format::Geojson => {
                    geojson::GeoJson::from(renderer.to_geojson()).to_string() + "\n"
                }
                Format::Html => render_page(&renderer, "Environmental Report Map"),
            };
            write_output(output.as_ref(), &text)?;
        }
        Commands::Location { id, json } => {
            let renderer = load_renderer(SeverityFilter::All).await?;
            let Some(detail) = renderer.detail(id) else {
                return Err(format!("location {id} not found or has no valid coordinates").into());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print!("{}", output::detail_text(&detail));
            }
        }
        Commands::Serve => {
            // The server uses actix-web's runtime, so run it in a blocking
            // task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(ecowatch_server::run_server())
            })
            .await??;
        }
    }

    Ok(())
}

async fn load_renderer(filter: SeverityFilter) -> Result<MapRenderer, Box<dyn std::error::Error>> {
    let config = MapConfig::load()?;
    let client = ApiClient::from_env()?;

    let mut renderer = MapRenderer::new(config);
    renderer.apply_filter(filter);
    let summary = renderer.load(&client).await?;
    log::info!(
        "{} markers, {} visible",
        summary.markers,
        renderer.visible_markers().count()
    );

    Ok(renderer)
}

fn write_output(path: Option<&PathBuf>, text: &str) -> std::io::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, text)?;
            log::info!("Wrote {}", path.display());
            Ok(())
        }
        None => {
            print!("{text}");
            Ok(())
        }
    }
}
