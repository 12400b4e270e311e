//! Incident Extractor - recovers incident details from dashcam stills.

mod config;
mod error;
mod fields;
mod narrative;
mod ocr;
mod pipeline;
mod record;
mod server;
mod timestamp;
#[cfg(feature = "vision")]
mod vision;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::ExtractorConfig;
use pipeline::IncidentExtractor;
use record::IncidentRecord;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "incident-extractor")]
#[command(about = "Extract date, time, registration, colour and incident type from dashcam images")]
#[command(version)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract incident details from one image
    Extract {
        image: PathBuf,

        /// Vision provider API key; without one only local OCR is used
        #[arg(long, env = config::CREDENTIAL_ENV, hide_env_values = true)]
        api_key: Option<String>,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,

        /// Also print the narrative for the detected incident type
        #[arg(long)]
        narrative: bool,
    },
    /// Start the HTTP server
    Serve {
        #[arg(long, default_value = "0.0.0.0:3000")]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "incident_extractor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ExtractorConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            image,
            api_key,
            json,
            narrative,
        } => {
            let extractor = IncidentExtractor::new(&config, api_key.as_deref());
            let record = extractor.extract(&image).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_report(&record);
            }

            if narrative {
                match record.incident_type {
                    Some(kind) => println!("\n{}", narrative::narrative_for(kind)),
                    None => println!("\nNo narrative: incident type NOT FOUND"),
                }
            }
        }
        Commands::Serve { addr } => {
            let credential = config::credential_from_env();
            let extractor = IncidentExtractor::new(&config, credential.as_deref());
            info!(
                "Text recognition: {}",
                if extractor.has_remote_recognition() {
                    "remote vision with local OCR fallback"
                } else {
                    "local OCR"
                }
            );

            let state = server::AppState {
                extractor: Arc::new(extractor),
            };
            server::serve(&addr, state).await?;
        }
    }

    Ok(())
}

fn print_report(record: &IncidentRecord) {
    const ABSENT: &str = "NOT FOUND";

    let rows = [
        ("Date", record.date_string()),
        ("Time", record.time_string()),
        ("Day of week", record.day_of_week()),
        ("Registration", record.registration.clone()),
        ("Colour", record.colour.clone()),
        ("Incident type", record.incident_type.map(|t| t.to_string())),
    ];

    println!("EXTRACTED INFORMATION");
    println!("{}", "=".repeat(40));
    for (label, value) in rows {
        println!("{:<14} {}", format!("{}:", label), value.as_deref().unwrap_or(ABSENT));
    }
}
