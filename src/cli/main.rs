//! Command-line point lookup against the IBGE boundary data.
//!
//! Resolves every administrative level for one coordinate and prints the
//! result as JSON.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use jacaranda::ibge::{DEFAULT_LOCALIDADES_URL, DEFAULT_MALHAS_URL};
use jacaranda::{GeoCoords, GeoLocator, IbgeClient, Quality};

#[derive(Parser, Debug)]
#[command(name = "locate")]
#[command(about = "Resolve the Brazilian administrative regions containing a point")]
struct Args {
    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Boundary quality tier: low, medium, or high
    #[arg(long, default_value = "low")]
    quality: Quality,

    /// Base URL of the IBGE mesh (malhas) API
    #[arg(long, default_value = DEFAULT_MALHAS_URL)]
    malhas_url: String,

    /// Base URL of the IBGE localities (localidades) API
    #[arg(long, default_value = DEFAULT_LOCALIDADES_URL)]
    localidades_url: String,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let coords = GeoCoords::new(args.lat, args.lon)?;
    info!("Resolving {} at {:?} quality", coords, args.quality);

    let client = IbgeClient::with_base_urls(&args.malhas_url, &args.localidades_url);
    let mut locator = GeoLocator::with_source(coords, args.quality, client);

    let resolution = locator.resolve().await?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&resolution)?
    } else {
        serde_json::to_string(&resolution)?
    };
    println!("{output}");

    Ok(())
}
