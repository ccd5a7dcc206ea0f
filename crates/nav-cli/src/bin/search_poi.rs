//! Search a POI and print its AR anchoring data.

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser)]
#[command(about = "Search a POI by name and print bearing/elevation data")]
struct Args {
    /// POI name (partial match)
    #[arg(long)]
    query: String,

    #[arg(long)]
    lat: f64,

    #[arg(long)]
    lon: f64,

    /// Observer altitude in meters
    #[arg(long, default_value_t = 0.0)]
    alt: f64,

    /// Server base URL (overrides NAV_SERVER_URL)
    #[arg(long)]
    server: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let base = args.server.unwrap_or_else(nav_cli::base_url);

    let client = reqwest::blocking::Client::new();
    let response = client
        .get(format!("{base}/v1/poi/search"))
        .query(&[
            ("q", args.query.as_str()),
            ("lat", &args.lat.to_string()),
            ("lon", &args.lon.to_string()),
            ("alt", &args.alt.to_string()),
        ])
        .send()
        .context("Failed to reach navigation server")?;

    let status = response.status();
    let text = response.text().unwrap_or_default();
    println!("HTTP {status}");
    nav_cli::print_response(&text);

    Ok(())
}
