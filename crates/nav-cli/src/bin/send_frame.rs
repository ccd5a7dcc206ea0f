//! Send a camera frame to the navigation server for analysis.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Parser;

#[derive(Parser)]
#[command(about = "Post a camera frame with GPS and heading for analysis")]
struct Args {
    /// Path to a JPEG frame
    #[arg(long)]
    image: String,

    #[arg(long)]
    lat: f64,

    #[arg(long)]
    lon: f64,

    /// Compass heading in degrees (0 = north)
    #[arg(long, default_value_t = 0.0)]
    heading: f64,

    /// Destination landmark name
    #[arg(long)]
    destination: Option<String>,

    /// Reasoning token from the previous frame
    #[arg(long)]
    token: Option<String>,

    /// Server base URL (overrides NAV_SERVER_URL)
    #[arg(long)]
    server: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let base = args.server.unwrap_or_else(nav_cli::base_url);

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read image {}", args.image))?;

    let mut body = serde_json::json!({
        "image": STANDARD.encode(&bytes),
        "latitude": args.lat,
        "longitude": args.lon,
        "heading": args.heading,
    });
    if let Some(destination) = args.destination {
        body["destination"] = destination.into();
    }
    if let Some(token) = args.token {
        body["reasoning_token"] = token.into();
    }

    let client = reqwest::blocking::Client::new();
    let response = client
        .post(format!("{base}/v1/analyze-frame"))
        .json(&body)
        .send()
        .context("Failed to reach navigation server")?;

    let status = response.status();
    let text = response.text().unwrap_or_default();
    println!("HTTP {status}");
    nav_cli::print_response(&text);

    Ok(())
}
