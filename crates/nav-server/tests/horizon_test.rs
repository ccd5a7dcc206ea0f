//! Horizon refinement API integration tests.
//!
//! Run with: cargo test --test horizon_test -- --ignored
//!
//! Note: Requires a running navigation server at http://localhost:3000
//! or set NAV_TEST_URL environment variable.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;

fn base_url() -> String {
    std::env::var("NAV_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

#[tokio::test]
#[ignore] // Run only when server is running
async fn horizon_never_drops_pois() {
    let client = Client::new();
    let base = base_url();

    let body = serde_json::json!({
        "image": STANDARD.encode(b"landscape frame"),
        "latitude": -0.0917,
        "longitude": 34.7680,
        "heading": 90.0,
        "visible_pois": [
            {"name": "Kisumu City", "bearing_degrees": 87.0, "distance_meters": 12400.0},
            {"name": "Radio Mast", "bearing_degrees": 101.5, "distance_meters": 3200.0}
        ],
    });

    let resp = client
        .post(format!("{}/v1/analyze-horizon", base))
        .json(&body)
        .send()
        .await
        .expect("Failed to post horizon request");
    assert!(resp.status().is_success());

    let json: serde_json::Value = resp.json().await.unwrap();
    let refined = json["refined_pois"].as_array().unwrap();
    assert_eq!(refined.len(), 2, "refined_pois must keep every input POI");
}

#[tokio::test]
#[ignore]
async fn turn_guidance_always_answers() {
    let client = Client::new();
    let base = base_url();

    let body = serde_json::json!({
        "user_heading": 350.0,
        "target_bearing": 10.0,
        "distance_meters": 740.0,
        "poi_name": "Sunny's Cafe",
    });

    let json: serde_json::Value = client
        .post(format!("{}/v1/turn-guidance", base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["alignment_status"], "turning_left");
    assert!((json["turn_degrees"].as_f64().unwrap() - 20.0).abs() < 0.01);
    assert!(!json["text"].as_str().unwrap().is_empty());
}
