//! Shared helpers for the CLI tools.

/// Server base URL from `NAV_SERVER_URL`, defaulting to localhost.
pub fn base_url() -> String {
    std::env::var("NAV_SERVER_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Pretty-print a JSON response body, falling back to raw text.
pub fn print_response(body: &str) {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default()),
        Err(_) => println!("{body}"),
    }
}
