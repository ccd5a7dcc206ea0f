//! Process-wide metrics for the navigation pipeline.
//!
//! One concurrency-safe recorder shared by every component. Counters are
//! advisory: initialized at process start, reset only by restart. Consumed
//! by the pipeline and loops, consulted by nothing but the metrics endpoint.

use chrono::Utc;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rolling window for latency samples.
const LATENCY_WINDOW: Duration = Duration::from_secs(3600);
/// Rolling window for error records.
const ERROR_WINDOW: Duration = Duration::from_secs(86_400);
/// Error messages are truncated to keep records bounded.
const ERROR_MESSAGE_MAX: usize = 200;

#[derive(Debug, Clone)]
struct LatencySample {
    recorded_at: Instant,
    duration_ms: f64,
}

#[derive(Debug, Clone)]
struct ErrorRecord {
    recorded_at: Instant,
    kind: String,
    message: String,
}

pub struct Metrics {
    requests: AtomicU64,
    fallbacks: AtomicU64,
    latencies: Mutex<Vec<LatencySample>>,
    errors: Mutex<Vec<ErrorRecord>>,
    compression_original_bytes: AtomicU64,
    compression_compressed_bytes: AtomicU64,
    compression_count: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
            latencies: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            compression_original_bytes: AtomicU64::new(0),
            compression_compressed_bytes: AtomicU64::new(0),
            compression_count: AtomicU64::new(0),
        }
    }

    pub fn increment_request_count(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_fallback_count(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one AI call's wall-clock latency.
    pub fn record_ai_latency(&self, duration_ms: f64) {
        if let Ok(mut latencies) = self.latencies.lock() {
            latencies.push(LatencySample {
                recorded_at: Instant::now(),
                duration_ms,
            });
            retain_window(&mut latencies, LATENCY_WINDOW, |s| s.recorded_at);
        }
        tracing::debug!("AI latency recorded: {:.2}ms", duration_ms);
    }

    /// Record an AI failure with a stable kind and a truncated message.
    pub fn record_ai_error(&self, kind: &str, message: &str) {
        let message: String = message.chars().take(ERROR_MESSAGE_MAX).collect();
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(ErrorRecord {
                recorded_at: Instant::now(),
                kind: kind.to_string(),
                message,
            });
            retain_window(&mut errors, ERROR_WINDOW, |e| e.recorded_at);
        }
        tracing::warn!("AI error recorded: {kind}");
    }

    pub fn record_compression(&self, original_bytes: u64, compressed_bytes: u64) {
        self.compression_original_bytes
            .fetch_add(original_bytes, Ordering::Relaxed);
        self.compression_compressed_bytes
            .fetch_add(compressed_bytes, Ordering::Relaxed);
        self.compression_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    /// Snapshot of all metrics for the metrics endpoint.
    pub fn summary(&self) -> Value {
        let (avg_latency_ms, recent_requests) = match self.latencies.lock() {
            Ok(mut latencies) => {
                retain_window(&mut latencies, LATENCY_WINDOW, |s| s.recorded_at);
                let count = latencies.len();
                let avg = if count > 0 {
                    latencies.iter().map(|s| s.duration_ms).sum::<f64>() / count as f64
                } else {
                    0.0
                };
                (avg, count)
            }
            Err(_) => (0.0, 0),
        };

        let (error_count, recent_errors) = match self.errors.lock() {
            Ok(mut errors) => {
                retain_window(&mut errors, ERROR_WINDOW, |e| e.recorded_at);
                let recent: Vec<Value> = errors
                    .iter()
                    .rev()
                    .take(10)
                    .map(|e| json!({ "type": e.kind, "message": e.message }))
                    .collect();
                (errors.len(), recent)
            }
            Err(_) => (0, Vec::new()),
        };

        let requests = self.request_count();
        let fallbacks = self.fallback_count();
        let fallback_rate = if requests > 0 {
            fallbacks as f64 / requests as f64 * 100.0
        } else {
            0.0
        };

        let original = self.compression_original_bytes.load(Ordering::Relaxed);
        let compressed = self.compression_compressed_bytes.load(Ordering::Relaxed);
        let saved = original.saturating_sub(compressed);
        let avg_compression = if original > 0 {
            saved as f64 / original as f64 * 100.0
        } else {
            0.0
        };

        json!({
            "ai_performance": {
                "average_latency_ms": (avg_latency_ms * 100.0).round() / 100.0,
                "recent_requests": recent_requests,
                "error_count_24h": error_count,
                "recent_errors": recent_errors,
            },
            "usage": {
                "total_requests": requests,
                "fallback_count": fallbacks,
                "fallback_rate_percent": (fallback_rate * 100.0).round() / 100.0,
            },
            "compression": {
                "total_bytes_saved": saved,
                "total_images_compressed": self.compression_count.load(Ordering::Relaxed),
                "average_compression_percent": (avg_compression * 100.0).round() / 100.0,
            },
            "timestamp": Utc::now().to_rfc3339(),
        })
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn retain_window<T>(records: &mut Vec<T>, window: Duration, recorded_at: impl Fn(&T) -> Instant) {
    let now = Instant::now();
    records.retain(|r| now.duration_since(recorded_at(r)) <= window);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = Metrics::new();
        metrics.increment_request_count();
        metrics.increment_request_count();
        metrics.increment_fallback_count();
        assert_eq!(metrics.request_count(), 2);
        assert_eq!(metrics.fallback_count(), 1);

        let summary = metrics.summary();
        assert_eq!(summary["usage"]["total_requests"], 2);
        assert_eq!(summary["usage"]["fallback_rate_percent"], 50.0);
    }

    #[test]
    fn latency_average_in_summary() {
        let metrics = Metrics::new();
        metrics.record_ai_latency(100.0);
        metrics.record_ai_latency(300.0);
        let summary = metrics.summary();
        assert_eq!(summary["ai_performance"]["average_latency_ms"], 200.0);
        assert_eq!(summary["ai_performance"]["recent_requests"], 2);
    }

    #[test]
    fn error_messages_are_truncated() {
        let metrics = Metrics::new();
        let long_message = "x".repeat(500);
        metrics.record_ai_error("upstream_unavailable", &long_message);
        let summary = metrics.summary();
        let recorded = summary["ai_performance"]["recent_errors"][0]["message"]
            .as_str()
            .unwrap();
        assert_eq!(recorded.len(), 200);
    }

    #[test]
    fn compression_savings_accumulate() {
        let metrics = Metrics::new();
        metrics.record_compression(10_000, 4_000);
        metrics.record_compression(5_000, 2_000);
        let summary = metrics.summary();
        assert_eq!(summary["compression"]["total_bytes_saved"], 9_000);
        assert_eq!(summary["compression"]["total_images_compressed"], 2);
        assert_eq!(summary["compression"]["average_compression_percent"], 60.0);
    }
}
