//! Thread-safe metrics collection
//!
//! Atomic counters for routing decisions and feedback intake, plus a bounded
//! window of routing latencies for percentile reporting.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

const MAX_LATENCY_SAMPLES: usize = 1000;

/// Thread-safe metrics collector using atomics and a mutex-protected window
pub struct MetricsCollector {
    // Routing
    routes_decided: AtomicU64,
    routes_fallback: AtomicU64,
    routes_failed: AtomicU64,
    routing_times: Mutex<Vec<u64>>, // microseconds

    // Feedback intake
    feedback_recorded: AtomicU64,
    anonymized_recorded: AtomicU64,
    validation_failures: AtomicU64,

    // Collaborator failures
    store_timeouts: AtomicU64,
    store_errors: AtomicU64,

    started_at: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            routes_decided: AtomicU64::new(0),
            routes_fallback: AtomicU64::new(0),
            routes_failed: AtomicU64::new(0),
            routing_times: Mutex::new(Vec::new()),
            feedback_recorded: AtomicU64::new(0),
            anonymized_recorded: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            store_timeouts: AtomicU64::new(0),
            store_errors: AtomicU64::new(0),
            started_at: AtomicU64::new(current_timestamp()),
        }
    }

    /// A routing call returned a winner
    pub fn route_decided(&self, duration: Duration, fallback: bool) {
        self.routes_decided.fetch_add(1, Ordering::Relaxed);
        if fallback {
            self.routes_fallback.fetch_add(1, Ordering::Relaxed);
        }
        self.record_routing_time(duration);
    }

    pub fn route_failed(&self) {
        self.routes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn feedback_recorded(&self) {
        self.feedback_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn anonymized_feedback_recorded(&self) {
        self.anonymized_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn validation_failed(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn store_timed_out(&self) {
        self.store_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn store_failed(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_routing_time(&self, duration: Duration) {
        if let Ok(mut times) = self.routing_times.lock() {
            times.push(duration.as_micros() as u64);

            if times.len() > MAX_LATENCY_SAMPLES {
                times.remove(0);
            }
        }
    }

    fn routing_time_statistics(&self) -> (f64, f64, f64, f64) {
        let Ok(times) = self.routing_times.lock() else {
            return (0.0, 0.0, 0.0, 0.0);
        };
        if times.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }

        let mut sorted = times.clone();
        sorted.sort_unstable();
        let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;

        (
            avg,
            percentile(&sorted, 50.0),
            percentile(&sorted, 95.0),
            percentile(&sorted, 99.0),
        )
    }

    /// Get complete metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let now = current_timestamp();
        let (avg, p50, p95, p99) = self.routing_time_statistics();

        MetricsSnapshot {
            routing: RoutingMetrics {
                routes_decided: self.routes_decided.load(Ordering::Relaxed),
                routes_fallback: self.routes_fallback.load(Ordering::Relaxed),
                routes_failed: self.routes_failed.load(Ordering::Relaxed),
                avg_routing_time_us: avg,
                routing_time_p50_us: p50,
                routing_time_p95_us: p95,
                routing_time_p99_us: p99,
            },
            feedback: FeedbackMetrics {
                feedback_recorded: self.feedback_recorded.load(Ordering::Relaxed),
                anonymized_recorded: self.anonymized_recorded.load(Ordering::Relaxed),
                validation_failures: self.validation_failures.load(Ordering::Relaxed),
            },
            store: StoreMetrics {
                timeouts: self.store_timeouts.load(Ordering::Relaxed),
                errors: self.store_errors.load(Ordering::Relaxed),
            },
            uptime_seconds: now.saturating_sub(self.started_at.load(Ordering::Relaxed)),
            timestamp: now,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub routing: RoutingMetrics,
    pub feedback: FeedbackMetrics,
    pub store: StoreMetrics,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct RoutingMetrics {
    pub routes_decided: u64,
    pub routes_fallback: u64,
    pub routes_failed: u64,
    pub avg_routing_time_us: f64,
    pub routing_time_p50_us: f64,
    pub routing_time_p95_us: f64,
    pub routing_time_p99_us: f64,
}

#[derive(Debug, Serialize)]
pub struct FeedbackMetrics {
    pub feedback_recorded: u64,
    pub anonymized_recorded: u64,
    pub validation_failures: u64,
}

#[derive(Debug, Serialize)]
pub struct StoreMetrics {
    pub timeouts: u64,
    pub errors: u64,
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let len = sorted_data.len();
    let index = (percentile / 100.0) * (len - 1) as f64;

    if index.fract() == 0.0 {
        sorted_data[index as usize] as f64
    } else {
        let lower_value = sorted_data[index.floor() as usize] as f64;
        let upper_value = sorted_data[index.ceil() as usize] as f64;
        lower_value + (upper_value - lower_value) * index.fract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_routing_metrics() {
        let collector = MetricsCollector::new();

        collector.route_decided(Duration::from_micros(100), false);
        collector.route_decided(Duration::from_micros(300), true);
        collector.route_failed();

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.routing.routes_decided, 2);
        assert_eq!(snapshot.routing.routes_fallback, 1);
        assert_eq!(snapshot.routing.routes_failed, 1);
        assert_eq!(snapshot.routing.avg_routing_time_us, 200.0);
    }

    #[test]
    fn test_feedback_and_store_metrics() {
        let collector = MetricsCollector::new();

        collector.feedback_recorded();
        collector.anonymized_feedback_recorded();
        collector.validation_failed();
        collector.store_timed_out();
        collector.store_failed();

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.feedback.feedback_recorded, 1);
        assert_eq!(snapshot.feedback.anonymized_recorded, 1);
        assert_eq!(snapshot.feedback.validation_failures, 1);
        assert_eq!(snapshot.store.timeouts, 1);
        assert_eq!(snapshot.store.errors, 1);
    }

    #[test]
    fn test_latency_window_is_bounded() {
        let collector = MetricsCollector::new();
        for i in 0..(MAX_LATENCY_SAMPLES + 50) {
            collector.route_decided(Duration::from_micros(i as u64), false);
        }
        assert_eq!(
            collector.routing_times.lock().unwrap().len(),
            MAX_LATENCY_SAMPLES
        );
    }

    #[test]
    fn test_percentile() {
        let data = vec![10, 20, 30, 40, 50];
        assert_eq!(percentile(&data, 0.0), 10.0);
        assert_eq!(percentile(&data, 50.0), 30.0);
        assert_eq!(percentile(&data, 100.0), 50.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_concurrent_updates() {
        let collector = Arc::new(MetricsCollector::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let collector = Arc::clone(&collector);
                thread::spawn(move || {
                    for _ in 0..100 {
                        collector.feedback_recorded();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(collector.snapshot().feedback.feedback_recorded, 800);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(MetricsCollector::new().snapshot()).unwrap();
        assert!(json["routing"]["routes_decided"].is_u64());
        assert!(json["store"]["timeouts"].is_u64());
    }
}
