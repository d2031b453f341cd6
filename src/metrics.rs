//! Request metrics for the churn prediction service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector shared by all request handlers
pub struct ServiceMetrics {
    /// Requests scored successfully
    pub predictions: AtomicU64,
    /// Predictions with label 1
    pub churn_predictions: AtomicU64,
    /// Rejected requests by error kind
    rejections: RwLock<HashMap<String, u64>>,
    /// Handling times (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            predictions: AtomicU64::new(0),
            churn_predictions: AtomicU64::new(0),
            rejections: RwLock::new(HashMap::new()),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a scored request
    pub fn record_prediction(&self, elapsed: Duration, probability: f64, label: u8) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        if label == 1 {
            self.churn_predictions.fetch_add(1, Ordering::Relaxed);
        }

        self.record_latency(elapsed);

        let bucket = ((probability * 10.0).max(0.0) as usize).min(9);
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a rejected request
    pub fn record_rejection(&self, kind: &str, elapsed: Duration) {
        if let Ok(mut by_kind) = self.rejections.write() {
            *by_kind.entry(kind.to_string()).or_insert(0) += 1;
        }
        self.record_latency(elapsed);
    }

    fn record_latency(&self, elapsed: Duration) {
        if let Ok(mut times) = self.latencies.write() {
            times.push(elapsed.as_micros() as u64);
            // Keep only the most recent samples
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    pub fn get_latency_stats(&self) -> LatencyStats {
        let Ok(times) = self.latencies.read() else {
            return LatencyStats::default();
        };
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = times.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.5),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    pub fn get_rejections(&self) -> HashMap<String, u64> {
        self.rejections
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn total_rejections(&self) -> u64 {
        self.get_rejections().values().sum()
    }

    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|b| *b)
            .unwrap_or([0; 10])
    }

    /// Requests handled per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let handled = self.predictions.load(Ordering::Relaxed) + self.total_rejections();
        if elapsed > 0.0 {
            handled as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let predictions = self.predictions.load(Ordering::Relaxed);
        let churn = self.churn_predictions.load(Ordering::Relaxed);
        let churn_rate = if predictions > 0 {
            churn as f64 / predictions as f64 * 100.0
        } else {
            0.0
        };
        let latency = self.get_latency_stats();

        info!(
            predictions = predictions,
            churn = churn,
            churn_rate = format!("{:.1}%", churn_rate),
            rejected = self.total_rejections(),
            throughput = format!("{:.1} req/s", self.get_throughput()),
            "Churn service summary"
        );
        info!(
            mean_us = latency.mean_us,
            p50_us = latency.p50_us,
            p95_us = latency.p95_us,
            p99_us = latency.p99_us,
            max_us = latency.max_us,
            "Request latency"
        );

        for (kind, count) in self.get_rejections() {
            info!(kind = %kind, count = count, "Rejections");
        }

        let dist = self.get_probability_distribution();
        let total: u64 = dist.iter().sum();
        for (i, &count) in dist.iter().enumerate() {
            let pct = if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            let bar = "█".repeat(((pct / 5.0) as usize).min(20));
            info!(
                "  p {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Request latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics summary
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_prediction(Duration::from_micros(100), 0.12, 0);
        metrics.record_prediction(Duration::from_micros(300), 0.91, 1);
        metrics.record_prediction(Duration::from_micros(200), 1.0, 1);

        assert_eq!(metrics.predictions.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.churn_predictions.load(Ordering::Relaxed), 2);

        let dist = metrics.get_probability_distribution();
        assert_eq!(dist[1], 1);
        assert_eq!(dist[9], 2);

        let stats = metrics.get_latency_stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean_us, 200);
        assert_eq!(stats.p50_us, 200);
        assert_eq!(stats.max_us, 300);
    }

    #[test]
    fn test_rejections_by_kind() {
        let metrics = ServiceMetrics::new();
        metrics.record_rejection("schema_mismatch", Duration::from_micros(10));
        metrics.record_rejection("schema_mismatch", Duration::from_micros(10));
        metrics.record_rejection("invalid_request", Duration::from_micros(10));

        let rejections = metrics.get_rejections();
        assert_eq!(rejections.get("schema_mismatch"), Some(&2));
        assert_eq!(metrics.total_rejections(), 3);
        assert_eq!(metrics.predictions.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_empty_latency_stats() {
        let stats = ServiceMetrics::new().get_latency_stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.max_us, 0);
    }
}
