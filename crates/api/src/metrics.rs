use fusion::RiskClass;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Timing (in microseconds)
    total_detect_time_us: AtomicU64,
    total_network_time_us: AtomicU64,

    // Counts
    transactions_scored: AtomicUsize,
    graphs_analyzed: AtomicUsize,
    high_risk_transactions: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            total_detect_time_us: AtomicU64::new(0),
            total_network_time_us: AtomicU64::new(0),
            transactions_scored: AtomicUsize::new(0),
            graphs_analyzed: AtomicUsize::new(0),
            high_risk_transactions: AtomicUsize::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// `risk_class` is `None` when the transaction could not be scored
    pub fn record_detection(&self, duration: Duration, risk_class: Option<RiskClass>) {
        self.total_detect_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.transactions_scored.fetch_add(1, Ordering::Relaxed);
        if risk_class == Some(RiskClass::High) {
            self.high_risk_transactions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_network(&self, duration: Duration) {
        self.total_network_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.graphs_analyzed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            avg_detect_time_ms: avg_time_ms(&self.total_detect_time_us, &self.transactions_scored),
            avg_network_time_ms: avg_time_ms(&self.total_network_time_us, &self.graphs_analyzed),
            transactions_scored: self.transactions_scored.load(Ordering::Relaxed),
            graphs_analyzed: self.graphs_analyzed.load(Ordering::Relaxed),
            high_risk_transactions: self.high_risk_transactions.load(Ordering::Relaxed),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub avg_detect_time_ms: f64,
    pub avg_network_time_ms: f64,
    pub transactions_scored: usize,
    pub graphs_analyzed: usize,
    pub high_risk_transactions: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_averages() {
        let metrics = Metrics::new();
        metrics.record_request(true);
        metrics.record_request(false);
        metrics.record_detection(Duration::from_millis(4), Some(RiskClass::High));
        metrics.record_detection(Duration::from_millis(2), Some(RiskClass::Low));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(snapshot.transactions_scored, 2);
        assert_eq!(snapshot.high_risk_transactions, 1);
        assert!((snapshot.avg_detect_time_ms - 3.0).abs() < 1e-9);
        assert_eq!(snapshot.avg_network_time_ms, 0.0);
    }
}
