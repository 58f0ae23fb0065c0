//! Metrics module - Control-loop timing and saturation statistics

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// TIMING METRICS - Cloneable handle over shared histograms
// ============================================================================

#[derive(Clone)]
pub struct TimingMetrics {
    compute_hist: Arc<Mutex<Histogram<u64>>>,
    log_hist: Arc<Mutex<Histogram<u64>>>,
    // Jitter tracking (variance in cycle period)
    last_cycle_time_ns: Arc<AtomicU64>,
    jitter_hist: Arc<Mutex<Histogram<u64>>>,
    samples: Arc<AtomicU64>,
    saturated_samples: Arc<AtomicU64>,
}

fn histogram() -> Arc<Mutex<Histogram<u64>>> {
    // 3 significant figures is always a valid precision
    Arc::new(Mutex::new(
        Histogram::new(3).expect("hdrhistogram accepts 3 significant figures"),
    ))
}

impl TimingMetrics {
    pub fn new() -> Self {
        Self {
            compute_hist: histogram(),
            log_hist: histogram(),
            last_cycle_time_ns: Arc::new(AtomicU64::new(0)),
            jitter_hist: histogram(),
            samples: Arc::new(AtomicU64::new(0)),
            saturated_samples: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_compute(&self, duration: Duration, saturated: bool) {
        self.compute_hist.lock().record(duration.as_nanos() as u64).ok();
        self.samples.fetch_add(1, Ordering::Relaxed);
        if saturated {
            self.saturated_samples.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_log_write(&self, duration: Duration) {
        self.log_hist.lock().record(duration.as_nanos() as u64).ok();
    }

    /// Record jitter (variation between consecutive cycle times)
    pub fn record_cycle_jitter(&self, cycle_duration_ns: u64) {
        let last = self.last_cycle_time_ns.swap(cycle_duration_ns, Ordering::Relaxed);
        if last > 0 {
            self.jitter_hist.lock().record(cycle_duration_ns.abs_diff(last)).ok();
        }
    }

    pub fn report(&self) -> MetricsReport {
        let compute = self.compute_hist.lock();
        let log = self.log_hist.lock();
        let jitter = self.jitter_hist.lock();

        MetricsReport {
            compute_p50: Duration::from_nanos(compute.value_at_quantile(0.5)),
            compute_p99: Duration::from_nanos(compute.value_at_quantile(0.99)),
            log_write_p50: Duration::from_nanos(log.value_at_quantile(0.5)),
            log_write_p99: Duration::from_nanos(log.value_at_quantile(0.99)),
            jitter_p50: Duration::from_nanos(jitter.value_at_quantile(0.5)),
            jitter_p99: Duration::from_nanos(jitter.value_at_quantile(0.99)),
            samples: self.samples.load(Ordering::Relaxed),
            saturated_samples: self.saturated_samples.load(Ordering::Relaxed),
        }
    }
}

impl Default for TimingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// METRICS REPORT - Summary statistics
// ============================================================================

#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub compute_p50: Duration,
    pub compute_p99: Duration,
    pub log_write_p50: Duration,
    pub log_write_p99: Duration,
    pub jitter_p50: Duration,
    pub jitter_p99: Duration,
    pub samples: u64,
    pub saturated_samples: u64,
}

impl MetricsReport {
    pub fn saturation_ratio(&self) -> f64 {
        if self.samples > 0 {
            self.saturated_samples as f64 / self.samples as f64
        } else {
            0.0
        }
    }
}
