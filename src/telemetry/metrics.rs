// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Metrics collection for performance monitoring.
//!
//! Lightweight in-process counters and latency histograms, enough to answer
//! "how long do loads, lookups and rewinds take" without an external stack.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Global metrics instance.
pub static GLOBAL_METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Central metrics collection.
#[derive(Debug)]
pub struct Metrics {
    /// Timed operations by name (e.g. "microagent.load").
    operations: RwLock<HashMap<String, OperationMetrics>>,

    /// Rewind outcomes.
    rewinds: RewindCounters,

    /// Microagents injected into prompts.
    microagent_matches: AtomicU64,

    /// Start time for calculating uptime.
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            operations: RwLock::new(HashMap::new()),
            rewinds: RewindCounters::default(),
            microagent_matches: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a timed operation.
    pub fn record_operation(&self, name: &str, duration: Duration) {
        let mut ops = self.operations.write().unwrap();
        let metrics = ops.entry(name.to_string()).or_insert_with(OperationMetrics::new);
        metrics.record(duration);
    }

    /// Record the outcome of a rewind and how many messages it removed.
    pub fn record_rewind(&self, success: bool, deleted: u32) {
        if success {
            self.rewinds.succeeded.fetch_add(1, Ordering::Relaxed);
            self.rewinds.messages_deleted.fetch_add(deleted as u64, Ordering::Relaxed);
        } else {
            self.rewinds.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record how many microagents matched a prompt.
    pub fn record_matches(&self, count: usize) {
        self.microagent_matches.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get metrics for a specific operation.
    pub fn operation_metrics(&self, name: &str) -> Option<OperationMetrics> {
        self.operations.read().unwrap().get(name).cloned()
    }

    /// Get uptime since metrics were initialized.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Take a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let operations = self.operations.read().unwrap();

        MetricsSnapshot {
            operations: operations.clone(),
            rewinds_succeeded: self.rewinds.succeeded.load(Ordering::Relaxed),
            rewinds_failed: self.rewinds.failed.load(Ordering::Relaxed),
            messages_deleted: self.rewinds.messages_deleted.load(Ordering::Relaxed),
            microagent_matches: self.microagent_matches.load(Ordering::Relaxed),
            uptime: self.uptime(),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        self.operations.write().unwrap().clear();
        self.rewinds.succeeded.store(0, Ordering::Relaxed);
        self.rewinds.failed.store(0, Ordering::Relaxed);
        self.rewinds.messages_deleted.store(0, Ordering::Relaxed);
        self.microagent_matches.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct RewindCounters {
    succeeded: AtomicU64,
    failed: AtomicU64,
    messages_deleted: AtomicU64,
}

/// Generic operation metrics with histogram.
#[derive(Debug, Clone)]
pub struct OperationMetrics {
    /// Number of operations.
    pub count: u64,

    /// Total duration.
    pub total_duration: Duration,

    /// Minimum duration.
    pub min_duration: Duration,

    /// Maximum duration.
    pub max_duration: Duration,

    /// Histogram buckets for latency distribution.
    pub histogram: Histogram,
}

impl OperationMetrics {
    /// Create new operation metrics.
    pub fn new() -> Self {
        Self {
            count: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::MAX,
            max_duration: Duration::ZERO,
            histogram: Histogram::default(),
        }
    }

    /// Record an operation.
    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total_duration += duration;
        self.min_duration = self.min_duration.min(duration);
        self.max_duration = self.max_duration.max(duration);
        self.histogram.record(duration);
    }

    /// Calculate average duration.
    pub fn avg_duration(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.count as u32
        }
    }
}

impl Default for OperationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-bucket histogram for latency tracking.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Bucket upper bounds in microseconds.
    buckets: Vec<u64>,

    /// Count per bucket, plus one overflow bucket.
    counts: Vec<u64>,
}

impl Histogram {
    /// Create a histogram with custom bucket boundaries (in microseconds).
    pub fn with_buckets(buckets: Vec<u64>) -> Self {
        let counts = vec![0; buckets.len() + 1];
        Self { buckets, counts }
    }

    /// Record a duration value.
    pub fn record(&mut self, duration: Duration) {
        let micros = duration.as_micros() as u64;
        let idx = self
            .buckets
            .iter()
            .position(|&b| micros <= b)
            .unwrap_or(self.buckets.len());
        self.counts[idx] += 1;
    }

    /// Get counts for each bucket.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Approximate percentile, reported as the upper bound of the bucket it falls in.
    pub fn percentile(&self, p: f64) -> Duration {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return Duration::ZERO;
        }

        let target = (total as f64 * p / 100.0).ceil() as u64;
        let mut cumulative = 0u64;

        for (i, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                let micros = match self.buckets.get(i) {
                    Some(&bound) => bound,
                    None => self.buckets.last().copied().unwrap_or(0) * 10,
                };
                return Duration::from_micros(micros);
            }
        }

        Duration::ZERO
    }

    /// Get p99 latency.
    pub fn p99(&self) -> Duration {
        self.percentile(99.0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        // 100us, 1ms, 10ms, 100ms, 1s, 10s
        Self::with_buckets(vec![100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000])
    }
}

/// A snapshot of all metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Operation metrics by name.
    pub operations: HashMap<String, OperationMetrics>,

    /// Rewinds that completed.
    pub rewinds_succeeded: u64,

    /// Rewinds that returned an error.
    pub rewinds_failed: u64,

    /// Messages removed by successful rewinds.
    pub messages_deleted: u64,

    /// Microagents injected into prompts.
    pub microagent_matches: u64,

    /// Uptime when snapshot was taken.
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Format as a human-readable report.
    pub fn format_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Metrics Report ===\n\n");
        report.push_str(&format!("Uptime: {:.2?}\n", self.uptime));
        report.push_str(&format!(
            "Rewinds: {} ok, {} failed, {} messages removed\n",
            self.rewinds_succeeded, self.rewinds_failed, self.messages_deleted
        ));
        report.push_str(&format!("Microagent matches: {}\n\n", self.microagent_matches));

        if !self.operations.is_empty() {
            let mut names: Vec<&String> = self.operations.keys().collect();
            names.sort();

            report.push_str("Operation Metrics:\n");
            for name in names {
                let metrics = &self.operations[name];
                report.push_str(&format!(
                    "  {}: {} ops, avg {:.2?}, p99 {:.2?}\n",
                    name,
                    metrics.count,
                    metrics.avg_duration(),
                    metrics.histogram.p99()
                ));
            }
        }

        report
    }
}

/// Convenience function to record an operation to global metrics.
pub fn record_operation(name: &str, duration: Duration) {
    GLOBAL_METRICS.record_operation(name, duration);
}
