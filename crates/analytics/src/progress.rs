//! Periodic progress reporting for long corpus passes

use std::time::{Duration, Instant};
use tracing::info;

/// Tracks items processed against an expected total and logs every `interval`
pub(crate) struct Progress {
    job: &'static str,
    total: u64,
    interval: u64,
    processed: u64,
    next_report: u64,
    started: Instant,
}

impl Progress {
    pub fn new(job: &'static str, total: u64, interval: u64) -> Self {
        let interval = interval.max(1);
        Self {
            job,
            total,
            interval,
            processed: 0,
            next_report: interval,
            started: Instant::now(),
        }
    }

    /// Count `n` more items, logging once per crossed interval boundary
    pub fn advance(&mut self, n: u64) {
        self.processed += n;
        if self.processed >= self.next_report {
            self.report();
            while self.next_report <= self.processed {
                self.next_report += self.interval;
            }
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.processed as f64 / self.total as f64 * 100.0).min(100.0)
    }

    /// Items per second since start
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs <= f64::EPSILON {
            return 0.0;
        }
        self.processed as f64 / secs
    }

    pub fn report(&self) {
        info!(
            job = self.job,
            processed = self.processed,
            total = self.total,
            percent = format!("{:.2}", self.percent()),
            elapsed_secs = format!("{:.1}", self.elapsed().as_secs_f64()),
            per_sec = format!("{:.1}", self.throughput()),
            "Progress"
        );
    }
}
