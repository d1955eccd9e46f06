//! Process-local counters reported by the analytics endpoint

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters since process start
#[derive(Debug, Default)]
pub struct Metrics {
    generated: AtomicU64,
    generation_failed: AtomicU64,
    batch_rows_ok: AtomicU64,
    batch_rows_failed: AtomicU64,
    decoded: AtomicU64,
    decode_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(counter: &AtomicU64, name: &'static str, by: u64) {
        if by == 0 {
            return;
        }
        counter.fetch_add(by, Ordering::Relaxed);
        tracing::debug!(counter = name, by, "Metric incremented");
    }

    pub fn generated(&self) {
        Self::bump(&self.generated, "generated", 1);
    }

    pub fn generation_failed(&self) {
        Self::bump(&self.generation_failed, "generation_failed", 1);
    }

    pub fn batch_rows(&self, ok: u64, failed: u64) {
        Self::bump(&self.batch_rows_ok, "batch_rows_ok", ok);
        Self::bump(&self.batch_rows_failed, "batch_rows_failed", failed);
    }

    pub fn decoded(&self) {
        Self::bump(&self.decoded, "decoded", 1);
    }

    pub fn decode_failed(&self) {
        Self::bump(&self.decode_failed, "decode_failed", 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            generated: self.generated.load(Ordering::Relaxed),
            generation_failed: self.generation_failed.load(Ordering::Relaxed),
            batch_rows_ok: self.batch_rows_ok.load(Ordering::Relaxed),
            batch_rows_failed: self.batch_rows_failed.load(Ordering::Relaxed),
            decoded: self.decoded.load(Ordering::Relaxed),
            decode_failed: self.decode_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub generated: u64,
    pub generation_failed: u64,
    pub batch_rows_ok: u64,
    pub batch_rows_failed: u64,
    pub decoded: u64,
    pub decode_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = Metrics::new();
        metrics.generated();
        metrics.generated();
        metrics.batch_rows(3, 1);
        metrics.decode_failed();

        let snap = metrics.snapshot();
        assert_eq!(snap.generated, 2);
        assert_eq!(snap.batch_rows_ok, 3);
        assert_eq!(snap.batch_rows_failed, 1);
        assert_eq!(snap.decode_failed, 1);
        assert_eq!(snap.decoded, 0);
    }
}
