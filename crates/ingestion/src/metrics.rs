//! Per-stream fetch metrics

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::StreamKind;

/// Source fetch counters
///
/// Shared between the source (which may live on a worker thread) and
/// whoever inspects it.
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Image fetch calls
    pub image_fetches: AtomicU64,

    /// IMU fetch calls
    pub imu_fetches: AtomicU64,

    /// Attitude fetch calls
    pub attitude_fetches: AtomicU64,

    /// Fetch calls that answered "no more data"
    pub exhausted_fetches: AtomicU64,
}

impl SourceMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one fetch call on `kind`
    pub fn record_fetch(&self, kind: StreamKind, produced: bool) {
        let counter = match kind {
            StreamKind::Image => &self.image_fetches,
            StreamKind::Imu => &self.imu_fetches,
            StreamKind::Attitude => &self.attitude_fetches,
            StreamKind::None => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if !produced {
            self.exhausted_fetches.fetch_add(1, Ordering::Relaxed);
        }
        metrics::counter!("dataserver_source_fetches_total", "stream" => kind.as_str())
            .increment(1);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> FetchSnapshot {
        FetchSnapshot {
            image_fetches: self.image_fetches.load(Ordering::Relaxed),
            imu_fetches: self.imu_fetches.load(Ordering::Relaxed),
            attitude_fetches: self.attitude_fetches.load(Ordering::Relaxed),
            exhausted_fetches: self.exhausted_fetches.load(Ordering::Relaxed),
        }
    }
}

/// Fetch counter snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSnapshot {
    pub image_fetches: u64,
    pub imu_fetches: u64,
    pub attitude_fetches: u64,
    pub exhausted_fetches: u64,
}

impl FetchSnapshot {
    /// Total fetch calls across all streams
    pub fn total(&self) -> u64 {
        self.image_fetches + self.imu_fetches + self.attitude_fetches
    }
}
