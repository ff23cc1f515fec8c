//! Latency-injecting source wrapper

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use contracts::{ImuVelocity, MeasurementSource, StampedAttitude, StampedImage, StreamKind};
use tracing::trace;

use crate::metrics::SourceMetrics;

/// Wraps a source and sleeps before every fetch
///
/// Emulates a source blocked on disk or network I/O. Fetch counters are
/// shared through [`ThrottledSource::metrics`] so they stay readable after
/// the source has moved onto a worker thread.
pub struct ThrottledSource<S> {
    inner: S,
    delay: Duration,
    metrics: Arc<SourceMetrics>,
}

impl<S: MeasurementSource> ThrottledSource<S> {
    /// Create new throttled source
    pub fn new(inner: S, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            metrics: Arc::new(SourceMetrics::new()),
        }
    }

    /// Shared fetch counters
    pub fn metrics(&self) -> Arc<SourceMetrics> {
        self.metrics.clone()
    }

    /// Unwrap the inner source
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn throttle<T>(
        &mut self,
        kind: StreamKind,
        fetch: impl FnOnce(&mut S) -> Option<T>,
    ) -> Option<T> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        let item = fetch(&mut self.inner);
        self.metrics.record_fetch(kind, item.is_some());
        trace!(stream = %kind, produced = item.is_some(), "throttled fetch");
        item
    }
}

impl<S: MeasurementSource> MeasurementSource for ThrottledSource<S> {
    fn next_image(&mut self) -> Option<StampedImage> {
        self.throttle(StreamKind::Image, S::next_image)
    }

    fn next_imu(&mut self) -> Option<ImuVelocity> {
        self.throttle(StreamKind::Imu, S::next_imu)
    }

    fn next_attitude(&mut self) -> Option<StampedAttitude> {
        self.throttle(StreamKind::Attitude, S::next_attitude)
    }
}
