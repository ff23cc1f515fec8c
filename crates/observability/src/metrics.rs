//! Data server metrics
//!
//! Counters and gauges are recorded through the `metrics` facade; without an
//! installed recorder they are no-ops. `MergeStatsAggregator` keeps an
//! in-memory summary of a merged feed for reporting.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{Measurement, Stamped, StreamKind};
use metrics::{counter, gauge};
use serde::Serialize;

/// Record one measurement handed to the consumer
pub fn record_measurement_delivered(kind: StreamKind) {
    counter!("dataserver_measurements_delivered_total", "stream" => kind.as_str()).increment(1);
}

/// Record the current depth of a stream queue
pub fn record_queue_depth(kind: StreamKind, depth: usize) {
    gauge!("dataserver_queue_depth", "stream" => kind.as_str()).set(depth as f64);
}

/// Record a stream reaching end of data
pub fn record_stream_finished(kind: StreamKind) {
    counter!("dataserver_streams_finished_total", "stream" => kind.as_str()).increment(1);
}

/// Record a `take_*` call that broke the delivery contract
pub fn record_contract_violation(kind: StreamKind) {
    counter!("dataserver_contract_violations_total", "stream" => kind.as_str()).increment(1);
}

/// Merged feed statistics aggregator
///
/// Fed with every delivered measurement, in delivery order.
#[derive(Debug, Clone, Default)]
pub struct MergeStatsAggregator {
    /// Total measurements
    pub total: u64,

    /// Measurements per stream
    pub per_stream: BTreeMap<StreamKind, u64>,

    /// Deliveries whose stamp went backwards
    pub order_violations: u64,

    /// Deliveries sharing the previous stamp on a different stream
    pub cross_stream_ties: u64,

    /// Gap between consecutive deliveries (ms)
    pub merged_gap_stats: RunningStats,

    /// Gap between consecutive samples of the same stream (ms)
    pub stream_gap_stats: BTreeMap<StreamKind, RunningStats>,

    first_stamp: Option<f64>,
    last: Option<(StreamKind, f64)>,
    last_per_stream: BTreeMap<StreamKind, f64>,
}

impl MergeStatsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one delivered measurement
    pub fn update(&mut self, measurement: &Measurement) {
        let kind = measurement.kind();
        let stamp = measurement.stamp();

        self.total += 1;
        *self.per_stream.entry(kind).or_insert(0) += 1;
        self.first_stamp.get_or_insert(stamp);

        if let Some((last_kind, last_stamp)) = self.last {
            if stamp < last_stamp {
                self.order_violations += 1;
            } else if stamp == last_stamp && kind != last_kind {
                self.cross_stream_ties += 1;
            }
            self.merged_gap_stats.push((stamp - last_stamp) * 1000.0);
        }
        self.last = Some((kind, stamp));

        if let Some(previous) = self.last_per_stream.insert(kind, stamp) {
            self.stream_gap_stats
                .entry(kind)
                .or_default()
                .push((stamp - previous) * 1000.0);
        }
    }

    /// Time span covered by the delivered feed (seconds)
    pub fn span_s(&self) -> f64 {
        match (self.first_stamp, self.last) {
            (Some(first), Some((_, last))) => last - first,
            _ => 0.0,
        }
    }

    /// Build a summary report
    pub fn summary(&self) -> MergeSummary {
        MergeSummary {
            total: self.total,
            images: self.count(StreamKind::Image),
            imus: self.count(StreamKind::Imu),
            attitudes: self.count(StreamKind::Attitude),
            order_violations: self.order_violations,
            cross_stream_ties: self.cross_stream_ties,
            span_s: self.span_s(),
            merged_gap_ms: StatsSummary::from(&self.merged_gap_stats),
            stream_gap_ms: self
                .stream_gap_stats
                .iter()
                .map(|(kind, stats)| (kind.as_str().to_string(), StatsSummary::from(stats)))
                .collect(),
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn count(&self, kind: StreamKind) -> u64 {
        self.per_stream.get(&kind).copied().unwrap_or(0)
    }
}

/// Merged feed summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeSummary {
    pub total: u64,
    pub images: u64,
    pub imus: u64,
    pub attitudes: u64,
    pub order_violations: u64,
    pub cross_stream_ties: u64,
    pub span_s: f64,
    pub merged_gap_ms: StatsSummary,
    pub stream_gap_ms: BTreeMap<String, StatsSummary>,
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Merge Summary ===")?;
        writeln!(
            f,
            "Measurements: {} (image={}, imu={}, attitude={})",
            self.total, self.images, self.imus, self.attitudes
        )?;
        writeln!(f, "Span: {:.3}s", self.span_s)?;
        writeln!(f, "Order violations: {}", self.order_violations)?;
        writeln!(f, "Cross-stream ties: {}", self.cross_stream_ties)?;
        writeln!(f, "Merged gap (ms): {}", self.merged_gap_ms)?;
        for (stream, gap) in &self.stream_gap_ms {
            writeln!(f, "  {stream} gap (ms): {gap}")?;
        }
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
