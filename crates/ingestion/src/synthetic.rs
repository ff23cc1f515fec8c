//! Synthetic rate-based source
//!
//! Generates the three streams at fixed rates over a bounded time span.
//! Stamps are computed from the sample index, so long runs do not drift.

use std::f64::consts::TAU;

use bytes::Bytes;
use contracts::{ImuVelocity, MeasurementSource, StampedAttitude, StampedImage, StreamKind};
use nalgebra::{UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{IngestionError, Result};

/// Synthetic source configuration
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Camera rate (Hz)
    pub image_hz: f64,

    /// IMU rate (Hz)
    pub imu_hz: f64,

    /// Attitude rate (Hz)
    pub attitude_hz: f64,

    /// First stamp (seconds)
    pub start_s: f64,

    /// Span covered by every stream (seconds)
    pub duration_s: f64,

    /// Image width (pixels)
    pub image_width: u32,

    /// Image height (pixels)
    pub image_height: u32,

    /// Uniform stamp jitter bound (seconds), must stay below half the
    /// shortest period so every stream remains sorted
    pub jitter_s: f64,

    /// Seed for the jitter generator
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            image_hz: 20.0,
            imu_hz: 200.0,
            attitude_hz: 100.0,
            start_s: 0.0,
            duration_s: 10.0,
            image_width: 64,
            image_height: 48,
            jitter_s: 0.0,
            seed: 0,
        }
    }
}

impl SyntheticConfig {
    fn rate(&self, kind: StreamKind) -> f64 {
        match kind {
            StreamKind::Image => self.image_hz,
            StreamKind::Imu => self.imu_hz,
            StreamKind::Attitude => self.attitude_hz,
            StreamKind::None => 0.0,
        }
    }

    /// Number of samples the given stream will produce
    ///
    /// Samples are placed at `start_s + i / rate` for every `i` with
    /// `i / rate <= duration_s`.
    pub fn expected_count(&self, kind: StreamKind) -> u64 {
        let rate = self.rate(kind);
        if rate <= 0.0 {
            return 0;
        }
        (self.duration_s * rate + 1e-9).floor() as u64 + 1
    }

    /// Payload size of one image (bytes)
    fn image_size(&self) -> usize {
        self.image_width as usize * self.image_height as usize
    }

    fn validate(&self) -> Result<()> {
        for (field, rate) in [
            ("image_hz", self.image_hz),
            ("imu_hz", self.imu_hz),
            ("attitude_hz", self.attitude_hz),
        ] {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(IngestionError::invalid_config(
                    field,
                    format!("rate must be > 0, got {rate}"),
                ));
            }
        }
        if !(self.duration_s.is_finite() && self.duration_s >= 0.0) {
            return Err(IngestionError::invalid_config(
                "duration_s",
                format!("duration must be >= 0, got {}", self.duration_s),
            ));
        }
        let max_hz = self.image_hz.max(self.imu_hz).max(self.attitude_hz);
        if !(self.jitter_s >= 0.0 && self.jitter_s < 0.5 / max_hz) {
            return Err(IngestionError::invalid_config(
                "jitter_s",
                format!(
                    "jitter must be in [0, {}), got {}",
                    0.5 / max_hz,
                    self.jitter_s
                ),
            ));
        }
        Ok(())
    }
}

/// Per-stream sample counter and jitter generator
///
/// Each stream owns its generator, so its stamps do not depend on how
/// fetches on the other streams are interleaved.
#[derive(Debug, Clone)]
struct StreamCursor {
    next_index: u64,
    count: u64,
    rate: f64,
    rng: StdRng,
}

impl StreamCursor {
    fn new(config: &SyntheticConfig, kind: StreamKind) -> Self {
        Self {
            next_index: 0,
            count: config.expected_count(kind),
            rate: config.rate(kind),
            rng: StdRng::seed_from_u64(config.seed ^ stream_salt(kind)),
        }
    }

    /// Index and stamp of the next sample
    fn advance(&mut self, start_s: f64, jitter_s: f64) -> Option<(u64, f64)> {
        if self.next_index >= self.count {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;

        let nominal = start_s + index as f64 / self.rate;
        let stamp = if jitter_s > 0.0 {
            nominal + self.rng.random_range(-jitter_s..jitter_s)
        } else {
            nominal
        };
        Some((index, stamp))
    }
}

fn stream_salt(kind: StreamKind) -> u64 {
    match kind {
        StreamKind::Image => 0x9e37_79b9_7f4a_7c15,
        StreamKind::Imu => 0xbf58_476d_1ce4_e5b9,
        StreamKind::Attitude => 0x94d0_49bb_1331_11eb,
        StreamKind::None => 0,
    }
}

/// Synthetic measurement source
///
/// The body spins slowly about the z axis; IMU readings and attitudes are
/// consistent with that motion.
pub struct SyntheticSource {
    config: SyntheticConfig,
    image: StreamCursor,
    imu: StreamCursor,
    attitude: StreamCursor,
}

impl SyntheticSource {
    /// Yaw rate of the simulated body (rad/s)
    const YAW_RATE: f64 = 0.1 * TAU;

    /// Create new synthetic source
    ///
    /// # Errors
    /// Non-positive rates, negative duration or jitter large enough to
    /// reorder a stream.
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        config.validate()?;

        let image = StreamCursor::new(&config, StreamKind::Image);
        let imu = StreamCursor::new(&config, StreamKind::Imu);
        let attitude = StreamCursor::new(&config, StreamKind::Attitude);

        debug!(
            image = image.count,
            imu = imu.count,
            attitude = attitude.count,
            duration_s = config.duration_s,
            "synthetic source created"
        );

        Ok(Self {
            config,
            image,
            imu,
            attitude,
        })
    }

    /// Total samples across all streams
    pub fn total_count(&self) -> u64 {
        self.image.count + self.imu.count + self.attitude.count
    }
}

impl MeasurementSource for SyntheticSource {
    fn next_image(&mut self) -> Option<StampedImage> {
        let (index, stamp) = self
            .image
            .advance(self.config.start_s, self.config.jitter_s)?;
        let size = self.config.image_size();
        Some(StampedImage {
            stamp,
            width: self.config.image_width,
            height: self.config.image_height,
            data: Bytes::from(vec![(index % 256) as u8; size]),
        })
    }

    fn next_imu(&mut self) -> Option<ImuVelocity> {
        let (_, stamp) = self.imu.advance(self.config.start_s, self.config.jitter_s)?;
        Some(ImuVelocity {
            stamp,
            gyr: Vector3::new(0.0, 0.0, Self::YAW_RATE),
            acc: Vector3::new(0.0, 0.0, 9.81),
        })
    }

    fn next_attitude(&mut self) -> Option<StampedAttitude> {
        let (_, stamp) = self
            .attitude
            .advance(self.config.start_s, self.config.jitter_s)?;
        let yaw = Self::YAW_RATE * (stamp - self.config.start_s);
        Some(StampedAttitude {
            stamp,
            q: UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config() -> SyntheticConfig {
        SyntheticConfig {
            image_hz: 10.0,
            imu_hz: 100.0,
            attitude_hz: 50.0,
            duration_s: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_expected_counts() {
        let config = short_config();
        assert_eq!(config.expected_count(StreamKind::Image), 11);
        assert_eq!(config.expected_count(StreamKind::Imu), 101);
        assert_eq!(config.expected_count(StreamKind::Attitude), 51);
    }

    #[test]
    fn test_streams_are_sorted_and_exhaust() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            jitter_s: 0.001,
            seed: 7,
            ..short_config()
        })
        .unwrap();

        let mut last = f64::NEG_INFINITY;
        let mut count = 0;
        while let Some(imu) = source.next_imu() {
            assert!(imu.stamp >= last);
            last = imu.stamp;
            count += 1;
        }
        assert_eq!(count, 101);
        assert!(source.next_imu().is_none());
    }

    #[test]
    fn test_image_payload_size() {
        let mut source = SyntheticSource::new(short_config()).unwrap();
        let image = source.next_image().unwrap();
        assert_eq!(image.stamp, 0.0);
        assert_eq!(image.data.len(), 64 * 48);
    }

    #[test]
    fn test_stream_stamps_independent_of_fetch_order() {
        let config = SyntheticConfig {
            jitter_s: 0.001,
            seed: 3,
            ..short_config()
        };
        let mut untouched = SyntheticSource::new(config.clone()).unwrap();
        let mut interleaved = SyntheticSource::new(config).unwrap();

        // Only one of the two sources sees image and attitude fetches
        interleaved.next_image().unwrap();
        interleaved.next_attitude().unwrap();

        for _ in 0..20 {
            let expected = untouched.next_imu().unwrap().stamp;
            assert_eq!(interleaved.next_imu().unwrap().stamp, expected);
            interleaved.next_image();
        }

        untouched.next_attitude().unwrap();
        let expected = untouched.next_attitude().unwrap().stamp;
        assert_eq!(interleaved.next_attitude().unwrap().stamp, expected);
    }

    #[test]
    fn test_streams_use_distinct_jitter() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            jitter_s: 0.001,
            seed: 11,
            ..short_config()
        })
        .unwrap();
        // Index 0 of every stream sits at start_s; jitter alone separates them
        let image = source.next_image().unwrap().stamp;
        let imu = source.next_imu().unwrap().stamp;
        assert_ne!(image, imu);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_large_image_size_does_not_overflow() {
        let config = SyntheticConfig {
            image_width: 70_000,
            image_height: 70_000,
            ..short_config()
        };
        assert_eq!(config.image_size(), 4_900_000_000);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let result = SyntheticSource::new(SyntheticConfig {
            imu_hz: 0.0,
            ..short_config()
        });
        assert!(matches!(
            result,
            Err(IngestionError::InvalidConfig { field: "imu_hz", .. })
        ));
    }

    #[test]
    fn test_excessive_jitter_rejected() {
        let result = SyntheticSource::new(SyntheticConfig {
            jitter_s: 0.01,
            ..short_config()
        });
        assert!(result.is_err());
    }
}
