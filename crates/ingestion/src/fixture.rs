//! In-memory fixture source

use std::collections::VecDeque;

use contracts::{ImuVelocity, MeasurementSource, StampedAttitude, StampedImage};

/// Source serving pre-built measurement lists
///
/// Each stream is replayed in the order given. Exhaustion is permanent:
/// once a list runs dry every further fetch answers `None`.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    images: VecDeque<StampedImage>,
    imus: VecDeque<ImuVelocity>,
    attitudes: VecDeque<StampedAttitude>,
}

impl FixtureSource {
    /// Create a fixture from explicit measurement lists
    pub fn new(
        images: Vec<StampedImage>,
        imus: Vec<ImuVelocity>,
        attitudes: Vec<StampedAttitude>,
    ) -> Self {
        Self {
            images: images.into(),
            imus: imus.into(),
            attitudes: attitudes.into(),
        }
    }

    /// Create a fixture where only stamps matter
    ///
    /// Images carry no pixels, IMU readings are at rest and attitudes are
    /// identity.
    pub fn from_stamps(images: &[f64], imus: &[f64], attitudes: &[f64]) -> Self {
        Self::new(
            images.iter().copied().map(StampedImage::empty).collect(),
            imus.iter().copied().map(ImuVelocity::at_rest).collect(),
            attitudes
                .iter()
                .copied()
                .map(StampedAttitude::identity)
                .collect(),
        )
    }

    /// Measurements not yet fetched, per stream (image, imu, attitude)
    pub fn remaining(&self) -> (usize, usize, usize) {
        (self.images.len(), self.imus.len(), self.attitudes.len())
    }

    /// Total measurements not yet fetched
    pub fn total_remaining(&self) -> usize {
        self.images.len() + self.imus.len() + self.attitudes.len()
    }
}

impl MeasurementSource for FixtureSource {
    fn next_image(&mut self) -> Option<StampedImage> {
        self.images.pop_front()
    }

    fn next_imu(&mut self) -> Option<ImuVelocity> {
        self.imus.pop_front()
    }

    fn next_attitude(&mut self) -> Option<StampedAttitude> {
        self.attitudes.pop_front()
    }
}
