//! MeasurementSource trait - upstream data source abstraction
//!
//! Decouples the data servers from whatever produces measurements
//! (dataset readers, live sensors, in-memory fixtures).

use crate::{ImuVelocity, StampedAttitude, StampedImage};

/// Upstream measurement source
///
/// Each stream is fetched independently. A fetch may block on I/O.
///
/// # Contract
///
/// 1. **Sorted**: every stream yields non-decreasing stamps
/// 2. **Idempotent exhaustion**: once a stream returns `None` it keeps returning `None`
/// 3. **No error channel**: a failing source reports `None`, same as end of data
pub trait MeasurementSource: Send {
    /// Next camera frame, or `None` when the image stream is exhausted
    fn next_image(&mut self) -> Option<StampedImage>;

    /// Next inertial reading, or `None` when the IMU stream is exhausted
    fn next_imu(&mut self) -> Option<ImuVelocity>;

    /// Next attitude reference, or `None` when the attitude stream is exhausted
    fn next_attitude(&mut self) -> Option<StampedAttitude>;
}

impl<S: MeasurementSource + ?Sized> MeasurementSource for Box<S> {
    fn next_image(&mut self) -> Option<StampedImage> {
        (**self).next_image()
    }

    fn next_imu(&mut self) -> Option<ImuVelocity> {
        (**self).next_imu()
    }

    fn next_attitude(&mut self) -> Option<StampedAttitude> {
        (**self).next_attitude()
    }
}
