//! Measurement types delivered by a data server.
//!
//! The server only ever looks at `stamp`; payloads pass through untouched.

use std::fmt;

use bytes::Bytes;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Measurement stream kind
///
/// Declaration order is the tie-break priority: when two streams hold
/// measurements with the same stamp, the earlier variant is delivered first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Camera frames
    Image,
    /// Inertial velocity readings
    Imu,
    /// Attitude references
    Attitude,
    /// No stream has data left
    None,
}

impl StreamKind {
    /// The three data-carrying streams, in tie-break priority order
    pub const STREAMS: [StreamKind; 3] = [StreamKind::Image, StreamKind::Imu, StreamKind::Attitude];

    /// Stable lowercase name, used as log field and metric label
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::Image => "image",
            StreamKind::Imu => "imu",
            StreamKind::Attitude => "attitude",
            StreamKind::None => "none",
        }
    }

    /// Whether this kind denotes an exhausted feed
    pub fn is_none(self) -> bool {
        self == StreamKind::None
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything carrying a measurement timestamp
pub trait Stamped {
    /// Timestamp in seconds
    fn stamp(&self) -> f64;
}

/// Camera frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedImage {
    /// Capture time (seconds)
    pub stamp: f64,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Raw pixel data (zero-copy)
    pub data: Bytes,
}

impl StampedImage {
    /// Frame with no pixel data, useful when only timing matters
    pub fn empty(stamp: f64) -> Self {
        Self {
            stamp,
            width: 0,
            height: 0,
            data: Bytes::new(),
        }
    }
}

/// Inertial velocity reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuVelocity {
    /// Sample time (seconds)
    pub stamp: f64,

    /// Angular velocity (rad/s)
    pub gyr: Vector3<f64>,

    /// Linear acceleration (m/s²)
    pub acc: Vector3<f64>,
}

impl ImuVelocity {
    /// Reading of a body at rest under gravity
    pub fn at_rest(stamp: f64) -> Self {
        Self {
            stamp,
            gyr: Vector3::zeros(),
            acc: Vector3::new(0.0, 0.0, 9.81),
        }
    }
}

/// Attitude reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StampedAttitude {
    /// Sample time (seconds)
    pub stamp: f64,

    /// Body orientation
    pub q: UnitQuaternion<f64>,
}

impl StampedAttitude {
    /// Identity attitude at the given stamp
    pub fn identity(stamp: f64) -> Self {
        Self {
            stamp,
            q: UnitQuaternion::identity(),
        }
    }
}

impl Stamped for StampedImage {
    fn stamp(&self) -> f64 {
        self.stamp
    }
}

impl Stamped for ImuVelocity {
    fn stamp(&self) -> f64 {
        self.stamp
    }
}

impl Stamped for StampedAttitude {
    fn stamp(&self) -> f64 {
        self.stamp
    }
}

/// One measurement of any stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Measurement {
    Image(StampedImage),
    Imu(ImuVelocity),
    Attitude(StampedAttitude),
}

impl Measurement {
    /// Stream this measurement belongs to
    pub fn kind(&self) -> StreamKind {
        match self {
            Measurement::Image(_) => StreamKind::Image,
            Measurement::Imu(_) => StreamKind::Imu,
            Measurement::Attitude(_) => StreamKind::Attitude,
        }
    }
}

impl Stamped for Measurement {
    fn stamp(&self) -> f64 {
        match self {
            Measurement::Image(m) => m.stamp,
            Measurement::Imu(m) => m.stamp,
            Measurement::Attitude(m) => m.stamp,
        }
    }
}

impl From<StampedImage> for Measurement {
    fn from(image: StampedImage) -> Self {
        Measurement::Image(image)
    }
}

impl From<ImuVelocity> for Measurement {
    fn from(imu: ImuVelocity) -> Self {
        Measurement::Imu(imu)
    }
}

impl From<StampedAttitude> for Measurement {
    fn from(attitude: StampedAttitude) -> Self {
        Measurement::Attitude(attitude)
    }
}
