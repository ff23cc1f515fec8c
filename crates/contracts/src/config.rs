//! Data server configuration contracts shared across crates.

use serde::{Deserialize, Serialize};

use crate::{ContractError, StreamKind};

/// Data server configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataServerConfig {
    /// Which implementation serves the merged feed
    #[serde(default)]
    pub mode: ServerMode,

    /// Per-stream queue capacities (threaded mode only)
    #[serde(default)]
    pub queues: QueueCapacities,
}

/// Data server implementation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMode {
    /// One prefetched measurement per stream, fetched on the caller's thread
    Simple,
    /// Background worker filling bounded per-stream queues
    #[default]
    Threaded,
}

impl ServerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerMode::Simple => "simple",
            ServerMode::Threaded => "threaded",
        }
    }
}

/// Bounded queue capacity per stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueCapacities {
    /// Camera frame queue capacity
    pub image: usize,
    /// IMU queue capacity
    pub imu: usize,
    /// Attitude queue capacity
    pub attitude: usize,
}

impl QueueCapacities {
    /// Largest accepted capacity per stream
    ///
    /// Queues allocate their full capacity up front.
    pub const MAX: usize = 1 << 20;

    /// Same capacity for all three streams
    pub fn uniform(capacity: usize) -> Self {
        Self {
            image: capacity,
            imu: capacity,
            attitude: capacity,
        }
    }

    /// Capacity of the given stream, zero for `StreamKind::None`
    pub fn get(&self, kind: StreamKind) -> usize {
        match kind {
            StreamKind::Image => self.image,
            StreamKind::Imu => self.imu,
            StreamKind::Attitude => self.attitude,
            StreamKind::None => 0,
        }
    }

    /// Check every capacity lies in `1..=MAX`
    pub fn check(&self) -> Result<(), ContractError> {
        for kind in StreamKind::STREAMS {
            let capacity = self.get(kind);
            if capacity == 0 || capacity > Self::MAX {
                return Err(ContractError::config_validation(
                    format!("queues.{kind}"),
                    format!(
                        "queue capacity must be in 1..={}, got {capacity}",
                        Self::MAX
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl Default for QueueCapacities {
    fn default() -> Self {
        Self {
            image: 10,
            imu: 100,
            attitude: 100,
        }
    }
}
