//! # Ingestion
//!
//! Reference measurement sources.
//!
//! Responsibilities:
//! - In-memory fixtures with exact, hand-picked stamps
//! - Synthetic rate-based streams for demos and load runs
//! - Per-fetch latency injection to emulate slow I/O
//!
//! Dataset decoding lives outside this workspace; anything implementing
//! `contracts::MeasurementSource` can be served.
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{FixtureSource, ThrottledSource};
//! use std::time::Duration;
//!
//! let fixture = FixtureSource::from_stamps(&[0.0, 2.0], &[0.1, 0.5, 1.0], &[1.0]);
//! let slow = ThrottledSource::new(fixture, Duration::from_millis(5));
//! let server = data_server::ThreadedDataServer::new(Box::new(slow), Default::default());
//! ```

mod error;
mod fixture;
mod metrics;
mod synthetic;
mod throttled;

// Re-exports
pub use contracts::MeasurementSource;
pub use error::{IngestionError, Result};
pub use fixture::FixtureSource;
pub use metrics::{FetchSnapshot, SourceMetrics};
pub use synthetic::{SyntheticConfig, SyntheticSource};
pub use throttled::ThrottledSource;
