//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend only on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Every measurement carries a `stamp` in seconds (f64)
//! - Stamps totally order measurements across the three streams
//! - Ties are broken by stream priority: Image > Imu > Attitude

mod config;
mod error;
mod measurement;
mod server;
mod source;

pub use config::*;
pub use error::*;
pub use measurement::*;
pub use server::{DataServer, Drain};
pub use source::MeasurementSource;
