//! # Data Server
//!
//! Time-ordered merge of the image, IMU and attitude streams.
//!
//! Two interchangeable implementations of [`DataServer`]:
//! - [`SimpleDataServer`]: one prefetched measurement per stream, fetched on
//!   the caller's thread
//! - [`ThreadedDataServer`]: background worker filling bounded per-stream queues
//!
//! Both deliver the same sequence for the same source: earliest stamp first,
//! ties broken Image > Imu > Attitude.
//!
//! ## Usage Example
//!
//! ```ignore
//! use data_server::{create_data_server, DataServer, DataServerConfig, StreamKind};
//!
//! let mut server = create_data_server(&DataServerConfig::default(), source)?;
//! loop {
//!     match server.next_kind() {
//!         StreamKind::Image => estimator.process_image(server.take_image()?),
//!         StreamKind::Imu => estimator.process_imu(server.take_imu()?),
//!         StreamKind::Attitude => estimator.process_attitude(server.take_attitude()?),
//!         StreamKind::None => break,
//!     }
//! }
//! ```

mod queue;
mod selection;
mod simple;
mod threaded;

use contracts::{ContractError, MeasurementSource};
use tracing::{instrument, warn};

// Re-exports
pub use contracts::{
    DataServer, DataServerConfig, DataServerError, Drain, Measurement, QueueCapacities,
    ServerMode, StreamKind,
};
pub use queue::QueueStats;
pub use selection::select_next;
pub use simple::SimpleDataServer;
pub use threaded::ThreadedDataServer;

/// Build the data server selected by `config.mode`
///
/// # Errors
/// - A zero queue capacity (threaded mode)
/// - The worker thread could not be spawned
#[instrument(name = "create_data_server", skip(source), fields(mode = config.mode.as_str()))]
pub fn create_data_server<S>(
    config: &DataServerConfig,
    source: S,
) -> Result<Box<dyn DataServer>, ContractError>
where
    S: MeasurementSource + 'static,
{
    let server: Box<dyn DataServer> = match config.mode {
        ServerMode::Simple => Box::new(SimpleDataServer::new(source)),
        ServerMode::Threaded => Box::new(ThreadedDataServer::new(source, config.queues)?),
    };
    Ok(server)
}

/// Log and count a misused `take_*` call
pub(crate) fn report_violation(err: DataServerError) -> DataServerError {
    warn!(error = %err, "data server contract violation");
    observability::record_contract_violation(err.requested());
    err
}
