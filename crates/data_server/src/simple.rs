//! Synchronous single-slot data server.

use contracts::{
    DataServer, DataServerError, ImuVelocity, MeasurementSource, Stamped, StampedAttitude,
    StampedImage, StreamKind,
};
use tracing::{debug, instrument, trace};

use crate::selection::select_next;
use crate::report_violation;

/// Data server without background execution
///
/// Holds exactly one prefetched measurement per stream. Every `take_*`
/// refills its slot from the source on the caller's thread, so the caller
/// blocks directly on source I/O. An empty slot means the stream is
/// exhausted; sources never produce again after answering `None`.
pub struct SimpleDataServer<S: MeasurementSource = Box<dyn MeasurementSource>> {
    source: S,
    next_image: Option<StampedImage>,
    next_imu: Option<ImuVelocity>,
    next_attitude: Option<StampedAttitude>,
    delivered: u64,
}

impl<S: MeasurementSource> SimpleDataServer<S> {
    /// Create the server and prefetch one measurement per stream
    #[instrument(name = "simple_data_server_new", skip(source))]
    pub fn new(mut source: S) -> Self {
        let next_image = source.next_image();
        let next_imu = source.next_imu();
        let next_attitude = source.next_attitude();

        debug!(
            image = next_image.is_some(),
            imu = next_imu.is_some(),
            attitude = next_attitude.is_some(),
            "simple data server primed"
        );

        Self {
            source,
            next_image,
            next_imu,
            next_attitude,
            delivered: 0,
        }
    }

    /// Measurements handed to the consumer so far
    pub fn delivered_count(&self) -> u64 {
        self.delivered
    }

    /// Whether the given stream still holds a prefetched measurement
    pub fn has_pending(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Image => self.next_image.is_some(),
            StreamKind::Imu => self.next_imu.is_some(),
            StreamKind::Attitude => self.next_attitude.is_some(),
            StreamKind::None => false,
        }
    }

    fn on_delivered<T: Stamped>(&mut self, kind: StreamKind, item: &T, refilled: bool) {
        self.delivered += 1;
        observability::record_measurement_delivered(kind);
        trace!(stream = %kind, stamp = item.stamp(), "measurement delivered");
        if !refilled {
            observability::record_stream_finished(kind);
            debug!(stream = %kind, "stream exhausted");
        }
    }
}

/// Hand out the slot content if `requested` is the next stream in order
fn take_pending<T>(
    requested: StreamKind,
    next: StreamKind,
    slot: &mut Option<T>,
) -> Result<T, DataServerError> {
    if next != requested {
        let err = if slot.is_none() {
            DataServerError::StreamEmpty { kind: requested }
        } else {
            DataServerError::contract_violation(requested, next)
        };
        return Err(report_violation(err));
    }
    slot.take()
        .ok_or_else(|| report_violation(DataServerError::StreamEmpty { kind: requested }))
}

impl<S: MeasurementSource> DataServer for SimpleDataServer<S> {
    fn next_kind(&self) -> StreamKind {
        select_next(
            self.next_image.as_ref().map(|m| m.stamp),
            self.next_imu.as_ref().map(|m| m.stamp),
            self.next_attitude.as_ref().map(|m| m.stamp),
        )
    }

    fn next_stamp(&self) -> f64 {
        match self.next_kind() {
            StreamKind::Image => self.next_image.as_ref().map(|m| m.stamp),
            StreamKind::Imu => self.next_imu.as_ref().map(|m| m.stamp),
            StreamKind::Attitude => self.next_attitude.as_ref().map(|m| m.stamp),
            StreamKind::None => None,
        }
        .unwrap_or(f64::NAN)
    }

    fn take_image(&mut self) -> Result<StampedImage, DataServerError> {
        let next = self.next_kind();
        let image = take_pending(StreamKind::Image, next, &mut self.next_image)?;
        self.next_image = self.source.next_image();
        let refilled = self.next_image.is_some();
        self.on_delivered(StreamKind::Image, &image, refilled);
        Ok(image)
    }

    fn take_imu(&mut self) -> Result<ImuVelocity, DataServerError> {
        let next = self.next_kind();
        let imu = take_pending(StreamKind::Imu, next, &mut self.next_imu)?;
        self.next_imu = self.source.next_imu();
        let refilled = self.next_imu.is_some();
        self.on_delivered(StreamKind::Imu, &imu, refilled);
        Ok(imu)
    }

    fn take_attitude(&mut self) -> Result<StampedAttitude, DataServerError> {
        let next = self.next_kind();
        let attitude = take_pending(StreamKind::Attitude, next, &mut self.next_attitude)?;
        self.next_attitude = self.source.next_attitude();
        let refilled = self.next_attitude.is_some();
        self.on_delivered(StreamKind::Attitude, &attitude, refilled);
        Ok(attitude)
    }
}
