//! DataServer trait - downstream contract
//!
//! The estimator drives a server with the loop:
//!
//! ```ignore
//! loop {
//!     match server.next_kind() {
//!         StreamKind::Image => estimator.process_image(server.take_image()?),
//!         StreamKind::Imu => estimator.process_imu(server.take_imu()?),
//!         StreamKind::Attitude => estimator.process_attitude(server.take_attitude()?),
//!         StreamKind::None => break,
//!     }
//! }
//! ```

use crate::{
    DataServerError, ImuVelocity, Measurement, StampedAttitude, StampedImage, StreamKind,
};

/// Time-ordered merge of the image, IMU and attitude streams
///
/// `take_*` must only be called for the kind most recently returned by
/// [`DataServer::next_kind`]. Any other call is a contract violation and
/// returns an error instead of data.
pub trait DataServer: Send {
    /// Stream holding the next measurement to deliver, without consuming it
    ///
    /// Returns [`StreamKind::None`] only once every stream is exhausted.
    fn next_kind(&self) -> StreamKind;

    /// Stamp of the measurement `next_kind` would deliver, NaN when exhausted
    fn next_stamp(&self) -> f64;

    /// Consume the next camera frame
    fn take_image(&mut self) -> Result<StampedImage, DataServerError>;

    /// Consume the next inertial reading
    fn take_imu(&mut self) -> Result<ImuVelocity, DataServerError>;

    /// Consume the next attitude reference
    fn take_attitude(&mut self) -> Result<StampedAttitude, DataServerError>;

    /// Consume whichever measurement is next, `None` once exhausted
    fn take_next(&mut self) -> Result<Option<Measurement>, DataServerError> {
        match self.next_kind() {
            StreamKind::Image => self.take_image().map(|m| Some(m.into())),
            StreamKind::Imu => self.take_imu().map(|m| Some(m.into())),
            StreamKind::Attitude => self.take_attitude().map(|m| Some(m.into())),
            StreamKind::None => Ok(None),
        }
    }

    /// Iterate over the remaining merged feed
    fn drain(&mut self) -> Drain<'_, Self>
    where
        Self: Sized,
    {
        Drain {
            server: self,
            done: false,
        }
    }
}

impl<S: DataServer + ?Sized> DataServer for Box<S> {
    fn next_kind(&self) -> StreamKind {
        (**self).next_kind()
    }

    fn next_stamp(&self) -> f64 {
        (**self).next_stamp()
    }

    fn take_image(&mut self) -> Result<StampedImage, DataServerError> {
        (**self).take_image()
    }

    fn take_imu(&mut self) -> Result<ImuVelocity, DataServerError> {
        (**self).take_imu()
    }

    fn take_attitude(&mut self) -> Result<StampedAttitude, DataServerError> {
        (**self).take_attitude()
    }

    fn take_next(&mut self) -> Result<Option<Measurement>, DataServerError> {
        (**self).take_next()
    }
}

/// Iterator returned by [`DataServer::drain`]
///
/// Fuses after the feed is exhausted or after the first error.
pub struct Drain<'a, S: DataServer + ?Sized> {
    server: &'a mut S,
    done: bool,
}

impl<S: DataServer + ?Sized> Iterator for Drain<'_, S> {
    type Item = Result<Measurement, DataServerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.server.take_next() {
            Ok(Some(measurement)) => Some(Ok(measurement)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
