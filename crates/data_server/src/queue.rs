//! Bounded per-stream FIFO with an exhaustion flag.

use std::fmt;

use contracts::Stamped;
use ringbuf::{traits::*, HeapRb};

/// Bounded FIFO of measurements for one stream
///
/// Once `finished` is set it is never cleared and nothing is pushed again,
/// so a finished queue only drains.
pub struct StreamQueue<T> {
    ring: HeapRb<T>,
    finished: bool,
    pushed: u64,
    popped: u64,
}

impl<T> fmt::Debug for StreamQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamQueue")
            .field("len", &self.ring.occupied_len())
            .field("capacity", &self.ring.capacity())
            .field("finished", &self.finished)
            .finish()
    }
}

impl<T: Stamped> StreamQueue<T> {
    /// Create an empty queue
    ///
    /// `capacity` must be at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: HeapRb::new(capacity),
            finished: false,
            pushed: 0,
            popped: 0,
        }
    }

    /// Record a fetch result: store the item, or mark the stream finished
    ///
    /// Returns `Err(item)` if the queue is full or already finished.
    #[inline]
    pub fn offer(&mut self, item: Option<T>) -> Result<(), T> {
        let Some(item) = item else {
            self.finished = true;
            return Ok(());
        };
        if self.finished {
            return Err(item);
        }
        self.ring.try_push(item)?;
        self.pushed += 1;
        Ok(())
    }

    /// Remove and return the oldest measurement
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let item = self.ring.try_pop()?;
        self.popped += 1;
        Some(item)
    }

    /// Stamp of the oldest measurement
    #[inline]
    pub fn front_stamp(&self) -> Option<f64> {
        self.ring.iter().next().map(|item| item.stamp())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The producer may fetch another item for this stream
    #[inline]
    pub fn wants_more(&self) -> bool {
        !self.finished && !self.ring.is_full()
    }

    /// Readiness: the consumer can trust what this queue says about its stream
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.finished || !self.ring.is_empty()
    }

    /// Finished and fully drained
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.finished && self.ring.is_empty()
    }

    /// Mark the stream finished without a fetch
    pub fn close(&mut self) {
        self.finished = true;
    }

    /// Diagnostic snapshot
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            depth: self.len(),
            capacity: self.ring.capacity().get(),
            finished: self.finished,
            pushed: self.pushed,
            popped: self.popped,
        }
    }
}

/// Queue status (for diagnostics)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Buffered measurements
    pub depth: usize,
    /// Maximum buffered measurements
    pub capacity: usize,
    /// Source reported end of stream
    pub finished: bool,
    /// Measurements ever buffered
    pub pushed: u64,
    /// Measurements handed to the consumer
    pub popped: u64,
}
