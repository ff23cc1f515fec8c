//! Threaded data server with bounded per-stream queues.
//!
//! A background worker tops up one queue per stream from the source while
//! the consumer pops from the queue fronts. Both sides share one mutex and
//! one condition variable:
//!
//! - the worker notifies after every fill pass and on exit
//! - the consumer notifies after every pop, waking a worker parked on full queues
//! - `Drop` raises the shutdown flag, notifies and joins the worker
//!
//! Source fetches happen outside the lock.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use contracts::{
    ContractError, DataServer, DataServerError, ImuVelocity, MeasurementSource, QueueCapacities,
    Stamped, StampedAttitude, StampedImage, StreamKind,
};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, instrument, trace, warn};

use crate::queue::{QueueStats, StreamQueue};
use crate::report_violation;
use crate::selection::select_next;

const WORKER_THREAD_NAME: &str = "dataserver-io";

/// State guarded by the shared mutex
#[derive(Debug)]
struct SharedState {
    image: StreamQueue<StampedImage>,
    imu: StreamQueue<ImuVelocity>,
    attitude: StreamQueue<StampedAttitude>,
    shutdown: bool,
}

impl SharedState {
    fn new(capacities: QueueCapacities) -> Self {
        Self {
            image: StreamQueue::new(capacities.image),
            imu: StreamQueue::new(capacities.imu),
            attitude: StreamQueue::new(capacities.attitude),
            shutdown: false,
        }
    }

    /// Every stream is either finished or has a measurement at its front
    fn is_ready(&self) -> bool {
        self.image.is_ready() && self.imu.is_ready() && self.attitude.is_ready()
    }

    fn all_finished(&self) -> bool {
        self.image.is_finished() && self.imu.is_finished() && self.attitude.is_finished()
    }

    fn has_room(&self) -> bool {
        self.image.wants_more() || self.imu.wants_more() || self.attitude.wants_more()
    }

    fn wants_more(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Image => self.image.wants_more(),
            StreamKind::Imu => self.imu.wants_more(),
            StreamKind::Attitude => self.attitude.wants_more(),
            StreamKind::None => false,
        }
    }

    fn is_empty(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Image => self.image.is_empty(),
            StreamKind::Imu => self.imu.is_empty(),
            StreamKind::Attitude => self.attitude.is_empty(),
            StreamKind::None => true,
        }
    }

    fn front_stamp(&self, kind: StreamKind) -> Option<f64> {
        match kind {
            StreamKind::Image => self.image.front_stamp(),
            StreamKind::Imu => self.imu.front_stamp(),
            StreamKind::Attitude => self.attitude.front_stamp(),
            StreamKind::None => None,
        }
    }

    fn is_exhausted(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Image => self.image.is_exhausted(),
            StreamKind::Imu => self.imu.is_exhausted(),
            StreamKind::Attitude => self.attitude.is_exhausted(),
            StreamKind::None => true,
        }
    }

    fn depth(&self, kind: StreamKind) -> usize {
        match kind {
            StreamKind::Image => self.image.len(),
            StreamKind::Imu => self.imu.len(),
            StreamKind::Attitude => self.attitude.len(),
            StreamKind::None => 0,
        }
    }

    /// Selection over the current queue fronts, one emptiness check per stream
    ///
    /// Only meaningful while `is_ready` holds; otherwise a stream that is
    /// merely slow looks the same as an exhausted one.
    fn select(&self) -> StreamKind {
        select_next(
            self.image.front_stamp(),
            self.imu.front_stamp(),
            self.attitude.front_stamp(),
        )
    }

    /// Verify `requested` is the stream at the head of the merged feed
    ///
    /// Outside readiness a slower stream may still produce an earlier
    /// stamp, so the take is refused rather than guessed.
    fn check_take(&self, requested: StreamKind) -> Result<(), DataServerError> {
        if !self.is_ready() {
            return Err(DataServerError::NotReady { requested });
        }
        if self.is_empty(requested) {
            return Err(DataServerError::StreamEmpty { kind: requested });
        }
        let next = self.select();
        if next != requested {
            return Err(DataServerError::contract_violation(requested, next));
        }
        Ok(())
    }

    /// Mark every unfinished stream finished
    fn close_all(&mut self) {
        self.image.close();
        self.imu.close();
        self.attitude.close();
    }
}

/// Mutex plus condition variable shared with the worker
#[derive(Debug)]
struct Shared {
    state: Mutex<SharedState>,
    changed: Condvar,
}

/// Data server backed by a background I/O worker
///
/// The worker keeps up to `capacities` measurements buffered per stream so
/// source latency is hidden from the consumer. `next_kind` blocks until
/// every stream is either finished or has a measurement queued, which keeps a
/// slow stream from being mistaken for an exhausted one.
///
/// There is no timeout: a source that blocks forever on one stream stalls
/// the merge, and dropping the server then waits for that fetch to return.
pub struct ThreadedDataServer {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadedDataServer {
    /// Create the server and start the background worker
    ///
    /// # Errors
    /// - A queue capacity of zero or above `QueueCapacities::MAX`
    /// - The worker thread could not be spawned
    #[instrument(name = "threaded_data_server_new", skip(source))]
    pub fn new<S>(source: S, capacities: QueueCapacities) -> Result<Self, ContractError>
    where
        S: MeasurementSource + 'static,
    {
        capacities.check()?;

        let shared = Arc::new(Shared {
            state: Mutex::new(SharedState::new(capacities)),
            changed: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || fill_queues(source, worker_shared))?;

        debug!(
            image = capacities.image,
            imu = capacities.imu,
            attitude = capacities.attitude,
            "threaded data server started"
        );

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Snapshot of one stream's queue
    pub fn queue_stats(&self, kind: StreamKind) -> QueueStats {
        let state = self.shared.state.lock();
        match kind {
            StreamKind::Image => state.image.stats(),
            StreamKind::Imu => state.imu.stats(),
            StreamKind::Attitude => state.attitude.stats(),
            StreamKind::None => QueueStats::default(),
        }
    }

    /// Block until the readiness predicate holds
    fn wait_ready(&self) -> parking_lot::MutexGuard<'_, SharedState> {
        let mut state = self.shared.state.lock();
        self.shared
            .changed
            .wait_while(&mut state, |state| !state.is_ready());
        state
    }

    /// Pop the front of `requested` after checking it is next in order
    ///
    /// Does not wait; readiness is established by `next_kind`.
    fn take_front<T: Stamped>(
        &self,
        requested: StreamKind,
        pop: impl FnOnce(&mut SharedState) -> Option<T>,
    ) -> Result<T, DataServerError> {
        let mut state = self.shared.state.lock();
        state.check_take(requested).map_err(report_violation)?;
        let item = pop(&mut *state)
            .ok_or_else(|| report_violation(DataServerError::StreamEmpty { kind: requested }))?;
        let depth = state.depth(requested);
        let drained = state.is_exhausted(requested);
        drop(state);

        // Wake a worker parked on a full queue
        self.shared.changed.notify_all();

        observability::record_measurement_delivered(requested);
        observability::record_queue_depth(requested, depth);
        trace!(stream = %requested, stamp = item.stamp(), depth, "measurement delivered");
        if drained {
            debug!(stream = %requested, "stream drained");
        }
        Ok(item)
    }
}

impl DataServer for ThreadedDataServer {
    fn next_kind(&self) -> StreamKind {
        self.wait_ready().select()
    }

    fn next_stamp(&self) -> f64 {
        let state = self.wait_ready();
        state.front_stamp(state.select()).unwrap_or(f64::NAN)
    }

    fn take_image(&mut self) -> Result<StampedImage, DataServerError> {
        self.take_front(StreamKind::Image, |state| state.image.pop())
    }

    fn take_imu(&mut self) -> Result<ImuVelocity, DataServerError> {
        self.take_front(StreamKind::Imu, |state| state.imu.pop())
    }

    fn take_attitude(&mut self) -> Result<StampedAttitude, DataServerError> {
        self.take_front(StreamKind::Attitude, |state| state.attitude.pop())
    }
}

impl Drop for ThreadedDataServer {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
        }
        self.shared.changed.notify_all();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("data server worker panicked");
            }
        }
        debug!("threaded data server stopped");
    }
}

/// Unblocks the consumer however the worker exits
///
/// On a panic (a failing source) every stream is closed so the consumer
/// drains what is buffered and then sees `StreamKind::None`.
struct WorkerExitGuard<'a> {
    shared: &'a Shared,
}

impl Drop for WorkerExitGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            let mut state = self.shared.state.lock();
            if !state.all_finished() {
                error!("data server worker panicked, closing unfinished streams");
                state.close_all();
            }
        }
        self.shared.changed.notify_all();
    }
}

/// Background worker loop
#[instrument(name = "data_server_fill_queues", skip_all)]
fn fill_queues<S: MeasurementSource>(mut source: S, shared: Arc<Shared>) {
    let _exit_guard = WorkerExitGuard { shared: &shared };
    debug!("data server worker started");

    let mut passes: u64 = 0;
    loop {
        let wanted = {
            let mut state = shared.state.lock();
            // Park while every unfinished queue is full
            shared.changed.wait_while(&mut state, |state| {
                !state.shutdown && !state.all_finished() && !state.has_room()
            });
            if state.shutdown || state.all_finished() {
                break;
            }
            StreamKind::STREAMS.map(|kind| state.wants_more(kind))
        };

        for (kind, wanted) in StreamKind::STREAMS.into_iter().zip(wanted) {
            if wanted && !top_up(kind, &mut source, &shared) {
                debug!(passes, "data server worker observed shutdown");
                return;
            }
        }

        passes += 1;
        shared.changed.notify_all();
    }

    debug!(passes, "data server worker finished");
}

/// Fetch one measurement of `kind` and queue it
///
/// Returns `false` once shutdown has been requested.
fn top_up<S: MeasurementSource>(kind: StreamKind, source: &mut S, shared: &Shared) -> bool {
    match kind {
        StreamKind::Image => {
            let item = source.next_image();
            store(kind, item, shared, |state| &mut state.image)
        }
        StreamKind::Imu => {
            let item = source.next_imu();
            store(kind, item, shared, |state| &mut state.imu)
        }
        StreamKind::Attitude => {
            let item = source.next_attitude();
            store(kind, item, shared, |state| &mut state.attitude)
        }
        StreamKind::None => true,
    }
}

fn store<T: Stamped>(
    kind: StreamKind,
    item: Option<T>,
    shared: &Shared,
    queue: impl FnOnce(&mut SharedState) -> &mut StreamQueue<T>,
) -> bool {
    let exhausted = item.is_none();
    let mut state = shared.state.lock();
    if state.shutdown {
        return false;
    }

    let queue = queue(&mut *state);
    if let Err(item) = queue.offer(item) {
        // Only the worker pushes and it checks for room first
        warn!(stream = %kind, stamp = item.stamp(), "queue rejected measurement");
    }
    let depth = queue.len();
    drop(state);

    observability::record_queue_depth(kind, depth);
    if exhausted {
        observability::record_stream_finished(kind);
        debug!(stream = %kind, "stream exhausted");
    }
    true
}
