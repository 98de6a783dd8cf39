//! Background snapshot writer.
//!
//! # Responsibility
//! - Drain snapshot payloads to the persistence backend off the caller's
//!   thread, in the order mutations produced them.
//! - Coalesce bursts: only the newest queued payload is ever written.
//!
//! # Invariants
//! - Payloads are serialized by the store at dispatch time, so the pending
//!   slot always holds a full, current snapshot; dropping an older queued
//!   payload never loses state.
//! - Shutdown drains the pending payload before the thread exits.

use crate::snapshot::{SnapshotError, SnapshotStore};
use log::error;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

#[derive(Default)]
struct WriterState {
    pending: Option<String>,
    in_flight: bool,
    shutdown: bool,
    last_error: Option<SnapshotError>,
}

struct WriterInner {
    state: Mutex<WriterState>,
    cv: Condvar,
}

/// Single-writer queue in front of a `SnapshotStore`.
pub(crate) struct SnapshotWriter {
    inner: Arc<WriterInner>,
    handle: Option<JoinHandle<()>>,
}

impl SnapshotWriter {
    pub(crate) fn spawn(snapshots: Arc<dyn SnapshotStore>) -> Self {
        let inner = Arc::new(WriterInner {
            state: Mutex::new(WriterState::default()),
            cv: Condvar::new(),
        });

        let handle = std::thread::Builder::new()
            .name("taskpad-snapshot-writer".to_owned())
            .spawn({
                let inner = inner.clone();
                move || run_worker(&inner, snapshots.as_ref())
            })
            .expect("spawn snapshot writer thread");

        Self {
            inner,
            handle: Some(handle),
        }
    }

    /// Queues a payload, replacing any not-yet-written predecessor.
    pub(crate) fn schedule(&self, payload: String) {
        let mut state = self.lock();
        state.pending = Some(payload);
        self.inner.cv.notify_all();
    }

    /// Blocks until queued and in-flight writes are done.
    ///
    /// Returns the most recent write failure, if the last attempt failed;
    /// a later successful write clears it.
    pub(crate) fn flush(&self) -> Result<(), SnapshotError> {
        let mut state = self.lock();
        while state.pending.is_some() || state.in_flight {
            state = self
                .inner
                .cv
                .wait(state)
                .expect("snapshot writer cv poisoned");
        }
        match state.last_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WriterState> {
        self.inner
            .state
            .lock()
            .expect("snapshot writer lock poisoned")
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        {
            let mut state = self.lock();
            state.shutdown = true;
            self.inner.cv.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_worker(inner: &WriterInner, snapshots: &dyn SnapshotStore) {
    loop {
        let payload = {
            let mut state = inner
                .state
                .lock()
                .expect("snapshot writer lock poisoned");
            loop {
                // Pending is checked before shutdown so a payload queued
                // just before drop still reaches the backend.
                if let Some(payload) = state.pending.take() {
                    state.in_flight = true;
                    break payload;
                }
                if state.shutdown {
                    return;
                }
                state = inner.cv.wait(state).expect("snapshot writer cv poisoned");
            }
        };

        let result = snapshots.write(&payload);

        let mut state = inner
            .state
            .lock()
            .expect("snapshot writer lock poisoned");
        state.in_flight = false;
        match result {
            Ok(()) => state.last_error = None,
            Err(err) => {
                error!("event=snapshot_write module=store status=error error={err}");
                state.last_error = Some(err);
            }
        }
        inner.cv.notify_all();
    }
}
