// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-thread run loop.
//!
//! A [`Looper`] is the owning thread's FIFO queue of [`ScheduledCallback`]s.
//! Any thread holding a [`LooperHandle`] can enqueue work without blocking;
//! the owning thread runs it by polling. One looper may exist per thread.

use core::cell::RefCell;
use core::fmt;
use core::marker::PhantomData;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::callback::ScheduledCallback;
use crate::error::{BridgeError, RenderingError};

std::thread_local! {
    static CURRENT: RefCell<Option<LooperHandle>> = const { RefCell::new(None) };
}

/// Sends callbacks to one thread's [`Looper`].
#[derive(Clone)]
pub struct LooperHandle {
    sender: Sender<ScheduledCallback>,
}

impl fmt::Debug for LooperHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LooperHandle")
            .field("queued", &self.sender.len())
            .finish()
    }
}

impl LooperHandle {
    /// Enqueues `callback`.
    ///
    /// Never blocks. Returns `false` if the looper has been dropped; the
    /// callback is then discarded.
    pub fn send(&self, callback: ScheduledCallback) -> bool {
        match self.sender.send(callback) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(callback = ?err.into_inner(), "looper gone, callback dropped");
                false
            }
        }
    }
}

/// The calling thread's run loop.
///
/// Not `Send`: it must be polled on the thread that prepared it.
pub struct Looper {
    receiver: Receiver<ScheduledCallback>,
    handle: LooperHandle,
    _not_send: PhantomData<*const ()>,
}

impl fmt::Debug for Looper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Looper")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl Looper {
    /// Creates the calling thread's looper.
    ///
    /// # Errors
    ///
    /// [`BridgeError::LooperAlreadyPrepared`] if this thread already has one.
    pub fn prepare() -> Result<Self, BridgeError> {
        CURRENT.with(|current| {
            let mut current = current.borrow_mut();
            if current.is_some() {
                return Err(BridgeError::LooperAlreadyPrepared);
            }
            let (sender, receiver) = crossbeam_channel::unbounded();
            let handle = LooperHandle { sender };
            *current = Some(handle.clone());
            Ok(Self {
                receiver,
                handle,
                _not_send: PhantomData,
            })
        })
    }

    /// Returns a handle to the calling thread's looper, if one is prepared.
    #[must_use]
    pub fn for_thread() -> Option<LooperHandle> {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Returns a handle to this looper.
    #[must_use]
    pub fn handle(&self) -> LooperHandle {
        self.handle.clone()
    }

    /// Number of callbacks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Runs every callback queued at the time of the call, in order.
    ///
    /// Returns the number of callbacks run.
    ///
    /// # Errors
    ///
    /// Stops at the first callback that raises and returns its error. Later
    /// callbacks stay queued for the next poll.
    pub fn poll_once(&self) -> Result<usize, RenderingError> {
        let queued = self.receiver.len();
        let mut ran = 0;
        for callback in self.receiver.try_iter().take(queued) {
            ran += 1;
            callback.run()?;
        }
        Ok(ran)
    }

    /// Waits up to `timeout` for a callback, then polls like
    /// [`poll_once`](Self::poll_once).
    ///
    /// Returns `Ok(0)` if nothing arrived in time.
    ///
    /// # Errors
    ///
    /// As for [`poll_once`](Self::poll_once).
    pub fn poll_timeout(&self, timeout: std::time::Duration) -> Result<usize, RenderingError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(callback) => {
                callback.run()?;
                Ok(1 + self.poll_once()?)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => Ok(0),
        }
    }
}

impl Drop for Looper {
    fn drop(&mut self) {
        // The thread-local may already be gone during thread teardown.
        _ = CURRENT.try_with(|current| current.borrow_mut().take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{ErrorReport, FinishedEventBatch};

    #[test]
    fn prepare_publishes_handle_once() {
        assert!(Looper::for_thread().is_none());
        let looper = Looper::prepare().unwrap();
        assert!(Looper::for_thread().is_some());
        assert!(matches!(Looper::prepare(), Err(BridgeError::LooperAlreadyPrepared)));
        drop(looper);
        assert!(Looper::for_thread().is_none());
    }

    #[test]
    fn error_stops_poll_and_keeps_the_rest() {
        let looper = Looper::prepare().unwrap();
        let handle = looper.handle();
        assert!(handle.send(ScheduledCallback::DeliverFinishedEvents(FinishedEventBatch::new())));
        assert!(handle.send(ScheduledCallback::RaiseReportedError(ErrorReport::new("boom"))));
        assert!(handle.send(ScheduledCallback::DeliverFinishedEvents(FinishedEventBatch::new())));

        let err = looper.poll_once().unwrap_err();
        assert_eq!(err.report().first(), "boom");
        assert_eq!(looper.pending(), 1);
        assert_eq!(looper.poll_once().unwrap(), 1);
        assert_eq!(looper.pending(), 0);
    }

    #[test]
    fn send_after_drop_is_lost() {
        let looper = Looper::prepare().unwrap();
        let handle = looper.handle();
        drop(looper);
        assert!(!handle.send(ScheduledCallback::RaiseReportedError(ErrorReport::new("late"))));
    }

    #[test]
    fn poll_timeout_receives_from_other_thread() {
        let looper = Looper::prepare().unwrap();
        let handle = looper.handle();
        std::thread::spawn(move || {
            handle.send(ScheduledCallback::DeliverFinishedEvents(FinishedEventBatch::new()));
        })
        .join()
        .unwrap();
        assert_eq!(looper.poll_timeout(std::time::Duration::from_secs(1)).unwrap(), 1);
        assert_eq!(looper.poll_timeout(std::time::Duration::from_millis(1)).unwrap(), 0);
    }
}
