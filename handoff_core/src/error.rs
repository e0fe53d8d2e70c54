// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Two families cross the API:
//!
//! - [`BridgeError`]: setup and dispatch failures returned directly to the
//!   caller (no looper on the creating thread, render thread gone).
//! - [`RenderingError`]: failures detected on the render thread while
//!   preparing the tree. These never surface on the render thread; they reach
//!   the owning thread as a scheduled callback and are returned from
//!   [`Looper::poll_once`](crate::looper::Looper::poll_once).

use std::io;

use thiserror::Error;

use crate::callback::ErrorReport;

/// Setup and cross-thread dispatch failures.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A [`SyncRoot`](crate::root::SyncRoot) was created on a thread with no
    /// prepared [`Looper`](crate::looper::Looper).
    #[error("SyncRoot must be created on a thread with a looper")]
    NoLooper,
    /// [`Looper::prepare`](crate::looper::Looper::prepare) was called twice on
    /// the same thread.
    #[error("a looper is already prepared for this thread")]
    LooperAlreadyPrepared,
    /// The render thread has exited; the request was not executed.
    #[error("render thread is no longer running")]
    RenderThreadGone,
    /// The render thread could not be spawned.
    #[error("failed to spawn render thread")]
    Spawn(#[source] io::Error),
}

/// A render-thread failure raised on the owning thread.
#[derive(Debug, Error)]
pub enum RenderingError {
    /// The tree was in an invalid state during preparation.
    #[error("illegal render state: {0}")]
    IllegalState(ErrorReport),
}

impl RenderingError {
    /// Returns the report carried by this error.
    #[must_use]
    pub fn report(&self) -> &ErrorReport {
        match self {
            Self::IllegalState(report) => report,
        }
    }
}
