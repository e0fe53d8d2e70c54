// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render thread's frame clock.
//!
//! [`FrameClock`] holds the time of the frame currently being produced. The
//! render pipeline feeds it vsync timestamps; animation drivers read it at the
//! start of every frame. It is shared as `Arc<FrameClock>` between the pipeline
//! and every driver created for it, so state lives in atomics.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::time::{Duration, FrameTime};

/// Frame-time source for one rendering session.
#[derive(Debug)]
pub struct FrameClock {
    frame_time: AtomicU64,
    frame_interval: AtomicU64,
}

impl FrameClock {
    /// Creates a clock at time zero with the given display refresh interval.
    #[must_use]
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            frame_time: AtomicU64::new(0),
            frame_interval: AtomicU64::new(frame_interval.nanos()),
        }
    }

    /// Returns the current frame time.
    #[inline]
    #[must_use]
    pub fn frame_time(&self) -> FrameTime {
        FrameTime(self.frame_time.load(Ordering::Acquire))
    }

    /// Returns the display refresh interval.
    #[inline]
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration(self.frame_interval.load(Ordering::Relaxed))
    }

    /// Replaces the display refresh interval.
    pub fn set_frame_interval(&self, interval: Duration) {
        self.frame_interval.store(interval.nanos(), Ordering::Relaxed);
    }

    /// Advances the clock to `vsync`.
    ///
    /// Returns `false` (and leaves the clock unchanged) unless `vsync` is
    /// strictly later than the current frame time.
    pub fn vsync_received(&self, vsync: FrameTime) -> bool {
        let previous = self.frame_time.fetch_max(vsync.nanos(), Ordering::AcqRel);
        previous < vsync.nanos()
    }

    /// Computes the frame time for a render-thread-driven frame at `now`.
    ///
    /// If at least one whole interval has passed since the last frame, the
    /// frame time snaps forward to the latest interval boundary that is not
    /// after `now`, so skipped frames are not animated one by one.
    pub fn compute_frame_time(&self, now: FrameTime) -> FrameTime {
        let interval = self.frame_interval().nanos();
        let current = self.frame_time();
        let jitter = now.saturating_duration_since(current).nanos();
        if interval > 0 && jitter >= interval {
            let offset = jitter % interval;
            self.vsync_received(FrameTime(now.nanos() - offset));
        }
        self.frame_time()
    }
}
