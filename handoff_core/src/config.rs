// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render session configuration.

use crate::time::Duration;

/// Configuration for a [`RenderProxy`](crate::proxy::RenderProxy) session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    /// Display refresh interval used by the session's
    /// [`FrameClock`](crate::clock::FrameClock).
    pub frame_interval: Duration,
    /// Name given to the spawned render thread.
    pub thread_name: &'static str,
}

impl RenderConfig {
    /// 60 Hz display.
    #[must_use]
    pub const fn hz60() -> Self {
        Self {
            // 16.666ms, truncated to whole nanoseconds.
            frame_interval: Duration(16_666_666),
            thread_name: "RenderThread",
        }
    }

    /// 120 Hz display.
    #[must_use]
    pub const fn hz120() -> Self {
        Self {
            frame_interval: Duration(8_333_333),
            thread_name: "RenderThread",
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::hz60()
    }
}
