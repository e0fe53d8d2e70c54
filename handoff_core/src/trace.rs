// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the render-thread frame loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! animation drivers and the render pipeline call at each stage of a frame.
//! All method bodies default to no-ops, so implementing only the events you
//! care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects phase timestamps during a frame and
//! produces a [`FrameSummary`] at the end.

use crate::time::FrameTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a render-thread frame is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Pending registrations drained, next-frame animations promoted.
    StartFrame,
    /// Tree walk: per-node animation and validation.
    PrepareTree,
    /// Animations for nodes the walk did not reach, then batch hand-off.
    RunAnimations,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted by an animation driver when a frame starts.
#[derive(Clone, Copy, Debug)]
pub struct FrameStartEvent {
    /// Driver frame counter.
    pub frame_index: u64,
    /// Frame time read from the clock.
    pub frame_time: FrameTime,
    /// Nodes handed over from the pending-registration queue.
    pub attached: u32,
    /// Nodes in the current frame's active set after promotion.
    pub active: u32,
}

/// Marks the beginning of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Driver frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Wall time at the start of the phase.
    pub timestamp: FrameTime,
}

/// Marks the end of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Driver frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Wall time at the end of the phase.
    pub timestamp: FrameTime,
}

/// Emitted when a finished-animation batch is handed to the owning thread.
#[derive(Clone, Copy, Debug)]
pub struct BatchScheduledEvent {
    /// Driver frame counter.
    pub frame_index: u64,
    /// Number of finished-animation events in the batch.
    pub events: u32,
    /// Whether the owning looper accepted the batch.
    pub accepted: bool,
}

/// Emitted after tree preparation reported at least one error.
#[derive(Clone, Copy, Debug)]
pub struct ErrorsReportedEvent {
    /// Driver frame counter.
    pub frame_index: u64,
    /// Errors reported during the pass.
    pub errors: u32,
    /// Subtrees skipped because their root was in error.
    pub skipped_subtrees: u32,
}

/// Per-frame summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct FrameSummary {
    /// Driver frame counter.
    pub frame_index: u64,
    /// Frame time the animations ran at.
    pub frame_time: FrameTime,
    /// Nodes visited by the tree walk.
    pub prepared_nodes: u32,
    /// Errors reported during the pass.
    pub errors: u32,
    /// Start-frame phase duration in nanoseconds (0 if not measured).
    pub start_nanos: u64,
    /// Prepare-tree phase duration in nanoseconds (0 if not measured).
    pub prepare_nanos: u64,
    /// Run-animations phase duration in nanoseconds (0 if not measured).
    pub animate_nanos: u64,
    /// Whether animations remain for a later frame.
    pub animating: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the render-thread frame loop.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called when a driver starts a frame.
    fn on_frame_start(&mut self, e: &FrameStartEvent) {
        _ = e;
    }

    /// Called at the beginning of a frame phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a frame phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a finished-animation batch is scheduled on the owner.
    fn on_batch_scheduled(&mut self, e: &BatchScheduledEvent) {
        _ = e;
    }

    /// Called when tree preparation reported errors.
    fn on_errors_reported(&mut self, e: &ErrorsReportedEvent) {
        _ = e;
    }

    /// Called with a per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameStartEvent`].
    #[inline]
    pub fn frame_start(&mut self, e: &FrameStartEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_start(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BatchScheduledEvent`].
    #[inline]
    pub fn batch_scheduled(&mut self, e: &BatchScheduledEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_batch_scheduled(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`ErrorsReportedEvent`].
    #[inline]
    pub fn errors_reported(&mut self, e: &ErrorsReportedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_errors_reported(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during a frame and produces a [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    frame_index: u64,
    frame_time: FrameTime,
    phase_starts: [Option<FrameTime>; 3],
    phase_ends: [Option<FrameTime>; 3],
    prepared_nodes: u32,
    errors: u32,
    animating: bool,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for one frame.
    #[must_use]
    pub fn new(frame_index: u64, frame_time: FrameTime) -> Self {
        Self {
            frame_index,
            frame_time,
            phase_starts: [None; 3],
            phase_ends: [None; 3],
            prepared_nodes: 0,
            errors: 0,
            animating: false,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: FrameTime) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: FrameTime) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Records the tree-walk outcome.
    pub fn set_outcome(&mut self, prepared_nodes: u32, errors: u32, animating: bool) {
        self.prepared_nodes = prepared_nodes;
        self.errors = errors;
        self.animating = animating;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.frame_index,
            frame_time: self.frame_time,
            prepared_nodes: self.prepared_nodes,
            errors: self.errors,
            start_nanos: self.phase_duration(PhaseKind::StartFrame),
            prepare_nanos: self.phase_duration(PhaseKind::PrepareTree),
            animate_nanos: self.phase_duration(PhaseKind::RunAnimations),
            animating: self.animating,
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).nanos(),
            _ => 0,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::StartFrame => 0,
        PhaseKind::PrepareTree => 1,
        PhaseKind::RunAnimations => 2,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
