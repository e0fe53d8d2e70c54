// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] writes one line per event. Write errors are ignored;
//! tracing must never fail a frame.

use std::io::{self, Write};

use handoff_core::trace::{
    BatchScheduledEvent, ErrorsReportedEvent, FrameStartEvent, FrameSummary, PhaseBeginEvent,
    PhaseEndEvent, TraceSink,
};

/// A [`TraceSink`] that prints one line per event.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    out: W,
}

impl<W: Write> core::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Prints to standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Prints to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

fn ms(nanos: u64) -> f64 {
    nanos as f64 / 1_000_000.0
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_start(&mut self, e: &FrameStartEvent) {
        _ = writeln!(
            self.out,
            "[frame {}] start t={:.3}ms attached={} active={}",
            e.frame_index,
            ms(e.frame_time.nanos()),
            e.attached,
            e.active,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = writeln!(
            self.out,
            "[frame {}]   begin {:?} @{:.3}ms",
            e.frame_index,
            e.phase,
            ms(e.timestamp.nanos()),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = writeln!(
            self.out,
            "[frame {}]   end   {:?} @{:.3}ms",
            e.frame_index,
            e.phase,
            ms(e.timestamp.nanos()),
        );
    }

    fn on_batch_scheduled(&mut self, e: &BatchScheduledEvent) {
        let status = if e.accepted { "posted" } else { "dropped, owner gone" };
        _ = writeln!(
            self.out,
            "[frame {}] finished batch of {} ({status})",
            e.frame_index, e.events,
        );
    }

    fn on_errors_reported(&mut self, e: &ErrorsReportedEvent) {
        _ = writeln!(
            self.out,
            "[frame {}] {} error(s), {} subtree(s) skipped",
            e.frame_index, e.errors, e.skipped_subtrees,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = writeln!(
            self.out,
            "[frame {}] summary nodes={} errors={} start={}ns prepare={}ns animate={}ns{}",
            s.frame_index,
            s.prepared_nodes,
            s.errors,
            s.start_nanos,
            s.prepare_nanos,
            s.animate_nanos,
            if s.animating { " animating" } else { "" },
        );
    }
}
