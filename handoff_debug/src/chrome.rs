// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Phases become duration events. Frame starts, batch hand-offs, error
/// reports, and summaries become instant events stamped with the most recent
/// phase timestamp, since they carry no wall time of their own.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameStart(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameStart",
                    "cat": "Animation",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "frame_time_us": nanos_to_us(e.frame_time.nanos()),
                        "attached": e.attached,
                        "active": e.active,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                last_ts = nanos_to_us(e.timestamp.nanos());
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Frame",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                last_ts = nanos_to_us(e.timestamp.nanos());
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Frame",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::BatchScheduled(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "BatchScheduled",
                    "cat": "Handoff",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "events": e.events,
                        "accepted": e.accepted,
                    }
                }));
            }
            RecordedEvent::ErrorsReported(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "ErrorsReported",
                    "cat": "Handoff",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "errors": e.errors,
                        "skipped_subtrees": e.skipped_subtrees,
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": s.frame_index,
                        "prepared_nodes": s.prepared_nodes,
                        "errors": s.errors,
                        "start_us": nanos_to_us(s.start_nanos),
                        "prepare_us": nanos_to_us(s.prepare_nanos),
                        "animate_us": nanos_to_us(s.animate_nanos),
                        "animating": s.animating,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}
