// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-thread animation hand-off between a scene-graph owner and a render
//! thread.
//!
//! `handoff_core` connects two threads. The **owning thread** builds the
//! scene graph, starts animations, and receives callbacks. The **render
//! thread** advances animations and prepares frames, one at a time. Three
//! kinds of events cross between them, and none of the crossings block:
//! newly animating nodes, finished-animation notifications, and errors found
//! while preparing the tree.
//!
//! # Architecture
//!
//! ```text
//!   owning thread                          render thread
//!   ─────────────                          ─────────────
//!   RenderNode::add_animator()
//!       │
//!       ▼
//!   SyncRoot::register_animating_node() ─► pending queue
//!                                              │  drained at frame start
//!                                              ▼
//!                                  AnimationBridge::start_frame()
//!                                              │
//!                                              ▼
//!                                  SyncRoot::prepare_tree() ── errors ─┐
//!                                              │                       │
//!                                              ▼                       │
//!                                  run_remaining_animations()          │
//!                                              │ FinishedEventBatch    │
//!                                              ▼                       ▼
//!   Looper::poll_once() ◄──────────── ScheduledCallback (FIFO) ◄───────┘
//! ```
//!
//! **[`root`]**: [`SyncRoot`](root::SyncRoot), the pending-registration queue
//! and the tree's error channel.
//!
//! **[`bridge`]**: [`AnimationBridge`](bridge::AnimationBridge), the driver
//! that drains the queue at frame start and posts finished batches at frame
//! end, and [`BridgeFactory`](bridge::BridgeFactory).
//!
//! **[`callback`]**: the [`ScheduledCallback`](callback::ScheduledCallback)
//! kinds and their payloads.
//!
//! **[`looper`]**: the owning thread's run loop.
//!
//! **[`animation`]**, **[`animator`]**, **[`node`]**, **[`tree`]**: the base
//! animation driver, property animators, scene-graph nodes, and tree
//! preparation the bridge plugs into.
//!
//! **[`pipeline`]** and **[`proxy`]**: the render-thread frame loop and the
//! owning-thread handle that spawns and drives it.
//!
//! **[`clock`]** and **[`time`]**: frame timing with vsync jitter correction.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod animation;
pub mod animator;
pub mod bridge;
pub mod callback;
pub mod clock;
pub mod config;
pub mod error;
pub mod looper;
pub mod node;
pub mod pipeline;
pub mod proxy;
pub mod root;
pub mod time;
pub mod trace;
pub mod tree;
