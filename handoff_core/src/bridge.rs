// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The animation driver that hands work back to the owning thread.
//!
//! [`AnimationBridge`] wraps an [`AnimationContext`] and hooks the two frame
//! boundaries:
//!
//! - **Frame start**: every node queued on the [`SyncRoot`] is drained into
//!   the context before it promotes its next-frame set, so registrations made
//!   before the drain run this frame.
//! - **Frame end**: completions detected during the frame are collected into
//!   a [`FinishedEventBatch`] instead of being delivered inline. A non-empty
//!   batch is moved into a
//!   [`DeliverFinishedEvents`](ScheduledCallback::DeliverFinishedEvents)
//!   callback and posted to the owning thread.
//!
//! [`BridgeFactory`] builds a fresh bridge each time a pipeline needs a new
//! animation context; every bridge shares the same root.

use core::fmt;
use core::mem;
use std::sync::Arc;

use crate::animation::{AnimationContext, AnimationDriver, ContextFactory};
use crate::animator::{AnimationListener, Animator};
use crate::callback::{FinishedAnimationEvent, FinishedEventBatch, ScheduledCallback};
use crate::clock::FrameClock;
use crate::node::RenderNode;
use crate::root::SyncRoot;
use crate::time::FrameTime;
use crate::trace::{BatchScheduledEvent, Tracer};
use crate::tree::TreeInfo;

/// Animation driver bound to a [`SyncRoot`].
pub struct AnimationBridge {
    context: AnimationContext,
    root: Arc<SyncRoot>,
    finished: FinishedEventBatch,
}

impl fmt::Debug for AnimationBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationBridge")
            .field("context", &self.context)
            .field("finished", &self.finished.len())
            .finish_non_exhaustive()
    }
}

impl AnimationBridge {
    /// Creates a bridge reading frame times from `clock`.
    #[must_use]
    pub fn new(clock: Arc<FrameClock>, root: Arc<SyncRoot>) -> Self {
        Self {
            context: AnimationContext::new(clock),
            root,
            finished: FinishedEventBatch::new(),
        }
    }

    /// The wrapped base context.
    #[must_use]
    pub fn context(&self) -> &AnimationContext {
        &self.context
    }

    /// The root this bridge drains and reports to.
    #[must_use]
    pub fn root(&self) -> &Arc<SyncRoot> {
        &self.root
    }

    /// Completions collected this frame and not yet posted.
    #[must_use]
    pub fn unposted_events(&self) -> usize {
        self.finished.len()
    }

    fn post_finished(&mut self, tracer: &mut Tracer<'_>) {
        if self.finished.is_empty() {
            return;
        }
        let batch = mem::take(&mut self.finished);
        let events = u32::try_from(batch.len()).unwrap_or(u32::MAX);
        let accepted = self
            .root
            .schedule_on_owner(ScheduledCallback::DeliverFinishedEvents(batch));
        tracer.batch_scheduled(&BatchScheduledEvent {
            frame_index: self.context.frame_index(),
            events,
            accepted,
        });
    }
}

impl AnimationDriver for AnimationBridge {
    fn frame_time(&self) -> FrameTime {
        self.context.frame_time()
    }

    fn frame_index(&self) -> u64 {
        self.context.frame_index()
    }

    fn add_animating_node(&mut self, node: Arc<RenderNode>) {
        self.context.add_animating_node(node);
    }

    fn start_frame(&mut self, tracer: &mut Tracer<'_>) {
        let attached = self.root.drain_pending_into(&mut self.context);
        self.context.begin_frame();
        tracer.frame_start(&self.context.frame_start_event(attached));
    }

    fn animate_node(&mut self, node: &Arc<RenderNode>, info: &mut TreeInfo<'_>) {
        self.context.animate_node_with(node, info, &mut self.finished);
    }

    fn run_remaining_animations(&mut self, info: &mut TreeInfo<'_>, tracer: &mut Tracer<'_>) {
        self.context.run_remaining_with(info, &mut self.finished);
        self.post_finished(tracer);
    }

    fn call_on_finished(&mut self, animator: Arc<Animator>, listener: Arc<dyn AnimationListener>) {
        self.finished.push(FinishedAnimationEvent { animator, listener });
    }

    fn has_animations(&self) -> bool {
        self.context.has_animations()
    }

    fn destroy(&mut self) {
        self.context.destroy_with(&mut self.finished);
        self.post_finished(&mut Tracer::none());
    }
}

/// Builds [`AnimationBridge`]s bound to one [`SyncRoot`].
#[derive(Clone, Debug)]
pub struct BridgeFactory {
    root: Arc<SyncRoot>,
}

impl BridgeFactory {
    /// Creates a factory for `root`.
    #[must_use]
    pub fn new(root: Arc<SyncRoot>) -> Self {
        Self { root }
    }

    /// Creates an independent bridge sharing this factory's root.
    #[must_use]
    pub fn create(&self, clock: Arc<FrameClock>) -> AnimationBridge {
        AnimationBridge::new(clock, Arc::clone(&self.root))
    }
}

impl ContextFactory for BridgeFactory {
    fn create_animation_context(&self, clock: Arc<FrameClock>) -> Box<dyn AnimationDriver> {
        Box::new(self.create(clock))
    }
}
