// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame animation drivers.
//!
//! An [`AnimationDriver`] owns the render thread's active animation set and
//! advances it once per frame:
//!
//! 1. [`start_frame`](AnimationDriver::start_frame) reads the frame time from
//!    the [`FrameClock`] and promotes the nodes scheduled for this frame.
//! 2. Tree preparation calls [`animate_node`](AnimationDriver::animate_node)
//!    for every animating node it visits.
//! 3. [`run_remaining_animations`](AnimationDriver::run_remaining_animations)
//!    advances the active nodes the walk did not reach.
//!
//! Nodes that still have animators after running are scheduled for the next
//! frame. [`AnimationContext`] is the base implementation and notifies
//! listeners inline on the render thread. The
//! [`AnimationBridge`](crate::bridge::AnimationBridge) wraps it and defers
//! notifications to the owning thread instead.

use core::fmt;
use core::mem;
use std::sync::Arc;

use hashbrown::HashSet;

use crate::animator::{AnimationListener, Animator};
use crate::clock::FrameClock;
use crate::node::{NodeId, RenderNode};
use crate::time::FrameTime;
use crate::trace::{FrameStartEvent, Tracer};
use crate::tree::TreeInfo;

/// Receives the completions detected while animating a node.
pub trait FinishedAnimationSink {
    /// Called once per finished animator that has a listener.
    fn call_on_finished(&mut self, animator: Arc<Animator>, listener: Arc<dyn AnimationListener>);
}

/// Delivers completions immediately on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineDelivery;

impl FinishedAnimationSink for InlineDelivery {
    fn call_on_finished(&mut self, animator: Arc<Animator>, listener: Arc<dyn AnimationListener>) {
        listener.on_animation_finished(&animator);
    }
}

/// The per-frame animation contract used by the render pipeline.
pub trait AnimationDriver: Send + fmt::Debug {
    /// Frame time read by the last [`start_frame`](Self::start_frame).
    fn frame_time(&self) -> FrameTime;

    /// Number of frames started so far.
    fn frame_index(&self) -> u64;

    /// Schedules `node` to join the active set at the next frame start.
    fn add_animating_node(&mut self, node: Arc<RenderNode>);

    /// Begins a frame.
    fn start_frame(&mut self, tracer: &mut Tracer<'_>);

    /// Advances `node`'s animators; called by tree preparation.
    fn animate_node(&mut self, node: &Arc<RenderNode>, info: &mut TreeInfo<'_>);

    /// Advances every active node not reached by tree preparation.
    fn run_remaining_animations(&mut self, info: &mut TreeInfo<'_>, tracer: &mut Tracer<'_>);

    /// Reports one finished animator with a listener.
    fn call_on_finished(&mut self, animator: Arc<Animator>, listener: Arc<dyn AnimationListener>);

    /// Returns `true` if any node is scheduled to animate.
    fn has_animations(&self) -> bool;

    /// Ends every active animator at its final value and reports completions.
    fn destroy(&mut self);
}

/// Creates animation drivers for a render pipeline.
///
/// The pipeline asks for a fresh driver at construction and again whenever
/// its animation context is reset.
pub trait ContextFactory: Send + Sync + fmt::Debug {
    /// Creates a new driver reading frame times from `clock`.
    fn create_animation_context(&self, clock: Arc<FrameClock>) -> Box<dyn AnimationDriver>;
}

/// Factory for plain [`AnimationContext`] drivers.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultContextFactory;

impl ContextFactory for DefaultContextFactory {
    fn create_animation_context(&self, clock: Arc<FrameClock>) -> Box<dyn AnimationDriver> {
        Box::new(AnimationContext::new(clock))
    }
}

// ---------------------------------------------------------------------------
// AnimationContext
// ---------------------------------------------------------------------------

/// Base animation driver.
pub struct AnimationContext {
    clock: Arc<FrameClock>,
    frame_time: FrameTime,
    frame_index: u64,
    current_frame: Vec<Arc<RenderNode>>,
    next_frame: Vec<Arc<RenderNode>>,
    scheduled: HashSet<NodeId>,
}

impl fmt::Debug for AnimationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationContext")
            .field("frame_time", &self.frame_time)
            .field("frame_index", &self.frame_index)
            .field("current_frame", &self.current_frame.len())
            .field("next_frame", &self.next_frame.len())
            .finish_non_exhaustive()
    }
}

impl AnimationContext {
    /// Creates an idle context reading frame times from `clock`.
    #[must_use]
    pub fn new(clock: Arc<FrameClock>) -> Self {
        Self {
            clock,
            frame_time: FrameTime::ZERO,
            frame_index: 0,
            current_frame: Vec::new(),
            next_frame: Vec::new(),
            scheduled: HashSet::new(),
        }
    }

    /// Returns the clock this context reads.
    #[must_use]
    pub fn clock(&self) -> &Arc<FrameClock> {
        &self.clock
    }

    /// Nodes that run this frame and have not run yet.
    #[must_use]
    pub fn current_frame_nodes(&self) -> &[Arc<RenderNode>] {
        &self.current_frame
    }

    /// Nodes scheduled for the next frame, in scheduling order.
    #[must_use]
    pub fn next_frame_nodes(&self) -> &[Arc<RenderNode>] {
        &self.next_frame
    }

    fn schedule_next(&mut self, node: Arc<RenderNode>) {
        if self.scheduled.insert(node.id()) {
            self.next_frame.push(node);
        }
    }

    /// Promotes next-frame nodes and reads the clock.
    pub(crate) fn begin_frame(&mut self) {
        self.current_frame.append(&mut self.next_frame);
        self.scheduled.clear();
        self.frame_time = self.clock.frame_time();
        self.frame_index += 1;
    }

    pub(crate) fn animate_node_with(
        &mut self,
        node: &Arc<RenderNode>,
        info: &mut TreeInfo<'_>,
        sink: &mut dyn FinishedAnimationSink,
    ) {
        self.current_frame.retain(|n| n.id() != node.id());
        if node.animate(self.frame_time, sink) {
            self.schedule_next(Arc::clone(node));
            info.out.has_animations = true;
        }
    }

    pub(crate) fn run_remaining_with(
        &mut self,
        info: &mut TreeInfo<'_>,
        sink: &mut dyn FinishedAnimationSink,
    ) {
        for node in mem::take(&mut self.current_frame) {
            if node.is_destroyed() {
                node.discard_animators();
                continue;
            }
            if node.animate(self.frame_time, sink) {
                self.schedule_next(node);
            }
        }
        info.out.has_animations |= !self.next_frame.is_empty();
    }

    pub(crate) fn destroy_with(&mut self, sink: &mut dyn FinishedAnimationSink) {
        let current = mem::take(&mut self.current_frame);
        let next = mem::take(&mut self.next_frame);
        self.scheduled.clear();
        for node in current.into_iter().chain(next) {
            node.end_all_animators(sink);
        }
    }

    pub(crate) fn frame_start_event(&self, attached: usize) -> FrameStartEvent {
        FrameStartEvent {
            frame_index: self.frame_index,
            frame_time: self.frame_time,
            attached: u32::try_from(attached).unwrap_or(u32::MAX),
            active: u32::try_from(self.current_frame.len()).unwrap_or(u32::MAX),
        }
    }
}

impl AnimationDriver for AnimationContext {
    fn frame_time(&self) -> FrameTime {
        self.frame_time
    }

    fn frame_index(&self) -> u64 {
        self.frame_index
    }

    fn add_animating_node(&mut self, node: Arc<RenderNode>) {
        self.schedule_next(node);
    }

    fn start_frame(&mut self, tracer: &mut Tracer<'_>) {
        self.begin_frame();
        tracer.frame_start(&self.frame_start_event(0));
    }

    fn animate_node(&mut self, node: &Arc<RenderNode>, info: &mut TreeInfo<'_>) {
        self.animate_node_with(node, info, &mut InlineDelivery);
    }

    fn run_remaining_animations(&mut self, info: &mut TreeInfo<'_>, _tracer: &mut Tracer<'_>) {
        self.run_remaining_with(info, &mut InlineDelivery);
    }

    fn call_on_finished(&mut self, animator: Arc<Animator>, listener: Arc<dyn AnimationListener>) {
        InlineDelivery.call_on_finished(animator, listener);
    }

    fn has_animations(&self) -> bool {
        !self.current_frame.is_empty() || !self.next_frame.is_empty()
    }

    fn destroy(&mut self) {
        self.destroy_with(&mut InlineDelivery);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AnimatedProperty;
    use crate::time::Duration;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Log(Mutex<Vec<u32>>);
    impl AnimationListener for Log {
        fn on_animation_finished(&self, animator: &Arc<Animator>) {
            self.0.lock().push(animator.id().0);
        }
    }

    fn clock_at(ms: u64) -> Arc<FrameClock> {
        let clock = Arc::new(FrameClock::new(Duration::from_millis(16)));
        clock.vsync_received(FrameTime::from_millis(ms));
        clock
    }

    fn animating_node(name: &str, ms: u64, log: &Arc<Log>) -> (Arc<RenderNode>, Arc<Animator>) {
        let node = RenderNode::new(name);
        let animator = Arc::new(
            Animator::new(AnimatedProperty::Alpha, 0.0, Duration::from_millis(ms))
                .with_listener(Arc::clone(log) as Arc<dyn AnimationListener>),
        );
        node.add_animator(Arc::clone(&animator));
        (node, animator)
    }

    #[test]
    fn added_nodes_join_at_frame_start() {
        let mut ctx = AnimationContext::new(clock_at(100));
        let log = Arc::new(Log::default());
        let (a, _) = animating_node("a", 50, &log);
        let (b, _) = animating_node("b", 50, &log);
        ctx.add_animating_node(Arc::clone(&a));
        ctx.add_animating_node(Arc::clone(&b));
        ctx.add_animating_node(Arc::clone(&a));
        assert!(ctx.current_frame_nodes().is_empty());
        assert_eq!(ctx.next_frame_nodes().len(), 2, "duplicates collapse");

        ctx.start_frame(&mut Tracer::none());
        assert_eq!(ctx.frame_index(), 1);
        assert_eq!(ctx.frame_time(), FrameTime::from_millis(100));
        let ids: Vec<_> = ctx.current_frame_nodes().iter().map(|n| n.id()).collect();
        assert_eq!(ids, [a.id(), b.id()]);
    }

    #[test]
    fn unfinished_nodes_are_rescheduled() {
        let clock = clock_at(0);
        let mut ctx = AnimationContext::new(Arc::clone(&clock));
        let log = Arc::new(Log::default());
        let (node, animator) = animating_node("n", 32, &log);
        ctx.add_animating_node(Arc::clone(&node));

        ctx.start_frame(&mut Tracer::none());
        let mut info = TreeInfo::new(ctx.frame_time());
        ctx.run_remaining_animations(&mut info, &mut Tracer::none());
        assert!(info.out.has_animations);
        assert_eq!(ctx.next_frame_nodes().len(), 1);

        clock.vsync_received(FrameTime::from_millis(32));
        ctx.start_frame(&mut Tracer::none());
        let mut info = TreeInfo::new(ctx.frame_time());
        ctx.run_remaining_animations(&mut info, &mut Tracer::none());
        assert!(!info.out.has_animations);
        assert!(!ctx.has_animations());
        assert_eq!(*log.0.lock(), [animator.id().0], "notified inline");
    }

    #[test]
    fn animate_node_removes_from_current_frame() {
        let mut ctx = AnimationContext::new(clock_at(10));
        let log = Arc::new(Log::default());
        let (node, _) = animating_node("n", 0, &log);
        ctx.add_animating_node(Arc::clone(&node));
        ctx.start_frame(&mut Tracer::none());

        let mut info = TreeInfo::new(ctx.frame_time());
        ctx.animate_node(&node, &mut info);
        assert!(ctx.current_frame_nodes().is_empty());
        ctx.run_remaining_animations(&mut info, &mut Tracer::none());
        assert_eq!(log.0.lock().len(), 1, "ran exactly once this frame");
    }

    #[test]
    fn destroyed_nodes_are_dropped_silently() {
        let mut ctx = AnimationContext::new(clock_at(10));
        let log = Arc::new(Log::default());
        let (node, _) = animating_node("n", 0, &log);
        ctx.add_animating_node(Arc::clone(&node));
        node.destroy();
        ctx.start_frame(&mut Tracer::none());
        ctx.run_remaining_animations(&mut TreeInfo::new(ctx.frame_time()), &mut Tracer::none());
        assert!(log.0.lock().is_empty());
        assert!(!node.has_animators());
    }

    #[test]
    fn destroy_ends_everything() {
        let mut ctx = AnimationContext::new(clock_at(10));
        let log = Arc::new(Log::default());
        let (a, _) = animating_node("a", 1000, &log);
        let (b, _) = animating_node("b", 1000, &log);
        ctx.add_animating_node(Arc::clone(&a));
        ctx.start_frame(&mut Tracer::none());
        ctx.add_animating_node(Arc::clone(&b));

        ctx.destroy();
        assert_eq!(log.0.lock().len(), 2);
        assert_eq!(a.properties().alpha, 0.0);
        assert!(!ctx.has_animations());
    }
}
