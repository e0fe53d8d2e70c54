// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render thread's per-frame animation path.
//!
//! A [`RenderPipeline`] owns the active [`AnimationDriver`] and runs one
//! frame at a time:
//!
//! ```text
//!   vsync ──► FrameClock ──► driver.start_frame()
//!                                 │
//!                                 ▼
//!             SyncRoot::prepare_tree() ──► driver.animate_node() per node
//!                                 │
//!                                 ▼
//!             driver.run_remaining_animations() ──► batch to owning thread
//! ```
//!
//! Nothing here touches the owning thread directly; all hand-off goes through
//! the driver and the [`SyncRoot`].

use core::fmt;
use std::sync::Arc;

use crate::animation::{AnimationDriver, ContextFactory};
use crate::clock::FrameClock;
use crate::root::SyncRoot;
use crate::time::{self, FrameTime};
use crate::trace::{
    ErrorsReportedEvent, FrameSummaryBuilder, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    TraceSink, Tracer,
};
use crate::tree::TreeInfo;

/// What one frame did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Driver frame counter after this frame.
    pub frame_index: u64,
    /// Frame time the animations ran at.
    pub frame_time: FrameTime,
    /// Nodes prepared by the tree walk (0 for animation-only ticks).
    pub prepared_nodes: u32,
    /// Errors reported by the tree walk.
    pub errors: u32,
    /// Whether animations remain for a later frame.
    pub animating: bool,
}

/// Render-thread animation state for one session.
pub struct RenderPipeline {
    root: Arc<SyncRoot>,
    factory: Arc<dyn ContextFactory>,
    clock: Arc<FrameClock>,
    driver: Box<dyn AnimationDriver>,
    sink: Option<Box<dyn TraceSink + Send>>,
}

impl fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("root", &self.root)
            .field("driver", &self.driver)
            .field("tracing", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl RenderPipeline {
    /// Creates a pipeline whose driver comes from `factory`.
    #[must_use]
    pub fn new(root: Arc<SyncRoot>, factory: Arc<dyn ContextFactory>, clock: Arc<FrameClock>) -> Self {
        let driver = factory.create_animation_context(Arc::clone(&clock));
        Self {
            root,
            factory,
            clock,
            driver,
            sink: None,
        }
    }

    /// The session's frame clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<FrameClock> {
        &self.clock
    }

    /// The active driver.
    #[must_use]
    pub fn driver(&self) -> &dyn AnimationDriver {
        &*self.driver
    }

    /// Installs or removes the frame-loop trace sink.
    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink + Send>>) {
        self.sink = sink;
    }

    /// Runs a full frame for `vsync`: animations plus tree preparation.
    pub fn draw_frame(&mut self, vsync: FrameTime) -> FrameOutcome {
        self.clock.vsync_received(vsync);
        let mut tracer = tracer_for(&mut self.sink);
        run_frame(&self.root, &mut *self.driver, &mut tracer, true)
    }

    /// Runs an animation-only frame at the jitter-corrected time for `now`.
    pub fn tick_animations(&mut self, now: FrameTime) -> FrameOutcome {
        self.clock.compute_frame_time(now);
        let mut tracer = tracer_for(&mut self.sink);
        run_frame(&self.root, &mut *self.driver, &mut tracer, false)
    }

    /// Destroys the driver and replaces it with a fresh one from the factory.
    pub fn reset(&mut self) {
        self.driver.destroy();
        self.driver = self.factory.create_animation_context(Arc::clone(&self.clock));
    }

    /// Ends every active animation and posts the completions.
    pub fn destroy(&mut self) {
        self.driver.destroy();
    }
}

fn tracer_for(sink: &mut Option<Box<dyn TraceSink + Send>>) -> Tracer<'_> {
    match sink {
        Some(sink) => Tracer::new(&mut **sink),
        None => Tracer::none(),
    }
}

fn run_frame(
    root: &SyncRoot,
    driver: &mut dyn AnimationDriver,
    tracer: &mut Tracer<'_>,
    prepare: bool,
) -> FrameOutcome {
    let start_begin = time::now();
    driver.start_frame(tracer);
    let frame_index = driver.frame_index();
    let frame_time = driver.frame_time();

    let mut summary = FrameSummaryBuilder::new(frame_index, frame_time);
    let mut phase = |tracer: &mut Tracer<'_>, kind: PhaseKind, begin: FrameTime, end: FrameTime| {
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: kind,
            timestamp: begin,
        });
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: kind,
            timestamp: end,
        });
        summary.phase_begin(kind, begin);
        summary.phase_end(kind, end);
    };
    phase(tracer, PhaseKind::StartFrame, start_begin, time::now());

    let mut info = TreeInfo::new(frame_time);
    if prepare {
        let begin = time::now();
        root.prepare_tree(&mut info, driver);
        phase(tracer, PhaseKind::PrepareTree, begin, time::now());
        if info.out.errors > 0 {
            tracer.errors_reported(&ErrorsReportedEvent {
                frame_index,
                errors: info.out.errors,
                skipped_subtrees: info.out.skipped_subtrees,
            });
        }
    }

    let begin = time::now();
    driver.run_remaining_animations(&mut info, tracer);
    phase(tracer, PhaseKind::RunAnimations, begin, time::now());

    let animating = driver.has_animations();
    summary.set_outcome(info.out.prepared_nodes, info.out.errors, animating);
    tracer.frame_summary(&summary.finish());

    FrameOutcome {
        frame_index,
        frame_time,
        prepared_nodes: info.out.prepared_nodes,
        errors: info.out.errors,
        animating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::DefaultContextFactory;
    use crate::animator::{AnimationListener, Animator};
    use crate::bridge::BridgeFactory;
    use crate::looper::Looper;
    use crate::node::{AnimatedProperty, RenderNode};
    use crate::time::Duration;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Count(Mutex<u32>);
    impl AnimationListener for Count {
        fn on_animation_finished(&self, _: &Arc<Animator>) {
            *self.0.lock() += 1;
        }
    }

    fn pipeline(root: &Arc<SyncRoot>) -> RenderPipeline {
        RenderPipeline::new(
            Arc::clone(root),
            Arc::new(BridgeFactory::new(Arc::clone(root))),
            Arc::new(FrameClock::new(Duration::from_millis(16))),
        )
    }

    fn animate(node: &Arc<RenderNode>, root: &SyncRoot, ms: u64, count: &Arc<Count>) {
        let animator = Animator::new(AnimatedProperty::TranslationY, 100.0, Duration::from_millis(ms))
            .with_listener(Arc::clone(count) as Arc<dyn AnimationListener>);
        if node.add_animator(Arc::new(animator)) {
            root.register_animating_node(Arc::clone(node));
        }
    }

    #[test]
    fn draw_frame_runs_animations_across_frames() {
        let looper = Looper::prepare().unwrap();
        let root = SyncRoot::with_owner(looper.handle());
        let node = RenderNode::new("n");
        root.node().add_child(Arc::clone(&node));
        let count = Arc::new(Count::default());
        animate(&node, &root, 32, &count);

        let mut pipeline = pipeline(&root);
        let first = pipeline.draw_frame(FrameTime::from_millis(16));
        assert_eq!(first.frame_index, 1);
        assert_eq!(first.prepared_nodes, 2);
        assert!(first.animating);

        let second = pipeline.draw_frame(FrameTime::from_millis(32));
        assert!(second.animating);
        assert!((node.properties().translation_y - 50.0).abs() < 1e-4);

        let third = pipeline.draw_frame(FrameTime::from_millis(48));
        assert!(!third.animating);
        assert_eq!(node.properties().translation_y, 100.0);

        assert_eq!(looper.poll_once().unwrap(), 1);
        assert_eq!(*count.0.lock(), 1);
    }

    #[test]
    fn tick_animates_detached_nodes_without_a_walk() {
        let looper = Looper::prepare().unwrap();
        let root = SyncRoot::with_owner(looper.handle());
        let detached = RenderNode::new("detached");
        let count = Arc::new(Count::default());
        animate(&detached, &root, 0, &count);

        let mut pipeline = pipeline(&root);
        let outcome = pipeline.tick_animations(FrameTime::from_millis(5));
        assert_eq!(outcome.prepared_nodes, 0);
        assert!(!outcome.animating);
        looper.poll_once().unwrap();
        assert_eq!(*count.0.lock(), 1);
    }

    #[test]
    fn reset_ends_animations_and_starts_fresh() {
        let looper = Looper::prepare().unwrap();
        let root = SyncRoot::with_owner(looper.handle());
        let node = RenderNode::new("n");
        let count = Arc::new(Count::default());
        animate(&node, &root, 10_000, &count);

        let mut pipeline = pipeline(&root);
        pipeline.draw_frame(FrameTime::from_millis(16));
        assert!(pipeline.driver().has_animations());
        pipeline.reset();
        assert_eq!(pipeline.driver().frame_index(), 0);
        assert!(!pipeline.driver().has_animations());
        looper.poll_once().unwrap();
        assert_eq!(*count.0.lock(), 1);
        assert_eq!(node.properties().translation_y, 100.0);
    }

    #[test]
    fn default_context_notifies_inline() {
        let looper = Looper::prepare().unwrap();
        let root = SyncRoot::with_owner(looper.handle());
        let node = RenderNode::new("n");
        root.node().add_child(Arc::clone(&node));
        let count = Arc::new(Count::default());
        animate(&node, &root, 0, &count);

        let mut pipeline = RenderPipeline::new(
            Arc::clone(&root),
            Arc::new(DefaultContextFactory),
            Arc::new(FrameClock::new(Duration::from_millis(16))),
        );
        pipeline.draw_frame(FrameTime::from_millis(16));
        assert_eq!(*count.0.lock(), 1);
        assert_eq!(looper.pending(), 0);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn trace_sink_sees_every_phase() {
        use crate::trace::{FrameStartEvent, FrameSummary};

        #[derive(Default)]
        struct Phases(Arc<Mutex<Vec<PhaseKind>>>, Arc<Mutex<Vec<(u32, bool)>>>);
        impl TraceSink for Phases {
            fn on_frame_start(&mut self, e: &FrameStartEvent) {
                assert_eq!(e.frame_index, 1);
            }
            fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
                self.0.lock().push(e.phase);
            }
            fn on_frame_summary(&mut self, s: &FrameSummary) {
                self.1.lock().push((s.prepared_nodes, s.animating));
            }
        }

        let looper = Looper::prepare().unwrap();
        let root = SyncRoot::with_owner(looper.handle());
        let sink = Phases::default();
        let (phases, summaries) = (Arc::clone(&sink.0), Arc::clone(&sink.1));
        let mut pipeline = pipeline(&root);
        pipeline.set_trace_sink(Some(Box::new(sink)));
        pipeline.draw_frame(FrameTime::from_millis(16));

        assert_eq!(
            *phases.lock(),
            [PhaseKind::StartFrame, PhaseKind::PrepareTree, PhaseKind::RunAnimations]
        );
        assert_eq!(*summaries.lock(), [(1, false)]);
    }
}
