// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owning-thread front end for the render thread.
//!
//! [`RenderProxy`] spawns the render thread, moves a [`RenderPipeline`] onto
//! it, and forwards calls over a channel. A call either waits for the render
//! thread to execute it ([`sync_and_draw_frame`](RenderProxy::sync_and_draw_frame),
//! [`fence`](RenderProxy::fence)) or is queued and returns immediately.
//! Node registration does not hop threads at all: it goes straight to the
//! [`SyncRoot`] queue.

use core::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::animation::ContextFactory;
use crate::bridge::BridgeFactory;
use crate::clock::FrameClock;
use crate::config::RenderConfig;
use crate::error::BridgeError;
use crate::node::RenderNode;
use crate::pipeline::{FrameOutcome, RenderPipeline};
use crate::root::SyncRoot;
use crate::time::{Duration, FrameTime};
use crate::trace::TraceSink;

enum RenderTask {
    SyncAndDraw {
        frame_time: FrameTime,
        reply: Sender<FrameOutcome>,
    },
    TickAnimations {
        now: FrameTime,
    },
    SetFrameInterval(Duration),
    ResetAnimationContext,
    SetTraceSink(Option<Box<dyn TraceSink + Send>>),
    Fence(Sender<()>),
    Shutdown,
}

/// Handle to a running render thread.
pub struct RenderProxy {
    root: Arc<SyncRoot>,
    clock: Arc<FrameClock>,
    tasks: Sender<RenderTask>,
    thread: Option<JoinHandle<()>>,
}

impl fmt::Debug for RenderProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderProxy")
            .field("root", &self.root)
            .field("running", &self.thread.is_some())
            .finish_non_exhaustive()
    }
}

impl RenderProxy {
    /// Starts a 60 Hz render thread driven by [`AnimationBridge`]s bound to
    /// `root`.
    ///
    /// [`AnimationBridge`]: crate::bridge::AnimationBridge
    ///
    /// # Errors
    ///
    /// [`BridgeError::Spawn`] if the thread cannot be started.
    pub fn new(root: Arc<SyncRoot>) -> Result<Self, BridgeError> {
        let factory = Arc::new(BridgeFactory::new(Arc::clone(&root)));
        Self::with_factory(root, factory, RenderConfig::default())
    }

    /// Starts a render thread with an explicit driver factory and config.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Spawn`] if the thread cannot be started.
    pub fn with_factory(
        root: Arc<SyncRoot>,
        factory: Arc<dyn ContextFactory>,
        config: RenderConfig,
    ) -> Result<Self, BridgeError> {
        let clock = Arc::new(FrameClock::new(config.frame_interval));
        let pipeline = RenderPipeline::new(Arc::clone(&root), factory, Arc::clone(&clock));
        let (tasks, receiver) = crossbeam_channel::unbounded();
        let thread = thread::Builder::new()
            .name(config.thread_name.to_owned())
            .spawn(move || render_loop(pipeline, &receiver))
            .map_err(BridgeError::Spawn)?;
        Ok(Self {
            root,
            clock,
            tasks,
            thread: Some(thread),
        })
    }

    /// The session's root.
    #[must_use]
    pub fn root(&self) -> &Arc<SyncRoot> {
        &self.root
    }

    /// The session's frame clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<FrameClock> {
        &self.clock
    }

    /// Queues `node` to start animating at the next frame.
    pub fn register_animating_node(&self, node: Arc<RenderNode>) {
        self.root.register_animating_node(node);
    }

    /// Draws a frame for `frame_time` and waits for it to finish.
    ///
    /// # Errors
    ///
    /// [`BridgeError::RenderThreadGone`] if the render thread has exited.
    pub fn sync_and_draw_frame(&self, frame_time: FrameTime) -> Result<FrameOutcome, BridgeError> {
        let (reply, outcome) = crossbeam_channel::bounded(1);
        self.post(RenderTask::SyncAndDraw { frame_time, reply })?;
        outcome.recv().map_err(|_| BridgeError::RenderThreadGone)
    }

    /// Waits until every previously queued call has run.
    ///
    /// # Errors
    ///
    /// [`BridgeError::RenderThreadGone`] if the render thread has exited.
    pub fn fence(&self) -> Result<(), BridgeError> {
        let (reply, done) = crossbeam_channel::bounded(1);
        self.post(RenderTask::Fence(reply))?;
        done.recv().map_err(|_| BridgeError::RenderThreadGone)
    }

    /// Queues an animation-only frame for `now`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::RenderThreadGone`] if the render thread has exited.
    pub fn tick_animations(&self, now: FrameTime) -> Result<(), BridgeError> {
        self.post(RenderTask::TickAnimations { now })
    }

    /// Queues a change of the display refresh interval.
    ///
    /// # Errors
    ///
    /// [`BridgeError::RenderThreadGone`] if the render thread has exited.
    pub fn set_frame_interval(&self, interval: Duration) -> Result<(), BridgeError> {
        self.post(RenderTask::SetFrameInterval(interval))
    }

    /// Queues a reset of the animation context.
    ///
    /// The current driver is destroyed, which ends its animations and posts
    /// their completions, and a new one is created from the factory.
    ///
    /// # Errors
    ///
    /// [`BridgeError::RenderThreadGone`] if the render thread has exited.
    pub fn reset_animation_context(&self) -> Result<(), BridgeError> {
        self.post(RenderTask::ResetAnimationContext)
    }

    /// Queues installation of a frame-loop trace sink.
    ///
    /// # Errors
    ///
    /// [`BridgeError::RenderThreadGone`] if the render thread has exited.
    pub fn set_trace_sink(&self, sink: Option<Box<dyn TraceSink + Send>>) -> Result<(), BridgeError> {
        self.post(RenderTask::SetTraceSink(sink))
    }

    /// Stops the render thread and waits for it to exit.
    ///
    /// Active animations are ended and their completions posted before the
    /// thread exits. Later calls return [`BridgeError::RenderThreadGone`].
    pub fn destroy(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        _ = self.tasks.send(RenderTask::Shutdown);
        if thread.join().is_err() {
            tracing::error!("render thread panicked");
        }
    }

    fn post(&self, task: RenderTask) -> Result<(), BridgeError> {
        if self.thread.is_none() {
            return Err(BridgeError::RenderThreadGone);
        }
        self.tasks.send(task).map_err(|_| BridgeError::RenderThreadGone)
    }
}

impl Drop for RenderProxy {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn render_loop(mut pipeline: RenderPipeline, tasks: &Receiver<RenderTask>) {
    tracing::debug!("render thread started");
    for task in tasks {
        match task {
            RenderTask::SyncAndDraw { frame_time, reply } => {
                let outcome = pipeline.draw_frame(frame_time);
                _ = reply.send(outcome);
            }
            RenderTask::TickAnimations { now } => {
                pipeline.tick_animations(now);
            }
            RenderTask::SetFrameInterval(interval) => pipeline.clock().set_frame_interval(interval),
            RenderTask::ResetAnimationContext => pipeline.reset(),
            RenderTask::SetTraceSink(sink) => pipeline.set_trace_sink(sink),
            RenderTask::Fence(reply) => {
                _ = reply.send(());
            }
            RenderTask::Shutdown => break,
        }
    }
    pipeline.destroy();
    tracing::debug!("render thread exiting");
}
