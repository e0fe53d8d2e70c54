// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The root of the scene graph and its cross-thread queues.
//!
//! [`SyncRoot`] is created once per rendering session, on the owning thread,
//! and shared with the render thread as `Arc<SyncRoot>`. It carries:
//!
//! - the pending-registration queue: nodes that started animating on the
//!   owning thread, appended without blocking and drained by the render
//!   thread at each frame start;
//! - the owning thread's [`LooperHandle`], through which finished-animation
//!   batches and error reports travel back;
//! - the tree's [`ErrorHandler`] for the duration of a preparation pass.
//!
//! The queue mutex is held only for a push or a `mem::take`, never while
//! calling into a driver.

use core::fmt;
use core::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::animation::AnimationDriver;
use crate::callback::{ErrorReport, ScheduledCallback};
use crate::error::BridgeError;
use crate::looper::{Looper, LooperHandle};
use crate::node::RenderNode;
use crate::tree::{ErrorHandler, TreeInfo};

/// Root synchronization object for one rendering session.
pub struct SyncRoot {
    node: Arc<RenderNode>,
    owner: LooperHandle,
    pending: Mutex<Vec<Arc<RenderNode>>>,
    // `Some` while a preparation pass collects errors.
    pass_errors: Mutex<Option<Vec<String>>>,
}

impl fmt::Debug for SyncRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncRoot")
            .field("node", &self.node.id())
            .field("pending", &self.pending_len())
            .finish_non_exhaustive()
    }
}

impl SyncRoot {
    /// Creates the root on the calling thread, which becomes the owning
    /// thread.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NoLooper`] if the calling thread has no prepared
    /// [`Looper`].
    pub fn new() -> Result<Arc<Self>, BridgeError> {
        let owner = Looper::for_thread().ok_or(BridgeError::NoLooper)?;
        Ok(Self::with_owner(owner))
    }

    /// Creates a root that reports to `owner`.
    #[must_use]
    pub fn with_owner(owner: LooperHandle) -> Arc<Self> {
        Arc::new(Self {
            node: RenderNode::new("RootRenderNode"),
            owner,
            pending: Mutex::new(Vec::new()),
            pass_errors: Mutex::new(None),
        })
    }

    /// The root node of the scene graph.
    #[must_use]
    pub fn node(&self) -> &Arc<RenderNode> {
        &self.node
    }

    /// Queues `node` to join the active animation set at the next frame
    /// start. Never blocks on the render thread.
    pub fn register_animating_node(&self, node: Arc<RenderNode>) {
        self.pending.lock().push(node);
    }

    /// Number of nodes waiting for the next frame start.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Moves every pending node into `driver`, in registration order.
    ///
    /// Returns the number of nodes moved; an empty queue is a no-op.
    pub fn drain_pending_into(&self, driver: &mut dyn AnimationDriver) -> usize {
        let pending = mem::take(&mut *self.pending.lock());
        let count = pending.len();
        for node in pending {
            driver.add_animating_node(node);
        }
        count
    }

    /// Posts `callback` to the owning thread's looper.
    ///
    /// Returns `false` if the owning thread's looper is gone.
    pub fn schedule_on_owner(&self, callback: ScheduledCallback) -> bool {
        self.owner.send(callback)
    }

    /// Prepares the whole tree with this root as the error handler.
    ///
    /// Errors reported during the walk are delivered to the owning thread as
    /// one ordered [`ErrorReport`] once the walk ends.
    pub fn prepare_tree<'a>(&'a self, info: &mut TreeInfo<'a>, driver: &mut dyn AnimationDriver) {
        let previous = info.error_handler.replace(self);
        *self.pass_errors.lock() = Some(Vec::new());

        self.node.prepare_tree(info, driver);

        info.error_handler = previous;
        let errors = self.pass_errors.lock().take().unwrap_or_default();
        if let Some(report) = ErrorReport::from_messages(errors) {
            self.schedule_on_owner(ScheduledCallback::RaiseReportedError(report));
        }
    }
}

impl ErrorHandler for SyncRoot {
    fn on_error(&self, message: String) {
        {
            let mut pass = self.pass_errors.lock();
            if let Some(errors) = pass.as_mut() {
                errors.push(message);
                return;
            }
        }
        self.schedule_on_owner(ScheduledCallback::RaiseReportedError(ErrorReport::new(message)));
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use hashbrown::HashSet;

    use super::*;
    use crate::animation::AnimationContext;
    use crate::clock::FrameClock;
    use crate::node::AnimatedProperty;
    use crate::time::{Duration, FrameTime};
    use crate::trace::Tracer;

    fn context() -> AnimationContext {
        AnimationContext::new(Arc::new(FrameClock::new(Duration::from_millis(16))))
    }

    #[test]
    fn requires_a_looper() {
        assert!(matches!(SyncRoot::new(), Err(BridgeError::NoLooper)));
        let _looper = Looper::prepare().unwrap();
        assert!(SyncRoot::new().is_ok());
    }

    #[test]
    fn drain_moves_everything_once() {
        let looper = Looper::prepare().unwrap();
        let root = SyncRoot::with_owner(looper.handle());
        let nodes: Vec<_> = (0..5).map(|i| RenderNode::new(format!("n{i}"))).collect();
        for node in &nodes {
            root.register_animating_node(Arc::clone(node));
        }
        assert_eq!(root.pending_len(), 5);

        let mut ctx = context();
        assert_eq!(root.drain_pending_into(&mut ctx), 5);
        ctx.start_frame(&mut Tracer::none());
        let active: Vec<_> = ctx.current_frame_nodes().iter().map(|n| n.id()).collect();
        let expected: Vec<_> = nodes.iter().map(|n| n.id()).collect();
        assert_eq!(active, expected);

        assert_eq!(root.pending_len(), 0);
        assert_eq!(root.drain_pending_into(&mut ctx), 0, "second drain is a no-op");
    }

    #[test]
    fn registrations_from_other_threads_are_not_lost() {
        let looper = Looper::prepare().unwrap();
        let root = SyncRoot::with_owner(looper.handle());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let root = Arc::clone(&root);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        root.register_animating_node(RenderNode::new("w"));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(root.drain_pending_into(&mut context()), 100);
    }

    #[test]
    fn registrations_racing_frame_starts_attach_exactly_once() {
        const WORKERS: usize = 4;
        const PER_WORKER: usize = 5000;

        let looper = Looper::prepare().unwrap();
        let root = SyncRoot::with_owner(looper.handle());
        let done = Arc::new(AtomicUsize::new(0));
        let workers: Vec<_> = (0..WORKERS)
            .map(|_| {
                let root = Arc::clone(&root);
                let done = Arc::clone(&done);
                std::thread::spawn(move || {
                    for _ in 0..PER_WORKER {
                        root.register_animating_node(RenderNode::new("w"));
                    }
                    done.fetch_add(1, Ordering::Release);
                })
            })
            .collect();

        let mut ctx = context();
        let mut attached = HashSet::new();
        let mut drained = 0;
        loop {
            // Read before draining so the last iteration sees every push.
            let finished = done.load(Ordering::Acquire) == WORKERS;
            drained += root.drain_pending_into(&mut ctx);
            ctx.start_frame(&mut Tracer::none());
            for node in ctx.current_frame_nodes() {
                assert!(attached.insert(node.id()), "{:?} attached twice", node.id());
            }
            ctx.run_remaining_animations(&mut TreeInfo::new(FrameTime::ZERO), &mut Tracer::none());
            if finished {
                break;
            }
        }
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(drained, WORKERS * PER_WORKER);
        assert_eq!(attached.len(), drained);
        assert_eq!(root.pending_len(), 0);
    }

    #[test]
    fn pass_errors_arrive_as_one_report() {
        let looper = Looper::prepare().unwrap();
        let root = SyncRoot::with_owner(looper.handle());
        let bad_a = RenderNode::new("a");
        let bad_b = RenderNode::new("b");
        bad_a.set_property(AnimatedProperty::Rotation, f32::INFINITY);
        bad_b.destroy();
        root.node().add_child(bad_a);
        root.node().add_child(bad_b);

        let mut info = TreeInfo::new(FrameTime::ZERO);
        root.prepare_tree(&mut info, &mut context());
        assert!(info.error_handler.is_none(), "handler removed after the pass");
        assert_eq!(info.out.errors, 2);

        let err = looper.poll_once().unwrap_err();
        assert_eq!(err.report().messages().len(), 2);
        assert!(err.report().messages()[0].starts_with("a: "));
        assert_eq!(err.report().messages()[1], "b: prepared after destroy");
    }

    #[test]
    fn clean_pass_schedules_nothing() {
        let looper = Looper::prepare().unwrap();
        let root = SyncRoot::with_owner(looper.handle());
        root.node().add_child(RenderNode::new("ok"));
        root.prepare_tree(&mut TreeInfo::new(FrameTime::ZERO), &mut context());
        assert_eq!(looper.pending(), 0);
    }

    #[test]
    fn error_outside_a_pass_is_scheduled_immediately() {
        let looper = Looper::prepare().unwrap();
        let root = SyncRoot::with_owner(looper.handle());
        root.on_error("late".into());
        assert_eq!(looper.pending(), 1);
        assert_eq!(looper.poll_once().unwrap_err().report().first(), "late");
    }
}
