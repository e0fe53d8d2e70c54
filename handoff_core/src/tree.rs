// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree preparation.
//!
//! The render thread walks the scene graph once per frame, depth-first in
//! child order. Each visited node runs its animators through the active
//! [`AnimationDriver`] and validates its properties. Problems are reported to
//! the pass's [`ErrorHandler`] and never abort the walk: the failing node's
//! subtree is skipped and its siblings are still prepared.

use std::sync::Arc;

use crate::animation::AnimationDriver;
use crate::node::RenderNode;
use crate::time::FrameTime;

/// Receives errors detected while preparing the tree.
pub trait ErrorHandler {
    /// Reports one error. Must not block.
    fn on_error(&self, message: String);
}

/// Counters collected by one preparation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeInfoOut {
    /// Nodes whose preparation ran.
    pub prepared_nodes: u32,
    /// Errors reported.
    pub errors: u32,
    /// Subtrees skipped because their root was in error.
    pub skipped_subtrees: u32,
    /// Whether any node is still animating after this pass.
    pub has_animations: bool,
}

/// Input and output of one preparation pass.
pub struct TreeInfo<'a> {
    /// Frame time animators run at.
    pub frame_time: FrameTime,
    /// Where errors go. Without a handler they are only logged.
    pub error_handler: Option<&'a dyn ErrorHandler>,
    /// Pass results.
    pub out: TreeInfoOut,
}

impl core::fmt::Debug for TreeInfo<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TreeInfo")
            .field("frame_time", &self.frame_time)
            .field("has_error_handler", &self.error_handler.is_some())
            .field("out", &self.out)
            .finish()
    }
}

impl TreeInfo<'_> {
    /// Creates a pass with no error handler.
    #[must_use]
    pub fn new(frame_time: FrameTime) -> Self {
        Self {
            frame_time,
            error_handler: None,
            out: TreeInfoOut::default(),
        }
    }

    /// Counts and forwards an error.
    pub fn report_error(&mut self, message: String) {
        self.out.errors += 1;
        match self.error_handler {
            Some(handler) => handler.on_error(message),
            None => tracing::warn!(%message, "render error with no handler"),
        }
    }
}

impl RenderNode {
    /// Prepares this node and its subtree for the frame.
    pub fn prepare_tree(self: &Arc<Self>, info: &mut TreeInfo<'_>, driver: &mut dyn AnimationDriver) {
        if self.is_destroyed() {
            info.report_error(format!("{}: prepared after destroy", self.name()));
            info.out.skipped_subtrees += 1;
            return;
        }
        info.out.prepared_nodes += 1;

        if self.has_animators() {
            driver.animate_node(self, info);
        }
        if let Err(message) = self.properties().validate() {
            info.report_error(format!("{}: {message}", self.name()));
            info.out.skipped_subtrees += 1;
            return;
        }

        for child in self.children() {
            child.prepare_tree(info, driver);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationContext;
    use crate::animator::Animator;
    use crate::clock::FrameClock;
    use crate::node::AnimatedProperty;
    use crate::time::Duration;
    use crate::trace::Tracer;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Errors(Mutex<Vec<String>>);
    impl ErrorHandler for Errors {
        fn on_error(&self, message: String) {
            self.0.lock().push(message);
        }
    }

    fn context() -> AnimationContext {
        AnimationContext::new(Arc::new(FrameClock::new(Duration::from_millis(16))))
    }

    #[test]
    fn errors_do_not_block_siblings() {
        let root = RenderNode::new("root");
        let x = RenderNode::new("x");
        let x_child = RenderNode::new("x-child");
        let y = RenderNode::new("y");
        let z = RenderNode::new("z");
        x.add_child(x_child);
        x.set_property(AnimatedProperty::ScaleY, f32::NAN);
        z.destroy();
        root.add_child(x);
        root.add_child(y);
        root.add_child(z);

        let errors = Errors::default();
        let mut info = TreeInfo::new(FrameTime::ZERO);
        info.error_handler = Some(&errors);
        root.prepare_tree(&mut info, &mut context());

        assert_eq!(info.out.prepared_nodes, 3, "root, x and y");
        assert_eq!(info.out.errors, 2);
        assert_eq!(info.out.skipped_subtrees, 2);
        let messages = errors.0.lock();
        assert!(messages[0].starts_with("x: non-finite ScaleY"), "{messages:?}");
        assert_eq!(messages[1], "z: prepared after destroy");
    }

    #[test]
    fn visited_nodes_animate_through_the_driver() {
        let root = RenderNode::new("root");
        let child = RenderNode::new("child");
        child.add_animator(Arc::new(Animator::new(
            AnimatedProperty::TranslationX,
            12.0,
            Duration::ZERO,
        )));
        root.add_child(Arc::clone(&child));

        let mut ctx = context();
        ctx.start_frame(&mut Tracer::none());
        let mut info = TreeInfo::new(FrameTime::ZERO);
        root.prepare_tree(&mut info, &mut ctx);
        assert_eq!(child.properties().translation_x, 12.0);
        assert!(!info.out.has_animations);
    }

    #[test]
    fn report_without_handler_is_counted() {
        let mut info = TreeInfo::new(FrameTime::ZERO);
        info.report_error("lost".into());
        assert_eq!(info.out.errors, 1);
    }
}
