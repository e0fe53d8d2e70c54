// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-graph nodes.
//!
//! A [`RenderNode`] is always shared as `Arc<RenderNode>`: the scene graph
//! holds it through its parent, and the animation hand-off holds it while the
//! node is pending registration or active on the render thread.
//!
//! Only the state the animation hand-off touches is modelled here: a name,
//! children, a handful of animatable properties, the node's animators, and a
//! destroyed flag. Locks are taken in the order animators → properties and
//! never held across calls into listeners or drivers.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use kurbo::Affine;
use parking_lot::Mutex;

use crate::animation::FinishedAnimationSink;
use crate::animator::Animator;
use crate::time::FrameTime;

/// Unique node identity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl NodeId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A node property that an [`Animator`] can drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimatedProperty {
    /// Opacity, clamped to `0.0..=1.0` on write.
    Alpha,
    /// Horizontal offset.
    TranslationX,
    /// Vertical offset.
    TranslationY,
    /// Horizontal scale factor.
    ScaleX,
    /// Vertical scale factor.
    ScaleY,
    /// Rotation in degrees.
    Rotation,
}

/// Animatable node properties.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeProperties {
    /// Opacity.
    pub alpha: f32,
    /// Horizontal offset.
    pub translation_x: f32,
    /// Vertical offset.
    pub translation_y: f32,
    /// Horizontal scale factor.
    pub scale_x: f32,
    /// Vertical scale factor.
    pub scale_y: f32,
    /// Rotation in degrees.
    pub rotation: f32,
}

impl Default for NodeProperties {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            translation_x: 0.0,
            translation_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }
}

impl NodeProperties {
    /// Reads one property.
    #[must_use]
    pub fn get(&self, property: AnimatedProperty) -> f32 {
        match property {
            AnimatedProperty::Alpha => self.alpha,
            AnimatedProperty::TranslationX => self.translation_x,
            AnimatedProperty::TranslationY => self.translation_y,
            AnimatedProperty::ScaleX => self.scale_x,
            AnimatedProperty::ScaleY => self.scale_y,
            AnimatedProperty::Rotation => self.rotation,
        }
    }

    /// Writes one property.
    pub fn set(&mut self, property: AnimatedProperty, value: f32) {
        match property {
            // `clamp` keeps NaN, so validation still sees it.
            AnimatedProperty::Alpha => self.alpha = value.clamp(0.0, 1.0),
            AnimatedProperty::TranslationX => self.translation_x = value,
            AnimatedProperty::TranslationY => self.translation_y = value,
            AnimatedProperty::ScaleX => self.scale_x = value,
            AnimatedProperty::ScaleY => self.scale_y = value,
            AnimatedProperty::Rotation => self.rotation = value,
        }
    }

    /// Composes translation, rotation (about the origin), and scale.
    #[must_use]
    pub fn transform(&self) -> Affine {
        Affine::translate((f64::from(self.translation_x), f64::from(self.translation_y)))
            * Affine::rotate(f64::from(self.rotation).to_radians())
            * Affine::scale_non_uniform(f64::from(self.scale_x), f64::from(self.scale_y))
    }

    /// Checks that every property is finite.
    pub fn validate(&self) -> Result<(), String> {
        const ALL: [AnimatedProperty; 6] = [
            AnimatedProperty::Alpha,
            AnimatedProperty::TranslationX,
            AnimatedProperty::TranslationY,
            AnimatedProperty::ScaleX,
            AnimatedProperty::ScaleY,
            AnimatedProperty::Rotation,
        ];
        for property in ALL {
            let value = self.get(property);
            if !value.is_finite() {
                return Err(format!("non-finite {property:?} value {value}"));
            }
        }
        Ok(())
    }
}

/// A node in the scene graph.
pub struct RenderNode {
    id: NodeId,
    name: String,
    properties: Mutex<NodeProperties>,
    animators: Mutex<Vec<Arc<Animator>>>,
    children: Mutex<Vec<Arc<RenderNode>>>,
    destroyed: AtomicBool,
}

impl fmt::Debug for RenderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("animators", &self.animators.lock().len())
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

impl RenderNode {
    /// Creates a detached node with default properties.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: NodeId::next(),
            name: name.into(),
            properties: Mutex::new(NodeProperties::default()),
            animators: Mutex::new(Vec::new()),
            children: Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
        })
    }

    /// Returns the node's identity.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a snapshot of the node's properties.
    #[must_use]
    pub fn properties(&self) -> NodeProperties {
        *self.properties.lock()
    }

    /// Writes one property.
    pub fn set_property(&self, property: AnimatedProperty, value: f32) {
        self.properties.lock().set(property, value);
    }

    /// Appends `child` to this node's children.
    pub fn add_child(&self, child: Arc<Self>) {
        self.children.lock().push(child);
    }

    /// Removes `child`; returns `false` if it was not a child of this node.
    pub fn remove_child(&self, child: &Self) -> bool {
        let mut children = self.children.lock();
        let before = children.len();
        children.retain(|c| c.id != child.id);
        children.len() != before
    }

    /// Returns a snapshot of the children, in order.
    #[must_use]
    pub fn children(&self) -> Vec<Arc<Self>> {
        self.children.lock().clone()
    }

    /// Attaches an animator.
    ///
    /// Returns `true` when this is the node's first active animator; the
    /// caller then registers the node with
    /// [`SyncRoot::register_animating_node`](crate::root::SyncRoot::register_animating_node).
    pub fn add_animator(&self, animator: Arc<Animator>) -> bool {
        let mut animators = self.animators.lock();
        animators.push(animator);
        animators.len() == 1
    }

    /// Returns `true` while the node has unfinished animators.
    #[must_use]
    pub fn has_animators(&self) -> bool {
        !self.animators.lock().is_empty()
    }

    /// Number of unfinished animators.
    #[must_use]
    pub fn animator_count(&self) -> usize {
        self.animators.lock().len()
    }

    /// Marks the node destroyed.
    ///
    /// A destroyed node still attached to the tree is reported as an error
    /// during tree preparation. Its unfinished animators are dropped from the
    /// active set without notifying their listeners.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::Release);
    }

    /// Returns `true` once [`destroy`](Self::destroy) has been called.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Advances every animator to `frame_time`.
    ///
    /// Finished animators are detached; those with listeners are reported to
    /// `sink` in attachment order, after all node locks are released. Returns
    /// `true` while animators remain.
    pub(crate) fn animate(&self, frame_time: FrameTime, sink: &mut dyn FinishedAnimationSink) -> bool {
        let (finished, remaining) = {
            let mut animators = self.animators.lock();
            let mut props = self.properties.lock();
            let mut finished = Vec::new();
            animators.retain(|animator| {
                if animator.animate(&mut props, frame_time) {
                    finished.push(Arc::clone(animator));
                    false
                } else {
                    true
                }
            });
            (finished, !animators.is_empty())
        };
        report_finished(finished, sink);
        remaining
    }

    /// Ends every animator at its final value and reports completions.
    pub(crate) fn end_all_animators(&self, sink: &mut dyn FinishedAnimationSink) {
        let finished = {
            let mut animators = self.animators.lock();
            let mut props = self.properties.lock();
            animators
                .drain(..)
                .filter(|animator| animator.end(&mut props))
                .collect::<Vec<_>>()
        };
        report_finished(finished, sink);
    }

    /// Drops unfinished animators without notification.
    pub(crate) fn discard_animators(&self) {
        self.animators.lock().clear();
    }
}

fn report_finished(finished: Vec<Arc<Animator>>, sink: &mut dyn FinishedAnimationSink) {
    for animator in finished {
        if let Some(listener) = animator.listener().cloned() {
            sink.call_on_finished(animator, listener);
        }
    }
}
