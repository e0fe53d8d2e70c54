// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property animators.
//!
//! An [`Animator`] drives one [`AnimatedProperty`] of a
//! [`RenderNode`](crate::node::RenderNode) toward a final value. Animators are
//! created on the owning thread, attached with
//! [`RenderNode::add_animator`](crate::node::RenderNode::add_animator), and
//! advanced on the render thread once per frame.
//!
//! The first frame an animator runs on fixes its start time and captures the
//! property's current value as the start value. The frame on which the
//! interpolation fraction reaches 1 writes the final value and reports
//! completion, exactly once, to the active
//! [`FinishedAnimationSink`](crate::animation::FinishedAnimationSink).

use core::f32::consts::PI;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::node::{AnimatedProperty, NodeProperties};
use crate::time::{Duration, FrameTime};

/// Receives completion notifications for an [`Animator`].
///
/// With an [`AnimationBridge`](crate::bridge::AnimationBridge) driving the
/// frame, notifications run on the owning thread's looper.
pub trait AnimationListener: Send + Sync {
    /// Called once when `animator` has finished.
    fn on_animation_finished(&self, animator: &Arc<Animator>);
}

/// Unique animator identity, for diagnostics and assertions.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimatorId(pub u32);

impl fmt::Debug for AnimatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnimatorId({})", self.0)
    }
}

impl AnimatorId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Maps linear time progress to animation progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interpolator {
    /// Constant rate.
    #[default]
    Linear,
    /// Starts and ends slowly, fastest in the middle (cosine curve).
    AccelerateDecelerate,
}

impl Interpolator {
    /// Maps `t` in `0.0..=1.0` to a progress value in `0.0..=1.0`.
    #[must_use]
    pub fn interpolate(self, t: f32) -> f32 {
        match self {
            Self::Linear => t,
            Self::AccelerateDecelerate => ((t + 1.0) * PI).cos() / 2.0 + 0.5,
        }
    }
}

/// Lifecycle of an [`Animator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayState {
    /// Attached but not yet advanced by any frame.
    NotStarted,
    /// Start time fixed; advancing every frame.
    Running,
    /// Final value written and completion reported.
    Finished,
}

#[derive(Debug)]
struct Progress {
    state: PlayState,
    start_time: FrameTime,
    from_value: f32,
}

/// Animates one property of a render node toward a final value.
pub struct Animator {
    id: AnimatorId,
    property: AnimatedProperty,
    final_value: f32,
    duration: Duration,
    start_delay: Duration,
    interpolator: Interpolator,
    listener: Option<Arc<dyn AnimationListener>>,
    progress: Mutex<Progress>,
}

impl fmt::Debug for Animator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animator")
            .field("id", &self.id)
            .field("property", &self.property)
            .field("final_value", &self.final_value)
            .field("duration", &self.duration)
            .field("state", &self.play_state())
            .finish_non_exhaustive()
    }
}

impl Animator {
    /// Creates a linear animator with no start delay and no listener.
    #[must_use]
    pub fn new(property: AnimatedProperty, final_value: f32, duration: Duration) -> Self {
        Self {
            id: AnimatorId::next(),
            property,
            final_value,
            duration,
            start_delay: Duration::ZERO,
            interpolator: Interpolator::Linear,
            listener: None,
            progress: Mutex::new(Progress {
                state: PlayState::NotStarted,
                start_time: FrameTime::ZERO,
                from_value: 0.0,
            }),
        }
    }

    /// Delays the start of the animation by `delay` after its first frame.
    #[must_use]
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Sets the interpolator.
    #[must_use]
    pub fn with_interpolator(mut self, interpolator: Interpolator) -> Self {
        self.interpolator = interpolator;
        self
    }

    /// Sets the completion listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn AnimationListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Returns this animator's identity.
    #[must_use]
    pub fn id(&self) -> AnimatorId {
        self.id
    }

    /// Returns the animated property.
    #[must_use]
    pub fn property(&self) -> AnimatedProperty {
        self.property
    }

    /// Returns the value written on completion.
    #[must_use]
    pub fn final_value(&self) -> f32 {
        self.final_value
    }

    /// Returns the animation duration, excluding the start delay.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns the completion listener, if any.
    #[must_use]
    pub fn listener(&self) -> Option<&Arc<dyn AnimationListener>> {
        self.listener.as_ref()
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn play_state(&self) -> PlayState {
        self.progress.lock().state
    }

    /// Advances the animation to `frame_time`, writing into `props`.
    ///
    /// Returns `true` on the one call that finishes the animation.
    pub(crate) fn animate(&self, props: &mut NodeProperties, frame_time: FrameTime) -> bool {
        let mut progress = self.progress.lock();
        match progress.state {
            PlayState::Finished => return false,
            PlayState::NotStarted => {
                progress.state = PlayState::Running;
                progress.start_time = frame_time.saturating_add(self.start_delay);
                progress.from_value = props.get(self.property);
            }
            PlayState::Running => {}
        }
        if frame_time < progress.start_time {
            return false;
        }

        let elapsed = frame_time.saturating_duration_since(progress.start_time);
        let fraction = elapsed.fraction_of(self.duration);
        let eased = self.interpolator.interpolate(fraction);
        let value = progress.from_value + (self.final_value - progress.from_value) * eased;
        props.set(self.property, value);

        if fraction >= 1.0 {
            props.set(self.property, self.final_value);
            progress.state = PlayState::Finished;
            return true;
        }
        false
    }

    /// Jumps to the final value.
    ///
    /// Returns `true` if this call finished the animation.
    pub(crate) fn end(&self, props: &mut NodeProperties) -> bool {
        let mut progress = self.progress.lock();
        if progress.state == PlayState::Finished {
            return false;
        }
        props.set(self.property, self.final_value);
        progress.state = PlayState::Finished;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fade_out(ms: u64) -> Animator {
        Animator::new(AnimatedProperty::Alpha, 0.0, Duration::from_millis(ms))
    }

    #[test]
    fn linear_progress_and_single_completion() {
        let animator = fade_out(100);
        let mut props = NodeProperties::default();

        assert!(!animator.animate(&mut props, FrameTime::from_millis(1000)));
        assert_eq!(animator.play_state(), PlayState::Running);
        assert_eq!(props.alpha, 1.0);

        assert!(!animator.animate(&mut props, FrameTime::from_millis(1050)));
        assert!((props.alpha - 0.5).abs() < 1e-6, "alpha = {}", props.alpha);

        assert!(animator.animate(&mut props, FrameTime::from_millis(1100)));
        assert_eq!(props.alpha, 0.0);
        assert_eq!(animator.play_state(), PlayState::Finished);

        assert!(
            !animator.animate(&mut props, FrameTime::from_millis(1200)),
            "completion is reported once"
        );
    }

    #[test]
    fn zero_duration_finishes_on_first_frame() {
        let animator = fade_out(0);
        let mut props = NodeProperties::default();
        assert!(animator.animate(&mut props, FrameTime::from_millis(5)));
        assert_eq!(props.alpha, 0.0);
    }

    #[test]
    fn start_delay_holds_value() {
        let animator = fade_out(10).with_start_delay(Duration::from_millis(20));
        let mut props = NodeProperties::default();
        assert!(!animator.animate(&mut props, FrameTime::from_millis(0)));
        assert!(!animator.animate(&mut props, FrameTime::from_millis(15)));
        assert_eq!(props.alpha, 1.0, "delay not yet elapsed");
        assert!(animator.animate(&mut props, FrameTime::from_millis(30)));
    }

    #[test]
    fn end_jumps_to_final_value_once() {
        let animator = Animator::new(AnimatedProperty::TranslationX, 40.0, Duration::from_millis(100));
        let mut props = NodeProperties::default();
        assert!(animator.end(&mut props));
        assert_eq!(props.translation_x, 40.0);
        assert!(!animator.end(&mut props));
    }

    #[test]
    fn accelerate_decelerate_endpoints() {
        let i = Interpolator::AccelerateDecelerate;
        assert!(i.interpolate(0.0).abs() < 1e-6);
        assert!((i.interpolate(0.5) - 0.5).abs() < 1e-6);
        assert!((i.interpolate(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn eased_animator_lags_linear_early_on() {
        let eased = fade_out(100).with_interpolator(Interpolator::AccelerateDecelerate);
        let linear = fade_out(100);
        let mut eased_props = NodeProperties::default();
        let mut linear_props = NodeProperties::default();
        for t in [1000, 1025] {
            eased.animate(&mut eased_props, FrameTime::from_millis(t));
            linear.animate(&mut linear_props, FrameTime::from_millis(t));
        }
        assert!((linear_props.alpha - 0.75).abs() < 1e-6, "alpha = {}", linear_props.alpha);
        assert!(
            (eased_props.alpha - 0.853_553).abs() < 1e-4,
            "alpha = {}",
            eased_props.alpha
        );
        assert!(eased.animate(&mut eased_props, FrameTime::from_millis(1100)));
        assert_eq!(eased_props.alpha, 0.0);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(fade_out(1).id(), fade_out(1).id());
    }
}
