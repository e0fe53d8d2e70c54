// Copyright 2026 the Handoff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Work the render thread hands to the owning thread.
//!
//! [`ScheduledCallback`] is a closed set of deferred work items. Each is
//! created on the render thread, moved onto the owning thread's
//! [`Looper`](crate::looper::Looper), and consumed by a single call to
//! [`ScheduledCallback::run`].

use core::fmt;
use std::sync::Arc;

use crate::animation::FinishedAnimationSink;
use crate::animator::{AnimationListener, Animator};
use crate::error::RenderingError;

/// One animator that finished during a frame, paired with its listener.
///
/// Both sides are held strongly until the listener has been invoked.
pub struct FinishedAnimationEvent {
    /// The animator that finished.
    pub animator: Arc<Animator>,
    /// The listener to notify.
    pub listener: Arc<dyn AnimationListener>,
}

impl fmt::Debug for FinishedAnimationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinishedAnimationEvent")
            .field("animator", &self.animator.id())
            .finish_non_exhaustive()
    }
}

/// Finished-animation events collected during one frame, in detection order.
///
/// Not `Clone`: a batch is moved into a
/// [`ScheduledCallback::DeliverFinishedEvents`] and cannot be observed by the
/// render thread afterwards.
#[derive(Debug, Default)]
pub struct FinishedEventBatch {
    events: Vec<FinishedAnimationEvent>,
}

impl FinishedEventBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn push(&mut self, event: FinishedAnimationEvent) {
        self.events.push(event);
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the batch holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates the events in detection order.
    pub fn iter(&self) -> impl Iterator<Item = &FinishedAnimationEvent> {
        self.events.iter()
    }

    /// Invokes every listener in order, consuming the batch.
    pub fn deliver(self) {
        for event in self.events {
            event.listener.on_animation_finished(&event.animator);
        }
    }
}

impl FinishedAnimationSink for FinishedEventBatch {
    fn call_on_finished(&mut self, animator: Arc<Animator>, listener: Arc<dyn AnimationListener>) {
        self.push(FinishedAnimationEvent { animator, listener });
    }
}

/// Errors reported during one tree preparation pass, in report order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorReport {
    messages: Vec<String>,
}

impl ErrorReport {
    /// A report with a single message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    /// A report carrying `messages`, or `None` if there are none.
    #[must_use]
    pub fn from_messages(messages: Vec<String>) -> Option<Self> {
        if messages.is_empty() {
            None
        } else {
            Some(Self { messages })
        }
    }

    /// All messages, in report order.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// The first message reported.
    #[must_use]
    pub fn first(&self) -> &str {
        self.messages.first().map_or("", String::as_str)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.messages.as_slice() {
            [single] => f.write_str(single),
            messages => write!(f, "{} render errors: {}", messages.len(), messages.join("; ")),
        }
    }
}

/// Deferred work run once on the owning thread.
#[derive(Debug)]
pub enum ScheduledCallback {
    /// Notify every listener in the batch, in order.
    DeliverFinishedEvents(FinishedEventBatch),
    /// Surface a render-thread error to the owning thread.
    RaiseReportedError(ErrorReport),
}

impl ScheduledCallback {
    /// Runs the callback, consuming it.
    ///
    /// # Errors
    ///
    /// [`RaiseReportedError`](Self::RaiseReportedError) always returns
    /// [`RenderingError::IllegalState`].
    pub fn run(self) -> Result<(), RenderingError> {
        match self {
            Self::DeliverFinishedEvents(batch) => {
                batch.deliver();
                Ok(())
            }
            Self::RaiseReportedError(report) => Err(RenderingError::IllegalState(report)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AnimatedProperty;
    use crate::time::Duration;
    use parking_lot::Mutex;

    struct Named(&'static str, Arc<Mutex<Vec<&'static str>>>);
    impl AnimationListener for Named {
        fn on_animation_finished(&self, _: &Arc<Animator>) {
            self.1.lock().push(self.0);
        }
    }

    fn event(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> FinishedAnimationEvent {
        FinishedAnimationEvent {
            animator: Arc::new(Animator::new(AnimatedProperty::Alpha, 0.0, Duration::ZERO)),
            listener: Arc::new(Named(name, Arc::clone(log))),
        }
    }

    #[test]
    fn batch_delivers_in_append_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut batch = FinishedEventBatch::new();
        batch.push(event("A1", &log));
        batch.push(event("A2", &log));
        batch.push(event("A3", &log));
        assert_eq!(batch.len(), 3);

        ScheduledCallback::DeliverFinishedEvents(batch).run().unwrap();
        assert_eq!(*log.lock(), ["A1", "A2", "A3"]);
    }

    #[test]
    fn batch_iterates_without_delivering() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut batch = FinishedEventBatch::new();
        let first = event("A1", &log);
        let first_id = first.animator.id();
        batch.push(first);
        batch.push(event("A2", &log));

        let ids: Vec<_> = batch.iter().map(|e| e.animator.id()).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], first_id);
        assert_ne!(ids[0], ids[1]);
        assert!(log.lock().is_empty(), "iterating runs no listener");
    }

    #[test]
    fn raise_returns_the_report() {
        let err = ScheduledCallback::RaiseReportedError(ErrorReport::new("bad node"))
            .run()
            .unwrap_err();
        assert_eq!(err.report().first(), "bad node");
        assert_eq!(err.to_string(), "illegal render state: bad node");
    }

    #[test]
    fn report_display_joins_messages() {
        let report = ErrorReport::from_messages(vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(report.to_string(), "2 render errors: a; b");
        assert!(ErrorReport::from_messages(Vec::new()).is_none());
    }
}
