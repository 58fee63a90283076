//! Synthetic input for when semantic node actions are unavailable
//!
//! A [`Gesture`] is one or more timed [`Stroke`]s handed to the host in a
//! single dispatch. Dispatch is fire-and-forget: the boolean returned by the
//! host only means the request was accepted. Completion or cancellation is
//! reported later through a callback that is logged and goes nowhere else, so
//! an accepted gesture has not necessarily happened when the call returns.

use crate::element::Node;
use crate::errors::AutomationError;
use crate::platforms::HostDispatcher;
use crate::types::Point;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// A timed path. One point means a press in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub path: Vec<Point>,
    pub start_delay: Duration,
    pub duration: Duration,
}

impl Stroke {
    pub fn new(path: Vec<Point>, start_delay: Duration, duration: Duration) -> Self {
        Self {
            path,
            start_delay,
            duration,
        }
    }

    fn validate(&self) -> Result<(), AutomationError> {
        if self.path.is_empty() {
            return Err(AutomationError::InvalidArgument(
                "stroke path has no points".to_string(),
            ));
        }
        if self.duration.is_zero() {
            return Err(AutomationError::InvalidArgument(
                "stroke duration must be positive".to_string(),
            ));
        }
        if let Some(p) = self.path.iter().find(|p| p.x < 0.0 || p.y < 0.0) {
            return Err(AutomationError::InvalidArgument(format!(
                "stroke point ({}, {}) is off screen",
                p.x, p.y
            )));
        }
        Ok(())
    }
}

/// Strokes dispatched to the host atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    strokes: Vec<Stroke>,
}

impl Gesture {
    pub fn builder() -> GestureBuilder {
        GestureBuilder::default()
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Time from dispatch until the last stroke ends.
    pub fn total_duration(&self) -> Duration {
        self.strokes
            .iter()
            .map(|s| s.start_delay + s.duration)
            .max()
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct GestureBuilder {
    strokes: Vec<Stroke>,
}

impl GestureBuilder {
    pub fn stroke(mut self, stroke: Stroke) -> Self {
        self.strokes.push(stroke);
        self
    }

    pub fn build(self) -> Result<Gesture, AutomationError> {
        if self.strokes.is_empty() {
            return Err(AutomationError::InvalidArgument(
                "gesture has no strokes".to_string(),
            ));
        }
        for stroke in &self.strokes {
            stroke.validate()?;
        }
        Ok(Gesture {
            strokes: self.strokes,
        })
    }
}

/// Asynchronous fate of an accepted gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Completed,
    Cancelled,
}

/// Builds taps and drags and hands them to the host.
#[derive(Clone)]
pub struct GestureSynthesizer {
    host: Arc<dyn HostDispatcher>,
    tap_duration: Duration,
    node_tap_duration: Duration,
    drag_duration: Duration,
}

impl GestureSynthesizer {
    pub fn new(
        host: Arc<dyn HostDispatcher>,
        tap_duration: Duration,
        node_tap_duration: Duration,
        drag_duration: Duration,
    ) -> Self {
        Self {
            host,
            tap_duration,
            node_tap_duration,
            drag_duration,
        }
    }

    pub fn host(&self) -> &Arc<dyn HostDispatcher> {
        &self.host
    }

    pub fn drag_duration(&self) -> Duration {
        self.drag_duration
    }

    /// Center of the screen as reported by the host.
    pub fn screen_center(&self) -> Point {
        Point::new(
            (self.host.screen_width() / 2) as f32,
            (self.host.screen_height() / 2) as f32,
        )
    }

    /// Press once at `point`. `true` means the host accepted the gesture.
    pub fn tap(&self, point: Point) -> bool {
        self.press(point, self.tap_duration, "tap")
    }

    /// Drag from `origin` by `(dx, dy)` over `duration`.
    pub fn drag_by(&self, origin: Point, dx: f32, dy: f32, duration: Duration) -> bool {
        let stroke = Stroke::new(
            vec![origin, origin.offset(dx, dy)],
            Duration::ZERO,
            duration,
        );
        self.dispatch_stroke(stroke, "drag")
    }

    /// Tap the center of `node`'s on-screen bounds after refreshing it.
    /// Works on nodes that do not report themselves clickable.
    pub fn tap_node(&self, node: &Node) -> bool {
        node.refresh();
        let bounds = node.bounds();
        if bounds.is_empty() {
            warn!(
                "tap_node: {} has empty bounds {:?}, tapping anyway",
                node.class_name(),
                bounds
            );
        }
        self.press(bounds.center(), self.node_tap_duration, "node tap")
    }

    /// Drag from the center of `node` by `(dx, dy)` with the scroll duration.
    /// Negative `dy` scrolls content up, positive down.
    pub fn drag_node(&self, node: &Node, dx: f32, dy: f32) -> bool {
        let origin = node.bounds().center();
        self.drag_by(origin, dx, dy, self.drag_duration)
    }

    fn press(&self, point: Point, duration: Duration, label: &'static str) -> bool {
        let stroke = Stroke::new(vec![point], Duration::ZERO, duration);
        self.dispatch_stroke(stroke, label)
    }

    fn dispatch_stroke(&self, stroke: Stroke, label: &'static str) -> bool {
        match Gesture::builder().stroke(stroke).build() {
            Ok(gesture) => self.dispatch(gesture, label),
            Err(e) => {
                error!("{} not dispatched: {}", label, e);
                false
            }
        }
    }

    /// Hand `gesture` to the host. Acceptance only, completion unknown.
    pub fn dispatch(&self, gesture: Gesture, label: &'static str) -> bool {
        let accepted = self.host.dispatch_gesture(
            gesture,
            Box::new(move |outcome| match outcome {
                GestureOutcome::Completed => debug!("{} onCompleted", label),
                GestureOutcome::Cancelled => debug!("{} onCancelled", label),
            }),
        );
        if accepted {
            debug!("{} accepted by host, completion unknown", label);
        } else {
            warn!("{} rejected by host", label);
        }
        accepted
    }
}
