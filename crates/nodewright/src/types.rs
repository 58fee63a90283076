//! Geometry and action types shared by nodes, hosts and gestures

use serde::{Deserialize, Serialize};

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Offset this point by `(dx, dy)`.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Screen-space rectangle as reported by the host (edges, not size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Center of the rectangle, truncated to whole pixels.
    pub fn center(&self) -> Point {
        Point::new(
            ((self.left + self.right) / 2) as f32,
            ((self.top + self.bottom) / 2) as f32,
        )
    }
}

/// Semantic actions a node can be asked to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeAction {
    Click,
    LongClick,
    ScrollForward,
    ScrollBackward,
    SetText(String),
}

impl NodeAction {
    pub fn name(&self) -> &'static str {
        match self {
            NodeAction::Click => "click",
            NodeAction::LongClick => "long_click",
            NodeAction::ScrollForward => "scroll_forward",
            NodeAction::ScrollBackward => "scroll_backward",
            NodeAction::SetText(_) => "set_text",
        }
    }
}

/// System-wide navigation actions forwarded to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalAction {
    Back,
    Home,
}
