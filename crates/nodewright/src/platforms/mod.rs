//! Host-side collaborators
//!
//! The engine never reaches for a global "current service". Whoever embeds
//! it hands in a [`RootProvider`] for tree snapshots and a [`HostDispatcher`]
//! for gestures and global actions.

pub mod memory;

use crate::element::Node;
use crate::gesture::{Gesture, GestureOutcome};
use crate::types::GlobalAction;

/// Supplies the live tree root.
pub trait RootProvider: Send + Sync {
    /// Current root. With `force_refresh` the host must re-read the live UI
    /// instead of returning a cached snapshot. `None` when no window is
    /// available.
    fn current_root(&self, force_refresh: bool) -> Option<Node>;
}

/// Called by the host once a dispatched gesture completes or is cancelled.
pub type GestureCallback = Box<dyn FnOnce(GestureOutcome) + Send + 'static>;

/// Input and navigation surface of the host.
pub trait HostDispatcher: Send + Sync {
    fn perform_global_action(&self, action: GlobalAction) -> bool;

    /// Queue `gesture` for execution. The return value only says whether the
    /// host accepted the request; `on_result` fires later, possibly on
    /// another thread.
    fn dispatch_gesture(&self, gesture: Gesture, on_result: GestureCallback) -> bool;

    fn screen_width(&self) -> i32;

    fn screen_height(&self) -> i32;
}
