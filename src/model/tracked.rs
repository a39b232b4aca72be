use tokio_util::time::delay_queue;

use crate::sys::compositor::{ActorId, BindingId};

/// Decorator state for one decorated window.
///
/// Everything in here is released together when the window closes.
#[derive(Debug)]
pub struct TrackedWindow {
    /// The compositor's actor for the window. Not owned.
    pub window_actor: ActorId,
    /// Node the rounded-corners effect is attached to. `None` when the window
    /// had no node to attach it to.
    pub rounded_actor: Option<ActorId>,
    /// Owned; destroyed on close.
    pub shadow: ActorId,
    /// Transform bindings from the window actor to the shadow.
    pub transform_bindings: Vec<BindingId>,
    /// `None` while the window is minimized.
    pub visible_binding: Option<BindingId>,
    pub pending_relayout: Option<delay_queue::Key>,
}

impl TrackedWindow {
    pub fn new(window_actor: ActorId, rounded_actor: Option<ActorId>, shadow: ActorId) -> Self {
        TrackedWindow {
            window_actor,
            rounded_actor,
            shadow,
            transform_bindings: Vec::new(),
            visible_binding: None,
            pending_relayout: None,
        }
    }
}
