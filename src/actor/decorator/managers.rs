use std::time::Duration;

use tokio::runtime::Handle;
use tokio_stream::StreamExt;
use tokio_util::time::DelayQueue;
use tokio_util::time::delay_queue::{Expired, Key};
use tracing::{trace, warn};

use crate::common::collections::HashMap;
use crate::common::config::Settings;
use crate::model::TrackedWindow;
use crate::sys::compositor::WindowId;

/// Decorated windows and the state created for them.
#[derive(Default)]
pub struct WindowManager {
    pub windows: HashMap<WindowId, TrackedWindow>,
}

impl WindowManager {
    /// Tracked windows in a stable order, so fan-out over all windows does
    /// not depend on hash order.
    pub fn window_ids(&self) -> Vec<WindowId> {
        let mut ids: Vec<_> = self.windows.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// The settings snapshot every derived value is computed from.
pub struct SettingsManager {
    pub settings: Settings,
}

/// One-shot timers that requeue a window's layout after it is unminimized.
pub struct RelayoutTimers {
    queue: DelayQueue<WindowId>,
}

impl RelayoutTimers {
    pub fn new() -> Self { RelayoutTimers { queue: DelayQueue::new() } }

    /// Arms a timer for `window`, cancelling `previous` if it is still
    /// pending.
    ///
    /// Timers need a tokio runtime with the time driver enabled. Outside of
    /// one nothing is armed and `None` is returned.
    pub fn arm(
        &mut self,
        window: WindowId,
        delay: Duration,
        previous: Option<Key>,
    ) -> Option<Key> {
        if let Some(previous) = previous {
            self.cancel(&previous);
        }
        if Handle::try_current().is_err() {
            warn!(?window, "no tokio runtime, skipping relayout timer");
            return None;
        }
        let key = self.queue.insert(window, delay);
        trace!(?window, ?delay, "armed relayout timer");
        Some(key)
    }

    pub fn cancel(&mut self, key: &Key) {
        // The key is stale when its timer already fired.
        if self.queue.try_remove(key).is_some() {
            trace!("cancelled relayout timer");
        }
    }

    pub fn len(&self) -> usize { self.queue.len() }

    /// Waits for the next timer. Resolves to `None` right away when nothing
    /// is pending.
    pub async fn next_expired(&mut self) -> Option<Expired<WindowId>> { self.queue.next().await }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arming_outside_a_runtime_is_skipped() {
        let mut timers = RelayoutTimers::new();
        assert_eq!(timers.arm(WindowId::new(1), Duration::from_millis(300), None), None);
        assert_eq!(timers.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_pending_timer() {
        let mut timers = RelayoutTimers::new();
        let window = WindowId::new(1);
        let first = timers.arm(window, Duration::from_millis(300), None);
        assert!(first.is_some());
        let second = timers.arm(window, Duration::from_millis(300), first);
        assert!(second.is_some());
        assert_eq!(timers.len(), 1);

        let expired = timers.next_expired().await.expect("timer fires");
        assert_eq!(expired.into_inner(), window);
        assert_eq!(timers.len(), 0);
    }
}
