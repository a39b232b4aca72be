use crate::sys::compositor::{WindowInfo, WindowModel};

/// Experimental compositor feature under which fractional scaling is done by
/// the compositor and every window renders at scale 1.
pub const FRACTIONAL_SCALING_FEATURE: &str = "scale-monitor-framebuffer";

/// Scale of the monitor `window` is on, or of the current monitor when no
/// window is given.
///
/// Queried on every call: a window can move between monitors at any time.
pub fn scale_factor<M: WindowModel + ?Sized>(model: &M, window: Option<&WindowInfo>) -> f64 {
    if compositor_handles_fractional_scaling(model) {
        return 1.0;
    }
    let monitor = match window {
        Some(window) => window.monitor,
        None => model.current_monitor(),
    };
    model.monitor_scale(monitor)
}

pub fn compositor_handles_fractional_scaling<M: WindowModel + ?Sized>(model: &M) -> bool {
    model.is_wayland_compositor()
        && model.experimental_features().iter().any(|f| f == FRACTIONAL_SCALING_FEATURE)
}
