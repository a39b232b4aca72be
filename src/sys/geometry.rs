use serde::{Deserialize, Serialize};

use crate::sys::compositor::WindowInfo;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect { x, y, width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Rectangle the rounded-corner mask is drawn into, in actor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Per-axis delta between the visible frame and the backing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentOffset {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub fn content_offset(window: &WindowInfo) -> ContentOffset {
    let frame = window.frame_rect;
    let buffer = window.buffer_rect;
    ContentOffset {
        x: frame.x - buffer.x,
        y: frame.y - buffer.y,
        width: frame.width - buffer.width,
        height: frame.height - buffer.height,
    }
}

/// Outer bounds of the mask: one pixel in from the content's top-left corner,
/// extended by the content inset.
pub fn mask_bounds(actor_size: Size, offset: ContentOffset) -> Bounds {
    Bounds {
        x1: offset.x + 1.0,
        y1: offset.y + 1.0,
        x2: offset.x + actor_size.width + offset.width,
        y2: offset.y + actor_size.height + offset.height,
    }
}

/// Offsets for the shadow's X, Y, Width and Height bind constraints, in that
/// order.
pub fn shadow_constraint_offsets(offset: ContentOffset, shadow_padding: f64) -> [f64; 4] {
    [
        offset.x - shadow_padding,
        offset.y - shadow_padding,
        offset.width + 2.0 * shadow_padding,
        offset.height + 2.0 * shadow_padding,
    ]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::compositor::WindowInfo;

    fn window(frame: Rect, buffer: Rect) -> WindowInfo {
        WindowInfo {
            frame_rect: frame,
            buffer_rect: buffer,
            ..WindowInfo::default()
        }
    }

    #[test]
    fn content_offset_is_frame_minus_buffer() {
        let win = window(
            Rect::new(110.0, 220.0, 800.0, 600.0),
            Rect::new(80.0, 190.0, 860.0, 660.0),
        );
        assert_eq!(
            content_offset(&win),
            ContentOffset { x: 30.0, y: 30.0, width: -60.0, height: -60.0 }
        );
    }

    #[test]
    fn server_side_decorated_windows_have_no_inset() {
        let rect = Rect::new(0.0, 0.0, 640.0, 480.0);
        assert_eq!(content_offset(&window(rect, rect)), ContentOffset::default());
    }

    #[test]
    fn mask_bounds_shrinks_by_inset() {
        let offset = ContentOffset { x: 30.0, y: 30.0, width: -60.0, height: -60.0 };
        let bounds = mask_bounds(Size { width: 860.0, height: 660.0 }, offset);
        assert_eq!(bounds, Bounds { x1: 31.0, y1: 31.0, x2: 830.0, y2: 630.0 });
    }

    #[test]
    fn shadow_offsets_grow_by_padding_on_both_axes() {
        let offset = ContentOffset { x: 30.0, y: 20.0, width: -60.0, height: -40.0 };
        let padding = 160.0;
        let [x, y, w, h] = shadow_constraint_offsets(offset, padding);
        assert_eq!(x, offset.x - padding);
        assert_eq!(y, offset.y - padding);
        assert_eq!(w, offset.width + 2.0 * padding);
        assert_eq!(h, offset.height + 2.0 * padding);
    }
}
