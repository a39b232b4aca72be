//! Style of the shadow actor.
//!
//! The shadow actor is an outer bin padded by [`SHADOW_PADDING`] around an
//! inner bin that carries the visible fill, corner radius and box shadow.
//! Everything here is a pure function of its inputs so the generated CSS is
//! identical for identical inputs.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::common::config::{Padding, RoundedCornersConfig, ShadowStyle};

/// Room around the window, in logical pixels, the shadow is drawn into.
pub const SHADOW_PADDING: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxShadow {
    pub horizontal_offset: f64,
    pub vertical_offset: f64,
    pub blur: f64,
    pub spread: f64,
    /// 0..=1
    pub alpha: f64,
}

impl BoxShadow {
    pub fn scaled(shadow: &ShadowStyle, scale: f64) -> Self {
        BoxShadow {
            horizontal_offset: shadow.horizontal_offset * scale,
            vertical_offset: shadow.vertical_offset * scale,
            blur: shadow.blur_offset * scale,
            spread: shadow.spread_radius * scale,
            alpha: shadow.opacity / 100.0,
        }
    }

    pub fn css(&self) -> String {
        format!(
            "box-shadow: {}px {}px {}px {}px rgba(0,0,0, {})",
            self.horizontal_offset, self.vertical_offset, self.blur, self.spread, self.alpha
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InnerStyle {
    /// Maximized or fullscreen: nothing visible.
    Hidden,
    Decorated {
        border_radius: f64,
        box_shadow: BoxShadow,
        margin: Padding,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowActorStyle {
    pub padding: f64,
    pub inner: InnerStyle,
}

impl ShadowActorStyle {
    pub fn outer_css(&self) -> String { format!("padding: {}px;", self.padding) }

    pub fn inner_css(&self) -> String {
        match self.inner {
            InnerStyle::Hidden => "opacity: 0;".to_string(),
            InnerStyle::Decorated { border_radius, box_shadow, margin } => {
                let mut css = String::from("background: white;");
                let _ = write!(css, " border-radius: {border_radius}px;");
                let _ = write!(css, " {};", box_shadow.css());
                let _ = write!(
                    css,
                    " margin: {}px {}px {}px {}px;",
                    margin.top, margin.right, margin.bottom, margin.left
                );
                css
            }
        }
    }
}

/// Correction between the window's scale and the scale themed styles render
/// at. Styles always follow the primary monitor while the window follows the
/// monitor it is on.
pub fn style_scale(window_scale: f64, theme_scale: f64) -> Option<f64> {
    let scale = window_scale / theme_scale;
    (scale.is_finite() && scale > 0.0).then_some(scale)
}

/// Computes the shadow actor style, or `None` when the corner settings are
/// missing or unusable.
pub fn compute(
    corners: Option<&RoundedCornersConfig>,
    shadow: &ShadowStyle,
    window_scale: f64,
    theme_scale: f64,
    maximized_or_fullscreen: bool,
) -> Option<ShadowActorStyle> {
    let corners = corners?;
    if !corners.border_radius.is_finite() {
        return None;
    }
    let scale = style_scale(window_scale, theme_scale)?;

    let inner = if maximized_or_fullscreen {
        InnerStyle::Hidden
    } else {
        let p = corners.padding;
        InnerStyle::Decorated {
            border_radius: corners.effective_radius() * scale,
            box_shadow: BoxShadow::scaled(shadow, scale),
            margin: Padding {
                left: p.left * scale,
                right: p.right * scale,
                top: p.top * scale,
                bottom: p.bottom * scale,
            },
        }
    };

    Some(ShadowActorStyle {
        padding: SHADOW_PADDING * scale,
        inner,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn corners() -> RoundedCornersConfig {
        RoundedCornersConfig {
            border_radius: 12.0,
            smoothing: 0.5,
            padding: Padding { left: 1.0, right: 2.0, top: 3.0, bottom: 4.0 },
            ..RoundedCornersConfig::default()
        }
    }

    #[test]
    fn decorated_style_scales_every_length() {
        let style = compute(Some(&corners()), &ShadowStyle::focused(), 2.0, 1.0, false)
            .expect("style");

        assert_eq!(style.outer_css(), "padding: 160px;");
        assert_eq!(
            style.inner_css(),
            "background: white; border-radius: 36px; \
             box-shadow: 0px 8px 56px 8px rgba(0,0,0, 0.6); margin: 6px 4px 8px 2px;"
        );
    }

    #[test]
    fn style_scale_compensates_for_theme_scale() {
        let style = compute(Some(&corners()), &ShadowStyle::unfocused(), 1.0, 2.0, false)
            .expect("style");
        assert_eq!(style.padding, 40.0);
        let InnerStyle::Decorated { border_radius, box_shadow, .. } = style.inner else {
            panic!("expected decorated style");
        };
        assert_eq!(border_radius, 9.0);
        assert_eq!(box_shadow.spread, -0.5);
        assert_eq!(box_shadow.alpha, 0.65);
    }

    #[test]
    fn maximized_windows_hide_the_inner_layer() {
        let style = compute(Some(&corners()), &ShadowStyle::focused(), 1.0, 1.0, true)
            .expect("style");
        assert_eq!(style.inner, InnerStyle::Hidden);
        assert_eq!(style.inner_css(), "opacity: 0;");
        assert_eq!(style.outer_css(), "padding: 80px;");
    }

    #[test]
    fn missing_or_broken_settings_produce_no_style() {
        let shadow = ShadowStyle::focused();
        assert_eq!(compute(None, &shadow, 1.0, 1.0, false), None);

        let broken = RoundedCornersConfig { border_radius: f64::NAN, ..corners() };
        assert_eq!(compute(Some(&broken), &shadow, 1.0, 1.0, false), None);

        assert_eq!(compute(Some(&corners()), &shadow, 1.0, 0.0, false), None);
    }

    #[test]
    fn identical_inputs_give_identical_css() {
        let a = compute(Some(&corners()), &ShadowStyle::focused(), 1.25, 1.0, false)
            .expect("style");
        let b = compute(Some(&corners()), &ShadowStyle::focused(), 1.25, 1.0, false)
            .expect("style");
        assert_eq!(a.inner_css(), b.inner_css());
        assert_eq!(a.outer_css(), b.outer_css());
    }
}
