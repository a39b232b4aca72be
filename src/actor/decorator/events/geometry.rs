use tracing::{debug, trace};

use crate::actor::decorator::{Decorator, ROUNDED_CORNERS_EFFECT, should_have_rounded_corners};
use crate::model::shadow_style::{self, SHADOW_PADDING};
use crate::sys::compositor::{ActorId, Compositor, WindowId, WindowInfo};
use crate::sys::geometry::{content_offset, mask_bounds, shadow_constraint_offsets};
use crate::sys::scale::scale_factor;

pub struct GeometryEventHandler;

impl GeometryEventHandler {
    /// Brings the rounded mask and the shadow constraints in line with the
    /// window's current geometry, scale and maximize state.
    pub fn handle_geometry_changed<C: Compositor>(decorator: &mut Decorator<C>, window: WindowId) {
        let Some(tracked) = decorator.window_manager.windows.get(&window) else {
            return;
        };
        let (window_actor, shadow) = (tracked.window_actor, tracked.shadow);
        let Some(rounded_actor) = tracked.rounded_actor else {
            return;
        };
        let Some(info) = decorator.compositor.window(window).cloned() else {
            return;
        };
        let Some(corners) = decorator.settings_manager.settings.rounded_corners else {
            trace!(?window, "no corner settings, skipping geometry update");
            return;
        };
        let Some(enabled) = decorator
            .compositor
            .rounded_effect_mut(rounded_actor, ROUNDED_CORNERS_EFFECT)
            .map(|effect| effect.enabled())
        else {
            return;
        };

        let should_round = should_have_rounded_corners(&info, &corners);
        if !should_round && enabled {
            Self::set_effect_enabled(decorator, rounded_actor, false);
            debug!(?window, "disabled rounded corners");
            Self::handle_focus_changed(decorator, window);
            return;
        }
        if should_round && !enabled {
            Self::set_effect_enabled(decorator, rounded_actor, true);
            debug!(?window, "enabled rounded corners");
            Self::handle_focus_changed(decorator, window);
        }

        let offset = content_offset(&info);
        let scale = scale_factor(&decorator.compositor, Some(&info));
        let Some(size) = decorator.compositor.actor_size(window_actor) else {
            return;
        };
        let bounds = mask_bounds(size, offset);
        let border = decorator.settings_manager.settings.border();
        if let Some(effect) =
            decorator.compositor.rounded_effect_mut(rounded_actor, ROUNDED_CORNERS_EFFECT)
        {
            effect.update_uniforms(scale, &corners, bounds, border);
        }

        let offsets = shadow_constraint_offsets(offset, SHADOW_PADDING * scale);
        for (index, value) in offsets.into_iter().enumerate() {
            if !decorator.compositor.set_bind_constraint_offset(shadow, index, value) {
                trace!(?window, index, "shadow has no such constraint");
            }
        }
    }

    fn set_effect_enabled<C: Compositor>(
        decorator: &mut Decorator<C>,
        actor: ActorId,
        enabled: bool,
    ) {
        if let Some(effect) =
            decorator.compositor.rounded_effect_mut(actor, ROUNDED_CORNERS_EFFECT)
        {
            effect.set_enabled(enabled);
        }
    }

    /// Restyles the shadow for the window's focus state.
    pub fn handle_focus_changed<C: Compositor>(decorator: &mut Decorator<C>, window: WindowId) {
        let Some(tracked) = decorator.window_manager.windows.get(&window) else {
            return;
        };
        let shadow = tracked.shadow;
        let Some(info) = decorator.compositor.window(window).cloned() else {
            return;
        };
        Self::update_shadow_actor_style(decorator, &info, shadow);
    }

    pub fn update_all_shadow_styles<C: Compositor>(decorator: &mut Decorator<C>) {
        for window in decorator.window_manager.window_ids() {
            Self::handle_focus_changed(decorator, window);
        }
    }

    pub fn update_shadow_actor_style<C: Compositor>(
        decorator: &mut Decorator<C>,
        info: &WindowInfo,
        shadow: ActorId,
    ) {
        let settings = &decorator.settings_manager.settings;
        let window_scale = scale_factor(&decorator.compositor, Some(info));
        let Some(style) = shadow_style::compute(
            settings.rounded_corners.as_ref(),
            &settings.shadow_for(info.appears_focused),
            window_scale,
            decorator.compositor.theme_scale_factor(),
            info.is_maximized_or_fullscreen(),
        ) else {
            trace!(title = %info.title, "skipping shadow style update");
            return;
        };

        decorator.compositor.set_style(shadow, &style.outer_css());
        let Some(inner) = decorator.compositor.first_child(shadow) else {
            return;
        };
        decorator.compositor.set_style(inner, &style.inner_css());
        decorator.compositor.queue_redraw(inner);
    }
}
