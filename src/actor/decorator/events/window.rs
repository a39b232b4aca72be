use strum::IntoEnumIterator;
use tokio_util::time::delay_queue;
use tracing::{debug, trace};

use super::geometry::GeometryEventHandler;
use crate::actor::decorator::{
    CLIP_SHADOW_EFFECT, Decorator, Event, Handler, RELAYOUT_DELAY, ROUNDED_CORNERS_EFFECT,
    SHADOW_ACTOR_NAME, Subject, should_enable_effect,
};
use crate::model::TrackedWindow;
use crate::sys::compositor::{
    ActorId, ActorProperty, BindCoordinate, ClientType, Compositor, EffectKind, ShadowMode,
    WindowId, WindowInfo,
};

const WINDOW_SIGNALS: [(&str, Handler); 4] = [
    ("size-changed", Handler::Window(Event::WindowGeometryChanged)),
    ("position-changed", Handler::Window(Event::WindowGeometryChanged)),
    ("notify::scale", Handler::Window(Event::WindowGeometryChanged)),
    ("notify::appears-focused", Handler::Window(Event::WindowFocusChanged)),
];

/// The node the rounded-corners effect goes on. X11 clients are drawn into
/// the first child of the window actor, Wayland clients into the actor
/// itself.
pub fn actor_to_rounded<C: Compositor>(
    compositor: &C,
    window_actor: ActorId,
    info: &WindowInfo,
) -> Option<ActorId> {
    match info.client_type {
        ClientType::X11 => compositor.first_child(window_actor),
        ClientType::Wayland => Some(window_actor),
    }
}

pub struct WindowEventHandler;

impl WindowEventHandler {
    pub fn handle_window_opened<C: Compositor>(decorator: &mut Decorator<C>, window: WindowId) {
        if decorator.window_manager.windows.contains_key(&window) {
            trace!(?window, "window is already decorated");
            return;
        }
        let Some(info) = decorator.compositor.window(window).cloned() else {
            trace!(?window, "window opened but is unknown to the compositor");
            return;
        };
        if !should_enable_effect(&info) {
            debug!(?window, title = %info.title, "window is not eligible");
            return;
        }
        let Some(window_actor) = decorator.compositor.window_actor(window) else {
            trace!(?window, "window has no actor");
            return;
        };

        let rounded_actor = actor_to_rounded(&decorator.compositor, window_actor, &info);
        if let Some(target) = rounded_actor {
            decorator.compositor.add_effect(
                target,
                ROUNDED_CORNERS_EFFECT,
                EffectKind::RoundedCorners,
            );
        }

        // Our own shadow replaces the compositor's.
        if decorator.compositor.shadow_mode(window_actor).is_some() {
            decorator.compositor.set_shadow_mode(window_actor, ShadowMode::ForcedOff);
        }

        let shadow = Self::create_shadow(decorator, window_actor, &info);
        let mut tracked = TrackedWindow::new(window_actor, rounded_actor, shadow);
        for property in ActorProperty::TRANSFORM {
            let binding = decorator.compositor.bind_property(window_actor, shadow, property);
            tracked.transform_bindings.push(binding);
        }
        tracked.visible_binding =
            Some(decorator.compositor.bind_property(window_actor, shadow, ActorProperty::Visible));
        decorator.window_manager.windows.insert(window, tracked);

        for (signal, handler) in WINDOW_SIGNALS {
            decorator.connections.connect(
                &mut decorator.compositor,
                Subject::Window(window),
                signal,
                handler,
            );
        }

        debug!(?window, title = %info.title, "decorated window");
    }

    fn create_shadow<C: Compositor>(
        decorator: &mut Decorator<C>,
        window_actor: ActorId,
        info: &WindowInfo,
    ) -> ActorId {
        let shadow = decorator.compositor.create_shadow_actor(SHADOW_ACTOR_NAME);
        GeometryEventHandler::update_shadow_actor_style(decorator, info, shadow);

        decorator.compositor.add_effect(shadow, CLIP_SHADOW_EFFECT, EffectKind::ClipShadow);
        decorator.compositor.insert_below(shadow, window_actor);

        for coordinate in BindCoordinate::iter() {
            decorator.compositor.add_bind_constraint(shadow, window_actor, coordinate);
        }
        shadow
    }

    /// Undoes everything done for `window`. Safe to call for windows that
    /// were never decorated.
    pub fn handle_window_closed<C: Compositor>(decorator: &mut Decorator<C>, window: WindowId) {
        let tracked = decorator.window_manager.windows.remove(&window);

        let window_actor = tracked
            .as_ref()
            .map(|t| t.window_actor)
            .or_else(|| decorator.compositor.window_actor(window));
        if let Some(window_actor) = window_actor {
            let rounded_actor = match &tracked {
                Some(tracked) => tracked.rounded_actor,
                None => decorator
                    .compositor
                    .window(window)
                    .cloned()
                    .and_then(|info| actor_to_rounded(&decorator.compositor, window_actor, &info)),
            };
            if let Some(target) = rounded_actor {
                decorator.compositor.remove_effect(target, ROUNDED_CORNERS_EFFECT);
            }

            if decorator.compositor.shadow_mode(window_actor) == Some(ShadowMode::ForcedOff) {
                decorator.compositor.set_shadow_mode(window_actor, ShadowMode::Auto);
            }
        }

        if let Some(tracked) = tracked {
            if let Some(key) = &tracked.pending_relayout {
                decorator.relayout_timers.cancel(key);
            }
            for binding in tracked.transform_bindings.iter().chain(&tracked.visible_binding) {
                decorator.compositor.unbind(*binding);
            }

            let shadow = tracked.shadow;
            decorator.compositor.remove_from_window_group(shadow);
            decorator.compositor.clear_effects(shadow);
            decorator.compositor.destroy_actor(shadow);
            debug!(?window, "undecorated window");
        }

        decorator
            .connections
            .disconnect_all(&mut decorator.compositor, Some(&Subject::Window(window)));
    }

    pub fn handle_minimize<C: Compositor>(decorator: &mut Decorator<C>, window: WindowId) {
        let Some(tracked) = decorator.window_manager.windows.get_mut(&window) else {
            return;
        };
        // The window actor stays visible while the minimize animation runs,
        // so the shadow is hidden by hand.
        if let Some(binding) = tracked.visible_binding.take() {
            decorator.compositor.unbind(binding);
        }
        decorator.compositor.set_visible(tracked.shadow, false);
        trace!(?window, "hid shadow");
    }

    pub fn handle_unminimize<C: Compositor>(decorator: &mut Decorator<C>, window: WindowId) {
        Self::restore_shadow(decorator, window);

        let Some(tracked) = decorator.window_manager.windows.get_mut(&window) else {
            return;
        };
        if decorator.compositor.first_child(tracked.window_actor).is_none() {
            return;
        }
        let previous = tracked.pending_relayout.take();
        tracked.pending_relayout = decorator.relayout_timers.arm(window, RELAYOUT_DELAY, previous);
    }

    /// Rebinds shadow visibility to the window actor.
    pub fn restore_shadow<C: Compositor>(decorator: &mut Decorator<C>, window: WindowId) {
        let Some(tracked) = decorator.window_manager.windows.get_mut(&window) else {
            return;
        };
        if let Some(binding) = tracked.visible_binding.take() {
            decorator.compositor.unbind(binding);
        }
        tracked.visible_binding = Some(decorator.compositor.bind_property(
            tracked.window_actor,
            tracked.shadow,
            ActorProperty::Visible,
        ));
    }

    pub fn handle_restacked<C: Compositor>(decorator: &mut Decorator<C>, window: WindowId) {
        let Some(tracked) = decorator.window_manager.windows.get(&window) else {
            return;
        };
        if !decorator.compositor.is_visible(tracked.window_actor) {
            return;
        }
        decorator.compositor.set_child_below_sibling(tracked.shadow, tracked.window_actor);
    }

    pub fn handle_relayout_due<C: Compositor>(
        decorator: &mut Decorator<C>,
        key: delay_queue::Key,
        window: WindowId,
    ) {
        let Some(tracked) = decorator.window_manager.windows.get_mut(&window) else {
            return;
        };
        if tracked.pending_relayout != Some(key) {
            trace!(?window, "ignoring stale relayout timer");
            return;
        }
        tracked.pending_relayout = None;
        if let Some(child) = decorator.compositor.first_child(tracked.window_actor) {
            decorator.compositor.queue_relayout(child);
            trace!(?window, "queued relayout");
        }
    }
}
