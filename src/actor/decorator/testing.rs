use super::{Decorator, ROUNDED_CORNERS_EFFECT, Subject};
use crate::common::config::Settings;
use crate::sys::compositor::{ActorId, ClientType, Scene, WindowId, WindowInfo};
use crate::sys::geometry::Rect;
use crate::sys::headless::{HeadlessCompositor, HeadlessEffect};

pub const MPV: WindowId = WindowId::new(1);
pub const OTHER: WindowId = WindowId::new(2);

/// Number of handlers `enable` connects.
pub const GLOBAL_HANDLERS: usize = 6;
/// Number of handlers connected per decorated window.
pub const WINDOW_HANDLERS: usize = 4;

pub fn mpv_window(client_type: ClientType) -> WindowInfo {
    WindowInfo {
        title: "mpv - video.mkv".to_string(),
        wm_class_instance: Some("mpv".to_string()),
        client_type,
        frame_rect: Rect::new(10.0, 10.0, 800.0, 600.0),
        buffer_rect: Rect::new(0.0, 0.0, 820.0, 620.0),
        ..WindowInfo::default()
    }
}

pub fn window_of_class(wm_class_instance: Option<&str>) -> WindowInfo {
    WindowInfo {
        title: "some window".to_string(),
        wm_class_instance: wm_class_instance.map(str::to_string),
        frame_rect: Rect::new(0.0, 0.0, 400.0, 300.0),
        buffer_rect: Rect::new(0.0, 0.0, 400.0, 300.0),
        ..WindowInfo::default()
    }
}

pub fn decorator() -> Decorator<HeadlessCompositor> {
    decorator_with(HeadlessCompositor::new(vec![1.0, 2.0]), Settings::default())
}

pub fn decorator_with(
    compositor: HeadlessCompositor,
    settings: Settings,
) -> Decorator<HeadlessCompositor> {
    let mut decorator = Decorator::new(compositor, settings);
    decorator.enable();
    decorator
}

/// Runs the handlers connected to `signal` and feeds the resulting events to
/// the decorator.
pub fn emit(
    decorator: &mut Decorator<HeadlessCompositor>,
    subject: Subject,
    signal: &str,
    window: Option<WindowId>,
) {
    for event in decorator.compositor().emit(&subject, signal, window) {
        decorator.handle_event(event);
    }
}

/// Maps a window the way the compositor would.
pub fn open(
    decorator: &mut Decorator<HeadlessCompositor>,
    id: WindowId,
    info: WindowInfo,
) -> ActorId {
    let actor = decorator.compositor_mut().add_window(id, info);
    emit(decorator, Subject::WindowManager, "map", Some(id));
    actor
}

/// Maps a window whose actor has no surface child yet.
pub fn open_without_surface(
    decorator: &mut Decorator<HeadlessCompositor>,
    id: WindowId,
    info: WindowInfo,
) -> ActorId {
    let actor = decorator.compositor_mut().add_window_without_surface(id, info);
    emit(decorator, Subject::WindowManager, "map", Some(id));
    actor
}

pub fn shadow_of(decorator: &Decorator<HeadlessCompositor>, id: WindowId) -> ActorId {
    decorator.tracked(id).expect("window is tracked").shadow
}

pub fn inner_style(decorator: &Decorator<HeadlessCompositor>, id: WindowId) -> String {
    let compositor = decorator.compositor();
    let inner = compositor.first_child(shadow_of(decorator, id)).expect("shadow has an inner bin");
    compositor.actor(inner).expect("inner bin exists").style.clone()
}

pub fn rounded_effect(
    decorator: &Decorator<HeadlessCompositor>,
    actor: ActorId,
) -> &HeadlessEffect {
    decorator
        .compositor()
        .actor(actor)
        .and_then(|node| node.effect(ROUNDED_CORNERS_EFFECT))
        .expect("rounded corners effect is attached")
}
