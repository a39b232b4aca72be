//! The Decorator keeps a rounded-corner effect and a shadow actor in sync with
//! every decorated window.
//!
//! It takes window lifecycle events from the compositor, one at a time, and
//! derives the visual state of each decorated window from the window's
//! current geometry, focus and maximize state and the current settings. All
//! state it creates for a window lives in a [`TrackedWindow`] and is released
//! together when the window closes.

mod events;
mod managers;
pub mod replay;

#[cfg(test)]
mod testing;


use std::time::Duration;

use events::geometry::GeometryEventHandler;
use events::settings::SettingsEventHandler;
use events::window::WindowEventHandler;
use serde::{Deserialize, Serialize};
use tokio_util::time::delay_queue;
use tracing::{debug, instrument, trace, warn};

use crate::actor;
use crate::common::config::{RoundedCornersConfig, Settings, SettingsKey};
use crate::common::connections::Connections;
use crate::model::TrackedWindow;
use crate::sys::compositor::{Compositor, HandlerId, WindowId, WindowInfo};

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

pub const ROUNDED_CORNERS_EFFECT: &str = "Rounded Corners Effect";
pub const CLIP_SHADOW_EFFECT: &str = "Clip Shadow Effect";
pub const SHADOW_ACTOR_NAME: &str = "Shadow Actor";

/// How long after unminimizing a window its layout is requeued, to fix up
/// whatever the minimize animation left behind.
pub const RELAYOUT_DELAY: Duration = Duration::from_millis(300);

/// Desktop Icons NG draws the desktop grid in a regular application window.
pub const DESKTOP_ICONS_APP_ID: &str = "com.rastersoft.ding";

/// Only windows of this client class are decorated.
pub const TARGET_WM_CLASS_INSTANCE: &str = "mpv";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Event {
    WindowOpened(WindowId),
    WindowClosed(WindowId),
    WindowMinimized(WindowId),
    WindowUnminimized(WindowId),
    /// The window group was restacked. Applies to every decorated window.
    Restacked,
    /// The active workspace changed. Applies to every decorated window.
    WorkspaceSwitched,
    /// Size, position or monitor scale of a window changed.
    WindowGeometryChanged(WindowId),
    WindowFocusChanged(WindowId),
    ConfigUpdated(Settings),
}

/// Objects signals are connected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    WindowManager,
    Display,
    Window(WindowId),
}

/// What a signal turns into.
#[derive(Debug, Clone, Copy)]
pub enum Handler {
    /// Signals about one window.
    Window(fn(WindowId) -> Event),
    /// Signals that concern every window.
    Broadcast(fn() -> Event),
}

impl Handler {
    pub fn invoke(&self, window: Option<WindowId>) -> Option<Event> {
        match *self {
            Handler::Window(make) => window.map(make),
            Handler::Broadcast(make) => Some(make()),
        }
    }
}

/// Decides whether a window gets decorated at all.
pub fn should_enable_effect(info: &WindowInfo) -> bool {
    if info.gtk_application_id.as_deref() == Some(DESKTOP_ICONS_APP_ID) {
        return false;
    }

    let Some(wm_class_instance) = info.wm_class_instance.as_deref() else {
        warn!(title = %info.title, "wm_class_instance of window is null");
        return false;
    };
    if wm_class_instance != TARGET_WM_CLASS_INSTANCE {
        return false;
    }

    info.window_type.is_decoratable()
}

/// Whether a decorated window should currently show rounded corners, given
/// its maximize and fullscreen state.
pub fn should_have_rounded_corners(info: &WindowInfo, cfg: &RoundedCornersConfig) -> bool {
    let maximized = info.is_maximized();
    let fullscreen = info.fullscreen;

    !(maximized || fullscreen)
        || (maximized && cfg.keep_rounded_corners.maximized)
        || (fullscreen && cfg.keep_rounded_corners.fullscreen)
}

pub struct Decorator<C: Compositor> {
    compositor: C,
    settings_manager: managers::SettingsManager,
    window_manager: managers::WindowManager,
    relayout_timers: managers::RelayoutTimers,
    connections: Connections<Subject, HandlerId>,
    enabled: bool,
}

impl<C: Compositor> Decorator<C> {
    pub fn new(compositor: C, settings: Settings) -> Self {
        Decorator {
            compositor,
            settings_manager: managers::SettingsManager { settings },
            window_manager: managers::WindowManager::default(),
            relayout_timers: managers::RelayoutTimers::new(),
            connections: Connections::new(),
            enabled: false,
        }
    }

    pub fn compositor(&self) -> &C { &self.compositor }

    pub fn compositor_mut(&mut self) -> &mut C { &mut self.compositor }

    pub fn settings(&self) -> &Settings { &self.settings_manager.settings }

    pub fn is_enabled(&self) -> bool { self.enabled }

    pub fn is_tracked(&self, window: WindowId) -> bool {
        self.window_manager.windows.contains_key(&window)
    }

    pub fn tracked(&self, window: WindowId) -> Option<&TrackedWindow> {
        self.window_manager.windows.get(&window)
    }

    pub fn tracked_count(&self) -> usize { self.window_manager.windows.len() }

    pub fn pending_relayouts(&self) -> usize { self.relayout_timers.len() }

    pub fn connections(&self) -> &Connections<Subject, HandlerId> { &self.connections }

    /// Subscribes to the compositor's window-manager signals and decorates
    /// every window that already exists.
    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;

        let signals: [(Subject, &str, Handler); 6] = [
            (Subject::WindowManager, "map", Handler::Window(Event::WindowOpened)),
            (Subject::WindowManager, "destroy", Handler::Window(Event::WindowClosed)),
            (Subject::WindowManager, "minimize", Handler::Window(Event::WindowMinimized)),
            (Subject::WindowManager, "unminimize", Handler::Window(Event::WindowUnminimized)),
            (
                Subject::WindowManager,
                "switch-workspace",
                Handler::Broadcast(|| Event::WorkspaceSwitched),
            ),
            (Subject::Display, "restacked", Handler::Broadcast(|| Event::Restacked)),
        ];
        for (subject, signal, handler) in signals {
            self.connections.connect(&mut self.compositor, subject, signal, handler);
        }

        let windows = self.compositor.window_ids();
        debug!(count = windows.len(), "decorating existing windows");
        for window in windows {
            self.on_window_opened(window);
            self.on_geometry_changed(window);
        }
    }

    /// Undecorates every window and drops every subscription.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;

        for window in self.window_manager.window_ids() {
            self.on_window_closed(window);
        }
        self.connections.disconnect_all(&mut self.compositor, None);
    }

    #[instrument(name = "decorator::handle_event", skip(self))]
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::WindowOpened(window) => {
                self.on_window_opened(window);
                self.on_geometry_changed(window);
            }
            Event::WindowClosed(window) => self.on_window_closed(window),
            Event::WindowMinimized(window) => self.on_minimize(window),
            Event::WindowUnminimized(window) => self.on_unminimize(window),
            Event::Restacked => {
                for window in self.window_manager.window_ids() {
                    self.on_restacked(window);
                }
            }
            Event::WorkspaceSwitched => {
                for window in self.window_manager.window_ids() {
                    self.on_workspace_switched(window);
                }
            }
            Event::WindowGeometryChanged(window) => self.on_geometry_changed(window),
            Event::WindowFocusChanged(window) => self.on_focus_changed(window),
            Event::ConfigUpdated(settings) => {
                SettingsEventHandler::handle_config_updated(self, settings)
            }
        }
    }

    pub fn on_window_opened(&mut self, window: WindowId) {
        WindowEventHandler::handle_window_opened(self, window);
    }

    pub fn on_window_closed(&mut self, window: WindowId) {
        WindowEventHandler::handle_window_closed(self, window);
    }

    pub fn on_minimize(&mut self, window: WindowId) {
        WindowEventHandler::handle_minimize(self, window);
    }

    pub fn on_unminimize(&mut self, window: WindowId) {
        WindowEventHandler::handle_unminimize(self, window);
    }

    pub fn on_workspace_switched(&mut self, window: WindowId) {
        WindowEventHandler::restore_shadow(self, window);
    }

    pub fn on_restacked(&mut self, window: WindowId) {
        WindowEventHandler::handle_restacked(self, window);
    }

    pub fn on_geometry_changed(&mut self, window: WindowId) {
        GeometryEventHandler::handle_geometry_changed(self, window);
    }

    pub fn on_focus_changed(&mut self, window: WindowId) {
        GeometryEventHandler::handle_focus_changed(self, window);
    }

    pub fn on_settings_changed(&mut self, key: SettingsKey) {
        SettingsEventHandler::handle_settings_changed(self, key);
    }

    /// A relayout timer fired. Stale keys (re-armed or closed windows) are
    /// ignored.
    pub fn on_relayout_due(&mut self, key: delay_queue::Key, window: WindowId) {
        WindowEventHandler::handle_relayout_due(self, key, window);
    }

    /// Fires every relayout timer that expires before `deadline`.
    pub async fn process_timers_until(&mut self, deadline: tokio::time::Instant) {
        while let Ok(Some(expired)) =
            tokio::time::timeout_at(deadline, self.relayout_timers.next_expired()).await
        {
            self.on_relayout_due(expired.key(), expired.into_inner());
        }
    }

    /// Handles events until every sender is dropped, then undecorates
    /// everything.
    pub async fn run(mut self, mut events: Receiver) -> Self {
        self.enable();
        loop {
            tokio::select! {
                Some(expired) = self.relayout_timers.next_expired() => {
                    self.on_relayout_due(expired.key(), expired.into_inner());
                }
                message = events.recv() => {
                    let Some((span, event)) = message else {
                        break;
                    };
                    let _guard = span.enter();
                    self.handle_event(event);
                }
            }
        }
        trace!("event channel closed");
        self.disable();
        self
    }
}
