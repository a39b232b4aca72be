//! Scripted sessions against the in-memory compositor.
//!
//! A script describes the monitors of a session and a list of steps. Each
//! step changes the compositor the way a real session would and emits the
//! signals the compositor would emit, which are then handled by a
//! [`Decorator`] exactly as in a live run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info_span};

use super::{Decorator, Event, Subject};
use crate::common::config::Settings;
use crate::sys::compositor::{
    ClientType, MaximizeFlags, Scene, WindowId, WindowInfo, WindowModel, WindowType,
};
use crate::sys::geometry::Rect;
use crate::sys::headless::HeadlessCompositor;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

fn default_monitors() -> Vec<f64> { vec![1.0] }

fn default_scale() -> f64 { 1.0 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default = "default_monitors")]
    pub monitors: Vec<f64>,
    #[serde(default)]
    pub wayland: bool,
    #[serde(default)]
    pub experimental_features: Vec<String>,
    #[serde(default = "default_scale")]
    pub theme_scale: f64,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn read(path: &Path) -> Result<Script, ReplayError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_owned(),
            source,
        })?;
        ron::from_str(&text).map_err(|source| ReplayError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWindow {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub wm_class: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub window_type: WindowType,
    #[serde(default)]
    pub client: ClientType,
    pub frame: Rect,
    /// Defaults to the frame.
    #[serde(default)]
    pub buffer: Option<Rect>,
    #[serde(default)]
    pub monitor: usize,
    #[serde(default)]
    pub focused: bool,
    /// Maps the window without a surface child.
    #[serde(default)]
    pub no_surface: bool,
}

impl NewWindow {
    fn info(&self) -> WindowInfo {
        WindowInfo {
            title: self.title.clone(),
            wm_class_instance: self.wm_class.clone(),
            gtk_application_id: self.app_id.clone(),
            window_type: self.window_type,
            client_type: self.client,
            frame_rect: self.frame,
            buffer_rect: self.buffer.unwrap_or(self.frame),
            maximized: MaximizeFlags::empty(),
            fullscreen: false,
            appears_focused: self.focused,
            monitor: self.monitor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    Open(NewWindow),
    Close(u64),
    Minimize(u64),
    Unminimize(u64),
    Resize { id: u64, frame: Rect, buffer: Option<Rect> },
    Maximize { id: u64, maximized: bool },
    Fullscreen { id: u64, fullscreen: bool },
    Focus(u64),
    Raise(u64),
    MoveToMonitor { id: u64, monitor: usize },
    SetMonitorScale { monitor: usize, scale: f64 },
    SwitchWorkspace,
    Configure(Settings),
    /// Lets time pass, in milliseconds, firing any timers that expire.
    Wait(u64),
}

/// Runs `script` from a fresh compositor and returns the decorator with the
/// final scene.
pub async fn replay(script: Script, settings: Settings) -> Decorator<HeadlessCompositor> {
    let mut compositor = HeadlessCompositor::new(script.monitors.clone());
    compositor.set_wayland(script.wayland);
    compositor.set_experimental_features(script.experimental_features.clone());
    compositor.set_theme_scale(script.theme_scale);

    let mut decorator = Decorator::new(compositor, settings);
    decorator.enable();
    for (index, step) in script.steps.into_iter().enumerate() {
        let span = info_span!("replay", step = index);
        run_step(&mut decorator, step).instrument(span).await;
    }
    decorator
}

async fn run_step(decorator: &mut Decorator<HeadlessCompositor>, step: Step) {
    debug!(?step, "replaying");
    match step {
        Step::Open(window) => {
            let id = WindowId::new(window.id);
            let compositor = decorator.compositor_mut();
            if window.no_surface {
                compositor.add_window_without_surface(id, window.info());
            } else {
                compositor.add_window(id, window.info());
            }
            emit(decorator, Subject::WindowManager, "map", Some(id));
        }
        Step::Close(id) => {
            let id = WindowId::new(id);
            emit(decorator, Subject::WindowManager, "destroy", Some(id));
            decorator.compositor_mut().remove_window(id);
        }
        Step::Minimize(id) => {
            let id = WindowId::new(id);
            emit(decorator, Subject::WindowManager, "minimize", Some(id));
            set_window_visible(decorator, id, false);
        }
        Step::Unminimize(id) => {
            let id = WindowId::new(id);
            set_window_visible(decorator, id, true);
            emit(decorator, Subject::WindowManager, "unminimize", Some(id));
        }
        Step::Resize { id, frame, buffer } => {
            let id = WindowId::new(id);
            decorator.compositor_mut().set_window_rects(id, frame, buffer.unwrap_or(frame));
            emit(decorator, Subject::Window(id), "size-changed", None);
        }
        Step::Maximize { id, maximized } => {
            let id = WindowId::new(id);
            if let Some(info) = decorator.compositor_mut().window_mut(id) {
                info.maximized =
                    if maximized { MaximizeFlags::BOTH } else { MaximizeFlags::empty() };
            }
            emit(decorator, Subject::Window(id), "size-changed", None);
        }
        Step::Fullscreen { id, fullscreen } => {
            let id = WindowId::new(id);
            if let Some(info) = decorator.compositor_mut().window_mut(id) {
                info.fullscreen = fullscreen;
            }
            emit(decorator, Subject::Window(id), "size-changed", None);
        }
        Step::Focus(id) => {
            decorator.compositor_mut().focus_window(WindowId::new(id));
            for window in decorator.compositor().window_ids() {
                emit(decorator, Subject::Window(window), "notify::appears-focused", None);
            }
        }
        Step::Raise(id) => {
            decorator.compositor_mut().raise_window(WindowId::new(id));
            emit(decorator, Subject::Display, "restacked", None);
        }
        Step::MoveToMonitor { id, monitor } => {
            let id = WindowId::new(id);
            if let Some(info) = decorator.compositor_mut().window_mut(id) {
                info.monitor = monitor;
            }
            emit(decorator, Subject::Window(id), "position-changed", None);
        }
        Step::SetMonitorScale { monitor, scale } => {
            decorator.compositor_mut().set_monitor_scale(monitor, scale);
            let compositor = decorator.compositor();
            let windows: Vec<WindowId> = compositor
                .window_ids()
                .into_iter()
                .filter(|w| compositor.window(*w).is_some_and(|info| info.monitor == monitor))
                .collect();
            for window in windows {
                emit(decorator, Subject::Window(window), "notify::scale", None);
            }
        }
        Step::SwitchWorkspace => emit(decorator, Subject::WindowManager, "switch-workspace", None),
        Step::Configure(settings) => decorator.handle_event(Event::ConfigUpdated(settings)),
        Step::Wait(ms) => {
            let deadline = tokio::time::Instant::now() + Duration::from_millis(ms);
            decorator.process_timers_until(deadline).await;
        }
    }
}

fn emit(
    decorator: &mut Decorator<HeadlessCompositor>,
    subject: Subject,
    signal: &str,
    window: Option<WindowId>,
) {
    for event in decorator.compositor().emit(&subject, signal, window) {
        decorator.handle_event(event);
    }
}

fn set_window_visible(decorator: &mut Decorator<HeadlessCompositor>, id: WindowId, visible: bool) {
    if let Some(actor) = decorator.compositor().window_actor(id) {
        decorator.compositor_mut().set_visible(actor, visible);
    }
}
