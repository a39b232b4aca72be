//! Interfaces of the compositor the decorator runs against.
//!
//! The decorator never owns windows or their actors; it only queries them
//! through [`WindowModel`] and manipulates the scene through [`Scene`]. Actors
//! it creates itself (shadows) are owned by it until it destroys them.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter};

use crate::actor::decorator::{Handler, Subject};
use crate::common::config::{BorderConfig, RoundedCornersConfig};
use crate::common::connections::SignalSource;
use crate::sys::geometry::{Bounds, Rect, Size};

slotmap::new_key_type! {
    pub struct ActorId;
    pub struct BindingId;
    pub struct HandlerId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl WindowId {
    pub const fn new(id: u64) -> Self { WindowId(id) }

    pub const fn get(self) -> u64 { self.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowType {
    #[default]
    Normal,
    Desktop,
    Dock,
    Dialog,
    ModalDialog,
    Toolbar,
    Menu,
    Utility,
    Splashscreen,
    DropdownMenu,
    PopupMenu,
    Tooltip,
    Notification,
    Combo,
    Dnd,
    OverrideOther,
}

impl WindowType {
    /// Window types that get rounded corners.
    pub fn is_decoratable(self) -> bool {
        matches!(self, WindowType::Normal | WindowType::Dialog | WindowType::ModalDialog)
    }
}

/// Protocol the window's client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClientType {
    #[default]
    Wayland,
    X11,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MaximizeFlags: u8 {
        const HORIZONTAL = 1 << 0;
        const VERTICAL = 1 << 1;
        const BOTH = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}

/// Snapshot of the compositor's view of a window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowInfo {
    pub title: String,
    pub wm_class_instance: Option<String>,
    pub gtk_application_id: Option<String>,
    pub window_type: WindowType,
    pub client_type: ClientType,
    pub frame_rect: Rect,
    pub buffer_rect: Rect,
    pub maximized: MaximizeFlags,
    pub fullscreen: bool,
    pub appears_focused: bool,
    pub monitor: usize,
}

impl WindowInfo {
    pub fn is_maximized(&self) -> bool { !self.maximized.is_empty() }

    pub fn is_maximized_or_fullscreen(&self) -> bool { self.is_maximized() || self.fullscreen }
}

/// How the compositor draws its own shadow for a window actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowMode {
    Auto,
    ForcedOff,
    ForcedOn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum BindCoordinate {
    X,
    Y,
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ActorProperty {
    PivotPoint,
    TranslationX,
    TranslationY,
    ScaleX,
    ScaleY,
    Visible,
}

impl ActorProperty {
    /// Properties mirrored from a window actor to its shadow for the whole
    /// life of the shadow.
    pub const TRANSFORM: [ActorProperty; 5] = [
        ActorProperty::PivotPoint,
        ActorProperty::TranslationX,
        ActorProperty::TranslationY,
        ActorProperty::ScaleX,
        ActorProperty::ScaleY,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    RoundedCorners,
    ClipShadow,
}

/// The shader that paints the rounded mask.
pub trait RoundedCornersEffect {
    fn enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn update_uniforms(
        &mut self,
        scale: f64,
        corners: &RoundedCornersConfig,
        bounds: Bounds,
        border: BorderConfig,
    );
}

pub trait WindowModel {
    fn window(&self, window: WindowId) -> Option<&WindowInfo>;
    fn window_ids(&self) -> Vec<WindowId>;
    fn is_wayland_compositor(&self) -> bool;
    fn experimental_features(&self) -> &[String];
    fn monitor_scale(&self, monitor: usize) -> f64;
    fn current_monitor(&self) -> usize;
    /// Scale the theme renders widget styles at (that of the primary monitor).
    fn theme_scale_factor(&self) -> f64;
}

pub trait Scene {
    fn window_actor(&self, window: WindowId) -> Option<ActorId>;
    fn first_child(&self, actor: ActorId) -> Option<ActorId>;
    fn actor_size(&self, actor: ActorId) -> Option<Size>;
    fn is_visible(&self, actor: ActorId) -> bool;
    fn set_visible(&mut self, actor: ActorId, visible: bool);

    /// `None` for actors the compositor draws no shadow for.
    fn shadow_mode(&self, actor: ActorId) -> Option<ShadowMode>;
    fn set_shadow_mode(&mut self, actor: ActorId, mode: ShadowMode);

    /// Creates a bin actor named `name` wrapping an inner bin with the
    /// `shadow` style class. The actor is not yet in the window group.
    fn create_shadow_actor(&mut self, name: &str) -> ActorId;
    fn destroy_actor(&mut self, actor: ActorId);

    fn insert_below(&mut self, actor: ActorId, sibling: ActorId);
    fn set_child_below_sibling(&mut self, actor: ActorId, sibling: ActorId);
    fn remove_from_window_group(&mut self, actor: ActorId);

    fn add_bind_constraint(&mut self, actor: ActorId, source: ActorId, coordinate: BindCoordinate);
    /// Sets the offset of the `index`th bind constraint. Returns `false` when
    /// there is no such constraint.
    fn set_bind_constraint_offset(&mut self, actor: ActorId, index: usize, offset: f64) -> bool;

    fn bind_property(&mut self, source: ActorId, target: ActorId, property: ActorProperty)
    -> BindingId;
    fn unbind(&mut self, binding: BindingId);

    fn add_effect(&mut self, actor: ActorId, name: &str, kind: EffectKind);
    fn remove_effect(&mut self, actor: ActorId, name: &str);
    fn clear_effects(&mut self, actor: ActorId);
    fn rounded_effect_mut(
        &mut self,
        actor: ActorId,
        name: &str,
    ) -> Option<&mut dyn RoundedCornersEffect>;

    fn set_style(&mut self, actor: ActorId, style: &str);
    fn queue_redraw(&mut self, actor: ActorId);
    fn queue_relayout(&mut self, actor: ActorId);
}

/// Everything the decorator needs from its host.
pub trait Compositor:
    WindowModel + Scene + SignalSource<Subject, Handler = Handler, HandlerId = HandlerId>
{
}

impl<T> Compositor for T where
    T: WindowModel + Scene + SignalSource<Subject, Handler = Handler, HandlerId = HandlerId>
{
}
