//! An in-memory compositor.
//!
//! Keeps just enough of a scene graph to observe what the decorator does:
//! paint order of the window group, constraints, live property bindings,
//! named effects and styles. Signals are recorded and turned into decorator
//! events by [`HeadlessCompositor::emit`].

use serde::Serialize;
use slotmap::SlotMap;

use crate::actor::decorator::{Event, Handler, Subject};
use crate::common::collections::BTreeMap;
use crate::common::config::{BorderConfig, RoundedCornersConfig};
use crate::common::connections::SignalSource;
use crate::sys::compositor::{
    ActorId, ActorProperty, BindCoordinate, BindingId, ClientType, EffectKind, HandlerId,
    RoundedCornersEffect, Scene, ShadowMode, WindowId, WindowInfo, WindowModel,
};
use crate::sys::geometry::{Bounds, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Point(f64, f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub pivot: (f64, f64),
    pub translation_x: f64,
    pub translation_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            pivot: (0.0, 0.0),
            translation_x: 0.0,
            translation_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Uniforms {
    pub scale: f64,
    pub corners: RoundedCornersConfig,
    pub bounds: Bounds,
    pub border: BorderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlessEffect {
    pub name: String,
    pub kind: EffectKind,
    pub enabled: bool,
    pub uniforms: Option<Uniforms>,
    pub uniform_updates: u32,
}

impl RoundedCornersEffect for HeadlessEffect {
    fn enabled(&self) -> bool { self.enabled }

    fn set_enabled(&mut self, enabled: bool) { self.enabled = enabled; }

    fn update_uniforms(
        &mut self,
        scale: f64,
        corners: &RoundedCornersConfig,
        bounds: Bounds,
        border: BorderConfig,
    ) {
        self.uniforms = Some(Uniforms {
            scale,
            corners: *corners,
            bounds,
            border,
        });
        self.uniform_updates += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BindConstraint {
    pub source: ActorId,
    pub coordinate: BindCoordinate,
    pub offset: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActorNode {
    pub name: String,
    pub parent: Option<ActorId>,
    pub children: Vec<ActorId>,
    pub size: Size,
    pub visible: bool,
    pub transform: Transform,
    pub style: String,
    pub style_classes: Vec<String>,
    pub shadow_mode: Option<ShadowMode>,
    pub constraints: Vec<BindConstraint>,
    pub effects: Vec<HeadlessEffect>,
    pub redraws: u32,
    pub relayouts: u32,
}

impl ActorNode {
    fn new(name: impl Into<String>) -> Self {
        ActorNode {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            size: Size::default(),
            visible: true,
            transform: Transform::default(),
            style: String::new(),
            style_classes: Vec::new(),
            shadow_mode: None,
            constraints: Vec::new(),
            effects: Vec::new(),
            redraws: 0,
            relayouts: 0,
        }
    }

    pub fn effect(&self, name: &str) -> Option<&HeadlessEffect> {
        self.effects.iter().find(|effect| effect.name == name)
    }
}

#[derive(Debug, Clone, Copy)]
struct PropertyBinding {
    source: ActorId,
    target: ActorId,
    property: ActorProperty,
}

#[derive(Debug, Clone, Copy)]
struct Connection {
    subject: Subject,
    seq: u64,
    handler: Handler,
}

#[derive(Debug, Clone)]
struct HeadlessWindow {
    info: WindowInfo,
    actor: ActorId,
}

pub struct HeadlessCompositor {
    windows: BTreeMap<WindowId, HeadlessWindow>,
    monitors: Vec<f64>,
    current_monitor: usize,
    wayland: bool,
    experimental_features: Vec<String>,
    theme_scale: f64,
    actors: SlotMap<ActorId, ActorNode>,
    /// Paint order, bottom first.
    window_group: Vec<ActorId>,
    bindings: SlotMap<BindingId, PropertyBinding>,
    handlers: SlotMap<HandlerId, (Connection, String)>,
    next_seq: u64,
}

impl HeadlessCompositor {
    /// A compositor with one monitor per entry of `monitor_scales`.
    pub fn new(monitor_scales: Vec<f64>) -> Self {
        let monitors = if monitor_scales.is_empty() { vec![1.0] } else { monitor_scales };
        HeadlessCompositor {
            windows: BTreeMap::new(),
            monitors,
            current_monitor: 0,
            wayland: true,
            experimental_features: Vec::new(),
            theme_scale: 1.0,
            actors: SlotMap::with_key(),
            window_group: Vec::new(),
            bindings: SlotMap::with_key(),
            handlers: SlotMap::with_key(),
            next_seq: 0,
        }
    }

    pub fn set_wayland(&mut self, wayland: bool) { self.wayland = wayland; }

    pub fn set_experimental_features(&mut self, features: Vec<String>) {
        self.experimental_features = features;
    }

    pub fn set_current_monitor(&mut self, monitor: usize) { self.current_monitor = monitor; }

    pub fn set_theme_scale(&mut self, scale: f64) { self.theme_scale = scale; }

    pub fn set_monitor_scale(&mut self, monitor: usize, scale: f64) {
        if let Some(slot) = self.monitors.get_mut(monitor) {
            *slot = scale;
        }
    }

    /// Maps a window and puts its actor on top of the window group. The
    /// actor wraps a single surface child; X11 actors also get a native
    /// shadow.
    pub fn add_window(&mut self, id: WindowId, info: WindowInfo) -> ActorId {
        self.map_window(id, info, true)
    }

    /// Like [`add_window`](Self::add_window), for a window whose surface has
    /// not been attached yet.
    pub fn add_window_without_surface(&mut self, id: WindowId, info: WindowInfo) -> ActorId {
        self.map_window(id, info, false)
    }

    fn map_window(&mut self, id: WindowId, info: WindowInfo, with_surface: bool) -> ActorId {
        if let Some(existing) = self.windows.get(&id) {
            return existing.actor;
        }
        let size = Size {
            width: info.buffer_rect.width,
            height: info.buffer_rect.height,
        };

        let mut node = ActorNode::new(format!("window {} ({})", id.get(), info.title));
        node.size = size;
        if info.client_type == ClientType::X11 {
            node.shadow_mode = Some(ShadowMode::Auto);
        }
        let actor = self.actors.insert(node);

        if with_surface {
            let mut surface = ActorNode::new("surface");
            surface.size = size;
            surface.parent = Some(actor);
            let surface = self.actors.insert(surface);
            self.actors[actor].children.push(surface);
        }

        self.window_group.push(actor);
        self.windows.insert(id, HeadlessWindow { info, actor });
        actor
    }

    /// Unmaps a window and destroys its actor.
    pub fn remove_window(&mut self, id: WindowId) {
        if let Some(window) = self.windows.remove(&id) {
            self.destroy_actor(window.actor);
        }
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut WindowInfo> {
        self.windows.get_mut(&id).map(|window| &mut window.info)
    }

    /// Moves or resizes a window. The actor follows the buffer rect.
    pub fn set_window_rects(
        &mut self,
        id: WindowId,
        frame: Rect,
        buffer: Rect,
    ) {
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        window.info.frame_rect = frame;
        window.info.buffer_rect = buffer;
        let actor = window.actor;
        let size = Size { width: buffer.width, height: buffer.height };
        if let Some(node) = self.actors.get_mut(actor) {
            node.size = size;
            for child in node.children.clone() {
                if let Some(child) = self.actors.get_mut(child) {
                    child.size = size;
                }
            }
        }
    }

    /// Focuses `id` and unfocuses every other window.
    pub fn focus_window(&mut self, id: WindowId) {
        for (window_id, window) in self.windows.iter_mut() {
            window.info.appears_focused = *window_id == id;
        }
    }

    /// Raises a window's actor to the top of the window group.
    pub fn raise_window(&mut self, id: WindowId) {
        let Some(actor) = self.windows.get(&id).map(|window| window.actor) else {
            return;
        };
        self.window_group.retain(|a| *a != actor);
        self.window_group.push(actor);
    }

    pub fn set_transform(&mut self, actor: ActorId, transform: Transform) {
        let (px, py) = transform.pivot;
        self.write_property(actor, ActorProperty::PivotPoint, PropertyValue::Point(px, py));
        self.write_property(
            actor,
            ActorProperty::TranslationX,
            PropertyValue::Number(transform.translation_x),
        );
        self.write_property(
            actor,
            ActorProperty::TranslationY,
            PropertyValue::Number(transform.translation_y),
        );
        self.write_property(actor, ActorProperty::ScaleX, PropertyValue::Number(transform.scale_x));
        self.write_property(actor, ActorProperty::ScaleY, PropertyValue::Number(transform.scale_y));
    }

    /// Runs the handlers connected to `signal` on `subject` in connection
    /// order and returns the events they produce. `window` is the signal's
    /// payload for window-manager signals.
    pub fn emit(&self, subject: &Subject, signal: &str, window: Option<WindowId>) -> Vec<Event> {
        let mut connections: Vec<&Connection> = self
            .handlers
            .values()
            .filter(|(connection, name)| connection.subject == *subject && name == signal)
            .map(|(connection, _)| connection)
            .collect();
        connections.sort_by_key(|connection| connection.seq);

        let payload = match subject {
            Subject::Window(id) => Some(*id),
            _ => window,
        };
        connections.into_iter().filter_map(|c| c.handler.invoke(payload)).collect()
    }

    pub fn actor(&self, actor: ActorId) -> Option<&ActorNode> { self.actors.get(actor) }

    pub fn actor_count(&self) -> usize { self.actors.len() }

    pub fn window_group(&self) -> &[ActorId] { &self.window_group }

    pub fn binding_count(&self) -> usize { self.bindings.len() }

    pub fn handler_count(&self) -> usize { self.handlers.len() }

    pub fn is_bound(&self, source: ActorId, target: ActorId, property: ActorProperty) -> bool {
        self.bindings
            .values()
            .any(|b| b.source == source && b.target == target && b.property == property)
    }

    pub fn is_connected(&self, subject: &Subject, signal: &str) -> bool {
        self.handlers
            .values()
            .any(|(connection, name)| connection.subject == *subject && name == signal)
    }

    fn read_property(&self, actor: ActorId, property: ActorProperty) -> Option<PropertyValue> {
        let node = self.actors.get(actor)?;
        let t = node.transform;
        Some(match property {
            ActorProperty::PivotPoint => PropertyValue::Point(t.pivot.0, t.pivot.1),
            ActorProperty::TranslationX => PropertyValue::Number(t.translation_x),
            ActorProperty::TranslationY => PropertyValue::Number(t.translation_y),
            ActorProperty::ScaleX => PropertyValue::Number(t.scale_x),
            ActorProperty::ScaleY => PropertyValue::Number(t.scale_y),
            ActorProperty::Visible => PropertyValue::Bool(node.visible),
        })
    }

    fn write_property(&mut self, actor: ActorId, property: ActorProperty, value: PropertyValue) {
        let Some(node) = self.actors.get_mut(actor) else {
            return;
        };
        let t = &mut node.transform;
        match (property, value) {
            (ActorProperty::PivotPoint, PropertyValue::Point(x, y)) => t.pivot = (x, y),
            (ActorProperty::TranslationX, PropertyValue::Number(v)) => t.translation_x = v,
            (ActorProperty::TranslationY, PropertyValue::Number(v)) => t.translation_y = v,
            (ActorProperty::ScaleX, PropertyValue::Number(v)) => t.scale_x = v,
            (ActorProperty::ScaleY, PropertyValue::Number(v)) => t.scale_y = v,
            (ActorProperty::Visible, PropertyValue::Bool(v)) => node.visible = v,
            _ => return,
        }

        let targets: Vec<ActorId> = self
            .bindings
            .values()
            .filter(|b| b.source == actor && b.property == property && b.target != actor)
            .map(|b| b.target)
            .collect();
        for target in targets {
            self.write_property(target, property, value);
        }
    }

    /// The window group as a tree, for dumps.
    pub fn scene_tree(&self) -> ascii_tree::Tree {
        let nodes = self.window_group.iter().map(|actor| self.actor_tree(*actor)).collect();
        ascii_tree::Tree::Node("window group".to_string(), nodes)
    }

    fn actor_tree(&self, actor: ActorId) -> ascii_tree::Tree {
        let Some(node) = self.actors.get(actor) else {
            return ascii_tree::Tree::Leaf(vec!["<destroyed>".to_string()]);
        };
        let mut lines = vec![format!(
            "{}x{} visible={}",
            node.size.width, node.size.height, node.visible
        )];
        if let Some(mode) = node.shadow_mode {
            lines.push(format!("shadow_mode={mode:?}"));
        }
        if !node.style.is_empty() {
            lines.push(format!("style: {}", node.style));
        }
        for constraint in &node.constraints {
            lines.push(format!("bind {:?} offset={}", constraint.coordinate, constraint.offset));
        }
        for effect in &node.effects {
            let mut line =
                format!("effect {:?} '{}' enabled={}", effect.kind, effect.name, effect.enabled);
            if let Some(u) = effect.uniforms {
                line.push_str(&format!(
                    " scale={} bounds=({}, {}, {}, {})",
                    u.scale, u.bounds.x1, u.bounds.y1, u.bounds.x2, u.bounds.y2
                ));
            }
            lines.push(line);
        }

        let mut children = vec![ascii_tree::Tree::Leaf(lines)];
        children.extend(node.children.iter().map(|child| self.actor_tree(*child)));
        ascii_tree::Tree::Node(node.name.clone(), children)
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            window_group: self
                .window_group
                .iter()
                .filter_map(|actor| self.actor_snapshot(*actor))
                .collect(),
            bindings: self.bindings.len(),
            handlers: self.handlers.len(),
        }
    }

    fn actor_snapshot(&self, actor: ActorId) -> Option<ActorSnapshot> {
        let node = self.actors.get(actor)?;
        Some(ActorSnapshot {
            node: node.clone(),
            children: node.children.iter().filter_map(|c| self.actor_snapshot(*c)).collect(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ActorSnapshot {
    #[serde(flatten)]
    pub node: ActorNode,
    #[serde(rename = "children_nodes")]
    pub children: Vec<ActorSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct SceneSnapshot {
    pub window_group: Vec<ActorSnapshot>,
    pub bindings: usize,
    pub handlers: usize,
}

impl WindowModel for HeadlessCompositor {
    fn window(&self, window: WindowId) -> Option<&WindowInfo> {
        self.windows.get(&window).map(|w| &w.info)
    }

    fn window_ids(&self) -> Vec<WindowId> { self.windows.keys().copied().collect() }

    fn is_wayland_compositor(&self) -> bool { self.wayland }

    fn experimental_features(&self) -> &[String] { &self.experimental_features }

    fn monitor_scale(&self, monitor: usize) -> f64 {
        self.monitors.get(monitor).copied().unwrap_or(1.0)
    }

    fn current_monitor(&self) -> usize { self.current_monitor }

    fn theme_scale_factor(&self) -> f64 { self.theme_scale }
}

impl Scene for HeadlessCompositor {
    fn window_actor(&self, window: WindowId) -> Option<ActorId> {
        self.windows.get(&window).map(|w| w.actor)
    }

    fn first_child(&self, actor: ActorId) -> Option<ActorId> {
        self.actors.get(actor)?.children.first().copied()
    }

    fn actor_size(&self, actor: ActorId) -> Option<Size> { self.actors.get(actor).map(|n| n.size) }

    fn is_visible(&self, actor: ActorId) -> bool {
        self.actors.get(actor).is_some_and(|node| node.visible)
    }

    fn set_visible(&mut self, actor: ActorId, visible: bool) {
        self.write_property(actor, ActorProperty::Visible, PropertyValue::Bool(visible));
    }

    fn shadow_mode(&self, actor: ActorId) -> Option<ShadowMode> {
        self.actors.get(actor)?.shadow_mode
    }

    fn set_shadow_mode(&mut self, actor: ActorId, mode: ShadowMode) {
        if let Some(node) = self.actors.get_mut(actor)
            && node.shadow_mode.is_some()
        {
            node.shadow_mode = Some(mode);
        }
    }

    fn create_shadow_actor(&mut self, name: &str) -> ActorId {
        let actor = self.actors.insert(ActorNode::new(name));
        let mut inner = ActorNode::new("shadow bin");
        inner.style_classes.push("shadow".to_string());
        inner.parent = Some(actor);
        let inner = self.actors.insert(inner);
        self.actors[actor].children.push(inner);
        actor
    }

    fn destroy_actor(&mut self, actor: ActorId) {
        let Some(node) = self.actors.remove(actor) else {
            return;
        };
        for child in node.children {
            self.destroy_actor(child);
        }
        if let Some(parent) = node.parent.and_then(|p| self.actors.get_mut(p)) {
            parent.children.retain(|c| *c != actor);
        }
        self.window_group.retain(|a| *a != actor);
        self.bindings.retain(|_, b| b.source != actor && b.target != actor);
    }

    fn insert_below(&mut self, actor: ActorId, sibling: ActorId) {
        if !self.actors.contains_key(actor) {
            return;
        }
        self.window_group.retain(|a| *a != actor);
        let index = self.window_group.iter().position(|a| *a == sibling).unwrap_or(0);
        self.window_group.insert(index, actor);
    }

    fn set_child_below_sibling(&mut self, actor: ActorId, sibling: ActorId) {
        if self.window_group.contains(&actor) && self.window_group.contains(&sibling) {
            self.insert_below(actor, sibling);
        }
    }

    fn remove_from_window_group(&mut self, actor: ActorId) {
        self.window_group.retain(|a| *a != actor);
    }

    fn add_bind_constraint(&mut self, actor: ActorId, source: ActorId, coordinate: BindCoordinate) {
        if let Some(node) = self.actors.get_mut(actor) {
            node.constraints.push(BindConstraint { source, coordinate, offset: 0.0 });
        }
    }

    fn set_bind_constraint_offset(&mut self, actor: ActorId, index: usize, offset: f64) -> bool {
        let Some(constraint) =
            self.actors.get_mut(actor).and_then(|node| node.constraints.get_mut(index))
        else {
            return false;
        };
        constraint.offset = offset;
        true
    }

    fn bind_property(
        &mut self,
        source: ActorId,
        target: ActorId,
        property: ActorProperty,
    ) -> BindingId {
        let binding = self.bindings.insert(PropertyBinding { source, target, property });
        // Sync on creation.
        if let Some(value) = self.read_property(source, property) {
            self.write_property(target, property, value);
        }
        binding
    }

    fn unbind(&mut self, binding: BindingId) { self.bindings.remove(binding); }

    fn add_effect(&mut self, actor: ActorId, name: &str, kind: EffectKind) {
        let Some(node) = self.actors.get_mut(actor) else {
            return;
        };
        node.effects.retain(|effect| effect.name != name);
        node.effects.push(HeadlessEffect {
            name: name.to_string(),
            kind,
            enabled: true,
            uniforms: None,
            uniform_updates: 0,
        });
    }

    fn remove_effect(&mut self, actor: ActorId, name: &str) {
        if let Some(node) = self.actors.get_mut(actor) {
            node.effects.retain(|effect| effect.name != name);
        }
    }

    fn clear_effects(&mut self, actor: ActorId) {
        if let Some(node) = self.actors.get_mut(actor) {
            node.effects.clear();
        }
    }

    fn rounded_effect_mut(
        &mut self,
        actor: ActorId,
        name: &str,
    ) -> Option<&mut dyn RoundedCornersEffect> {
        let effect = self
            .actors
            .get_mut(actor)?
            .effects
            .iter_mut()
            .find(|effect| effect.name == name && effect.kind == EffectKind::RoundedCorners)?;
        Some(effect as &mut dyn RoundedCornersEffect)
    }

    fn set_style(&mut self, actor: ActorId, style: &str) {
        if let Some(node) = self.actors.get_mut(actor) {
            node.style = style.to_string();
        }
    }

    fn queue_redraw(&mut self, actor: ActorId) {
        if let Some(node) = self.actors.get_mut(actor) {
            node.redraws += 1;
        }
    }

    fn queue_relayout(&mut self, actor: ActorId) {
        if let Some(node) = self.actors.get_mut(actor) {
            node.relayouts += 1;
        }
    }
}

impl SignalSource<Subject> for HeadlessCompositor {
    type Handler = Handler;
    type HandlerId = HandlerId;

    fn connect(&mut self, subject: &Subject, signal: &str, handler: Handler) -> HandlerId {
        self.next_seq += 1;
        let connection = Connection {
            subject: *subject,
            seq: self.next_seq,
            handler,
        };
        self.handlers.insert((connection, signal.to_string()))
    }

    fn disconnect(&mut self, _subject: &Subject, id: HandlerId) { self.handlers.remove(id); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(title: &str, client_type: ClientType) -> WindowInfo {
        WindowInfo {
            title: title.to_string(),
            client_type,
            frame_rect: Rect::new(0.0, 0.0, 400.0, 300.0),
            buffer_rect: Rect::new(0.0, 0.0, 400.0, 300.0),
            ..WindowInfo::default()
        }
    }

    #[test]
    fn visible_binding_follows_source_until_unbound() {
        let mut compositor = HeadlessCompositor::new(vec![1.0]);
        let actor = compositor.add_window(WindowId::new(1), window("a", ClientType::Wayland));
        let shadow = compositor.create_shadow_actor("shadow");

        compositor.set_visible(actor, false);
        let binding = compositor.bind_property(actor, shadow, ActorProperty::Visible);
        assert!(!compositor.is_visible(shadow), "binding syncs on creation");

        compositor.set_visible(actor, true);
        assert!(compositor.is_visible(shadow));

        compositor.unbind(binding);
        compositor.set_visible(actor, false);
        assert!(compositor.is_visible(shadow));
    }

    #[test]
    fn insert_below_places_actor_directly_under_sibling() {
        let mut compositor = HeadlessCompositor::new(vec![1.0]);
        let a = compositor.add_window(WindowId::new(1), window("a", ClientType::Wayland));
        let b = compositor.add_window(WindowId::new(2), window("b", ClientType::Wayland));
        let shadow = compositor.create_shadow_actor("shadow");

        compositor.insert_below(shadow, b);
        assert_eq!(compositor.window_group(), &[a, shadow, b]);

        compositor.raise_window(WindowId::new(1));
        compositor.set_child_below_sibling(shadow, a);
        assert_eq!(compositor.window_group(), &[b, shadow, a]);
    }

    #[test]
    fn destroying_an_actor_drops_its_bindings_and_children() {
        let mut compositor = HeadlessCompositor::new(vec![1.0]);
        let actor = compositor.add_window(WindowId::new(1), window("a", ClientType::X11));
        let shadow = compositor.create_shadow_actor("shadow");
        compositor.bind_property(actor, shadow, ActorProperty::ScaleX);
        let before = compositor.actor_count();

        compositor.destroy_actor(shadow);

        assert_eq!(compositor.binding_count(), 0);
        assert_eq!(compositor.actor_count(), before - 2);
    }

    #[test]
    fn x11_window_actors_have_native_shadow() {
        let mut compositor = HeadlessCompositor::new(vec![1.0]);
        let x11 = compositor.add_window(WindowId::new(1), window("x", ClientType::X11));
        let wl = compositor.add_window(WindowId::new(2), window("w", ClientType::Wayland));
        assert_eq!(compositor.shadow_mode(x11), Some(ShadowMode::Auto));
        assert_eq!(compositor.shadow_mode(wl), None);
        assert!(compositor.first_child(x11).is_some());
    }
}
