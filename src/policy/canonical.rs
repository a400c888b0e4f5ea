//! The default window management policy
//!
//! Places new windows (beside their parent's anchor rectangle, cascaded
//! from the session's first window, or centred a little above the middle
//! of the active display), tracks per-surface state for maximize/restore,
//! and implements the stock key and pointer bindings:
//!
//! | Input | Action |
//! |---|---|
//! | Alt+F11 / Shift+F11 / Ctrl+F11 | toggle maximized / vertically / horizontally maximized |
//! | Ctrl+F4 | ask the focused session's default surface to close |
//! | Alt+F4 | ask every surface of the focused session to close |
//! | Alt+Tab / Alt+Shift+Tab | focus next / previous session |
//! | click or tap | focus and raise the window tree under the cursor |
//! | Alt+drag (primary / tertiary button) | move / resize |
//! | three-finger drag | move |
//!
//! The policy keeps its bookkeeping behind one mutex and never holds it
//! while calling back into the shell or into surfaces.

use super::{FocusController, PolicyFactory, SurfaceBuilder, WindowManagerPolicy};
use crate::config::{FocusConfig, PlacementConfig, ShellConfig};
use crate::error::ShellResult;
use crate::geometry::{Displacement, Point, Rectangle, Size};
use crate::input::{
    keys, KeyAction, KeyboardEvent, Modifiers, PointerAction, PointerEvent, TouchAction,
    TouchEvent,
};
use crate::session::{Session, SessionId};
use crate::surface::{
    Surface, SurfaceAttribute, SurfaceCreationParameters, SurfaceId, SurfaceSpecification,
    SurfaceState,
};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// What the policy remembers about each surface it placed
#[derive(Debug, Clone)]
struct CanonicalSurfaceInfo {
    session: Weak<Session>,
    parent: Weak<Surface>,
    state: SurfaceState,
    restore_rect: Rectangle,
    min_width: Option<i32>,
    min_height: Option<i32>,
    max_width: Option<i32>,
    max_height: Option<i32>,
    children: Vec<Weak<Surface>>,
}

#[derive(Debug, Default, Clone, Copy)]
struct CanonicalSessionInfo {
    surfaces: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureKind {
    Move,
    Resize,
}

/// A client-initiated move or resize, driven by pointer motion until the
/// button is released
#[derive(Debug, Clone)]
struct Gesture {
    kind: GestureKind,
    surface: Weak<Surface>,
}

#[derive(Debug)]
struct PolicyState {
    surfaces: HashMap<SurfaceId, CanonicalSurfaceInfo>,
    sessions: HashMap<SessionId, CanonicalSessionInfo>,
    displays: Vec<Rectangle>,
    display_area: Rectangle,
    active_surface: Weak<Surface>,
    old_cursor: Point,
    gesture: Option<Gesture>,
    dragging_and_dropping: bool,
}

impl PolicyState {
    fn new(default_display: Rectangle) -> Self {
        Self {
            surfaces: HashMap::new(),
            sessions: HashMap::new(),
            displays: Vec::new(),
            display_area: default_display,
            active_surface: Weak::new(),
            old_cursor: Point::default(),
            gesture: None,
            dragging_and_dropping: false,
        }
    }

    /// The display a rectangle lives on: the one holding its top-left
    /// corner, else the first one it overlaps, else the whole display area
    fn output_for(&self, rect: &Rectangle) -> Rectangle {
        self.displays
            .iter()
            .find(|d| d.contains(rect.top_left))
            .or_else(|| self.displays.iter().find(|d| d.overlaps(rect)))
            .copied()
            .unwrap_or(self.display_area)
    }

    fn active_display(&self) -> Rectangle {
        if let Some(active) = self.active_surface.upgrade() {
            if let Some(display) = self.displays.iter().find(|d| d.contains(active.top_left())) {
                return *display;
            }
        }
        self.displays
            .iter()
            .find(|d| d.contains(self.old_cursor))
            .or_else(|| self.displays.first())
            .copied()
            .unwrap_or(self.display_area)
    }

    /// `root` followed by all its descendants, depth first
    fn tree_of(&self, root: &Arc<Surface>) -> Vec<Arc<Surface>> {
        let mut tree = vec![Arc::clone(root)];
        let mut index = 0;
        while index < tree.len() {
            if let Some(info) = self.surfaces.get(&tree[index].id()) {
                let children: Vec<_> = info.children.iter().filter_map(Weak::upgrade).collect();
                tree.extend(children);
            }
            index += 1;
        }
        tree
    }
}

pub struct CanonicalWindowManagerPolicy {
    tools: Weak<dyn FocusController>,
    placement: PlacementConfig,
    focus: FocusConfig,
    state: Mutex<PolicyState>,
}

impl CanonicalWindowManagerPolicy {
    pub fn new(tools: Weak<dyn FocusController>, config: &ShellConfig) -> Self {
        Self {
            tools,
            placement: config.placement.clone(),
            focus: config.focus.clone(),
            state: Mutex::new(PolicyState::new(config.placement.default_display)),
        }
    }

    /// Factory suitable for [`crate::shell::Shell::new`]
    pub fn factory(config: ShellConfig) -> PolicyFactory {
        Box::new(move |tools: Weak<dyn FocusController>| {
            let policy = CanonicalWindowManagerPolicy::new(tools, &config);
            Box::new(policy) as Box<dyn WindowManagerPolicy>
        })
    }

    fn tools(&self) -> Option<Arc<dyn FocusController>> {
        self.tools.upgrade()
    }

    /// Bounding rectangle of all known displays
    pub fn display_area(&self) -> Rectangle {
        self.state.lock().display_area
    }

    /// The surface the bindings act on: the last one selected, else the
    /// focused session's default surface
    fn active_surface(&self) -> Option<Arc<Surface>> {
        let selected = self.state.lock().active_surface.upgrade();
        selected.or_else(|| {
            self.tools()
                .and_then(|tools| tools.focused_session())
                .and_then(|session| session.default_surface())
        })
    }

    fn place_new_surface(
        &self,
        state: &PolicyState,
        session: &Session,
        mut params: SurfaceCreationParameters,
    ) -> SurfaceCreationParameters {
        let active_display = state.active_display();
        let width = params.size.width;
        let height = params.size.height;
        let mut positioned = false;

        if params.parent.is_none() {
            if let Some(default_surface) = session.default_surface() {
                let offset = Displacement::new(
                    self.placement.title_bar_height,
                    self.placement.title_bar_height,
                );
                params.top_left = default_surface.top_left() + offset;

                let display_for_app = state.output_for(&Rectangle::new(
                    default_surface.top_left(),
                    default_surface.window_size(),
                ));
                positioned =
                    display_for_app.overlaps(&Rectangle::new(params.top_left, params.size));
            }
        }

        if let (Some(parent), Some(aux_rect), Some(edge)) =
            (&params.parent, params.aux_rect, params.edge_attachment)
        {
            let parent_offset = parent.top_left() - Point::default();
            let top_left = aux_rect.top_left + parent_offset;
            let top_right = aux_rect.top_right() + parent_offset;
            let bottom_left = aux_rect.bottom_left() + parent_offset;

            if edge.allows_vertical() {
                if active_display.contains(top_right + Displacement::new(width, height)) {
                    params.top_left = top_right;
                    positioned = true;
                } else if active_display.contains(top_left + Displacement::new(-width, height)) {
                    params.top_left = top_left + Displacement::new(-width, 0);
                    positioned = true;
                }
            }

            if edge.allows_horizontal() {
                if active_display.contains(bottom_left + Displacement::new(width, height)) {
                    params.top_left = bottom_left;
                    positioned = true;
                } else if active_display.contains(top_left + Displacement::new(width, -height)) {
                    params.top_left = top_left + Displacement::new(0, -height);
                    positioned = true;
                }
            }
        }

        if !positioned {
            let centred = active_display.top_left
                + Displacement::new(
                    (active_display.size.width - width) / 2,
                    (active_display.size.height - height) / 2,
                );
            params.top_left =
                centred - Displacement::new(0, (active_display.size.height - height) / 6);

            if params.top_left.y < state.display_area.top() {
                params.top_left.y = state.display_area.top();
            }
        }

        debug!(
            "Placed '{}' at ({}, {}) size {}x{}",
            params.name, params.top_left.x, params.top_left.y, width, height
        );
        params
    }

    /// Focus and raise `surface`, or its nearest ancestor that can take focus
    fn select_active_surface(&self, surface: Option<Arc<Surface>>) {
        let mut candidate = surface;
        while let Some(surface) = candidate {
            let session = {
                let state = self.state.lock();
                match state.surfaces.get(&surface.id()) {
                    Some(info) => info.session.upgrade(),
                    None => return,
                }
            };

            if surface.surface_type().can_take_focus() {
                if let Some(tools) = self.tools() {
                    if let Err(e) = tools.set_focus_to(session.as_ref(), Some(&surface)) {
                        warn!("Could not focus surface {}: {}", surface.id(), e);
                    }
                }
                self.raise_tree(&surface);
                self.state.lock().active_surface = Arc::downgrade(&surface);
                return;
            }

            // Cannot have input focus - try the parent
            candidate = surface.parent();
        }

        self.state.lock().active_surface = Weak::new();
    }

    fn raise_tree(&self, root: &Arc<Surface>) {
        let tree = self.state.lock().tree_of(root);
        if let Some(tools) = self.tools() {
            tools.raise(&tree);
        }
    }

    fn move_tree(&self, root: &Arc<Surface>, movement: Displacement) {
        if movement == Displacement::default() {
            return;
        }
        let tree = self.state.lock().tree_of(root);
        for surface in tree {
            surface.move_to(surface.top_left() + movement);
        }
    }

    fn click(&self, cursor: Point) {
        if self.focus.click_to_focus {
            let hit = self.tools().and_then(|tools| tools.surface_at(cursor));
            if hit.is_some() {
                self.select_active_surface(hit);
            }
        }
        self.state.lock().old_cursor = cursor;
    }

    fn drag(&self, cursor: Point) {
        let old_cursor = self.state.lock().old_cursor;
        let hit = self.tools().and_then(|tools| tools.surface_at(old_cursor));
        self.select_active_surface(hit);
        if let Some(surface) = self.active_surface() {
            self.drag_surface(&surface, cursor, old_cursor);
        }
        self.state.lock().old_cursor = cursor;
    }

    fn resize(&self, cursor: Point) {
        let old_cursor = self.state.lock().old_cursor;
        let hit = self.tools().and_then(|tools| tools.surface_at(old_cursor));
        self.select_active_surface(hit);
        if let Some(surface) = self.active_surface() {
            self.resize_surface(&surface, cursor, old_cursor);
        }
        self.state.lock().old_cursor = cursor;
    }

    /// Continue a client-initiated move or resize
    fn continue_gesture(&self, gesture: &Gesture, cursor: Point) -> bool {
        let Some(surface) = gesture.surface.upgrade() else {
            return false;
        };
        let old_cursor = self.state.lock().old_cursor;
        let handled = match gesture.kind {
            GestureKind::Move => self.drag_surface(&surface, cursor, old_cursor),
            GestureKind::Resize => self.resize_surface(&surface, cursor, old_cursor),
        };
        self.state.lock().old_cursor = cursor;
        handled
    }

    fn drag_surface(&self, surface: &Arc<Surface>, to: Point, from: Point) -> bool {
        if !surface.input_area_contains(from) {
            return false;
        }

        let bounds = self.display_area();
        let top_left = surface.top_left();
        let bottom_right = top_left + surface.window_size().as_displacement();

        let mut movement = to - from;
        if movement.dx < 0 {
            movement.dx = movement.dx.max((bounds.top_left - top_left).dx);
        }
        if movement.dy < 0 {
            movement.dy = movement.dy.max((bounds.top_left - top_left).dy);
        }
        if movement.dx > 0 {
            movement.dx = movement.dx.min((bounds.bottom_right() - bottom_right).dx);
        }
        if movement.dy > 0 {
            movement.dy = movement.dy.min((bounds.bottom_right() - bottom_right).dy);
        }

        self.move_tree(surface, movement);
        true
    }

    /// Resize by dragging whichever corner is nearest the grab point
    fn resize_surface(&self, surface: &Arc<Surface>, cursor: Point, old_cursor: Point) -> bool {
        if !surface.input_area_contains(old_cursor) {
            return false;
        }

        let top_left = surface.top_left();
        let old_pos = Rectangle::new(top_left, surface.window_size());

        let mut anchor = top_left;
        for corner in [old_pos.top_right(), old_pos.bottom_left(), old_pos.bottom_right()] {
            if (old_cursor - anchor).length_squared() < (old_cursor - corner).length_squared() {
                anchor = corner;
            }
        }

        let left_resize = anchor.x != top_left.x;
        let top_resize = anchor.y != top_left.y;
        let x_sign = if left_resize { -1 } else { 1 };
        let y_sign = if top_resize { -1 } else { 1 };

        let delta = cursor - old_cursor;
        let new_size = Size::new(
            old_pos.size.width + x_sign * delta.dx,
            old_pos.size.height + y_sign * delta.dy,
        );
        let new_pos = top_left
            + Displacement::new(
                if left_resize { delta.dx } else { 0 },
                if top_resize { delta.dy } else { 0 },
            );

        self.constrained_resize(surface, new_pos, new_size, left_resize, top_resize)
    }

    /// Apply a resize honouring min/max limits, the display area and the
    /// surface's maximized state
    fn constrained_resize(
        &self,
        surface: &Arc<Surface>,
        mut new_pos: Point,
        mut new_size: Size,
        left_resize: bool,
        top_resize: bool,
    ) -> bool {
        let (info, bounds) = {
            let state = self.state.lock();
            match state.surfaces.get(&surface.id()) {
                Some(info) => (info.clone(), state.display_area),
                None => return false,
            }
        };

        if let Some(min_width) = info.min_width.filter(|&w| w > new_size.width) {
            if left_resize {
                new_pos.x += min_width - new_size.width;
            }
            new_size.width = min_width;
        }

        if let Some(min_height) = info.min_height.filter(|&h| h > new_size.height) {
            if top_resize {
                new_pos.y += min_height - new_size.height;
            }
            new_size.height = min_height;
        }

        if let Some(max_width) = info.max_width.filter(|&w| w < new_size.width) {
            if left_resize {
                new_pos.x += max_width - new_size.width;
            }
            new_size.width = max_width;
        }

        if let Some(max_height) = info.max_height.filter(|&h| h < new_size.height) {
            if top_resize {
                new_pos.y += max_height - new_size.height;
            }
            new_size.height = max_height;
        }

        if left_resize {
            if new_pos.x < bounds.left() {
                new_size.width += new_pos.x - bounds.left();
                new_pos.x = bounds.left();
            }
        } else {
            let to_bottom_right = bounds.bottom_right() - (new_pos + new_size.as_displacement());
            if to_bottom_right.dx < 0 {
                new_size.width += to_bottom_right.dx;
            }
        }

        if top_resize {
            if new_pos.y < bounds.top() {
                new_size.height += new_pos.y - bounds.top();
                new_pos.y = bounds.top();
            }
        } else {
            let to_bottom_right = bounds.bottom_right() - (new_pos + new_size.as_displacement());
            if to_bottom_right.dy < 0 {
                new_size.height += to_bottom_right.dy;
            }
        }

        match info.state {
            SurfaceState::Restored => {}
            // Anchored to the top and bottom of the workspace, any width
            SurfaceState::VertMaximized => {
                new_pos.y = surface.top_left().y;
                new_size.height = surface.window_size().height;
            }
            // Anchored to the left and right of the workspace, any height
            SurfaceState::HorizMaximized => {
                new_pos.x = surface.top_left().x;
                new_size.width = surface.window_size().width;
            }
            _ => return true,
        }

        surface.resize(new_size);
        self.move_tree(surface, new_pos - surface.top_left());
        true
    }

    fn toggle(&self, requested: SurfaceState) {
        let Some(surface) = self.active_surface() else {
            return;
        };

        let current = self
            .state
            .lock()
            .surfaces
            .get(&surface.id())
            .map(|info| info.state);
        let target = if current == Some(requested) {
            SurfaceState::Restored
        } else {
            requested
        };

        let effective = self.handle_set_state(&surface, target);
        if let Err(e) = surface.configure(SurfaceAttribute::State, effective.as_raw()) {
            warn!("Failed to apply state {:?} to surface {}: {}", effective, surface.id(), e);
        }
    }

    fn cycle_sessions(&self, backwards: bool) {
        let Some(tools) = self.tools() else {
            return;
        };
        let result = if backwards {
            tools.focus_prev_session()
        } else {
            tools.focus_next_session()
        };
        if let Err(e) = result {
            warn!("Session cycling failed: {}", e);
            return;
        }
        if let Some(surface) = tools.focused_surface() {
            self.raise_tree(&surface);
        }
    }
}

impl WindowManagerPolicy for CanonicalWindowManagerPolicy {
    fn add_session(&self, session: &Arc<Session>) {
        self.state
            .lock()
            .sessions
            .insert(session.id(), CanonicalSessionInfo::default());
    }

    fn remove_session(&self, session: &Arc<Session>) {
        self.state.lock().sessions.remove(&session.id());
    }

    fn add_surface(
        &self,
        session: &Arc<Session>,
        params: SurfaceCreationParameters,
        build: &mut SurfaceBuilder<'_>,
    ) -> ShellResult<Arc<Surface>> {
        let placed = {
            let state = self.state.lock();
            self.place_new_surface(&state, session, params)
        };
        let limits = (placed.min_width, placed.min_height, placed.max_width, placed.max_height);

        let surface = build(session, placed)?;

        let focusable = surface.surface_type().can_take_focus();
        {
            let mut state = self.state.lock();
            if let Some(parent) = surface.parent() {
                if let Some(parent_info) = state.surfaces.get_mut(&parent.id()) {
                    parent_info.children.push(Arc::downgrade(&surface));
                }
            }

            state.sessions.entry(session.id()).or_default().surfaces += 1;

            let (min_width, min_height, max_width, max_height) = limits;
            state.surfaces.insert(
                surface.id(),
                CanonicalSurfaceInfo {
                    session: Arc::downgrade(session),
                    parent: surface.parent().as_ref().map(Arc::downgrade).unwrap_or_default(),
                    state: surface.state(),
                    restore_rect: Rectangle::new(surface.top_left(), surface.window_size()),
                    min_width,
                    min_height,
                    max_width,
                    max_height,
                    children: Vec::new(),
                },
            );

            if focusable {
                state.active_surface = Arc::downgrade(&surface);
            }
        }

        if focusable && self.focus.focus_new_surfaces {
            if let Some(tools) = self.tools() {
                if let Err(e) = tools.set_focus_to(Some(session), Some(&surface)) {
                    warn!("Could not focus new surface {}: {}", surface.id(), e);
                }
            }
        }

        Ok(surface)
    }

    fn modify_surface(
        &self,
        _session: &Arc<Session>,
        surface: &Arc<Surface>,
        modifications: &SurfaceSpecification,
    ) {
        if let Some(name) = &modifications.name {
            surface.rename(name);
        }

        {
            let mut state = self.state.lock();
            let Some(info) = state.surfaces.get_mut(&surface.id()) else {
                return;
            };
            if modifications.min_width.is_some() {
                info.min_width = modifications.min_width;
            }
            if modifications.min_height.is_some() {
                info.min_height = modifications.min_height;
            }
            if modifications.max_width.is_some() {
                info.max_width = modifications.max_width;
            }
            if modifications.max_height.is_some() {
                info.max_height = modifications.max_height;
            }
        }

        if modifications.width.is_some() || modifications.height.is_some() {
            let current = surface.window_size();
            let new_size = Size::new(
                modifications.width.unwrap_or(current.width),
                modifications.height.unwrap_or(current.height),
            );
            self.constrained_resize(surface, surface.top_left(), new_size, false, false);
        }

        if let Some(top_left) = modifications.top_left {
            self.move_tree(surface, top_left - surface.top_left());
        }

        if let Some(requested) = modifications.state {
            let effective = self.handle_set_state(surface, requested);
            if let Err(e) = surface.configure(SurfaceAttribute::State, effective.as_raw()) {
                warn!("Failed to apply state to surface {}: {}", surface.id(), e);
            }
        }
    }

    fn remove_surface(&self, session: &Arc<Session>, surface: &Arc<Surface>) {
        let session_emptied = {
            let mut state = self.state.lock();
            if let Some(info) = state.surfaces.remove(&surface.id()) {
                if let Some(parent) = info.parent.upgrade() {
                    if let Some(parent_info) = state.surfaces.get_mut(&parent.id()) {
                        parent_info
                            .children
                            .retain(|c| !std::ptr::eq(c.as_ptr(), Arc::as_ptr(surface)));
                    }
                }
            }
            if std::ptr::eq(state.active_surface.as_ptr(), Arc::as_ptr(surface)) {
                state.active_surface = Weak::new();
            }
            match state.sessions.get_mut(&session.id()) {
                Some(info) => {
                    info.surfaces = info.surfaces.saturating_sub(1);
                    info.surfaces == 0
                }
                None => false,
            }
        };

        if !session_emptied {
            return;
        }

        if let Some(tools) = self.tools() {
            let focused = tools
                .focused_session()
                .map_or(false, |focused| Arc::ptr_eq(&focused, session));
            if focused {
                if let Err(e) = tools.focus_next_session() {
                    warn!("Could not move focus off session {}: {}", session.id(), e);
                }
                if let Some(next) = tools.focused_surface() {
                    tools.raise(&[next]);
                }
            }
        }
    }

    fn add_display(&self, area: Rectangle) {
        let mut state = self.state.lock();
        state.displays.push(area);
        state.display_area = Rectangle::bounding(&state.displays).unwrap_or(area);
        debug!("Display area is now {:?}", state.display_area);
    }

    fn remove_display(&self, area: Rectangle) {
        let mut state = self.state.lock();
        if let Some(index) = state.displays.iter().position(|d| *d == area) {
            state.displays.remove(index);
        }
        state.display_area = Rectangle::bounding(&state.displays)
            .unwrap_or(self.placement.default_display);
    }

    fn handle_keyboard_event(&self, event: &KeyboardEvent) -> bool {
        if event.action != KeyAction::Down {
            return false;
        }

        let modifiers = event.modifiers;
        match event.scan_code {
            keys::KEY_F11 => {
                let state = match modifiers {
                    Modifiers::ALT => SurfaceState::Maximized,
                    Modifiers::SHIFT => SurfaceState::VertMaximized,
                    Modifiers::CTRL => SurfaceState::HorizMaximized,
                    _ => return false,
                };
                self.toggle(state);
                true
            }
            keys::KEY_F4 => {
                let Some(session) = self.tools().and_then(|tools| tools.focused_session()) else {
                    return false;
                };
                match modifiers {
                    Modifiers::ALT => {
                        for surface in session.surfaces() {
                            surface.request_client_surface_close();
                        }
                        true
                    }
                    Modifiers::CTRL => match session.default_surface() {
                        Some(surface) => {
                            surface.request_client_surface_close();
                            true
                        }
                        None => false,
                    },
                    _ => false,
                }
            }
            keys::KEY_TAB if modifiers.alt && !modifiers.ctrl && !modifiers.meta => {
                self.cycle_sessions(modifiers.shift);
                true
            }
            _ => false,
        }
    }

    fn handle_touch_event(&self, event: &TouchEvent) -> bool {
        let Some(cursor) = event.centroid() else {
            return false;
        };

        let mut is_drag = true;
        for point in &event.points {
            match point.action {
                TouchAction::Up => return false,
                TouchAction::Down => is_drag = false,
                TouchAction::Change => {}
            }
        }

        if is_drag && event.points.len() == 3 {
            self.drag(cursor);
            true
        } else {
            self.click(cursor);
            false
        }
    }

    fn handle_pointer_event(&self, event: &PointerEvent) -> bool {
        let cursor = event.position;

        match event.action {
            PointerAction::ButtonDown => {
                self.click(cursor);
                false
            }
            PointerAction::ButtonUp => {
                let (gesture, dnd) = {
                    let mut state = self.state.lock();
                    let dnd = std::mem::replace(&mut state.dragging_and_dropping, false);
                    (state.gesture.take(), dnd)
                };
                if dnd {
                    if let Some(tools) = self.tools() {
                        tools.clear_drag_and_drop_handle();
                    }
                }
                gesture.is_some()
            }
            PointerAction::Motion => {
                let gesture = self.state.lock().gesture.clone();
                if let Some(gesture) = gesture {
                    if event.buttons.primary {
                        return self.continue_gesture(&gesture, cursor);
                    }
                }

                if event.modifiers == Modifiers::ALT {
                    if event.buttons.primary {
                        self.drag(cursor);
                        return true;
                    }
                    if event.buttons.tertiary {
                        self.resize(cursor);
                        return true;
                    }
                }

                self.state.lock().old_cursor = cursor;
                false
            }
            PointerAction::Enter | PointerAction::Leave => false,
        }
    }

    fn handle_set_state(&self, surface: &Arc<Surface>, requested: SurfaceState) -> SurfaceState {
        let (movement, size, visible) = {
            let mut state = self.state.lock();
            let display_area = state.display_area;
            let old_pos = surface.top_left();
            let output = state.output_for(&Rectangle::new(old_pos, surface.window_size()));

            let Some(info) = state.surfaces.get_mut(&surface.id()) else {
                return surface.state();
            };

            if requested == SurfaceState::Unknown {
                return info.state;
            }

            if info.state == SurfaceState::Restored {
                info.restore_rect = Rectangle::new(old_pos, surface.window_size());
            }

            if info.state == requested {
                return info.state;
            }

            let restore = info.restore_rect;
            let geometry = match requested {
                SurfaceState::Restored => Some((restore.top_left - old_pos, restore.size)),
                SurfaceState::Maximized => {
                    Some((display_area.top_left - old_pos, display_area.size))
                }
                SurfaceState::HorizMaximized => Some((
                    Point::new(display_area.left(), restore.top()) - old_pos,
                    Size::new(display_area.size.width, restore.size.height),
                )),
                SurfaceState::VertMaximized => Some((
                    Point::new(restore.left(), display_area.top()) - old_pos,
                    Size::new(restore.size.width, display_area.size.height),
                )),
                SurfaceState::Fullscreen => Some((output.top_left - old_pos, output.size)),
                _ => None,
            };

            info.state = requested;
            let visible = !matches!(requested, SurfaceState::Minimized | SurfaceState::Hidden);
            match geometry {
                Some((movement, size)) => (movement, Some(size), visible),
                None => (Displacement::default(), None, visible),
            }
        };

        debug!("Surface {} state -> {:?}", surface.id(), requested);

        if visible {
            surface.show();
        } else {
            surface.hide();
        }
        if let Some(size) = size {
            surface.resize(size);
        }
        self.move_tree(surface, movement);

        requested
    }

    fn handle_raise_surface(&self, _session: &Arc<Session>, surface: &Arc<Surface>) {
        self.select_active_surface(Some(Arc::clone(surface)));
    }

    fn handle_request_move(&self, _session: &Arc<Session>, surface: &Arc<Surface>, cursor: Point) {
        let mut state = self.state.lock();
        state.gesture = Some(Gesture {
            kind: GestureKind::Move,
            surface: Arc::downgrade(surface),
        });
        state.old_cursor = cursor;
    }

    fn handle_request_resize(
        &self,
        _session: &Arc<Session>,
        surface: &Arc<Surface>,
        cursor: Point,
    ) {
        let mut state = self.state.lock();
        state.gesture = Some(Gesture {
            kind: GestureKind::Resize,
            surface: Arc::downgrade(surface),
        });
        state.old_cursor = cursor;
    }

    fn handle_request_drag_and_drop(
        &self,
        _session: &Arc<Session>,
        _surface: &Arc<Surface>,
        handle: &[u8],
    ) {
        if let Some(tools) = self.tools() {
            tools.set_drag_and_drop_handle(handle);
            self.state.lock().dragging_and_dropping = true;
        }
    }
}

#[cfg(test)]
mod tests;
