//! Surface stacking order and hit testing
//!
//! [`SurfaceStack`] is the seam to the scene: the shell asks it to insert,
//! remove, raise and hit-test surfaces. [`InMemorySurfaceStack`] keeps the
//! order in memory (bottom to top, the last surface is the top-most) and is
//! what the headless driver and the tests run against.

use crate::geometry::Point;
use crate::surface::{InputReceptionMode, Surface, SurfaceId};
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub trait SurfaceStack: Send + Sync {
    fn add_surface(&self, surface: &Arc<Surface>, mode: InputReceptionMode);
    fn remove_surface(&self, surface: &Arc<Surface>);
    fn raise(&self, surface: &Arc<Surface>);
    /// Raise a set of surfaces to the top, keeping their relative order
    fn raise_set(&self, surfaces: &[Arc<Surface>]);
    /// Top-most visible surface accepting input at `point`
    fn surface_at(&self, point: Point) -> Option<Arc<Surface>>;
    fn swap_z_order(&self, first: &Arc<Surface>, second: &Arc<Surface>);
    fn send_to_back(&self, surface: &Arc<Surface>);
}

#[derive(Debug, Clone)]
struct StackEntry {
    surface: Arc<Surface>,
    mode: InputReceptionMode,
}

#[derive(Debug, Default)]
struct StackState {
    /// Bottom to top
    entries: Vec<StackEntry>,
    /// Surface id -> index in `entries`
    positions: HashMap<SurfaceId, usize>,
}

impl StackState {
    fn push(&mut self, entry: StackEntry) -> bool {
        let id = entry.surface.id();
        if self.positions.contains_key(&id) {
            return false;
        }
        self.positions.insert(id, self.entries.len());
        self.entries.push(entry);
        true
    }

    fn remove(&mut self, id: SurfaceId) -> Option<StackEntry> {
        let position = self.positions.remove(&id)?;
        let entry = self.entries.remove(position);
        self.rebuild_positions();
        Some(entry)
    }

    fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            self.positions.insert(entry.surface.id(), i);
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemorySurfaceStack {
    state: Mutex<StackState>,
}

impl InMemorySurfaceStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface ids from bottom to top
    pub fn render_order(&self) -> Vec<SurfaceId> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|e| e.surface.id())
            .collect()
    }

    pub fn top(&self) -> Option<Arc<Surface>> {
        self.state.lock().entries.last().map(|e| Arc::clone(&e.surface))
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.state.lock().positions.contains_key(&id)
    }

    pub fn position(&self, id: SurfaceId) -> Option<usize> {
        self.state.lock().positions.get(&id).copied()
    }
}

impl SurfaceStack for InMemorySurfaceStack {
    fn add_surface(&self, surface: &Arc<Surface>, mode: InputReceptionMode) {
        let added = self.state.lock().push(StackEntry {
            surface: Arc::clone(surface),
            mode,
        });
        if added {
            debug!("Stack: added surface {}", surface.id());
        }
    }

    fn remove_surface(&self, surface: &Arc<Surface>) {
        if self.state.lock().remove(surface.id()).is_some() {
            debug!("Stack: removed surface {}", surface.id());
        }
    }

    fn raise(&self, surface: &Arc<Surface>) {
        let mut state = self.state.lock();
        if let Some(entry) = state.remove(surface.id()) {
            state.push(entry);
        }
    }

    fn raise_set(&self, surfaces: &[Arc<Surface>]) {
        let mut state = self.state.lock();
        let mut raised: Vec<StackEntry> = Vec::new();
        state.entries.retain(|entry| {
            let in_set = surfaces.iter().any(|s| Arc::ptr_eq(s, &entry.surface));
            if in_set {
                raised.push(entry.clone());
            }
            !in_set
        });
        state.entries.extend(raised);
        state.rebuild_positions();
    }

    fn surface_at(&self, point: Point) -> Option<Arc<Surface>> {
        let state = self.state.lock();
        state
            .entries
            .iter()
            .rev()
            .filter(|e| e.surface.is_visible())
            .find(|e| {
                e.mode == InputReceptionMode::ReceivesAllInput
                    || e.surface.input_area_contains(point)
            })
            .map(|e| Arc::clone(&e.surface))
    }

    fn swap_z_order(&self, first: &Arc<Surface>, second: &Arc<Surface>) {
        let mut state = self.state.lock();
        let a = state.positions.get(&first.id()).copied();
        let b = state.positions.get(&second.id()).copied();
        if let (Some(a), Some(b)) = (a, b) {
            state.entries.swap(a, b);
            state.rebuild_positions();
        }
    }

    fn send_to_back(&self, surface: &Arc<Surface>) {
        let mut state = self.state.lock();
        if let Some(entry) = state.remove(surface.id()) {
            state.entries.insert(0, entry);
            state.rebuild_positions();
        }
    }
}
