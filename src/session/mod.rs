//! Sessions: the server-side view of one connected client
//!
//! A session owns the surfaces its client created, in creation order. The
//! oldest surviving surface is the session's *default surface*, which is what
//! coarse-grained (session level) focus lands on.

pub mod registry;

use crate::error::{ShellError, ShellResult};
use crate::input::InputEvent;
use crate::observer::Multiplexer;
use crate::stack::SurfaceStack;
use crate::surface::{Surface, SurfaceAttribute, SurfaceCreationParameters, SurfaceId};
use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub use registry::SessionRegistry;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-client outbound channel (the protocol layer implements this)
pub trait ClientSink: Send + Sync {
    fn handle_surface_attribute(
        &self,
        _surface: SurfaceId,
        _attribute: SurfaceAttribute,
        _value: i32,
    ) {
    }
    fn handle_close_request(&self, _surface: SurfaceId) {}
    fn handle_input(&self, _surface: SurfaceId, _event: &InputEvent) {}
}

/// Client sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullClientSink;

impl ClientSink for NullClientSink {}

/// Global session notifications consumed by the display configuration and
/// lifecycle subsystems
pub trait SessionEventSink: Send + Sync {
    fn handle_focus_change(&self, session: &Arc<Session>);
    fn handle_no_focus(&self);
    fn handle_session_stopping(&self, session: &Arc<Session>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSessionEventSink;

impl SessionEventSink for NullSessionEventSink {
    fn handle_focus_change(&self, _session: &Arc<Session>) {}
    fn handle_no_focus(&self) {}
    fn handle_session_stopping(&self, _session: &Arc<Session>) {}
}

/// Session and surface lifecycle observers. Every method defaults to a no-op.
pub trait SessionListener: Send + Sync {
    fn starting(&self, _session: &Arc<Session>) {}
    fn stopping(&self, _session: &Arc<Session>) {}
    fn focused(&self, _session: &Arc<Session>) {}
    fn unfocused(&self) {}
    fn surface_created(&self, _session: &Session, _surface: &Arc<Surface>) {}
    fn destroying_surface(&self, _session: &Session, _surface: &Arc<Surface>) {}
}

impl SessionListener for Multiplexer<dyn SessionListener> {
    fn starting(&self, session: &Arc<Session>) {
        self.for_each(|l| l.starting(session));
    }

    fn stopping(&self, session: &Arc<Session>) {
        self.for_each(|l| l.stopping(session));
    }

    fn focused(&self, session: &Arc<Session>) {
        self.for_each(|l| l.focused(session));
    }

    fn unfocused(&self) {
        self.for_each(|l| l.unfocused());
    }

    fn surface_created(&self, session: &Session, surface: &Arc<Surface>) {
        self.for_each(|l| l.surface_created(session, surface));
    }

    fn destroying_surface(&self, session: &Session, surface: &Arc<Surface>) {
        self.for_each(|l| l.destroying_surface(session, surface));
    }
}

pub struct Session {
    id: SessionId,
    pid: i32,
    name: String,
    client: Arc<dyn ClientSink>,
    surfaces: Mutex<Vec<Arc<Surface>>>,
    closing: AtomicBool,
}

impl Session {
    pub fn new(pid: i32, name: impl Into<String>, client: Arc<dyn ClientSink>) -> Self {
        Self {
            id: SessionId::next(),
            pid,
            name: name.into(),
            client,
            surfaces: Mutex::new(Vec::new()),
            closing: AtomicBool::new(false),
        }
    }

    /// Set once the shell starts closing the session. A closing session
    /// can no longer be focused.
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    /// Returns false if the session was already closing
    pub(crate) fn mark_closing(&self) -> bool {
        !self.closing.swap(true, Ordering::SeqCst)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn process_id(&self) -> i32 {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client_sink(&self) -> &Arc<dyn ClientSink> {
        &self.client
    }

    /// The oldest surviving surface
    pub fn default_surface(&self) -> Option<Arc<Surface>> {
        self.surfaces.lock().first().cloned()
    }

    /// Snapshot of the owned surfaces in creation order
    pub fn surfaces(&self) -> Vec<Arc<Surface>> {
        self.surfaces.lock().clone()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.lock().len()
    }

    pub fn has_surfaces(&self) -> bool {
        !self.surfaces.lock().is_empty()
    }

    pub fn surface(&self, id: SurfaceId) -> Option<Arc<Surface>> {
        self.surfaces.lock().iter().find(|s| s.id() == id).cloned()
    }

    pub fn contains(&self, surface: &Surface) -> bool {
        self.surfaces
            .lock()
            .iter()
            .any(|s| std::ptr::eq(s.as_ref(), surface))
    }

    /// The next surface after `before` (wrapping) that can take focus
    pub fn surface_after(&self, before: &Surface) -> ShellResult<Option<Arc<Surface>>> {
        let surfaces = self.surfaces.lock();
        let position = surfaces
            .iter()
            .position(|s| std::ptr::eq(s.as_ref(), before))
            .ok_or(ShellError::SurfaceNotFound {
                session: self.id,
                surface: before.id(),
            })?;

        let next = surfaces[position + 1..]
            .iter()
            .chain(surfaces[..position].iter())
            .find(|s| s.surface_type().can_take_focus())
            .cloned();
        Ok(next)
    }

    /// Materialize a surface from placed parameters, add it to the stack and
    /// tell the listeners.
    pub(crate) fn create_surface(
        &self,
        params: &SurfaceCreationParameters,
        stack: &dyn SurfaceStack,
        listener: &dyn SessionListener,
    ) -> Arc<Surface> {
        let surface = Arc::new(Surface::new(self.id, params, Arc::clone(&self.client)));
        stack.add_surface(&surface, params.input_mode);
        self.surfaces.lock().push(Arc::clone(&surface));

        debug!(
            "Session {} ({}) created surface {} '{}'",
            self.id,
            self.name,
            surface.id(),
            params.name
        );
        listener.surface_created(self, &surface);
        surface
    }

    /// Remove an owned surface. Listeners hear about it while the surface is
    /// still owned.
    pub(crate) fn destroy_surface(
        &self,
        surface: &Arc<Surface>,
        stack: &dyn SurfaceStack,
        listener: &dyn SessionListener,
    ) -> ShellResult<()> {
        let not_found = ShellError::SurfaceNotFound {
            session: self.id,
            surface: surface.id(),
        };

        if !self.contains(surface) {
            return Err(not_found);
        }

        listener.destroying_surface(self, surface);

        {
            let mut surfaces = self.surfaces.lock();
            let position = surfaces
                .iter()
                .position(|s| Arc::ptr_eq(s, surface))
                .ok_or(not_found)?;
            surfaces.remove(position);
        }

        stack.remove_surface(surface);
        debug!("Session {} destroyed surface {}", self.id, surface.id());
        Ok(())
    }

    pub fn hide(&self) {
        for surface in self.surfaces() {
            surface.hide();
        }
    }

    pub fn show(&self) {
        for surface in self.surfaces() {
            surface.show();
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("surfaces", &self.surface_count())
            .finish()
    }
}

#[cfg(test)]
mod tests;
