//! The shell: session registry, surface lifecycle and focus
//!
//! [`Shell`] owns the session registry and the focus state, delegates every
//! placement and input decision to its [`WindowManagerPolicy`], and drives
//! the external collaborators (input targeter, surface stack, session event
//! sink) as a result.
//!
//! The policy is constructed by a factory that receives a weak
//! [`FocusController`] handle back to the shell, so the two can call each
//! other without forming a reference cycle.

mod focus;
mod popup;

use crate::error::{ShellError, ShellResult};
use crate::geometry::{Point, Rectangle};
use crate::input::{DeviceStateEvent, InputEvent, InputTargeter};
use crate::observer::Multiplexer;
use crate::policy::{FocusController, PolicyFactory, WindowManagerPolicy};
use crate::report::ShellReport;
use crate::session::{ClientSink, Session, SessionEventSink, SessionListener, SessionRegistry};
use crate::stack::SurfaceStack;
use crate::surface::{
    Surface, SurfaceAttribute, SurfaceCreationParameters, SurfaceSpecification,
};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// External collaborators the shell drives
#[derive(Clone)]
pub struct ShellCollaborators {
    pub input_targeter: Arc<dyn InputTargeter>,
    pub surface_stack: Arc<dyn SurfaceStack>,
    pub session_event_sink: Arc<dyn SessionEventSink>,
    pub report: Arc<dyn ShellReport>,
}

pub struct Shell {
    input_targeter: Arc<dyn InputTargeter>,
    surface_stack: Arc<dyn SurfaceStack>,
    session_event_sink: Arc<dyn SessionEventSink>,
    report: Arc<dyn ShellReport>,
    policy: Box<dyn WindowManagerPolicy>,
    sessions: SessionRegistry,
    listeners: Multiplexer<dyn SessionListener>,
    focus: focus::FocusTracker,
    popups: popup::PopupGrab,
    device_state: Mutex<Option<DeviceStateEvent>>,
}

impl Shell {
    pub fn new(collaborators: ShellCollaborators, policy_factory: PolicyFactory) -> Arc<Self> {
        Arc::new_cyclic(|shell: &Weak<Shell>| {
            let tools: Weak<dyn FocusController> = shell.clone();
            let policy = policy_factory(tools);

            Shell {
                input_targeter: collaborators.input_targeter,
                surface_stack: collaborators.surface_stack,
                session_event_sink: collaborators.session_event_sink,
                report: collaborators.report,
                policy,
                sessions: SessionRegistry::new(),
                listeners: Multiplexer::new(),
                focus: focus::FocusTracker::default(),
                popups: popup::PopupGrab::default(),
                device_state: Mutex::new(None),
            }
        })
    }

    /// Registered sessions in creation order
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        self.sessions.snapshot()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn add_session_listener(&self, listener: Arc<dyn SessionListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_session_listener(&self, listener: &Arc<dyn SessionListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Register a new client session. The session is not focused.
    pub fn open_session(
        &self,
        client_pid: i32,
        name: &str,
        client: Arc<dyn ClientSink>,
    ) -> Arc<Session> {
        let session = Arc::new(Session::new(client_pid, name, client));
        self.sessions.insert(Arc::clone(&session));
        self.listeners.starting(&session);
        self.policy.add_session(&session);
        self.report.opened_session(&session);
        session
    }

    /// Tear down every surface of `session`, then forget the session.
    /// Focus moves on if it was held by the closing session.
    ///
    /// From the start of the call the session can no longer be focused,
    /// and focus is checked again just before the session is forgotten.
    pub fn close_session(&self, session: &Arc<Session>) -> ShellResult<()> {
        {
            let _serialized = self.focus.serializer.lock();
            self.ensure_registered(session)?;
            if !session.mark_closing() {
                return Err(ShellError::SessionClosing(session.id()));
            }
        }
        self.report.closing_session(session);

        for surface in session.surfaces() {
            self.tear_down_surface(session, &surface, false)?;
        }

        self.release_focus_from(session)?;

        self.session_event_sink.handle_session_stopping(session);
        self.listeners.stopping(session);
        self.policy.remove_session(session);

        {
            let _serialized = self.focus.serializer.lock();
            self.release_focus_from(session)?;
            self.sessions.remove(session)?;
        }
        info!("👋 Session {} '{}' closed", session.id(), session.name());
        Ok(())
    }

    /// Create a surface for `session`. Margins are folded into the sizes
    /// before the policy places the surface, and the policy must build it
    /// exactly once.
    pub fn create_surface(
        &self,
        session: &Arc<Session>,
        mut params: SurfaceCreationParameters,
    ) -> ShellResult<Arc<Surface>> {
        self.ensure_registered(session)?;
        params.fold_margins();

        let mut invocations = 0usize;
        let mut built: Vec<(Arc<Session>, Arc<Surface>)> = Vec::new();
        let result = {
            let mut build = |owner: &Arc<Session>,
                             placed: SurfaceCreationParameters|
             -> ShellResult<Arc<Surface>> {
                invocations += 1;
                if invocations > 1 {
                    return Err(ShellError::BuildInvokedRepeatedly(invocations));
                }
                let surface =
                    owner.create_surface(&placed, self.surface_stack.as_ref(), &self.listeners);
                built.push((Arc::clone(owner), Arc::clone(&surface)));
                Ok(surface)
            };
            self.policy.add_surface(session, params, &mut build)
        };

        let outcome = match invocations {
            0 => Err(ShellError::BuildNotInvoked),
            1 => result,
            n => Err(ShellError::BuildInvokedRepeatedly(n)),
        };

        match outcome {
            Ok(surface) => {
                self.report.created_surface(session, &surface);
                Ok(surface)
            }
            Err(e) => {
                // Nothing the failed request built may outlive it
                for (owner, surface) in built {
                    if let Err(undo) = self.tear_down_surface(&owner, &surface, true) {
                        warn!("Could not undo surface {}: {}", surface.id(), undo);
                    }
                }
                Err(e)
            }
        }
    }

    /// Remove `surface` from `session`. Destroying the focused surface moves
    /// focus to the session's next default surface, or to the next session.
    pub fn destroy_surface(
        &self,
        session: &Arc<Session>,
        surface: &Arc<Surface>,
    ) -> ShellResult<()> {
        self.ensure_owned(session, surface)?;
        self.tear_down_surface(session, surface, true)
    }

    fn tear_down_surface(
        &self,
        session: &Arc<Session>,
        surface: &Arc<Surface>,
        retarget_focus: bool,
    ) -> ShellResult<()> {
        self.report.destroying_surface(session, surface);
        self.policy.remove_surface(session, surface);
        session.destroy_surface(surface, self.surface_stack.as_ref(), &self.listeners)?;
        if retarget_focus {
            self.retarget_focus_from(session, surface)?;
        }
        Ok(())
    }

    /// Apply a client modification request. Content-relative sizes are
    /// converted to window sizes first; a request that changes nothing
    /// never reaches the policy.
    pub fn modify_surface(
        &self,
        session: &Arc<Session>,
        surface: &Arc<Surface>,
        modifications: &SurfaceSpecification,
    ) -> ShellResult<()> {
        self.ensure_owned(session, surface)?;

        let window_size = surface.window_size();
        let content_size = surface.content_size();
        let mut window_mods = modifications.clone();
        window_mods.add_frame_padding(
            window_size.width - content_size.width,
            window_size.height - content_size.height,
            surface.content_offset(),
        );

        self.report.update_surface(session, surface, &window_mods);

        if window_mods.is_empty() {
            debug!("Ignoring empty modification of surface {}", surface.id());
            return Ok(());
        }
        self.policy.modify_surface(session, surface, &window_mods);
        Ok(())
    }

    /// Returns the value actually in effect, which the policy may have
    /// changed
    pub fn set_surface_attribute(
        &self,
        session: &Arc<Session>,
        surface: &Arc<Surface>,
        attribute: SurfaceAttribute,
        value: i32,
    ) -> ShellResult<i32> {
        self.ensure_owned(session, surface)?;
        let result = self
            .policy
            .set_surface_attribute(session, surface, attribute, value);
        if let Err(e) = &result {
            warn!("Rejected attribute change on surface {}: {}", surface.id(), e);
        }
        result
    }

    pub fn get_surface_attribute(&self, surface: &Surface, attribute: SurfaceAttribute) -> i32 {
        surface.query(attribute)
    }

    pub fn raise_surface(&self, session: &Arc<Session>, surface: &Arc<Surface>) -> ShellResult<()> {
        self.ensure_owned(session, surface)?;
        self.policy.handle_raise_surface(session, surface);
        Ok(())
    }

    pub fn request_move(
        &self,
        session: &Arc<Session>,
        surface: &Arc<Surface>,
        cursor: Point,
    ) -> ShellResult<()> {
        self.ensure_owned(session, surface)?;
        self.policy.handle_request_move(session, surface, cursor);
        Ok(())
    }

    pub fn request_resize(
        &self,
        session: &Arc<Session>,
        surface: &Arc<Surface>,
        cursor: Point,
    ) -> ShellResult<()> {
        self.ensure_owned(session, surface)?;
        self.policy.handle_request_resize(session, surface, cursor);
        Ok(())
    }

    pub fn request_drag_and_drop(
        &self,
        session: &Arc<Session>,
        surface: &Arc<Surface>,
        handle: &[u8],
    ) -> ShellResult<()> {
        self.ensure_owned(session, surface)?;
        self.policy
            .handle_request_drag_and_drop(session, surface, handle);
        Ok(())
    }

    pub fn set_drag_and_drop_handle(&self, handle: &[u8]) {
        self.input_targeter.set_drag_and_drop_handle(handle);
    }

    pub fn clear_drag_and_drop_handle(&self) {
        self.input_targeter.clear_drag_and_drop_handle();
    }

    pub fn add_display(&self, area: Rectangle) {
        self.report.adding_display(&area);
        self.policy.add_display(area);
    }

    pub fn remove_display(&self, area: Rectangle) {
        self.report.removing_display(&area);
        self.policy.remove_display(area);
    }

    /// Dispatch an input event. Keyboard, touch and pointer events go to the
    /// policy; a device-state snapshot is delivered to the focused surface.
    /// Returns `true` if the event was consumed.
    pub fn handle(&self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Keyboard(key) => self.policy.handle_keyboard_event(key),
            InputEvent::Touch(touch) => self.policy.handle_touch_event(touch),
            InputEvent::Pointer(pointer) => self.policy.handle_pointer_event(pointer),
            InputEvent::DeviceState(state) => {
                *self.device_state.lock() = Some(state.clone());
                match self.focused_surface() {
                    Some(surface) => {
                        surface.consume(event);
                        true
                    }
                    None => false,
                }
            }
            InputEvent::KeyboardResync => false,
        }
    }

    pub fn surface_at(&self, cursor: Point) -> Option<Arc<Surface>> {
        self.surface_stack.surface_at(cursor)
    }

    pub fn raise(&self, surfaces: &[Arc<Surface>]) {
        self.surface_stack.raise_set(surfaces);
        self.report.surfaces_raised(surfaces);
    }

    fn ensure_registered(&self, session: &Arc<Session>) -> ShellResult<()> {
        if self.sessions.contains(session) {
            Ok(())
        } else {
            Err(ShellError::SessionNotRegistered(session.id()))
        }
    }

    fn ensure_owned(&self, session: &Arc<Session>, surface: &Arc<Surface>) -> ShellResult<()> {
        self.ensure_registered(session)?;
        if session.contains(surface) {
            return Ok(());
        }
        if surface.session_id() != session.id() {
            return Err(ShellError::SurfaceNotOwned {
                surface: surface.id(),
                owner: surface.session_id(),
                session: session.id(),
            });
        }
        Err(ShellError::SurfaceNotFound {
            session: session.id(),
            surface: surface.id(),
        })
    }
}

impl FocusController for Shell {
    fn set_focus_to(
        &self,
        session: Option<&Arc<Session>>,
        surface: Option<&Arc<Surface>>,
    ) -> ShellResult<()> {
        Shell::set_focus_to(self, session, surface)
    }

    fn focus_next_session(&self) -> ShellResult<()> {
        Shell::focus_next_session(self)
    }

    fn focus_prev_session(&self) -> ShellResult<()> {
        Shell::focus_prev_session(self)
    }

    fn focused_session(&self) -> Option<Arc<Session>> {
        Shell::focused_session(self)
    }

    fn focused_surface(&self) -> Option<Arc<Surface>> {
        Shell::focused_surface(self)
    }

    fn surface_at(&self, cursor: Point) -> Option<Arc<Surface>> {
        Shell::surface_at(self, cursor)
    }

    fn raise(&self, surfaces: &[Arc<Surface>]) {
        Shell::raise(self, surfaces)
    }

    fn set_popup_grab_tree(&self, root: Option<&Arc<Surface>>) {
        Shell::set_popup_grab_tree(self, root)
    }

    fn set_drag_and_drop_handle(&self, handle: &[u8]) {
        Shell::set_drag_and_drop_handle(self, handle)
    }

    fn clear_drag_and_drop_handle(&self) {
        Shell::clear_drag_and_drop_handle(self)
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell")
            .field("sessions", &self.sessions.len())
            .field("focused_session", &self.focused_session().map(|s| s.id()))
            .field("focused_surface", &self.focused_surface().map(|s| s.id()))
            .finish()
    }
}
