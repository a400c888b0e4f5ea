//! Focus state machine
//!
//! The shell tracks one focused session and at most one focused surface.
//! Every surface on the path from the focused surface to the root of its
//! tree carries a focus label: the surface itself is `Focused`, its
//! ancestors are `Active`. Popups (menus, tips, glosses) never take
//! keyboard focus; asking to focus one focuses its nearest non-popup
//! ancestor and labels the popups walked over `Active`.
//!
//! Labels are only written when they change, so moving focus between two
//! children of the same parent leaves the parent `Active` throughout.
//!
//! Focus changes are serialized by a reentrant lock held for the whole
//! operation, including the calls to the input targeter, the session event
//! sink and session listeners. A collaborator notified mid-change may move
//! focus again from the same thread. It must not block on another thread
//! that changes focus: that thread waits for the serializer and the two
//! deadlock. The recorded focus lives behind a separate short lock that is
//! never held across a call out of the shell.
//!
//! Requests are validated after the serializer is taken, so a session that
//! started closing cannot gain focus.

use super::Shell;
use crate::error::{ShellError, ShellResult};
use crate::input::InputEvent;
use crate::session::{Session, SessionListener};
use crate::surface::{FocusState, Surface};
use log::debug;
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::{Arc, Weak};

#[derive(Debug, Default)]
struct FocusRecord {
    session: Weak<Session>,
    /// Surface holding keyboard focus
    surface: Weak<Surface>,
    /// Surfaces currently carrying a `Focused` or `Active` label
    labelled: Vec<Weak<Surface>>,
    /// Popups walked over to reach `surface`
    popups: Vec<Weak<Surface>>,
}

#[derive(Debug, Default)]
pub(super) struct FocusTracker {
    pub(super) serializer: ReentrantMutex<()>,
    record: Mutex<FocusRecord>,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Next,
    Previous,
}

fn same<T>(a: Option<&Arc<T>>, b: Option<&Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn contains(surfaces: &[Arc<Surface>], surface: &Arc<Surface>) -> bool {
    surfaces.iter().any(|s| Arc::ptr_eq(s, surface))
}

impl Shell {
    /// Move focus to `surface` of `session`.
    ///
    /// With no surface the session's default surface is used; with neither
    /// focus is cleared. Focusing a surface of an unregistered session, or
    /// a surface the session does not own, is an error and leaves focus
    /// untouched.
    pub fn set_focus_to(
        &self,
        session: Option<&Arc<Session>>,
        surface: Option<&Arc<Surface>>,
    ) -> ShellResult<()> {
        let _serialized = self.focus.serializer.lock();
        self.validate_focus_request(session, surface)?;

        let requested = surface
            .cloned()
            .or_else(|| session.and_then(|s| s.default_surface()));

        // Don't give keyboard focus to popups
        let mut new_popups = Vec::new();
        let mut target = requested;
        while let Some(candidate) = target.clone() {
            if !candidate.surface_type().is_popup() {
                break;
            }
            target = candidate.parent();
            new_popups.push(candidate);
        }

        let mut new_labels: Vec<(Arc<Surface>, FocusState)> = new_popups
            .iter()
            .map(|popup| (Arc::clone(popup), FocusState::Active))
            .collect();
        if let Some(target) = &target {
            new_labels.push((Arc::clone(target), FocusState::Focused));
            new_labels.extend(target.ancestors().map(|a| (a, FocusState::Active)));
        }
        let new_chain: Vec<Arc<Surface>> = new_labels.iter().map(|(s, _)| Arc::clone(s)).collect();

        let previous = {
            let mut record = self.focus.record.lock();
            std::mem::replace(
                &mut *record,
                FocusRecord {
                    session: session.map(Arc::downgrade).unwrap_or_default(),
                    surface: target.as_ref().map(Arc::downgrade).unwrap_or_default(),
                    labelled: new_chain.iter().map(Arc::downgrade).collect(),
                    popups: new_popups.iter().map(Arc::downgrade).collect(),
                },
            )
        };

        for old_popup in previous.popups.iter().filter_map(Weak::upgrade) {
            if !contains(&new_popups, &old_popup) {
                debug!("Closing popup {} left behind by focus change", old_popup.id());
                old_popup.request_client_surface_close();
                old_popup.hide();
            }
        }

        for old in previous.labelled.iter().filter_map(Weak::upgrade) {
            if !contains(&new_chain, &old) {
                old.set_focus_state(FocusState::Unfocused);
            }
        }

        let old_target = previous.surface.upgrade();
        if !same(old_target.as_ref(), target.as_ref()) {
            match &target {
                Some(target) => {
                    self.surface_stack.raise(target);
                    self.input_targeter.set_focus(target);
                    let device_state = self.device_state.lock().clone();
                    if let Some(device_state) = device_state {
                        target.consume(&InputEvent::DeviceState(device_state));
                    }
                }
                None => self.input_targeter.clear_focus(),
            }
        }

        for (surface, state) in &new_labels {
            surface.set_focus_state(*state);
        }

        let old_session = previous.session.upgrade();
        if !same(old_session.as_ref(), session) {
            match session {
                Some(session) => {
                    self.session_event_sink.handle_focus_change(session);
                    self.listeners.focused(session);
                }
                None => {
                    self.session_event_sink.handle_no_focus();
                    self.listeners.unfocused();
                }
            }
        }

        self.report
            .input_focus_set_to(session.map(|s| s.as_ref()), target.as_deref());
        Ok(())
    }

    /// Focus the next session (in creation order) that has a surface,
    /// clearing focus if none has
    pub fn focus_next_session(&self) -> ShellResult<()> {
        self.cycle_focus(Direction::Next)
    }

    /// Focus the previous session (in creation order) that has a surface,
    /// clearing focus if none has
    pub fn focus_prev_session(&self) -> ShellResult<()> {
        self.cycle_focus(Direction::Previous)
    }

    pub fn focused_session(&self) -> Option<Arc<Session>> {
        self.focus.record.lock().session.upgrade()
    }

    pub fn focused_surface(&self) -> Option<Arc<Surface>> {
        self.focus.record.lock().surface.upgrade()
    }

    fn cycle_focus(&self, direction: Direction) -> ShellResult<()> {
        let _serialized = self.focus.serializer.lock();

        let step = |from: Option<&Arc<Session>>| match direction {
            Direction::Next => self.sessions.successor_of(from),
            Direction::Previous => self.sessions.predecessor_of(from),
        };

        let focused = self.focused_session();
        let mut candidate = step(focused.as_ref());
        let sentinel = candidate.clone();

        // Bounded by the registry size in case the sentinel is closed meanwhile
        for _ in 0..=self.sessions.len() {
            let Some(session) = candidate.clone() else {
                break;
            };
            if session.has_surfaces() && !session.is_closing() {
                break;
            }
            candidate = step(Some(&session));
            if same(candidate.as_ref(), sentinel.as_ref()) {
                break;
            }
        }

        let surface = candidate
            .as_ref()
            .filter(|s| !s.is_closing())
            .and_then(|s| s.default_surface());
        let session = if surface.is_some() { candidate } else { None };

        debug!(
            "Cycling focus {:?} from {:?} to {:?}",
            direction,
            focused.as_ref().map(|s| s.id()),
            session.as_ref().map(|s| s.id())
        );
        self.set_focus_to(session.as_ref(), surface.as_ref())
    }

    /// Keep focus on a live surface after `destroyed` has left `session`
    pub(super) fn retarget_focus_from(
        &self,
        session: &Arc<Session>,
        destroyed: &Arc<Surface>,
    ) -> ShellResult<()> {
        let _serialized = self.focus.serializer.lock();

        let was_focused = self
            .focused_surface()
            .map_or(false, |focused| Arc::ptr_eq(&focused, destroyed));
        if !was_focused {
            return Ok(());
        }

        match session.default_surface().filter(|_| !session.is_closing()) {
            Some(next) => self.set_focus_to(Some(session), Some(&next)),
            None => self.focus_next_session(),
        }
    }

    /// Move focus off `session` if it holds it. Called while the session
    /// is closing, so cycling never lands back on it.
    pub(super) fn release_focus_from(&self, session: &Arc<Session>) -> ShellResult<()> {
        let _serialized = self.focus.serializer.lock();

        let holds_focus = |shell: &Shell| {
            shell
                .focused_session()
                .map_or(false, |focused| Arc::ptr_eq(&focused, session))
        };
        if !holds_focus(self) {
            return Ok(());
        }

        self.focus_next_session()?;
        if holds_focus(self) {
            self.set_focus_to(None, None)?;
        }
        Ok(())
    }

    fn validate_focus_request(
        &self,
        session: Option<&Arc<Session>>,
        surface: Option<&Arc<Surface>>,
    ) -> ShellResult<()> {
        match (session, surface) {
            (None, None) => {}
            (None, Some(surface)) => return Err(ShellError::MissingSession(surface.id())),
            (Some(session), None) => self.ensure_registered(session)?,
            (Some(session), Some(surface)) => self.ensure_owned(session, surface)?,
        }
        match session {
            Some(session) if session.is_closing() => Err(ShellError::SessionClosing(session.id())),
            _ => Ok(()),
        }
    }
}
