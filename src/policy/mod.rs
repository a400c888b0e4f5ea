//! Window management policy contract
//!
//! The shell consults a [`WindowManagerPolicy`] for every session and surface
//! lifecycle event and every raw input event. The policy is built by a
//! factory that receives a weak handle to the shell's [`FocusController`],
//! through which it can move focus, raise surfaces and hit-test.
//!
//! Surface creation is a callback protocol: the shell hands the policy a
//! *build* function, the policy may rewrite the creation parameters (place
//! the window, adjust its size) and must then call build exactly once.

pub mod canonical;

use crate::error::ShellResult;
use crate::geometry::{Point, Rectangle};
use crate::input::{KeyboardEvent, PointerEvent, TouchEvent};
use crate::session::Session;
use crate::surface::{
    Surface, SurfaceAttribute, SurfaceCreationParameters, SurfaceSpecification, SurfaceState,
};
use std::sync::{Arc, Weak};

pub use canonical::CanonicalWindowManagerPolicy;

/// The shell-supplied function that materializes a surface from placed
/// parameters
pub type SurfaceBuilder<'a> =
    dyn FnMut(&Arc<Session>, SurfaceCreationParameters) -> ShellResult<Arc<Surface>> + 'a;

/// Builds the policy once the shell exists
pub type PolicyFactory =
    Box<dyn FnOnce(Weak<dyn FocusController>) -> Box<dyn WindowManagerPolicy>>;

/// Operations the shell offers back to its policy
pub trait FocusController: Send + Sync {
    /// Focus `surface` of `session`. A `None` surface focuses the session
    /// itself; `None` for both clears focus.
    fn set_focus_to(
        &self,
        session: Option<&Arc<Session>>,
        surface: Option<&Arc<Surface>>,
    ) -> ShellResult<()>;
    fn focus_next_session(&self) -> ShellResult<()>;
    fn focus_prev_session(&self) -> ShellResult<()>;
    fn focused_session(&self) -> Option<Arc<Session>>;
    fn focused_surface(&self) -> Option<Arc<Surface>>;
    fn surface_at(&self, cursor: Point) -> Option<Arc<Surface>>;
    fn raise(&self, surfaces: &[Arc<Surface>]);
    /// Install (or clear, with `None`) the popup grab root
    fn set_popup_grab_tree(&self, root: Option<&Arc<Surface>>);
    fn set_drag_and_drop_handle(&self, handle: &[u8]);
    fn clear_drag_and_drop_handle(&self);
}

pub trait WindowManagerPolicy: Send + Sync {
    fn add_session(&self, session: &Arc<Session>);

    fn remove_session(&self, session: &Arc<Session>);

    /// Place a new surface and call `build` exactly once with the final
    /// parameters
    fn add_surface(
        &self,
        session: &Arc<Session>,
        params: SurfaceCreationParameters,
        build: &mut SurfaceBuilder<'_>,
    ) -> ShellResult<Arc<Surface>>;

    /// `modifications` are already expressed in window (margin-inclusive) terms
    fn modify_surface(
        &self,
        session: &Arc<Session>,
        surface: &Arc<Surface>,
        modifications: &SurfaceSpecification,
    );

    /// Called before the session forgets the surface
    fn remove_surface(&self, session: &Arc<Session>, surface: &Arc<Surface>);

    fn add_display(&self, area: Rectangle);

    fn remove_display(&self, area: Rectangle);

    /// Returns `true` if the event was consumed
    fn handle_keyboard_event(&self, event: &KeyboardEvent) -> bool;

    fn handle_touch_event(&self, event: &TouchEvent) -> bool;

    fn handle_pointer_event(&self, event: &PointerEvent) -> bool;

    /// Decide the state a surface actually enters when `requested` is asked for
    fn handle_set_state(&self, surface: &Arc<Surface>, requested: SurfaceState) -> SurfaceState;

    /// Attribute writes pass straight to the surface, except state changes
    /// which the policy gets to override.
    fn set_surface_attribute(
        &self,
        _session: &Arc<Session>,
        surface: &Arc<Surface>,
        attribute: SurfaceAttribute,
        value: i32,
    ) -> ShellResult<i32> {
        match attribute {
            SurfaceAttribute::State => {
                // Validate before the policy sees it
                let requested = match SurfaceState::from_raw(value) {
                    Some(state) => state,
                    None => return surface.configure(attribute, value),
                };
                let effective = self.handle_set_state(surface, requested);
                surface.configure(attribute, effective.as_raw())
            }
            _ => surface.configure(attribute, value),
        }
    }

    /// The client posted its first content
    fn handle_surface_ready(&self, _session: &Arc<Session>, _surface: &Arc<Surface>) {}

    fn handle_raise_surface(&self, _session: &Arc<Session>, _surface: &Arc<Surface>) {}

    /// Client asked for an interactive move starting at `cursor`
    fn handle_request_move(
        &self,
        _session: &Arc<Session>,
        _surface: &Arc<Surface>,
        _cursor: Point,
    ) {
    }

    /// Client asked for an interactive resize starting at `cursor`
    fn handle_request_resize(
        &self,
        _session: &Arc<Session>,
        _surface: &Arc<Surface>,
        _cursor: Point,
    ) {
    }

    fn handle_request_drag_and_drop(
        &self,
        _session: &Arc<Session>,
        _surface: &Arc<Surface>,
        _handle: &[u8],
    ) {
    }
}
