//! Popup grab enforcement
//!
//! While a grab root is installed, a popup that becomes ready outside the
//! root's tree is closed straight away. Changing the root re-checks the
//! popups already shown.

use super::Shell;
use crate::error::ShellResult;
use crate::session::Session;
use crate::surface::Surface;
use log::debug;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

#[derive(Debug, Default)]
struct GrabState {
    root: Weak<Surface>,
    ready_popups: Vec<Weak<Surface>>,
}

#[derive(Debug, Default)]
pub(super) struct PopupGrab {
    state: Mutex<GrabState>,
}

impl PopupGrab {
    pub(super) fn root(&self) -> Option<Arc<Surface>> {
        self.state.lock().root.upgrade()
    }
}

impl Shell {
    /// Install `root` as the popup grab anchor, or remove the grab with
    /// `None`. Ready popups outside the new tree are asked to close.
    pub fn set_popup_grab_tree(&self, root: Option<&Arc<Surface>>) {
        let outside = {
            let mut state = self.popups.state.lock();
            state.root = root.map(Arc::downgrade).unwrap_or_default();

            let mut outside = Vec::new();
            state.ready_popups.retain(|popup| match popup.upgrade() {
                Some(popup) => match root {
                    Some(root) if !popup.is_in_tree_of(root) => {
                        outside.push(popup);
                        false
                    }
                    _ => true,
                },
                None => false,
            });
            outside
        };

        debug!("Popup grab tree set to {:?}", root.map(|r| r.id()));
        for popup in outside {
            debug!("Closing popup {} outside the grab tree", popup.id());
            popup.request_client_surface_close();
        }
    }

    pub fn popup_grab_tree(&self) -> Option<Arc<Surface>> {
        self.popups.root()
    }

    /// The client has posted content for `surface`.
    ///
    /// A popup outside the current grab tree is closed instead of being
    /// shown; anything else is handed to the policy.
    pub fn surface_ready(&self, session: &Arc<Session>, surface: &Arc<Surface>) -> ShellResult<()> {
        self.ensure_owned(session, surface)?;
        if !surface.mark_ready() {
            return Ok(());
        }

        if surface.surface_type().is_popup() {
            let rejected = {
                let mut state = self.popups.state.lock();
                match state.root.upgrade() {
                    Some(root) if !surface.is_in_tree_of(&root) => true,
                    _ => {
                        state.ready_popups.push(Arc::downgrade(surface));
                        false
                    }
                }
            };
            if rejected {
                debug!("Popup {} is outside the grab tree, closing", surface.id());
                surface.request_client_surface_close();
                return Ok(());
            }
        }

        self.policy.handle_surface_ready(session, surface);
        Ok(())
    }
}
