//! Structured shell reporting hooks
//!
//! The shell fires these at every lifecycle and focus transition. The
//! logging implementation renders them through the `log` facade; the null
//! implementation is what embedders use when they already trace elsewhere.

use crate::geometry::Rectangle;
use crate::session::Session;
use crate::surface::{Surface, SurfaceSpecification};
use log::{debug, info};
use std::sync::Arc;

pub trait ShellReport: Send + Sync {
    fn opened_session(&self, session: &Session);
    fn closing_session(&self, session: &Session);
    fn created_surface(&self, session: &Session, surface: &Surface);
    fn update_surface(
        &self,
        session: &Session,
        surface: &Surface,
        modifications: &SurfaceSpecification,
    );
    fn destroying_surface(&self, session: &Session, surface: &Surface);
    fn input_focus_set_to(&self, session: Option<&Session>, surface: Option<&Surface>);
    fn surfaces_raised(&self, surfaces: &[Arc<Surface>]);
    fn adding_display(&self, area: &Rectangle);
    fn removing_display(&self, area: &Rectangle);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingShellReport;

impl ShellReport for LoggingShellReport {
    fn opened_session(&self, session: &Session) {
        info!(
            "🪟 Opened session {} '{}' (pid {})",
            session.id(),
            session.name(),
            session.process_id()
        );
    }

    fn closing_session(&self, session: &Session) {
        info!("🗑️ Closing session {} '{}'", session.id(), session.name());
    }

    fn created_surface(&self, session: &Session, surface: &Surface) {
        let size = surface.window_size();
        info!(
            "✨ Session {} created surface {} '{}' ({:?}, {}x{})",
            session.id(),
            surface.id(),
            surface.name(),
            surface.surface_type(),
            size.width,
            size.height
        );
    }

    fn update_surface(
        &self,
        session: &Session,
        surface: &Surface,
        modifications: &SurfaceSpecification,
    ) {
        debug!(
            "Session {} updating surface {}: {:?}",
            session.id(),
            surface.id(),
            modifications
        );
    }

    fn destroying_surface(&self, session: &Session, surface: &Surface) {
        info!("💥 Session {} destroying surface {}", session.id(), surface.id());
    }

    fn input_focus_set_to(&self, session: Option<&Session>, surface: Option<&Surface>) {
        match (session, surface) {
            (Some(session), Some(surface)) => info!(
                "🎯 Focus -> session {} '{}', surface {} '{}'",
                session.id(),
                session.name(),
                surface.id(),
                surface.name()
            ),
            (Some(session), None) => info!(
                "🎯 Focus -> session {} '{}' (no surface)",
                session.id(),
                session.name()
            ),
            _ => info!("🎯 Focus cleared"),
        }
    }

    fn surfaces_raised(&self, surfaces: &[Arc<Surface>]) {
        let ids: Vec<String> = surfaces.iter().map(|s| s.id().to_string()).collect();
        debug!("Raised surfaces [{}]", ids.join(", "));
    }

    fn adding_display(&self, area: &Rectangle) {
        info!(
            "🖥️ Adding display {}x{} at ({}, {})",
            area.size.width,
            area.size.height,
            area.left(),
            area.top()
        );
    }

    fn removing_display(&self, area: &Rectangle) {
        info!(
            "🖥️ Removing display {}x{} at ({}, {})",
            area.size.width,
            area.size.height,
            area.left(),
            area.top()
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullShellReport;

impl ShellReport for NullShellReport {
    fn opened_session(&self, _session: &Session) {}
    fn closing_session(&self, _session: &Session) {}
    fn created_surface(&self, _session: &Session, _surface: &Surface) {}
    fn update_surface(
        &self,
        _session: &Session,
        _surface: &Surface,
        _modifications: &SurfaceSpecification,
    ) {
    }
    fn destroying_surface(&self, _session: &Session, _surface: &Surface) {}
    fn input_focus_set_to(&self, _session: Option<&Session>, _surface: Option<&Surface>) {}
    fn surfaces_raised(&self, _surfaces: &[Arc<Surface>]) {}
    fn adding_display(&self, _area: &Rectangle) {}
    fn removing_display(&self, _area: &Rectangle) {}
}
