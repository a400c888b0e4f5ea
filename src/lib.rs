//! # Axiom Shell Library
//!
//! The session and focus core of a display server shell: which client
//! sessions exist, which surfaces they own, where new windows go, and which
//! session and surface receive keyboard input.
//!
//! ## Architecture
//!
//! - `shell`: the [`Shell`] orchestrator, focus state machine and popup grab
//! - `session`: client sessions and the session registry
//! - `surface`: surfaces, their attributes and creation/modification requests
//! - `policy`: the window management policy contract and the default policy
//! - `stack`: the surface stack seam (z-order and hit testing)
//! - `input`: input events and the input targeter seam
//! - `report`: structured shell event hooks
//! - `config`: configuration parsing and management
//! - `scenario`: headless replay of scripted sessions
//!
//! ## Usage
//!
//! ```rust,no_run
//! use axiom_shell::{
//!     CanonicalWindowManagerPolicy, InMemorySurfaceStack, LoggingInputTargeter,
//!     LoggingShellReport, NullClientSink, NullSessionEventSink, Shell, ShellCollaborators,
//!     ShellConfig, Size, SurfaceCreationParameters,
//! };
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let shell = Shell::new(
//!         ShellCollaborators {
//!             input_targeter: Arc::new(LoggingInputTargeter),
//!             surface_stack: Arc::new(InMemorySurfaceStack::new()),
//!             session_event_sink: Arc::new(NullSessionEventSink),
//!             report: Arc::new(LoggingShellReport),
//!         },
//!         CanonicalWindowManagerPolicy::factory(ShellConfig::default()),
//!     );
//!
//!     let session = shell.open_session(1234, "terminal", Arc::new(NullClientSink));
//!     let surface = shell.create_surface(
//!         &session,
//!         SurfaceCreationParameters::new("main", Size::new(640, 480)),
//!     )?;
//!     shell.set_focus_to(Some(&session), Some(&surface))?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod observer;
pub mod policy;
pub mod report;
pub mod scenario;
pub mod session;
pub mod shell;
pub mod stack;
pub mod surface;

// Re-export main types for easy access
pub use config::ShellConfig;
pub use error::{ShellError, ShellResult};
pub use geometry::{Displacement, Point, Rectangle, Size};
pub use input::{InputEvent, InputTargeter, LoggingInputTargeter};
pub use policy::{
    CanonicalWindowManagerPolicy, FocusController, PolicyFactory, WindowManagerPolicy,
};
pub use report::{LoggingShellReport, NullShellReport, ShellReport};
pub use session::{
    ClientSink, NullClientSink, NullSessionEventSink, Session, SessionEventSink, SessionId,
    SessionListener, SessionRegistry,
};
pub use shell::{Shell, ShellCollaborators};
pub use stack::{InMemorySurfaceStack, SurfaceStack};
pub use surface::{
    FocusState, Surface, SurfaceAttribute, SurfaceCreationParameters, SurfaceId,
    SurfaceSpecification, SurfaceState, SurfaceType,
};

/// Version information for Axiom Shell
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
