//! Headless scenario replay
//!
//! A scenario is a TOML list of `[[step]]` tables describing what clients
//! and the user do: open sessions, create surfaces, move focus, press keys.
//! [`ScenarioRunner`] replays the steps against a [`Shell`] backed by the
//! default policy and an in-memory surface stack, then summarizes the
//! resulting focus and stacking state as an [`Outcome`].
//!
//! Sessions and surfaces are referred to by the labels the scenario gives
//! them.
//!
//! ```toml
//! [[step]]
//! action = "open_session"
//! name = "terminal"
//!
//! [[step]]
//! action = "create_surface"
//! session = "terminal"
//! label = "main"
//! width = 640
//! height = 480
//!
//! [[step]]
//! action = "input"
//! event = { kind = "keyboard", action = "down", scan_code = 15, modifiers = { alt = true } }
//! ```

use crate::config::ShellConfig;
use crate::geometry::{Point, Rectangle, Size};
use crate::input::{InputEvent, LoggingInputTargeter};
use crate::policy::CanonicalWindowManagerPolicy;
use crate::report::ShellReport;
use crate::session::{ClientSink, NullSessionEventSink, Session};
use crate::shell::{Shell, ShellCollaborators};
use crate::stack::InMemorySurfaceStack;
use crate::surface::{
    EdgeAttachment, Margins, Surface, SurfaceAttribute, SurfaceCreationParameters, SurfaceId,
    SurfaceSpecification, SurfaceState, SurfaceType,
};
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AuxRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub edge: EdgeAttachment,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    OpenSession {
        name: String,
        #[serde(default)]
        pid: i32,
    },
    CloseSession {
        session: String,
    },
    CreateSurface {
        session: String,
        label: String,
        width: i32,
        height: i32,
        #[serde(default, rename = "type")]
        surface_type: SurfaceType,
        #[serde(default)]
        parent: Option<String>,
        #[serde(default)]
        margins: Margins,
        #[serde(default)]
        aux_rect: Option<AuxRect>,
    },
    DestroySurface {
        surface: String,
    },
    ModifySurface {
        surface: String,
        #[serde(flatten)]
        changes: SurfaceSpecification,
    },
    SetState {
        surface: String,
        state: SurfaceState,
    },
    Focus {
        session: Option<String>,
        #[serde(default)]
        surface: Option<String>,
    },
    FocusNext,
    FocusPrev,
    SurfaceReady {
        surface: String,
    },
    PopupGrab {
        #[serde(default)]
        surface: Option<String>,
    },
    AddDisplay {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    Input {
        event: InputEvent,
    },
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse scenario file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        Ok(scenario)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurfaceSummary {
    pub label: String,
    pub top_left: Point,
    pub size: Size,
    pub state: SurfaceState,
    pub focus: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub name: String,
    pub surfaces: Vec<SurfaceSummary>,
}

/// Final state after a replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub focused_session: Option<String>,
    pub focused_surface: Option<String>,
    pub sessions: Vec<SessionSummary>,
    /// Surface labels, bottom to top
    pub stacking: Vec<String>,
    /// Surfaces the shell asked their client to close, in request order
    pub close_requests: Vec<String>,
}

impl Outcome {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "focused session: {}\n",
            self.focused_session.as_deref().unwrap_or("<none>")
        ));
        out.push_str(&format!(
            "focused surface: {}\n",
            self.focused_surface.as_deref().unwrap_or("<none>")
        ));
        for session in &self.sessions {
            out.push_str(&format!("session {}\n", session.name));
            for s in &session.surfaces {
                out.push_str(&format!(
                    "  {} at ({}, {}) {}x{} {:?} {}{}\n",
                    s.label,
                    s.top_left.x,
                    s.top_left.y,
                    s.size.width,
                    s.size.height,
                    s.state,
                    s.focus,
                    if s.visible { "" } else { " hidden" }
                ));
            }
        }
        out.push_str(&format!("stacking: {}\n", self.stacking.join(" < ")));
        if !self.close_requests.is_empty() {
            out.push_str(&format!("close requests: {}\n", self.close_requests.join(", ")));
        }
        out
    }
}

/// Collects every close request the shell sends to any scenario client
#[derive(Default)]
struct CloseRecorder {
    requests: Mutex<Vec<SurfaceId>>,
}

impl ClientSink for CloseRecorder {
    fn handle_close_request(&self, surface: SurfaceId) {
        self.requests.lock().push(surface);
    }
}

pub struct ScenarioRunner {
    shell: Arc<Shell>,
    stack: Arc<InMemorySurfaceStack>,
    client: Arc<CloseRecorder>,
    sessions: Vec<(String, Arc<Session>)>,
    surfaces: HashMap<String, (Arc<Session>, Arc<Surface>)>,
    labels: HashMap<SurfaceId, String>,
}

impl ScenarioRunner {
    pub fn new(config: &ShellConfig, report: Arc<dyn ShellReport>) -> Self {
        let stack = Arc::new(InMemorySurfaceStack::new());
        let shell = Shell::new(
            ShellCollaborators {
                input_targeter: Arc::new(LoggingInputTargeter),
                surface_stack: stack.clone(),
                session_event_sink: Arc::new(NullSessionEventSink),
                report,
            },
            CanonicalWindowManagerPolicy::factory(config.clone()),
        );

        Self {
            shell,
            stack,
            client: Arc::new(CloseRecorder::default()),
            sessions: Vec::new(),
            surfaces: HashMap::new(),
            labels: HashMap::new(),
        }
    }

    pub fn shell(&self) -> &Arc<Shell> {
        &self.shell
    }

    pub fn run(&mut self, scenario: &Scenario) -> Result<Outcome> {
        info!("🎬 Replaying {} scenario steps", scenario.steps.len());
        for (index, step) in scenario.steps.iter().enumerate() {
            self.apply(step)
                .with_context(|| format!("Step {} ({:?}) failed", index + 1, step))?;
        }
        Ok(self.outcome())
    }

    pub fn apply(&mut self, step: &Step) -> Result<()> {
        debug!("Applying {:?}", step);
        match step {
            Step::OpenSession { name, pid } => {
                if self.session(name).is_ok() {
                    bail!("session '{}' is already open", name);
                }
                let session = self.shell.open_session(*pid, name, self.client.clone());
                self.sessions.push((name.clone(), session));
            }
            Step::CloseSession { session } => {
                let target = self.session(session)?;
                self.shell.close_session(&target)?;
                self.sessions.retain(|(_, s)| !Arc::ptr_eq(s, &target));
                self.surfaces.retain(|_, (owner, _)| !Arc::ptr_eq(owner, &target));
            }
            Step::CreateSurface {
                session,
                label,
                width,
                height,
                surface_type,
                parent,
                margins,
                aux_rect,
            } => {
                if self.surfaces.contains_key(label) {
                    bail!("surface label '{}' is already in use", label);
                }
                let owner = self.session(session)?;
                let size = Size::new(*width, *height);
                let mut params = SurfaceCreationParameters::new(label.clone(), size)
                    .of_type(*surface_type)
                    .with_margins(*margins);
                if let Some(parent) = parent {
                    let (_, parent) = self.surface(parent)?;
                    params = params.with_parent(&parent);
                }
                if let Some(aux) = aux_rect {
                    params = params.with_aux_rect(
                        Rectangle::from_loc_and_size((aux.x, aux.y), (aux.width, aux.height)),
                        aux.edge,
                    );
                }
                let surface = self.shell.create_surface(&owner, params)?;
                self.labels.insert(surface.id(), label.clone());
                self.surfaces.insert(label.clone(), (owner, surface));
            }
            Step::DestroySurface { surface } => {
                let (owner, target) = self.surface(surface)?;
                self.shell.destroy_surface(&owner, &target)?;
                self.surfaces.remove(surface);
            }
            Step::ModifySurface { surface, changes } => {
                let (owner, target) = self.surface(surface)?;
                self.shell.modify_surface(&owner, &target, changes)?;
            }
            Step::SetState { surface, state } => {
                let (owner, target) = self.surface(surface)?;
                self.shell.set_surface_attribute(
                    &owner,
                    &target,
                    SurfaceAttribute::State,
                    state.as_raw(),
                )?;
            }
            Step::Focus { session, surface } => {
                let session = session.as_deref().map(|name| self.session(name)).transpose()?;
                let surface = surface
                    .as_deref()
                    .map(|label| self.surface(label).map(|(_, s)| s))
                    .transpose()?;
                self.shell.set_focus_to(session.as_ref(), surface.as_ref())?;
            }
            Step::FocusNext => self.shell.focus_next_session()?,
            Step::FocusPrev => self.shell.focus_prev_session()?,
            Step::SurfaceReady { surface } => {
                let (owner, target) = self.surface(surface)?;
                self.shell.surface_ready(&owner, &target)?;
            }
            Step::PopupGrab { surface } => {
                let root = surface
                    .as_deref()
                    .map(|label| self.surface(label).map(|(_, s)| s))
                    .transpose()?;
                self.shell.set_popup_grab_tree(root.as_ref());
            }
            Step::AddDisplay {
                x,
                y,
                width,
                height,
            } => {
                self.shell
                    .add_display(Rectangle::from_loc_and_size((*x, *y), (*width, *height)));
            }
            Step::Input { event } => {
                let consumed = self.shell.handle(event);
                debug!("Input {:?} consumed: {}", event, consumed);
            }
        }
        Ok(())
    }

    pub fn outcome(&self) -> Outcome {
        let label_of = |surface: &Surface| {
            self.labels
                .get(&surface.id())
                .cloned()
                .unwrap_or_else(|| format!("#{}", surface.id()))
        };

        let focused_session = self.shell.focused_session().and_then(|focused| {
            self.sessions
                .iter()
                .find(|(_, s)| Arc::ptr_eq(s, &focused))
                .map(|(name, _)| name.clone())
        });

        let sessions = self
            .sessions
            .iter()
            .map(|(name, session)| SessionSummary {
                name: name.clone(),
                surfaces: session
                    .surfaces()
                    .iter()
                    .map(|surface| SurfaceSummary {
                        label: label_of(surface),
                        top_left: surface.top_left(),
                        size: surface.window_size(),
                        state: surface.state(),
                        focus: format!("{:?}", surface.focus_state()).to_lowercase(),
                        visible: surface.is_visible(),
                    })
                    .collect(),
            })
            .collect();

        let stacking = self
            .stack
            .render_order()
            .iter()
            .map(|id| self.labels.get(id).cloned().unwrap_or_else(|| format!("#{}", id)))
            .collect();

        let close_requests = self
            .client
            .requests
            .lock()
            .iter()
            .map(|id| self.labels.get(id).cloned().unwrap_or_else(|| format!("#{}", id)))
            .collect();

        Outcome {
            focused_session,
            focused_surface: self.shell.focused_surface().map(|s| label_of(&s)),
            sessions,
            stacking,
            close_requests,
        }
    }

    fn session(&self, name: &str) -> Result<Arc<Session>> {
        self.sessions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| Arc::clone(s))
            .ok_or_else(|| anyhow!("unknown session '{}'", name))
    }

    fn surface(&self, label: &str) -> Result<(Arc<Session>, Arc<Surface>)> {
        self.surfaces
            .get(label)
            .cloned()
            .ok_or_else(|| anyhow!("unknown surface '{}'", label))
    }
}
