//! Surface entity: one window owned by a session
//!
//! A surface carries its geometry (window size including margins), a type,
//! an optional non-owning link to its parent, a focus state and an attribute
//! store. Ownership flows strictly session -> surface; the parent link is a
//! `Weak` used only for lookups so that parent/child trees never keep each
//! other alive.
//!
//! Attribute writes go through [`Surface::configure`], which validates the
//! raw value, records it, and tells observers and the owning client when the
//! value actually changed.

pub mod spec;

use crate::error::{ShellError, ShellResult};
use crate::geometry::{Displacement, Point, Rectangle, Size};
use crate::input::InputEvent;
use crate::observer::Multiplexer;
use crate::session::{ClientSink, SessionId};
use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

pub use spec::{EdgeAttachment, SurfaceCreationParameters, SurfaceSpecification};

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique surface identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Window type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceType {
    #[default]
    Normal,
    Utility,
    Dialog,
    Gloss,
    Freestyle,
    Menu,
    InputMethod,
    Satellite,
    Tip,
    Decoration,
}

impl SurfaceType {
    const ALL: [SurfaceType; 10] = [
        SurfaceType::Normal,
        SurfaceType::Utility,
        SurfaceType::Dialog,
        SurfaceType::Gloss,
        SurfaceType::Freestyle,
        SurfaceType::Menu,
        SurfaceType::InputMethod,
        SurfaceType::Satellite,
        SurfaceType::Tip,
        SurfaceType::Decoration,
    ];

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(value: i32) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Transient popups never hold keyboard focus themselves; focusing one
    /// focuses its nearest non-popup ancestor instead.
    pub fn is_popup(self) -> bool {
        matches!(self, SurfaceType::Gloss | SurfaceType::Tip | SurfaceType::Menu)
    }

    /// Whether a surface of this type is a candidate when cycling a
    /// session's surfaces
    pub fn can_take_focus(self) -> bool {
        !matches!(
            self,
            SurfaceType::Gloss | SurfaceType::Tip | SurfaceType::Decoration
        )
    }
}

/// Window state as requested by clients and decided by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceState {
    Unknown,
    #[default]
    Restored,
    Minimized,
    Maximized,
    VertMaximized,
    Fullscreen,
    HorizMaximized,
    Hidden,
}

impl SurfaceState {
    const ALL: [SurfaceState; 8] = [
        SurfaceState::Unknown,
        SurfaceState::Restored,
        SurfaceState::Minimized,
        SurfaceState::Maximized,
        SurfaceState::VertMaximized,
        SurfaceState::Fullscreen,
        SurfaceState::HorizMaximized,
        SurfaceState::Hidden,
    ];

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(value: i32) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }
}

/// Per-surface focus label
///
/// `Focused` is held by exactly the surface receiving keyboard input.
/// `Active` marks its ancestors and any popups walked over on the way to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusState {
    #[default]
    Unfocused,
    Focused,
    Active,
}

impl FocusState {
    pub fn as_raw(self) -> i32 {
        match self {
            FocusState::Unfocused => 0,
            FocusState::Focused => 1,
            FocusState::Active => 2,
        }
    }

    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(FocusState::Unfocused),
            1 => Some(FocusState::Focused),
            2 => Some(FocusState::Active),
            _ => None,
        }
    }
}

/// Keys of the surface attribute store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceAttribute {
    Type,
    State,
    SwapInterval,
    Focus,
    Dpi,
    Visibility,
    PreferredOrientation,
}

/// Whether a surface takes part in normal hit testing or sees every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputReceptionMode {
    #[default]
    Normal,
    ReceivesAllInput,
}

/// Frame margins between the window edge and the client content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl Margins {
    pub const fn new(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn horizontal(&self) -> i32 {
        self.left.saturating_add(self.right)
    }

    pub fn vertical(&self) -> i32 {
        self.top.saturating_add(self.bottom)
    }

    pub fn content_offset(&self) -> Displacement {
        Displacement::new(self.left, self.top)
    }
}

/// Change notifications for a single surface. Every method defaults to a no-op.
pub trait SurfaceObserver: Send + Sync {
    fn attrib_changed(&self, _surface: &Surface, _attribute: SurfaceAttribute, _value: i32) {}
    fn moved_to(&self, _surface: &Surface, _top_left: Point) {}
    fn resized_to(&self, _surface: &Surface, _size: Size) {}
    fn hidden_set_to(&self, _surface: &Surface, _hidden: bool) {}
    fn renamed(&self, _surface: &Surface, _name: &str) {}
    fn client_surface_close_requested(&self, _surface: &Surface) {}
    fn input_consumed(&self, _surface: &Surface, _event: &InputEvent) {}
}

pub struct Surface {
    id: SurfaceId,
    session_id: SessionId,
    name: Mutex<String>,
    parent: Weak<Surface>,
    input_mode: InputReceptionMode,
    margins: Margins,
    geometry: Mutex<Rectangle>,
    attributes: Mutex<HashMap<SurfaceAttribute, i32>>,
    visible: AtomicBool,
    ready: AtomicBool,
    observers: Multiplexer<dyn SurfaceObserver>,
    client: Arc<dyn ClientSink>,
}

impl Surface {
    /// Build a surface from placed parameters, whose `size` already
    /// includes the margins.
    pub(crate) fn new(
        session_id: SessionId,
        params: &SurfaceCreationParameters,
        client: Arc<dyn ClientSink>,
    ) -> Self {
        let mut attributes = HashMap::new();
        attributes.insert(SurfaceAttribute::Type, params.surface_type.as_raw());
        attributes.insert(
            SurfaceAttribute::State,
            params.state.unwrap_or_default().as_raw(),
        );
        attributes.insert(SurfaceAttribute::Focus, FocusState::Unfocused.as_raw());
        attributes.insert(SurfaceAttribute::Visibility, 0);
        attributes.insert(SurfaceAttribute::SwapInterval, 1);
        attributes.insert(SurfaceAttribute::Dpi, 0);
        attributes.insert(SurfaceAttribute::PreferredOrientation, 0);

        Self {
            id: SurfaceId::next(),
            session_id,
            name: Mutex::new(params.name.clone()),
            parent: params
                .parent
                .as_ref()
                .map(Arc::downgrade)
                .unwrap_or_default(),
            input_mode: params.input_mode,
            margins: params.margins,
            geometry: Mutex::new(Rectangle::new(params.top_left, params.size.clamped())),
            attributes: Mutex::new(attributes),
            visible: AtomicBool::new(true),
            ready: AtomicBool::new(false),
            observers: Multiplexer::new(),
            client,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn name(&self) -> String {
        self.name.lock().clone()
    }

    pub fn rename(&self, name: &str) {
        *self.name.lock() = name.to_string();
        self.observers.for_each(|o| o.renamed(self, name));
    }

    /// The parent surface, if it has one and it is still alive
    pub fn parent(&self) -> Option<Arc<Surface>> {
        self.parent.upgrade()
    }

    /// Ancestors from the direct parent up to the root of the tree
    pub fn ancestors(&self) -> impl Iterator<Item = Arc<Surface>> {
        std::iter::successors(self.parent(), |s| s.parent())
    }

    /// Whether `root` is this surface or one of its ancestors
    pub fn is_in_tree_of(&self, root: &Surface) -> bool {
        std::ptr::eq(self, root) || self.ancestors().any(|a| std::ptr::eq(a.as_ref(), root))
    }

    pub fn input_mode(&self) -> InputReceptionMode {
        self.input_mode
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn top_left(&self) -> Point {
        self.geometry.lock().top_left
    }

    /// Window size, margins included
    pub fn window_size(&self) -> Size {
        self.geometry.lock().size
    }

    /// Size of the client content region
    pub fn content_size(&self) -> Size {
        let size = self.window_size();
        Size::new(
            size.width - self.margins.horizontal(),
            size.height - self.margins.vertical(),
        )
        .clamped()
    }

    pub fn content_offset(&self) -> Displacement {
        self.margins.content_offset()
    }

    /// Content region in scene coordinates
    pub fn content_bounds(&self) -> Rectangle {
        Rectangle::new(self.top_left() + self.content_offset(), self.content_size())
    }

    pub fn input_bounds(&self) -> Rectangle {
        *self.geometry.lock()
    }

    pub fn input_area_contains(&self, point: Point) -> bool {
        self.input_bounds().contains(point)
    }

    pub fn move_to(&self, top_left: Point) {
        {
            let mut geometry = self.geometry.lock();
            if geometry.top_left == top_left {
                return;
            }
            geometry.top_left = top_left;
        }
        self.observers.for_each(|o| o.moved_to(self, top_left));
    }

    /// Resize the window (margins included)
    pub fn resize(&self, size: Size) {
        let size = size.clamped();
        {
            let mut geometry = self.geometry.lock();
            if geometry.size == size {
                return;
            }
            geometry.size = size;
        }
        debug!("Surface {} resized to {}x{}", self.id, size.width, size.height);
        self.observers.for_each(|o| o.resized_to(self, size));
    }

    pub fn surface_type(&self) -> SurfaceType {
        SurfaceType::from_raw(self.query(SurfaceAttribute::Type)).unwrap_or_default()
    }

    pub fn state(&self) -> SurfaceState {
        SurfaceState::from_raw(self.query(SurfaceAttribute::State)).unwrap_or_default()
    }

    pub fn focus_state(&self) -> FocusState {
        FocusState::from_raw(self.query(SurfaceAttribute::Focus)).unwrap_or_default()
    }

    /// Returns `true` if the label changed
    pub fn set_focus_state(&self, state: FocusState) -> bool {
        self.store(SurfaceAttribute::Focus, state.as_raw())
    }

    pub fn query(&self, attribute: SurfaceAttribute) -> i32 {
        self.attributes
            .lock()
            .get(&attribute)
            .copied()
            .unwrap_or_default()
    }

    /// Validate and store an attribute value, returning the value now in effect
    pub fn configure(&self, attribute: SurfaceAttribute, value: i32) -> ShellResult<i32> {
        let valid = match attribute {
            SurfaceAttribute::Type => SurfaceType::from_raw(value).is_some(),
            SurfaceAttribute::State => SurfaceState::from_raw(value).is_some(),
            SurfaceAttribute::Focus => FocusState::from_raw(value).is_some(),
            SurfaceAttribute::Visibility => matches!(value, 0 | 1),
            SurfaceAttribute::SwapInterval
            | SurfaceAttribute::Dpi
            | SurfaceAttribute::PreferredOrientation => value >= 0,
        };
        if !valid {
            return Err(ShellError::InvalidAttributeValue { attribute, value });
        }

        self.store(attribute, value);
        Ok(value)
    }

    fn store(&self, attribute: SurfaceAttribute, value: i32) -> bool {
        let previous = self.attributes.lock().insert(attribute, value);
        if previous == Some(value) {
            return false;
        }

        debug!("Surface {} {:?} = {}", self.id, attribute, value);
        self.observers
            .for_each(|o| o.attrib_changed(self, attribute, value));
        self.client
            .handle_surface_attribute(self.id, attribute, value);
        true
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn show(&self) {
        if !self.visible.swap(true, Ordering::SeqCst) {
            self.observers.for_each(|o| o.hidden_set_to(self, false));
        }
    }

    pub fn hide(&self) {
        if self.visible.swap(false, Ordering::SeqCst) {
            self.observers.for_each(|o| o.hidden_set_to(self, true));
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Record that the client has posted content. Returns `true` the first time.
    pub(crate) fn mark_ready(&self) -> bool {
        !self.ready.swap(true, Ordering::SeqCst)
    }

    /// Ask the owning client to close this surface
    pub fn request_client_surface_close(&self) {
        debug!("Requesting client close of surface {}", self.id);
        self.observers
            .for_each(|o| o.client_surface_close_requested(self));
        self.client.handle_close_request(self.id);
    }

    /// Deliver an input event directly to the client owning this surface
    pub fn consume(&self, event: &InputEvent) {
        self.observers.for_each(|o| o.input_consumed(self, event));
        self.client.handle_input(self.id, event);
    }

    pub fn add_observer(&self, observer: Arc<dyn SurfaceObserver>) {
        self.observers.add(observer);
    }

    pub fn remove_observer(&self, observer: &Arc<dyn SurfaceObserver>) -> bool {
        self.observers.remove(observer)
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.id)
            .field("session", &self.session_id)
            .field("type", &self.surface_type())
            .field("focus", &self.focus_state())
            .finish()
    }
}
