//! Input events as seen by the shell, and the input targeter seam
//!
//! Events are already decoded by the platform layer. The shell does not
//! interpret them; it hands keyboard, touch and pointer events to the window
//! management policy and delivers device-state snapshots to the focused
//! surface.

use crate::geometry::Point;
use crate::surface::Surface;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Linux input scan codes the default policy binds
pub mod keys {
    pub const KEY_TAB: u32 = 15;
    pub const KEY_F4: u32 = 62;
    pub const KEY_F11: u32 = 87;
}

/// Held modifier keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        alt: false,
        ctrl: false,
        shift: false,
        meta: false,
    };

    pub const ALT: Modifiers = Modifiers {
        alt: true,
        ..Modifiers::NONE
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    pub fn is_empty(&self) -> bool {
        *self == Modifiers::NONE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    Down,
    Up,
    Repeat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardEvent {
    pub action: KeyAction,
    pub scan_code: u32,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyboardEvent {
    pub fn down(scan_code: u32, modifiers: Modifiers) -> Self {
        Self {
            action: KeyAction::Down,
            scan_code,
            modifiers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchAction {
    Down,
    Up,
    Change,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub action: TouchAction,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub points: Vec<TouchPoint>,
}

impl TouchEvent {
    /// Average position of all touch points
    pub fn centroid(&self) -> Option<Point> {
        if self.points.is_empty() {
            return None;
        }
        let count = self.points.len() as i64;
        let (sx, sy) = self.points.iter().fold((0i64, 0i64), |(x, y), p| {
            (x + p.position.x as i64, y + p.position.y as i64)
        });
        Some(Point::new((sx / count) as i32, (sy / count) as i32))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerAction {
    ButtonDown,
    ButtonUp,
    Motion,
    Enter,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerButtons {
    pub primary: bool,
    pub secondary: bool,
    pub tertiary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub action: PointerAction,
    pub position: Point,
    #[serde(default)]
    pub buttons: PointerButtons,
    #[serde(default)]
    pub modifiers: Modifiers,
}

/// Snapshot of device state handed to a surface when it gains focus
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceStateEvent {
    pub cursor: Point,
    #[serde(default)]
    pub pressed_keys: Vec<u32>,
    #[serde(default)]
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    Keyboard(KeyboardEvent),
    Touch(TouchEvent),
    Pointer(PointerEvent),
    DeviceState(DeviceStateEvent),
    KeyboardResync,
}

/// Performs the actual keyboard focus rerouting in the input stack
pub trait InputTargeter: Send + Sync {
    fn set_focus(&self, surface: &Arc<Surface>);
    fn clear_focus(&self);
    fn set_drag_and_drop_handle(&self, handle: &[u8]);
    fn clear_drag_and_drop_handle(&self);
}

/// Input targeter that only records what it was told, through `log`
#[derive(Debug, Default)]
pub struct LoggingInputTargeter;

impl InputTargeter for LoggingInputTargeter {
    fn set_focus(&self, surface: &Arc<Surface>) {
        log::info!("⌨️ Keyboard focus -> surface {} '{}'", surface.id(), surface.name());
    }

    fn clear_focus(&self) {
        log::info!("⌨️ Keyboard focus cleared");
    }

    fn set_drag_and_drop_handle(&self, handle: &[u8]) {
        log::debug!("Drag and drop handle set ({} bytes)", handle.len());
    }

    fn clear_drag_and_drop_handle(&self) {
        log::debug!("Drag and drop handle cleared");
    }
}
