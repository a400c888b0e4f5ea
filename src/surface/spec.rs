//! Creation parameters and modification requests for surfaces
//!
//! Clients describe content sizes. The window management policy reasons about
//! whole windows, so the shell folds the frame margins into every size-like
//! field before the policy sees a request.

use super::{InputReceptionMode, Margins, Surface, SurfaceState, SurfaceType};
use crate::geometry::{Displacement, Point, Rectangle, Size};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which edges of the aux rect a child may be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeAttachment {
    Vertical,
    Horizontal,
    Any,
}

impl EdgeAttachment {
    pub fn allows_vertical(self) -> bool {
        matches!(self, EdgeAttachment::Vertical | EdgeAttachment::Any)
    }

    pub fn allows_horizontal(self) -> bool {
        matches!(self, EdgeAttachment::Horizontal | EdgeAttachment::Any)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SurfaceCreationParameters {
    pub name: String,
    pub top_left: Point,
    /// Content size as requested; the window size once margins are folded in
    pub size: Size,
    pub surface_type: SurfaceType,
    pub state: Option<SurfaceState>,
    pub parent: Option<Arc<Surface>>,
    /// Anchor rectangle relative to the parent
    pub aux_rect: Option<Rectangle>,
    pub edge_attachment: Option<EdgeAttachment>,
    pub min_width: Option<i32>,
    pub min_height: Option<i32>,
    pub max_width: Option<i32>,
    pub max_height: Option<i32>,
    pub margins: Margins,
    pub input_mode: InputReceptionMode,
    pub server_side_decorated: Option<bool>,
}

impl SurfaceCreationParameters {
    pub fn new(name: impl Into<String>, size: Size) -> Self {
        Self {
            name: name.into(),
            size,
            ..Default::default()
        }
    }

    pub fn of_type(mut self, surface_type: SurfaceType) -> Self {
        self.surface_type = surface_type;
        self
    }

    pub fn with_parent(mut self, parent: &Arc<Surface>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn with_top_left(mut self, top_left: Point) -> Self {
        self.top_left = top_left;
        self
    }

    pub fn with_state(mut self, state: SurfaceState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_aux_rect(mut self, aux_rect: Rectangle, edge: EdgeAttachment) -> Self {
        self.aux_rect = Some(aux_rect);
        self.edge_attachment = Some(edge);
        self
    }

    pub fn with_input_mode(mut self, mode: InputReceptionMode) -> Self {
        self.input_mode = mode;
        self
    }

    /// Grow every size-like field by the frame margins and shift the aux
    /// rect by the content offset.
    pub(crate) fn fold_margins(&mut self) {
        let horiz = self.margins.horizontal();
        let vert = self.margins.vertical();
        self.size = Size::new(
            self.size.width.saturating_add(horiz),
            self.size.height.saturating_add(vert),
        );
        pad(&mut self.min_width, horiz);
        pad(&mut self.max_width, horiz);
        pad(&mut self.min_height, vert);
        pad(&mut self.max_height, vert);
        if let Some(aux_rect) = self.aux_rect.as_mut() {
            aux_rect.top_left = aux_rect.top_left + self.margins.content_offset();
        }
    }
}

/// A client request to change an existing surface. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSpecification {
    pub name: Option<String>,
    pub top_left: Option<Point>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub min_width: Option<i32>,
    pub min_height: Option<i32>,
    pub max_width: Option<i32>,
    pub max_height: Option<i32>,
    pub aux_rect: Option<Rectangle>,
    pub edge_attachment: Option<EdgeAttachment>,
    pub surface_type: Option<SurfaceType>,
    pub state: Option<SurfaceState>,
}

impl SurfaceSpecification {
    /// Request a new content size
    pub fn resize(size: Size) -> Self {
        Self {
            width: Some(size.width),
            height: Some(size.height),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Convert content-relative values into window-relative ones
    pub(crate) fn add_frame_padding(
        &mut self,
        horiz: i32,
        vert: i32,
        content_offset: Displacement,
    ) {
        pad(&mut self.width, horiz);
        pad(&mut self.height, vert);
        pad(&mut self.min_width, horiz);
        pad(&mut self.max_width, horiz);
        pad(&mut self.min_height, vert);
        pad(&mut self.max_height, vert);
        if let Some(aux_rect) = self.aux_rect.as_mut() {
            aux_rect.top_left = aux_rect.top_left + content_offset;
        }
    }
}

fn pad(value: &mut Option<i32>, by: i32) {
    if let Some(v) = value.as_mut() {
        *v = v.saturating_add(by);
    }
}
