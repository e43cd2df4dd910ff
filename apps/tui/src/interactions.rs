//! Map interaction tools owned by a session.

use crate::domain::{Coord, FeatureId, GeometryKind};
use crate::layer::DrawLayer;
use crate::wizard::InteractionMask;

/// Snap radius in screen pixels.
pub const SNAP_TOLERANCE_PX: f64 = 12.0;
/// Pick radius in screen pixels for select and modify.
pub const PICK_TOLERANCE_PX: f64 = 12.0;

#[derive(Debug)]
pub struct DrawTool {
    pub active: bool,
    pub kind: GeometryKind,
    sketch: Vec<Coord>,
}

impl DrawTool {
    pub fn sketch(&self) -> &[Coord] {
        &self.sketch
    }

    pub fn push_vertex(&mut self, at: Coord) {
        self.sketch.push(at);
    }

    pub fn pop_vertex(&mut self) -> Option<Coord> {
        self.sketch.pop()
    }

    pub fn take_sketch(&mut self) -> Vec<Coord> {
        std::mem::take(&mut self.sketch)
    }

    pub fn clear_sketch(&mut self) {
        self.sketch.clear();
    }
}

#[derive(Debug)]
pub struct SnapTool {
    pub active: bool,
}

impl SnapTool {
    /// Snaps to the nearest layer or sketch vertex within tolerance.
    pub fn snap(&self, at: Coord, resolution: f64, layer: &DrawLayer, sketch: &[Coord]) -> Coord {
        if !self.active {
            return at;
        }

        let tolerance = SNAP_TOLERANCE_PX * resolution;
        let from_layer = layer
            .nearest_vertex(at, tolerance, None)
            .map(|hit| (hit.coord, hit.distance));
        let from_sketch = sketch
            .iter()
            .map(|coord| (*coord, coord.distance(at)))
            .filter(|(_, distance)| *distance <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        [from_layer, from_sketch]
            .into_iter()
            .flatten()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(at, |(coord, _)| coord)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexGrab {
    pub feature: FeatureId,
    pub vertex: usize,
}

#[derive(Debug)]
pub struct ModifyTool {
    pub active: bool,
    grab: Option<VertexGrab>,
}

impl ModifyTool {
    pub const fn grab(&self) -> Option<VertexGrab> {
        self.grab
    }

    pub fn start(&mut self, grab: VertexGrab) {
        if self.active {
            self.grab = Some(grab);
        }
    }

    pub fn release(&mut self) -> Option<VertexGrab> {
        self.grab.take()
    }

    pub fn release_feature(&mut self, feature: FeatureId) {
        if self.grab.is_some_and(|grab| grab.feature == feature) {
            self.grab = None;
        }
    }
}

#[derive(Debug)]
pub struct SelectTool {
    pub active: bool,
    pub filter: Option<GeometryKind>,
}

impl SelectTool {
    pub fn pick(&self, at: Coord, resolution: f64, layer: &DrawLayer) -> Option<FeatureId> {
        if !self.active {
            return None;
        }
        let kind = self.filter?;
        layer.pick(at, PICK_TOLERANCE_PX * resolution, kind)
    }
}

#[derive(Debug)]
pub struct Interactions {
    pub draw: DrawTool,
    pub snap: SnapTool,
    pub modify: ModifyTool,
    pub select: SelectTool,
}

impl Default for Interactions {
    fn default() -> Self {
        Self::new()
    }
}

impl Interactions {
    /// All tools start inactive until a step mask is applied.
    pub const fn new() -> Self {
        Self {
            draw: DrawTool {
                active: false,
                kind: GeometryKind::Point,
                sketch: Vec::new(),
            },
            snap: SnapTool { active: false },
            modify: ModifyTool {
                active: false,
                grab: None,
            },
            select: SelectTool {
                active: false,
                filter: None,
            },
        }
    }

    /// Activates exactly the tools in `mask`; transient tool state (sketch,
    /// vertex grab) never survives a mask change.
    pub fn apply(&mut self, mask: InteractionMask, kind: Option<GeometryKind>) {
        self.draw.active = mask.draw;
        self.snap.active = mask.snap;
        self.modify.active = mask.modify;
        self.select.active = mask.select;

        if let Some(kind) = kind {
            self.draw.kind = kind;
        }
        self.select.filter = kind;

        self.draw.clear_sketch();
        self.modify.release();
    }

    pub const fn active_mask(&self) -> InteractionMask {
        InteractionMask {
            draw: self.draw.active,
            snap: self.snap.active,
            modify: self.modify.active,
            select: self.select.active,
        }
    }
}
