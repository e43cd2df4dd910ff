//! Single-field label editor bound to the selected feature.

use crate::domain::{Coord, Feature, FeatureId, GeometryKind};
use crate::layer::DrawLayer;

/// Vertical screen offset for point labels; negative is up.
pub const POINT_LABEL_OFFSET_PX: f64 = -10.0;

/// How a labelled feature is drawn: text at an anchor plus a screen offset.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub text: String,
    pub anchor: Coord,
    pub offset_y_px: f64,
}

/// Computes the label style for a feature. Unlabelled features get none.
pub fn label_style(feature: &Feature) -> Option<LabelStyle> {
    let attribute = feature.attribute()?;
    let (anchor, offset_y_px) = match feature.kind() {
        GeometryKind::Point => (feature.geometry().centroid(), POINT_LABEL_OFFSET_PX),
        GeometryKind::Polygon => (feature.geometry().centroid(), 0.0),
    };

    Some(LabelStyle {
        text: attribute.label_text(),
        anchor,
        offset_y_px,
    })
}

#[derive(Debug, Default)]
pub struct LabelEditor {
    target: Option<FeatureId>,
    kind: Option<GeometryKind>,
    text: String,
}

impl LabelEditor {
    /// Rebinds to a new selection, loading its current attribute.
    pub fn bind(&mut self, feature: Option<&Feature>) {
        self.target = feature.map(Feature::id);
        self.kind = feature.map(Feature::kind);
        self.text = feature
            .and_then(Feature::label)
            .map(str::to_string)
            .unwrap_or_default();
    }

    pub const fn target(&self) -> Option<FeatureId> {
        self.target
    }

    pub const fn kind(&self) -> Option<GeometryKind> {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push(&mut self, ch: char) {
        if self.target.is_some() {
            self.text.push(ch);
        }
    }

    pub fn pop(&mut self) {
        self.text.pop();
    }

    /// Writes the buffer into the bound feature and returns its refreshed
    /// style. `None` when nothing is bound or the feature is gone.
    pub fn submit(&self, layer: &mut DrawLayer) -> Option<Option<LabelStyle>> {
        let feature = layer.get_mut(self.target?)?;
        feature.set_label(Some(&self.text));
        Some(label_style(feature))
    }
}
