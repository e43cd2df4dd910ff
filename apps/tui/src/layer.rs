use crate::domain::{Coord, Feature, FeatureId, Geometry, GeometryKind};
use crate::geojson::FeatureDraft;

/// A vertex located by [`DrawLayer::nearest_vertex`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexHit {
    pub feature: FeatureId,
    pub vertex: usize,
    pub coord: Coord,
    pub distance: f64,
}

/// The ordered collection of user geometries behind the visible draw layer.
/// Insertion order is preserved so undo always drops the newest feature.
#[derive(Debug, Default)]
pub struct DrawLayer {
    features: Vec<Feature>,
    next_id: u64,
}

impl DrawLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, geometry: Geometry) -> FeatureId {
        self.next_id += 1;
        let id = FeatureId(self.next_id);
        self.features.push(Feature::new(id, geometry));
        id
    }

    pub fn add_labelled(&mut self, geometry: Geometry, label: Option<&str>) -> FeatureId {
        let id = self.add(geometry);
        if let Some(feature) = self.get_mut(id) {
            feature.set_label(label);
        }
        id
    }

    /// Appends decoded features in order; returns how many were added.
    pub fn load(&mut self, drafts: Vec<FeatureDraft>) -> usize {
        let count = drafts.len();
        for draft in drafts {
            self.add_labelled(draft.geometry, draft.label.as_deref());
        }
        count
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.iter().find(|feature| feature.id() == id)
    }

    pub fn get_mut(&mut self, id: FeatureId) -> Option<&mut Feature> {
        self.features.iter_mut().find(|feature| feature.id() == id)
    }

    pub fn remove(&mut self, id: FeatureId) -> Option<Feature> {
        let index = self.features.iter().position(|feature| feature.id() == id)?;
        Some(self.features.remove(index))
    }

    /// Removes the most recently added feature.
    pub fn pop_last(&mut self) -> Option<Feature> {
        self.features.pop()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn of_kind(&self, kind: GeometryKind) -> impl Iterator<Item = &Feature> {
        self.features
            .iter()
            .filter(move |feature| feature.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn count_of(&self, kind: GeometryKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn unlabelled_count(&self, kind: GeometryKind) -> usize {
        self.of_kind(kind)
            .filter(|feature| !feature.is_labelled())
            .count()
    }

    pub fn partition(&self) -> (Vec<&Feature>, Vec<&Feature>) {
        self.features
            .iter()
            .partition(|feature| feature.kind() == GeometryKind::Point)
    }

    /// Closest vertex of any feature (or only of `within`) inside `tolerance`.
    pub fn nearest_vertex(
        &self,
        at: Coord,
        tolerance: f64,
        within: Option<FeatureId>,
    ) -> Option<VertexHit> {
        self.features
            .iter()
            .filter(|feature| within.map_or(true, |id| feature.id() == id))
            .flat_map(|feature| {
                feature
                    .geometry()
                    .vertices()
                    .iter()
                    .enumerate()
                    .map(move |(vertex, coord)| VertexHit {
                        feature: feature.id(),
                        vertex,
                        coord: *coord,
                        distance: coord.distance(at),
                    })
            })
            .filter(|hit| hit.distance <= tolerance)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Hit-test restricted to `kind`: the nearest point within tolerance, or
    /// the topmost polygon containing `at`, else the polygon with the nearest
    /// vertex within tolerance.
    pub fn pick(&self, at: Coord, tolerance: f64, kind: GeometryKind) -> Option<FeatureId> {
        let nearest = self
            .of_kind(kind)
            .flat_map(|feature| {
                feature
                    .geometry()
                    .vertices()
                    .iter()
                    .map(move |coord| (feature.id(), coord.distance(at)))
            })
            .filter(|(_, distance)| *distance <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id);

        match kind {
            GeometryKind::Point => nearest,
            GeometryKind::Polygon => self
                .of_kind(kind)
                .filter(|feature| feature.geometry().contains(at))
                .last()
                .map(Feature::id)
                .or(nearest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64) -> Geometry {
        Geometry::Point(Coord::new(x, y))
    }

    fn square(origin: f64, size: f64) -> Geometry {
        Geometry::Polygon(vec![
            Coord::new(origin, origin),
            Coord::new(origin + size, origin),
            Coord::new(origin + size, origin + size),
            Coord::new(origin, origin + size),
        ])
    }

    #[test]
    fn undo_removes_only_the_newest_feature() {
        let mut layer = DrawLayer::new();
        let first = layer.add(point(0.0, 0.0));
        let second = layer.add(square(10.0, 5.0));
        let third = layer.add(point(3.0, 3.0));

        let removed = layer.pop_last().map(|feature| feature.id());
        assert_eq!(removed, Some(third));
        let remaining: Vec<_> = layer.iter().map(Feature::id).collect();
        assert_eq!(remaining, vec![first, second]);
    }

    #[test]
    fn ids_are_never_reused_after_removal() {
        let mut layer = DrawLayer::new();
        let first = layer.add(point(0.0, 0.0));
        layer.pop_last();
        let second = layer.add(point(0.0, 0.0));
        assert_ne!(first, second);
    }

    #[test]
    fn removing_from_the_middle_keeps_order() {
        let mut layer = DrawLayer::new();
        let a = layer.add(point(0.0, 0.0));
        let b = layer.add(point(1.0, 0.0));
        let c = layer.add(point(2.0, 0.0));

        assert!(layer.remove(b).is_some());
        assert!(layer.remove(b).is_none());
        assert_eq!(layer.pop_last().map(|f| f.id()), Some(c));
        assert_eq!(layer.pop_last().map(|f| f.id()), Some(a));
    }

    #[test]
    fn pick_filters_by_kind() {
        let mut layer = DrawLayer::new();
        let area = layer.add(square(0.0, 10.0));
        let ap = layer.add(point(5.0, 5.0));

        assert_eq!(layer.pick(Coord::new(5.5, 5.0), 1.0, GeometryKind::Point), Some(ap));
        assert_eq!(layer.pick(Coord::new(5.5, 5.0), 1.0, GeometryKind::Polygon), Some(area));
        assert_eq!(layer.pick(Coord::new(50.0, 50.0), 1.0, GeometryKind::Polygon), None);
    }

    #[test]
    fn nearest_vertex_respects_tolerance_and_scope() {
        let mut layer = DrawLayer::new();
        let area = layer.add(square(0.0, 10.0));
        layer.add(point(1.0, 1.0));

        let hit = layer.nearest_vertex(Coord::new(1.5, 1.5), 2.0, None);
        assert_eq!(hit.map(|h| h.coord), Some(Coord::new(1.0, 1.0)));

        let scoped = layer.nearest_vertex(Coord::new(1.5, 1.5), 3.0, Some(area));
        assert_eq!(scoped.map(|h| (h.feature, h.vertex)), Some((area, 0)));

        assert!(layer.nearest_vertex(Coord::new(40.0, 40.0), 2.0, None).is_none());
    }

    #[test]
    fn partition_splits_points_from_polygons() {
        let mut layer = DrawLayer::new();
        layer.add(point(0.0, 0.0));
        layer.add(square(0.0, 1.0));
        layer.add(point(2.0, 2.0));

        let (points, polygons) = layer.partition();
        assert_eq!(points.len(), 2);
        assert_eq!(polygons.len(), 1);
    }
}
