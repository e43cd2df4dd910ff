//! One annotation run: the draw layer together with every tool that acts on
//! it. All mutation goes through [`Session`]; the front end only translates
//! keys into these calls and renders the result.

use crate::domain::{Feature, FeatureId, Geometry, GeometryKind};
use crate::geojson::{self, FeatureCollection, GeoJsonError};
use crate::interactions::{Interactions, VertexGrab, PICK_TOLERANCE_PX};
use crate::label::{LabelEditor, LabelStyle};
use crate::layer::DrawLayer;
use crate::status::{Status, StatusBanner, StatusLevel};
use crate::submit::{SubmissionBatch, SubmitError};
use crate::view::{MapView, ViewOptions};
use crate::wizard::{Direction, Step, Transition, TransitionError, ValidationError, Wizard};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Minimum vertex count of a finished polygon sketch.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Outcome of a step change request.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Moved(Step),
    /// Guard failed; a warning banner is showing and nothing changed.
    Blocked(ValidationError),
    /// Past a boundary, or a submission is still running.
    Refused,
    /// Entered the submit step: the caller sends this batch and reports back
    /// through [`Session::finish_submission`].
    Submit(SubmissionBatch),
}

#[derive(Debug)]
pub struct Session {
    layer: DrawLayer,
    wizard: Wizard,
    interactions: Interactions,
    view: MapView,
    selected: Option<FeatureId>,
    editor: LabelEditor,
    status: StatusBanner,
    in_flight: bool,
}

impl Session {
    pub fn new(options: &ViewOptions) -> Self {
        let wizard = Wizard::new();
        let mut interactions = Interactions::new();
        let step = wizard.step();
        interactions.apply(step.mask(), step.geometry_kind());

        Self {
            layer: DrawLayer::new(),
            wizard,
            interactions,
            view: MapView::from_options(options),
            selected: None,
            editor: LabelEditor::default(),
            status: StatusBanner::default(),
            in_flight: false,
        }
    }

    /// Appends a saved collection to the layer.
    pub fn load_collection(&mut self, collection: &FeatureCollection) -> Result<usize, GeoJsonError> {
        let drafts = geojson::decode(collection)?;
        let count = self.layer.load(drafts);
        info!("Loaded {} saved feature(s)", count);
        Ok(count)
    }

    pub const fn layer(&self) -> &DrawLayer {
        &self.layer
    }

    pub const fn step(&self) -> Step {
        self.wizard.step()
    }

    pub const fn view(&self) -> &MapView {
        &self.view
    }

    pub const fn interactions(&self) -> &Interactions {
        &self.interactions
    }

    pub const fn selected(&self) -> Option<FeatureId> {
        self.selected
    }

    pub fn selected_feature(&self) -> Option<&Feature> {
        self.layer.get(self.selected?)
    }

    pub const fn editor(&self) -> &LabelEditor {
        &self.editor
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.current()
    }

    pub const fn is_submitting(&self) -> bool {
        self.in_flight
    }

    /// Geometry kind whose label the form currently edits.
    pub const fn label_kind(&self) -> Option<GeometryKind> {
        self.wizard.step().geometry_kind()
    }

    pub fn set_status(&mut self, level: StatusLevel, message: impl Into<String>, now: Instant) {
        self.status.set(level, message, now);
    }

    pub fn tick(&mut self, now: Instant) {
        self.status.tick(now);
    }

    pub fn advance(&mut self, direction: Direction, now: Instant) -> Advance {
        if self.in_flight {
            return Advance::Refused;
        }

        match self.wizard.advance(direction, &self.layer) {
            Ok(row) => {
                self.enter(row);
                if row.next.is_terminal() {
                    self.in_flight = true;
                    self.status.set_sticky(StatusLevel::Info, "Sending to server...");
                    Advance::Submit(SubmissionBatch::from_layer(&self.layer))
                } else {
                    Advance::Moved(row.next)
                }
            }
            Err(TransitionError::Validation(err)) => {
                warn!("Step {} blocked: {}", self.step().number(), err);
                self.status.set(StatusLevel::Warning, err.to_string(), now);
                Advance::Blocked(err)
            }
            Err(TransitionError::Boundary { .. }) => Advance::Refused,
        }
    }

    /// Reports the joined submission result. On success the banner confirms
    /// and the full collection to persist is returned; on failure the wizard
    /// moves back one step.
    pub fn finish_submission(
        &mut self,
        result: Result<(), SubmitError>,
        now: Instant,
    ) -> Option<FeatureCollection> {
        self.in_flight = false;
        match result {
            Ok(()) => {
                self.status
                    .set(StatusLevel::Success, "Features submitted", now);
                Some(geojson::encode(self.layer.iter()))
            }
            Err(err) => {
                self.status.set(StatusLevel::Error, err.to_string(), now);
                if let Some(row) = self.wizard.revert() {
                    self.enter(row);
                }
                None
            }
        }
    }

    fn enter(&mut self, row: &Transition) {
        debug!("Entering step {} ({:?})", row.next.number(), row.mask);
        self.interactions.apply(row.mask, row.next.geometry_kind());

        let keep = self
            .selected_feature()
            .is_some_and(|feature| Some(feature.kind()) == row.next.geometry_kind());
        if !keep {
            self.select(None);
        }
    }

    /// Enter/Space at the crosshair: draw, release a grab, or select.
    pub fn primary_action(&mut self, now: Instant) {
        if self.in_flight {
            return;
        }

        let center = self.view.center();
        if self.interactions.draw.active {
            let at = self.interactions.snap.snap(
                center,
                self.view.resolution(),
                &self.layer,
                self.interactions.draw.sketch(),
            );
            match self.interactions.draw.kind {
                GeometryKind::Point => {
                    let id = self.layer.add(Geometry::Point(at));
                    debug!("Placed point {}", id);
                    self.select(Some(id));
                }
                GeometryKind::Polygon => self.interactions.draw.push_vertex(at),
            }
        } else if self.interactions.modify.grab().is_some() {
            self.interactions.modify.release();
        } else if self.interactions.select.active {
            let picked =
                self.interactions
                    .select
                    .pick(center, self.view.resolution(), &self.layer);
            if picked.is_none() {
                self.status
                    .set(StatusLevel::Info, "Nothing to select here", now);
            }
            self.select(picked);
        }
    }

    /// Closes the polygon sketch into a feature and selects it.
    pub fn finish_sketch(&mut self, now: Instant) -> Option<FeatureId> {
        if self.in_flight || !self.interactions.draw.active {
            return None;
        }
        if self.interactions.draw.kind != GeometryKind::Polygon {
            return None;
        }

        let count = self.interactions.draw.sketch().len();
        if count < MIN_POLYGON_VERTICES {
            self.status.set(
                StatusLevel::Warning,
                format!("A polygon needs at least {MIN_POLYGON_VERTICES} vertices"),
                now,
            );
            return None;
        }

        let ring = self.interactions.draw.take_sketch();
        let id = self.layer.add(Geometry::Polygon(ring));
        debug!("Finished polygon {} with {} vertices", id, count);
        self.select(Some(id));
        Some(id)
    }

    pub fn pop_sketch_vertex(&mut self) {
        self.interactions.draw.pop_vertex();
    }

    pub fn cancel_sketch(&mut self) {
        self.interactions.draw.clear_sketch();
    }

    /// Grabs the selected feature's vertex nearest the crosshair, or drops
    /// the current grab.
    pub fn toggle_grab(&mut self, now: Instant) {
        if self.in_flight || !self.interactions.modify.active {
            return;
        }
        if self.interactions.modify.release().is_some() {
            return;
        }

        let Some(selected) = self.selected else {
            self.status
                .set(StatusLevel::Info, "Select a feature to move its vertices", now);
            return;
        };

        let tolerance = PICK_TOLERANCE_PX * self.view.resolution();
        match self
            .layer
            .nearest_vertex(self.view.center(), tolerance, Some(selected))
        {
            Some(hit) => {
                self.interactions.modify.start(VertexGrab {
                    feature: hit.feature,
                    vertex: hit.vertex,
                });
                // snap the grabbed vertex onto the crosshair before it follows panning
                self.drag_grabbed();
            }
            None => self
                .status
                .set(StatusLevel::Info, "No vertex under the crosshair", now),
        }
    }

    pub fn pan(&mut self, dx_px: f64, dy_px: f64) {
        self.view.pan(dx_px, dy_px);
        self.drag_grabbed();
    }

    fn drag_grabbed(&mut self) {
        let Some(grab) = self.interactions.modify.grab() else {
            return;
        };
        let center = self.view.center();
        let moved = self
            .layer
            .get_mut(grab.feature)
            .is_some_and(|feature| feature.geometry_mut().move_vertex(grab.vertex, center));
        if !moved {
            self.interactions.modify.release();
        }
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.view.zoom_by(delta);
    }

    /// Applies edited view options; unchanged fields keep the live view.
    pub fn apply_options(&mut self, previous: &ViewOptions, options: &ViewOptions) {
        self.interactions.modify.release();
        self.view.update(previous, options);
    }

    /// Removes the most recently added feature.
    pub fn undo(&mut self) -> Option<FeatureId> {
        if self.in_flight {
            return None;
        }
        let removed = self.layer.pop_last()?.id();
        self.forget(removed);
        Some(removed)
    }

    /// Removes the selected feature. No-op without a selection.
    pub fn delete_selected(&mut self) -> Option<FeatureId> {
        if self.in_flight {
            return None;
        }
        let selected = self.selected?;
        self.layer.remove(selected)?;
        self.forget(selected);
        Some(selected)
    }

    fn forget(&mut self, id: FeatureId) {
        self.interactions.modify.release_feature(id);
        if self.selected == Some(id) {
            self.select(None);
        }
    }

    /// Changes the selection and rebinds the label form to it.
    pub fn select(&mut self, id: Option<FeatureId>) {
        self.selected = id.filter(|id| self.layer.get(*id).is_some());
        if let Some(grab) = self.interactions.modify.grab() {
            if Some(grab.feature) != self.selected {
                self.interactions.modify.release();
            }
        }
        self.editor.bind(self.selected.and_then(|id| self.layer.get(id)));
    }

    /// Moves the label target to the next feature of the current step's kind.
    pub fn cycle_label_target(&mut self) -> Option<FeatureId> {
        if self.in_flight {
            return None;
        }
        let kind = self.label_kind()?;
        let ids: Vec<FeatureId> = self.layer.of_kind(kind).map(Feature::id).collect();
        let next = match self
            .selected
            .and_then(|current| ids.iter().position(|id| *id == current))
        {
            Some(index) => ids.get((index + 1) % ids.len()).copied(),
            None => ids.first().copied(),
        };
        self.select(next);
        next
    }

    pub fn push_label_char(&mut self, ch: char) {
        if !self.in_flight {
            self.editor.push(ch);
        }
    }

    pub fn pop_label_char(&mut self) {
        self.editor.pop();
    }

    /// Commits the label buffer to the selected feature.
    pub fn submit_label(&mut self, now: Instant) -> Option<LabelStyle> {
        if self.in_flight {
            return None;
        }
        let Some(style) = self.editor.submit(&mut self.layer) else {
            self.status
                .set(StatusLevel::Info, "Nothing selected to label", now);
            return None;
        };
        // reload so the buffer shows the trimmed value
        self.editor
            .bind(self.selected.and_then(|id| self.layer.get(id)));
        if let Some(style) = &style {
            self.status.set(StatusLevel::Info, format!("Labelled {}", style.text), now);
        }
        style
    }

    /// Ends the session, releasing the tools and returning the final layer
    /// encoding.
    pub fn finish(self) -> FeatureCollection {
        let Self { layer, .. } = self;
        geojson::encode(layer.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coord;
    use crate::wizard::InteractionMask;

    fn session() -> Session {
        Session::new(&ViewOptions::default())
    }

    fn place_point(session: &mut Session, now: Instant) -> FeatureId {
        session.primary_action(now);
        let id = session.selected().unwrap();
        // move away so the next point does not snap onto this one
        session.pan(200.0, 0.0);
        id
    }

    fn label(session: &mut Session, id: FeatureId, text: &str, now: Instant) {
        session.select(Some(id));
        while !session.editor().text().is_empty() {
            session.pop_label_char();
        }
        text.chars().for_each(|c| session.push_label_char(c));
        session.submit_label(now);
    }

    fn draw_square(session: &mut Session, now: Instant) -> FeatureId {
        session.primary_action(now);
        session.pan(200.0, 0.0);
        session.primary_action(now);
        session.pan(0.0, 200.0);
        session.primary_action(now);
        session.pan(-200.0, 0.0);
        session.primary_action(now);
        session.finish_sketch(now).unwrap()
    }

    fn reach_review(session: &mut Session, now: Instant) -> (FeatureId, FeatureId) {
        let point = place_point(session, now);
        label(session, point, "AP-1", now);
        assert_eq!(session.advance(Direction::Forward, now), Advance::Moved(Step::LabelPoints));
        assert_eq!(session.advance(Direction::Forward, now), Advance::Moved(Step::PlacePolygons));
        let area = draw_square(session, now);
        label(session, area, "Lobby", now);
        assert_eq!(session.advance(Direction::Forward, now), Advance::Moved(Step::LabelPolygons));
        assert_eq!(session.advance(Direction::Forward, now), Advance::Moved(Step::Review));
        (point, area)
    }

    #[test]
    fn session_starts_in_place_points_with_draw_mask() {
        let session = session();
        assert_eq!(session.step(), Step::PlacePoints);
        assert_eq!(session.interactions().active_mask(), InteractionMask::DRAWING);
    }

    #[test]
    fn unlabelled_points_block_then_labelled_points_pass() {
        let now = Instant::now();
        let mut session = session();
        let a = place_point(&mut session, now);
        let b = place_point(&mut session, now);

        let outcome = session.advance(Direction::Forward, now);
        assert_eq!(
            outcome,
            Advance::Blocked(ValidationError::UnidentifiedPoints(2))
        );
        assert_eq!(session.step(), Step::PlacePoints);
        assert_eq!(session.status().map(|s| s.level), Some(StatusLevel::Warning));

        label(&mut session, a, "AP-1", now);
        label(&mut session, b, "AP-2", now);
        assert_eq!(session.advance(Direction::Forward, now), Advance::Moved(Step::LabelPoints));
        assert_eq!(session.step().number(), 2);
    }

    #[test]
    fn unnamed_polygons_block_the_polygon_step() {
        let now = Instant::now();
        let mut session = session();
        let point = place_point(&mut session, now);
        label(&mut session, point, "AP-1", now);
        session.advance(Direction::Forward, now);
        session.advance(Direction::Forward, now);

        assert_eq!(
            session.advance(Direction::Forward, now),
            Advance::Blocked(ValidationError::NoPolygons)
        );
        let area = draw_square(&mut session, now);
        session.select(None);
        assert_eq!(
            session.advance(Direction::Forward, now),
            Advance::Blocked(ValidationError::UnnamedPolygons(1))
        );
        label(&mut session, area, "Lobby", now);
        assert_eq!(
            session.advance(Direction::Forward, now),
            Advance::Moved(Step::LabelPolygons)
        );
    }

    #[test]
    fn undo_removes_only_the_newest_feature() {
        let now = Instant::now();
        let mut session = session();
        let first = place_point(&mut session, now);
        let second = place_point(&mut session, now);

        assert_eq!(session.undo(), Some(second));
        let left: Vec<_> = session.layer().iter().map(Feature::id).collect();
        assert_eq!(left, vec![first]);
    }

    #[test]
    fn delete_without_selection_is_a_no_op() {
        let now = Instant::now();
        let mut session = session();
        place_point(&mut session, now);
        session.select(None);

        assert_eq!(session.delete_selected(), None);
        assert_eq!(session.layer().len(), 1);
    }

    #[test]
    fn delete_removes_the_selected_feature_and_clears_selection() {
        let now = Instant::now();
        let mut session = session();
        let first = place_point(&mut session, now);
        place_point(&mut session, now);
        session.select(Some(first));

        assert_eq!(session.delete_selected(), Some(first));
        assert!(session.selected().is_none());
        assert_eq!(session.editor().text(), "");
        assert!(session.layer().get(first).is_none());
    }

    #[test]
    fn label_persists_across_selection_changes() {
        let now = Instant::now();
        let mut session = session();
        let a = place_point(&mut session, now);
        let b = place_point(&mut session, now);
        label(&mut session, a, "AP-1", now);

        session.select(Some(b));
        assert_eq!(session.editor().text(), "");
        session.select(Some(a));
        assert_eq!(session.editor().text(), "AP-1");
        assert_eq!(session.selected_feature().and_then(Feature::label), Some("AP-1"));
    }

    #[test]
    fn entering_submit_returns_the_partitioned_batch() {
        let now = Instant::now();
        let mut session = session();
        reach_review(&mut session, now);

        let Advance::Submit(batch) = session.advance(Direction::Forward, now) else {
            panic!("expected submission");
        };
        assert_eq!(session.step(), Step::Submit);
        assert!(session.is_submitting());
        assert_eq!(batch.points.len(), 1);
        assert_eq!(batch.polygons.len(), 1);
        assert_eq!(session.advance(Direction::Backward, now), Advance::Refused);
    }

    #[test]
    fn successful_submission_yields_the_full_collection() {
        let now = Instant::now();
        let mut session = session();
        reach_review(&mut session, now);
        session.advance(Direction::Forward, now);

        let saved = session.finish_submission(Ok(()), now).unwrap();
        assert_eq!(session.status().map(|s| s.level), Some(StatusLevel::Success));
        assert_eq!(session.step(), Step::Submit);
        assert_eq!(saved.len(), 2);
        assert_eq!(saved.count_of(GeometryKind::Point), 1);
        assert_eq!(saved.count_of(GeometryKind::Polygon), 1);
        assert_eq!(session.advance(Direction::Forward, now), Advance::Refused);
    }

    #[test]
    fn failed_submission_reverts_one_step_with_the_error_message() {
        let now = Instant::now();
        let mut session = session();
        reach_review(&mut session, now);
        session.advance(Direction::Forward, now);

        let failure = Err(SubmitError::Transport("connection refused".to_string()));
        assert!(session.finish_submission(failure, now).is_none());

        assert_eq!(session.step(), Step::Review);
        assert_eq!(session.interactions().active_mask(), Step::Review.mask());
        let status = session.status().unwrap();
        assert_eq!(status.level, StatusLevel::Error);
        assert_eq!(status.message, "connection refused");
        assert!(!session.is_submitting());
    }

    #[test]
    fn navigation_is_ignored_while_submitting() {
        let now = Instant::now();
        let mut session = session();
        reach_review(&mut session, now);
        session.advance(Direction::Forward, now);

        let count = session.layer().len();
        assert!(session.undo().is_none());
        assert_eq!(session.layer().len(), count);
        assert_eq!(session.advance(Direction::Backward, now), Advance::Refused);
    }

    #[test]
    fn selection_survives_only_matching_step_kinds() {
        let now = Instant::now();
        let mut session = session();
        let point = place_point(&mut session, now);
        label(&mut session, point, "AP-1", now);

        session.advance(Direction::Forward, now);
        assert_eq!(session.selected(), Some(point));

        session.advance(Direction::Forward, now);
        assert_eq!(session.selected(), None);
        assert_eq!(session.editor().text(), "");
    }

    #[test]
    fn step_change_discards_the_sketch() {
        let now = Instant::now();
        let mut session = session();
        let point = place_point(&mut session, now);
        label(&mut session, point, "AP-1", now);
        session.advance(Direction::Forward, now);
        session.advance(Direction::Forward, now);

        session.primary_action(now);
        assert_eq!(session.interactions().draw.sketch().len(), 1);
        session.advance(Direction::Backward, now);
        assert!(session.interactions().draw.sketch().is_empty());
    }

    #[test]
    fn short_sketch_is_not_finished() {
        let now = Instant::now();
        let mut session = session();
        let point = place_point(&mut session, now);
        label(&mut session, point, "AP-1", now);
        session.advance(Direction::Forward, now);
        session.advance(Direction::Forward, now);

        session.primary_action(now);
        session.pan(200.0, 0.0);
        session.primary_action(now);
        assert!(session.finish_sketch(now).is_none());
        assert_eq!(session.layer().count_of(GeometryKind::Polygon), 0);
        assert_eq!(session.status().map(|s| s.level), Some(StatusLevel::Warning));
    }

    #[test]
    fn drawing_snaps_to_existing_vertices() {
        let now = Instant::now();
        let mut session = session();
        session.primary_action(now);
        let first = session.selected().unwrap();
        // a few pixels away stays within the snap tolerance
        session.pan(3.0, 0.0);
        session.primary_action(now);
        let second = session.selected().unwrap();

        let a = session.layer().get(first).unwrap().geometry().centroid();
        let b = session.layer().get(second).unwrap().geometry().centroid();
        assert_eq!(a, b);
    }

    #[test]
    fn grabbed_vertex_follows_panning() {
        let now = Instant::now();
        let mut session = session();
        let point = place_point(&mut session, now);
        label(&mut session, point, "AP-1", now);
        session.advance(Direction::Forward, now);

        session.pan(-200.0, 0.0);
        session.toggle_grab(now);
        assert!(session.interactions().modify.grab().is_some());

        session.pan(0.0, 50.0);
        session.toggle_grab(now);
        assert!(session.interactions().modify.grab().is_none());

        let moved = session.layer().get(point).unwrap().geometry().centroid();
        assert!(moved.distance(session.view().center()) < 1e-6);
    }

    #[test]
    fn select_in_label_steps_filters_by_kind() {
        let now = Instant::now();
        let mut session = session();
        let point = place_point(&mut session, now);
        label(&mut session, point, "AP-1", now);
        session.advance(Direction::Forward, now);
        session.select(None);

        session.pan(-200.0, 0.0);
        session.primary_action(now);
        assert_eq!(session.selected(), Some(point));

        session.pan(5_000.0, 0.0);
        session.primary_action(now);
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn cycle_label_target_wraps_within_the_step_kind() {
        let now = Instant::now();
        let mut session = session();
        let a = place_point(&mut session, now);
        let b = place_point(&mut session, now);

        session.select(None);
        assert_eq!(session.cycle_label_target(), Some(a));
        assert_eq!(session.cycle_label_target(), Some(b));
        assert_eq!(session.cycle_label_target(), Some(a));
    }

    #[test]
    fn saved_collection_round_trips_through_a_session() -> Result<(), GeoJsonError> {
        let saved = FeatureCollection::parse(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"id":"AP-9"},
                 "geometry":{"type":"Point","coordinates":[11.66725,48.262725]}},
                {"type":"Feature","properties":{"name":"Hall"},
                 "geometry":{"type":"Polygon","coordinates":[[[11.667,48.262],[11.668,48.262],
                 [11.668,48.263],[11.667,48.262]]]}}]}"#,
        )?;

        let mut session = session();
        assert_eq!(session.load_collection(&saved)?, 2);
        let written = session.finish();

        assert_eq!(written.len(), saved.len());
        for (before, after) in saved.features.iter().zip(&written.features) {
            assert_eq!(before.geometry.kind(), after.geometry.kind());
            assert_eq!(before.label(), after.label());
        }
        Ok(())
    }

    #[test]
    fn redrawn_position_matches_crosshair() {
        let now = Instant::now();
        let mut session = session();
        let id = place_point(&mut session, now);
        let at = session.layer().get(id).unwrap().geometry().centroid();
        let expected = session.view().center().offset(-200.0 * session.view().resolution(), 0.0);
        assert!(at.distance(expected) < 1e-6);
        assert_ne!(at, Coord::new(0.0, 0.0));
    }
}
