//! Step controller for the guided annotation workflow.
//!
//! Every legal move is a row of [`TRANSITIONS`]: the step it leaves, the
//! direction, an optional exit guard, the step it enters and the interaction
//! mask that becomes active there.

use crate::domain::GeometryKind;
use crate::layer::DrawLayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    PlacePoints,
    LabelPoints,
    PlacePolygons,
    LabelPolygons,
    Review,
    Submit,
}

impl Step {
    pub const ALL: [Self; 6] = [
        Self::PlacePoints,
        Self::LabelPoints,
        Self::PlacePolygons,
        Self::LabelPolygons,
        Self::Review,
        Self::Submit,
    ];

    pub const fn number(self) -> u8 {
        match self {
            Self::PlacePoints => 1,
            Self::LabelPoints => 2,
            Self::PlacePolygons => 3,
            Self::LabelPolygons => 4,
            Self::Review => 5,
            Self::Submit => 6,
        }
    }

    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::PlacePoints),
            2 => Some(Self::LabelPoints),
            3 => Some(Self::PlacePolygons),
            4 => Some(Self::LabelPolygons),
            5 => Some(Self::Review),
            6 => Some(Self::Submit),
            _ => None,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::PlacePoints => "Place Access Points",
            Self::LabelPoints => "Label Access Points",
            Self::PlacePolygons => "Place Areas of Interest",
            Self::LabelPolygons => "Label Areas of Interest",
            Self::Review => "Review",
            Self::Submit => "Send to Server",
        }
    }

    /// Geometry kind the step draws or selects, if any.
    pub const fn geometry_kind(self) -> Option<GeometryKind> {
        match self {
            Self::PlacePoints | Self::LabelPoints => Some(GeometryKind::Point),
            Self::PlacePolygons | Self::LabelPolygons => Some(GeometryKind::Polygon),
            Self::Review | Self::Submit => None,
        }
    }

    pub const fn mask(self) -> InteractionMask {
        match self {
            Self::PlacePoints | Self::PlacePolygons => InteractionMask::DRAWING,
            Self::LabelPoints | Self::LabelPolygons => InteractionMask::EDITING,
            Self::Review | Self::Submit => InteractionMask::NONE,
        }
    }

    pub const fn is_first(self) -> bool {
        matches!(self, Self::PlacePoints)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Submit)
    }

    /// The step whose Next button reads "Send".
    pub const fn is_last_before_submit(self) -> bool {
        matches!(self, Self::Review)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionMask {
    pub draw: bool,
    pub snap: bool,
    pub modify: bool,
    pub select: bool,
}

impl InteractionMask {
    pub const NONE: Self = Self {
        draw: false,
        snap: false,
        modify: false,
        select: false,
    };

    pub const DRAWING: Self = Self {
        draw: true,
        snap: true,
        modify: false,
        select: false,
    };

    pub const EDITING: Self = Self {
        draw: false,
        snap: false,
        modify: true,
        select: true,
    };
}

/// Exit condition checked before a forward move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    PointsIdentified,
    PolygonsNamed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Place at least one access point before continuing")]
    NoPoints,
    #[error("{0} access point(s) still need an identifier")]
    UnidentifiedPoints(usize),
    #[error("Draw at least one area of interest before continuing")]
    NoPolygons,
    #[error("{0} area(s) of interest still need a name")]
    UnnamedPolygons(usize),
}

impl Guard {
    pub fn check(self, layer: &DrawLayer) -> Result<(), ValidationError> {
        let (kind, empty, missing): (_, _, fn(usize) -> ValidationError) = match self {
            Self::PointsIdentified => (
                GeometryKind::Point,
                ValidationError::NoPoints,
                ValidationError::UnidentifiedPoints,
            ),
            Self::PolygonsNamed => (
                GeometryKind::Polygon,
                ValidationError::NoPolygons,
                ValidationError::UnnamedPolygons,
            ),
        };

        if layer.count_of(kind) == 0 {
            return Err(empty);
        }

        match layer.unlabelled_count(kind) {
            0 => Ok(()),
            unlabelled => Err(missing(unlabelled)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Step,
    pub direction: Direction,
    pub guard: Option<Guard>,
    pub next: Step,
    pub mask: InteractionMask,
}

const fn forward(from: Step, guard: Option<Guard>, next: Step) -> Transition {
    Transition {
        from,
        direction: Direction::Forward,
        guard,
        next,
        mask: next.mask(),
    }
}

const fn backward(from: Step, next: Step) -> Transition {
    Transition {
        from,
        direction: Direction::Backward,
        guard: None,
        next,
        mask: next.mask(),
    }
}

pub static TRANSITIONS: [Transition; 10] = [
    forward(Step::PlacePoints, Some(Guard::PointsIdentified), Step::LabelPoints),
    forward(Step::LabelPoints, None, Step::PlacePolygons),
    forward(Step::PlacePolygons, Some(Guard::PolygonsNamed), Step::LabelPolygons),
    forward(Step::LabelPolygons, None, Step::Review),
    forward(Step::Review, None, Step::Submit),
    backward(Step::LabelPoints, Step::PlacePoints),
    backward(Step::PlacePolygons, Step::LabelPoints),
    backward(Step::LabelPolygons, Step::PlacePolygons),
    backward(Step::Review, Step::LabelPolygons),
    backward(Step::Submit, Step::Review),
];

pub fn lookup(from: Step, direction: Direction) -> Option<&'static Transition> {
    TRANSITIONS
        .iter()
        .find(|row| row.from == from && row.direction == direction)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("no step {direction:?} of {from:?}")]
    Boundary { from: Step, direction: Direction },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone)]
pub struct Wizard {
    step: Step,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub const fn new() -> Self {
        Self {
            step: Step::PlacePoints,
        }
    }

    pub const fn step(&self) -> Step {
        self.step
    }

    /// Applies the table row for `(step, direction)`. The step is unchanged
    /// on any error.
    pub fn advance(
        &mut self,
        direction: Direction,
        layer: &DrawLayer,
    ) -> Result<&'static Transition, TransitionError> {
        let row = lookup(self.step, direction).ok_or(TransitionError::Boundary {
            from: self.step,
            direction,
        })?;

        if let Some(guard) = row.guard {
            guard.check(layer)?;
        }

        self.step = row.next;
        Ok(row)
    }

    /// Steps back one position without consulting guards.
    pub fn revert(&mut self) -> Option<&'static Transition> {
        let row = lookup(self.step, Direction::Backward)?;
        self.step = row.next;
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coord, Geometry};

    #[test]
    fn every_step_number_round_trips() {
        for step in Step::ALL {
            assert_eq!(Step::from_number(step.number()), Some(step));
        }
        assert_eq!(Step::from_number(0), None);
        assert_eq!(Step::from_number(7), None);
    }

    #[test]
    fn masks_follow_the_step_table() {
        assert_eq!(Step::PlacePoints.mask(), InteractionMask::DRAWING);
        assert_eq!(Step::LabelPoints.mask(), InteractionMask::EDITING);
        assert_eq!(Step::PlacePolygons.mask(), InteractionMask::DRAWING);
        assert_eq!(Step::LabelPolygons.mask(), InteractionMask::EDITING);
        assert_eq!(Step::Review.mask(), InteractionMask::NONE);
        assert_eq!(Step::Submit.mask(), InteractionMask::NONE);
    }

    #[test]
    fn at_most_one_interaction_pair_is_active_per_step() {
        for step in Step::ALL {
            let mask = step.mask();
            assert_eq!(mask.draw, mask.snap, "{step:?}");
            assert_eq!(mask.select, mask.modify, "{step:?}");
            assert!(!(mask.draw && mask.select), "{step:?}");
        }
    }

    #[test]
    fn table_rows_are_adjacent_and_carry_target_masks() {
        for row in &TRANSITIONS {
            let delta = i16::from(row.next.number()) - i16::from(row.from.number());
            match row.direction {
                Direction::Forward => assert_eq!(delta, 1, "{row:?}"),
                Direction::Backward => assert_eq!(delta, -1, "{row:?}"),
            }
            assert_eq!(row.mask, row.next.mask(), "{row:?}");
        }
    }

    #[test]
    fn only_exits_from_drawing_steps_are_guarded() {
        let guarded: Vec<_> = TRANSITIONS
            .iter()
            .filter(|row| row.guard.is_some())
            .map(|row| (row.from, row.next))
            .collect();
        assert_eq!(
            guarded,
            vec![
                (Step::PlacePoints, Step::LabelPoints),
                (Step::PlacePolygons, Step::LabelPolygons)
            ]
        );
    }

    #[test]
    fn boundaries_are_refused() {
        let layer = DrawLayer::new();
        let mut wizard = Wizard::new();
        assert!(matches!(
            wizard.advance(Direction::Backward, &layer),
            Err(TransitionError::Boundary { .. })
        ));
        assert_eq!(wizard.step(), Step::PlacePoints);

        assert!(lookup(Step::Submit, Direction::Forward).is_none());
    }

    #[test]
    fn points_guard_requires_identifiers() {
        let mut layer = DrawLayer::new();
        let mut wizard = Wizard::new();

        assert_eq!(
            wizard.advance(Direction::Forward, &layer),
            Err(TransitionError::Validation(ValidationError::NoPoints))
        );

        let a = layer.add(Geometry::Point(Coord::new(0.0, 0.0)));
        let b = layer.add(Geometry::Point(Coord::new(1.0, 1.0)));
        assert_eq!(
            wizard.advance(Direction::Forward, &layer),
            Err(TransitionError::Validation(
                ValidationError::UnidentifiedPoints(2)
            ))
        );
        assert_eq!(wizard.step(), Step::PlacePoints);

        for (id, label) in [(a, "AP-1"), (b, "AP-2")] {
            layer.get_mut(id).unwrap().set_label(Some(label));
        }
        let row = wizard.advance(Direction::Forward, &layer).unwrap();
        assert_eq!(row.next, Step::LabelPoints);
        assert_eq!(wizard.step(), Step::LabelPoints);
    }

    #[test]
    fn polygon_guard_requires_names() {
        let mut layer = DrawLayer::new();
        let mut wizard = Wizard { step: Step::PlacePolygons };

        let area = layer.add(Geometry::Polygon(vec![
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(1.0, 1.0),
        ]));
        assert_eq!(
            wizard.advance(Direction::Forward, &layer),
            Err(TransitionError::Validation(ValidationError::UnnamedPolygons(1)))
        );

        layer.get_mut(area).unwrap().set_label(Some("Lobby"));
        assert!(wizard.advance(Direction::Forward, &layer).is_ok());
        assert_eq!(wizard.step(), Step::LabelPolygons);
    }

    #[test]
    fn unguarded_points_do_not_block_polygon_exit() {
        let mut layer = DrawLayer::new();
        layer.add(Geometry::Point(Coord::new(0.0, 0.0)));
        let area = layer.add(Geometry::Polygon(vec![
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(1.0, 1.0),
        ]));
        layer.get_mut(area).unwrap().set_label(Some("Lobby"));

        assert_eq!(Guard::PolygonsNamed.check(&layer), Ok(()));
    }

    #[test]
    fn revert_steps_back_without_guards() {
        let mut wizard = Wizard { step: Step::Submit };
        assert_eq!(wizard.revert().map(|row| row.next), Some(Step::Review));
        assert_eq!(wizard.step(), Step::Review);

        let mut first = Wizard::new();
        assert!(first.revert().is_none());
        assert_eq!(first.step(), Step::PlacePoints);
    }
}
