/// A position in the display projection (EPSG:3857 metres).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Polygon,
}

impl GeometryKind {
    /// Property key the single attribute is stored under in GeoJSON.
    pub const fn attribute_key(self) -> &'static str {
        match self {
            Self::Point => "id",
            Self::Polygon => "name",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Point => "Access Point",
            Self::Polygon => "Area of Interest",
        }
    }

    pub const fn field_label(self) -> &'static str {
        match self {
            Self::Point => "Identifier",
            Self::Polygon => "Name",
        }
    }
}

/// Point or simple polygon. Polygon rings are stored open: the closing
/// vertex is implied and only added when encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    Polygon(Vec<Coord>),
}

impl Geometry {
    pub const fn kind(&self) -> GeometryKind {
        match self {
            Self::Point(_) => GeometryKind::Point,
            Self::Polygon(_) => GeometryKind::Polygon,
        }
    }

    pub fn vertices(&self) -> &[Coord] {
        match self {
            Self::Point(coord) => std::slice::from_ref(coord),
            Self::Polygon(ring) => ring,
        }
    }

    /// Moves a single vertex. Returns false when the index is out of range.
    pub fn move_vertex(&mut self, index: usize, to: Coord) -> bool {
        let slot = match self {
            Self::Point(coord) if index == 0 => Some(coord),
            Self::Point(_) => None,
            Self::Polygon(ring) => ring.get_mut(index),
        };

        let Some(vertex) = slot else {
            return false;
        };
        *vertex = to;
        true
    }

    /// Area-weighted centroid for polygons, falling back to the vertex mean
    /// for degenerate rings.
    pub fn centroid(&self) -> Coord {
        match self {
            Self::Point(coord) => *coord,
            Self::Polygon(ring) => polygon_centroid(ring),
        }
    }

    /// Even-odd containment test. Points never contain anything.
    pub fn contains(&self, at: Coord) -> bool {
        let Self::Polygon(ring) = self else {
            return false;
        };

        let mut inside = false;
        let mut j = ring.len().wrapping_sub(1);
        for (i, a) in ring.iter().enumerate() {
            let b = ring[j];
            if (a.y > at.y) != (b.y > at.y) {
                let cross_x = (b.x - a.x) * (at.y - a.y) / (b.y - a.y) + a.x;
                if at.x < cross_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

fn polygon_centroid(ring: &[Coord]) -> Coord {
    if ring.is_empty() {
        return Coord::new(0.0, 0.0);
    }

    let mut area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        let cross = a.x.mul_add(b.y, -(b.x * a.y));
        area += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }

    if area.abs() < f64::EPSILON {
        #[allow(clippy::cast_precision_loss)]
        let n = ring.len() as f64;
        let (sx, sy) = ring
            .iter()
            .fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));
        return Coord::new(sx / n, sy / n);
    }

    area *= 0.5;
    Coord::new(cx / (6.0 * area), cy / (6.0 * area))
}

/// The single free-form attribute a feature may carry. The variant is fixed
/// by the geometry kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Identifier(String),
    Name(String),
}

impl Attribute {
    pub fn for_kind(kind: GeometryKind, value: impl Into<String>) -> Self {
        match kind {
            GeometryKind::Point => Self::Identifier(value.into()),
            GeometryKind::Polygon => Self::Name(value.into()),
        }
    }

    pub const fn key(&self) -> &'static str {
        match self {
            Self::Identifier(_) => GeometryKind::Point.attribute_key(),
            Self::Name(_) => GeometryKind::Polygon.attribute_key(),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Identifier(value) | Self::Name(value) => value,
        }
    }

    /// Text rendered next to the feature on the map.
    pub fn label_text(&self) -> String {
        format!("{} {}", self.key(), self.value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(pub(crate) u64);

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    id: FeatureId,
    geometry: Geometry,
    attribute: Option<Attribute>,
}

impl Feature {
    pub(crate) const fn new(id: FeatureId, geometry: Geometry) -> Self {
        Self {
            id,
            geometry,
            attribute: None,
        }
    }

    pub const fn id(&self) -> FeatureId {
        self.id
    }

    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    pub const fn kind(&self) -> GeometryKind {
        self.geometry.kind()
    }

    pub const fn attribute(&self) -> Option<&Attribute> {
        self.attribute.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.attribute.as_ref().map(Attribute::value)
    }

    pub fn is_labelled(&self) -> bool {
        self.label().is_some_and(|value| !value.trim().is_empty())
    }

    /// Replaces whatever attribute the feature had. Blank values unset it.
    pub fn set_label(&mut self, value: Option<&str>) {
        self.attribute = value
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Attribute::for_kind(self.kind(), value));
    }
}
