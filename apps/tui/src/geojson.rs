//! GeoJSON FeatureCollection encoding for the draw layer.
//!
//! Features live in display metres; everything written here is reprojected to
//! geographic coordinates (EPSG:4326) and everything read is projected back.

use crate::domain::{Coord, Feature, Geometry, GeometryKind};
use crate::projection::{from_lon_lat, to_lon_lat};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum GeoJsonError {
    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("position needs at least two ordinates, found {0}")]
    ShortPosition(usize),
    #[error("polygon has no exterior ring")]
    MissingRing,
    #[error("polygon ring needs at least 3 distinct vertices, found {0}")]
    DegenerateRing(usize),
}

pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<GeoJsonFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct GeoJsonFeature {
    pub geometry: GeoJsonGeometry,
    #[serde(default)]
    pub properties: Option<Properties>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point { coordinates: Position },
    Polygon { coordinates: Vec<Vec<Position>> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar_text"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar_text"
    )]
    pub name: Option<String>,
}

/// Reads a string, number or boolean attribute as text; other values are
/// treated as absent.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

/// A decoded feature that has not been given a layer identity yet.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDraft {
    pub geometry: Geometry,
    pub label: Option<String>,
}

impl FeatureCollection {
    pub const fn empty() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, GeoJsonError> {
        serde_json::from_str(text).map_err(Into::into)
    }

    pub fn to_json_string(&self) -> Result<String, GeoJsonError> {
        serde_json::to_string(self).map_err(Into::into)
    }

    pub fn to_pretty_string(&self) -> Result<String, GeoJsonError> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn count_of(&self, kind: GeometryKind) -> usize {
        self.features
            .iter()
            .filter(|feature| feature.geometry.kind() == kind)
            .count()
    }

    /// Features of `kind` without a non-blank attribute.
    pub fn unlabelled_of(&self, kind: GeometryKind) -> usize {
        self.features
            .iter()
            .filter(|feature| feature.geometry.kind() == kind)
            .filter(|feature| feature.label().map_or(true, |label| label.trim().is_empty()))
            .count()
    }
}

impl GeoJsonGeometry {
    pub const fn kind(&self) -> GeometryKind {
        match self {
            Self::Point { .. } => GeometryKind::Point,
            Self::Polygon { .. } => GeometryKind::Polygon,
        }
    }
}

impl GeoJsonFeature {
    /// The attribute relevant for this geometry kind; other keys are ignored.
    pub fn label(&self) -> Option<&str> {
        let properties = self.properties.as_ref()?;
        match self.geometry.kind() {
            GeometryKind::Point => properties.id.as_deref(),
            GeometryKind::Polygon => properties.name.as_deref(),
        }
    }
}

/// Encodes features in layer order.
pub fn encode<'a>(features: impl IntoIterator<Item = &'a Feature>) -> FeatureCollection {
    FeatureCollection {
        features: features.into_iter().map(encode_feature).collect(),
    }
}

fn encode_feature(feature: &Feature) -> GeoJsonFeature {
    let geometry = match feature.geometry() {
        Geometry::Point(coord) => GeoJsonGeometry::Point {
            coordinates: to_position(*coord),
        },
        Geometry::Polygon(ring) => {
            let mut closed: Vec<Position> = ring.iter().copied().map(to_position).collect();
            if let Some(first) = closed.first().cloned() {
                closed.push(first);
            }
            GeoJsonGeometry::Polygon {
                coordinates: vec![closed],
            }
        }
    };

    let properties = feature.label().map(|label| match feature.kind() {
        GeometryKind::Point => Properties {
            id: Some(label.to_string()),
            name: None,
        },
        GeometryKind::Polygon => Properties {
            id: None,
            name: Some(label.to_string()),
        },
    });

    GeoJsonFeature {
        geometry,
        properties,
    }
}

fn to_position(coord: Coord) -> Position {
    let (lon, lat) = to_lon_lat(coord);
    vec![lon, lat]
}

fn from_position(position: &[f64]) -> Result<Coord, GeoJsonError> {
    match position {
        [lon, lat, ..] => Ok(from_lon_lat(*lon, *lat)),
        _ => Err(GeoJsonError::ShortPosition(position.len())),
    }
}

/// Decodes a collection into drafts in display metres. Only the exterior ring
/// of a polygon is kept; dropped holes are logged.
pub fn decode(collection: &FeatureCollection) -> Result<Vec<FeatureDraft>, GeoJsonError> {
    collection
        .features
        .iter()
        .map(|feature| {
            let geometry = match &feature.geometry {
                GeoJsonGeometry::Point { coordinates } => {
                    Geometry::Point(from_position(coordinates)?)
                }
                GeoJsonGeometry::Polygon { coordinates } => {
                    let exterior = coordinates.first().ok_or(GeoJsonError::MissingRing)?;
                    if coordinates.len() > 1 {
                        warn!(
                            "Dropping {} interior ring(s) of a saved polygon",
                            coordinates.len() - 1
                        );
                    }
                    let mut ring = exterior
                        .iter()
                        .map(|position| from_position(position))
                        .collect::<Result<Vec<_>, _>>()?;
                    if ring.len() > 1 && ring.first() == ring.last() {
                        ring.pop();
                    }
                    if ring.len() < 3 {
                        return Err(GeoJsonError::DegenerateRing(ring.len()));
                    }
                    Geometry::Polygon(ring)
                }
            };

            Ok(FeatureDraft {
                geometry,
                label: feature.label().map(str::to_string),
            })
        })
        .collect()
}
