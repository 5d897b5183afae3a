use serde::Deserialize;
use serde_json::Value;

/// A single `[longitude, latitude]` pair as it arrived from the boundary source.
///
/// Non-numeric or missing components are kept as NaN so that projection and
/// path building can drop them point-by-point instead of failing the feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    fn from_value(value: &Value) -> Self {
        let component = |idx: usize| {
            value
                .as_array()
                .and_then(|pair| pair.get(idx))
                .and_then(Value::as_f64)
                .unwrap_or(f64::NAN)
        };
        Self::new(component(0), component(1))
    }
}

/// One closed ring of a county polygon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ring(pub Vec<Coordinate>);

impl Ring {
    pub fn valid_points(&self) -> impl Iterator<Item = &Coordinate> {
        self.0.iter().filter(|c| c.is_valid())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountyBoundary {
    pub object_id: i64,
    pub name: String,
    pub rings: Vec<Ring>,
}

impl CountyBoundary {
    pub fn coordinates(&self) -> impl Iterator<Item = &Coordinate> {
        self.rings.iter().flat_map(|ring| ring.0.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryCollection {
    pub features: Vec<CountyBoundary>,
}

#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    #[error("boundary payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("boundary payload has no `features` array")]
    MissingFeatures,
}

#[derive(Deserialize)]
struct RawCollection {
    features: Option<Vec<RawFeature>>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<RawProperties>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
}

#[derive(Deserialize)]
struct RawProperties {
    #[serde(rename = "COUNTY", alias = "county", alias = "name", default)]
    county: Option<String>,
    #[serde(rename = "OBJECTID", alias = "objectid", default)]
    object_id: Option<i64>,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

impl BoundaryCollection {
    /// Parse a GeoJSON `FeatureCollection` of county polygons.
    ///
    /// `Polygon` and `MultiPolygon` geometries are both flattened into rings.
    /// Features without a county name are skipped since nothing can be joined
    /// against them.
    pub fn from_geojson_slice(bytes: &[u8]) -> Result<Self, BoundaryError> {
        let raw: RawCollection = serde_json::from_slice(bytes)?;
        let features = raw.features.ok_or(BoundaryError::MissingFeatures)?;

        let features = features
            .into_iter()
            .enumerate()
            .filter_map(|(idx, feature)| {
                let properties = feature.properties?;
                let name = properties.county.filter(|name| !name.trim().is_empty())?;
                let rings = feature
                    .geometry
                    .as_ref()
                    .map(rings_from_geometry)
                    .unwrap_or_default();
                Some(CountyBoundary {
                    object_id: properties.object_id.unwrap_or(idx as i64),
                    name,
                    rings,
                })
            })
            .collect();

        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &Coordinate> {
        self.features.iter().flat_map(CountyBoundary::coordinates)
    }
}

fn rings_from_geometry(geometry: &RawGeometry) -> Vec<Ring> {
    match geometry.kind.as_str() {
        "MultiPolygon" => geometry
            .coordinates
            .as_array()
            .into_iter()
            .flatten()
            .flat_map(polygon_rings)
            .collect(),
        _ => polygon_rings(&geometry.coordinates),
    }
}

fn polygon_rings(polygon: &Value) -> Vec<Ring> {
    polygon
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|ring| {
            ring.as_array()
                .map(|points| Ring(points.iter().map(Coordinate::from_value).collect()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{BoundaryCollection, BoundaryError};

    #[test]
    fn parses_polygon_and_multipolygon_features() {
        let payload = br#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"COUNTY": "Nairobi", "OBJECTID": 7},
                    "geometry": {"type": "Polygon", "coordinates": [[[36.6, -1.4], [37.1, -1.4], [36.9, -1.1]]]}
                },
                {
                    "type": "Feature",
                    "properties": {"COUNTY": "Lamu", "OBJECTID": 12},
                    "geometry": {"type": "MultiPolygon", "coordinates": [
                        [[[40.1, -2.5], [41.0, -2.5], [40.5, -1.9]]],
                        [[[41.1, -2.1], [41.2, -2.1], [41.15, -2.0]]]
                    ]}
                }
            ]
        }"#;

        let collection = BoundaryCollection::from_geojson_slice(payload).expect("valid geojson");
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.features[0].name, "Nairobi");
        assert_eq!(collection.features[0].object_id, 7);
        assert_eq!(collection.features[0].rings.len(), 1);
        assert_eq!(collection.features[1].rings.len(), 2);
    }

    #[test]
    fn non_numeric_coordinates_become_invalid_points() {
        let payload = br#"{"features": [{
            "properties": {"COUNTY": "Kisumu"},
            "geometry": {"type": "Polygon", "coordinates": [[[34.7, -0.1], ["x", -0.2], [null], [34.9, -0.3]]]}
        }]}"#;

        let collection = BoundaryCollection::from_geojson_slice(payload).expect("valid geojson");
        let ring = &collection.features[0].rings[0];
        assert_eq!(ring.0.len(), 4);
        assert_eq!(ring.valid_points().count(), 2);
    }

    #[test]
    fn skips_unnamed_features_and_defaults_missing_geometry() {
        let payload = br#"{"features": [
            {"properties": {"COUNTY": "  "}, "geometry": null},
            {"properties": null},
            {"properties": {"COUNTY": "Turkana"}}
        ]}"#;

        let collection = BoundaryCollection::from_geojson_slice(payload).expect("valid geojson");
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.features[0].name, "Turkana");
        assert_eq!(collection.features[0].object_id, 2);
        assert!(collection.features[0].rings.is_empty());
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(matches!(
            BoundaryCollection::from_geojson_slice(b"<html>not json</html>"),
            Err(BoundaryError::Json(_))
        ));
        assert!(matches!(
            BoundaryCollection::from_geojson_slice(br#"{"type": "FeatureCollection"}"#),
            Err(BoundaryError::MissingFeatures)
        ));
    }
}
