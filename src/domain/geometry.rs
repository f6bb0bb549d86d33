// Caller-supplied locations: sample points and GeoJSON areas of interest
use geojson::GeoJson;
use serde_json::Value as Json;
use thiserror::Error;

/// A WGS84 location used for single-pixel sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Error)]
pub enum AoiError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    GeoJson(#[from] geojson::Error),
    #[error("Invalid GeoJSON geometry: {0}")]
    Geometry(String),
}

/// GeoJSON geometry types that map onto a remote geometry constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

impl ShapeKind {
    fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Point" => Some(Self::Point),
            "MultiPoint" => Some(Self::MultiPoint),
            "LineString" => Some(Self::LineString),
            "MultiLineString" => Some(Self::MultiLineString),
            "Polygon" => Some(Self::Polygon),
            "MultiPolygon" => Some(Self::MultiPolygon),
            _ => None,
        }
    }

    pub fn is_areal(&self) -> bool {
        matches!(self, Self::Polygon | Self::MultiPolygon)
    }
}

/// A parsed area of interest, kept as the raw coordinate arrays of each shape.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaOfInterest {
    Shape { kind: ShapeKind, coordinates: Json },
    Collection(Vec<AreaOfInterest>),
}

impl AreaOfInterest {
    /// Parse a GeoJSON geometry (or a Feature wrapping one) from a query-string value.
    pub fn parse(raw: &str) -> Result<Self, AoiError> {
        let json: Json = serde_json::from_str(raw)?;
        let geometry = match GeoJson::from_json_value(json.clone())? {
            GeoJson::Geometry(_) => json,
            GeoJson::Feature(feature) if feature.geometry.is_some() => json
                .get("geometry")
                .cloned()
                .ok_or_else(|| AoiError::Geometry("feature without geometry".to_string()))?,
            GeoJson::Feature(_) => {
                return Err(AoiError::Geometry("feature without geometry".to_string()));
            }
            GeoJson::FeatureCollection(_) => {
                return Err(AoiError::Geometry(
                    "feature collections are not supported".to_string(),
                ));
            }
        };
        Self::from_geometry(&geometry)
    }

    fn from_geometry(geometry: &Json) -> Result<Self, AoiError> {
        let type_name = geometry
            .get("type")
            .and_then(Json::as_str)
            .ok_or_else(|| AoiError::Geometry("missing geometry type".to_string()))?;

        if type_name == "GeometryCollection" {
            let members = geometry
                .get("geometries")
                .and_then(Json::as_array)
                .ok_or_else(|| AoiError::Geometry("missing geometries".to_string()))?;
            return members
                .iter()
                .map(Self::from_geometry)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Collection);
        }

        let kind = ShapeKind::from_type_name(type_name)
            .ok_or_else(|| AoiError::Geometry(format!("unsupported type {type_name}")))?;
        let coordinates = geometry
            .get("coordinates")
            .cloned()
            .ok_or_else(|| AoiError::Geometry("missing coordinates".to_string()))?;

        if kind.is_areal() {
            check_rings(kind, &coordinates)?;
        }
        Ok(Self::Shape { kind, coordinates })
    }
}

// Every linear ring needs at least three vertices to enclose an area
fn check_rings(kind: ShapeKind, coordinates: &Json) -> Result<(), AoiError> {
    let polygons: Vec<&Json> = match kind {
        ShapeKind::MultiPolygon => coordinates
            .as_array()
            .map(|polys| polys.iter().collect())
            .unwrap_or_default(),
        _ => vec![coordinates],
    };

    for polygon in polygons {
        let rings = polygon
            .as_array()
            .ok_or_else(|| AoiError::Geometry("polygon without rings".to_string()))?;
        if rings.is_empty() {
            return Err(AoiError::Geometry("polygon without rings".to_string()));
        }
        for ring in rings {
            let vertices = ring.as_array().map(Vec::len).unwrap_or(0);
            if vertices < 3 {
                return Err(AoiError::Geometry(format!(
                    "linear ring has {vertices} vertices, at least 3 required"
                )));
            }
        }
    }
    Ok(())
}
