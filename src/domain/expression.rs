// Expression graph evaluated by the remote imagery service
//
// Building an expression performs no I/O. The typed wrappers below mirror the
// remote algorithms this service needs and nothing more.
use crate::domain::geometry::{AreaOfInterest, Point, ShapeKind};
use crate::domain::month::DateBounds;
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// Argument name bound by `ImageCollection::map` bodies.
pub const MAPPING_VAR: &str = "_MAPPING_VAR_0_0";

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Json),
    Call {
        function: &'static str,
        args: BTreeMap<&'static str, Expr>,
    },
    Lambda {
        params: Vec<&'static str>,
        body: Box<Expr>,
    },
    ArgRef(&'static str),
    Array(Vec<Expr>),
}

impl Expr {
    pub fn constant(value: impl Into<Json>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn call<const N: usize>(function: &'static str, args: [(&'static str, Expr); N]) -> Self {
        Expr::Call {
            function,
            args: args.into_iter().collect(),
        }
    }

    /// Name of the outermost algorithm, if this is an invocation.
    #[cfg(test)]
    pub fn function(&self) -> Option<&'static str> {
        match self {
            Expr::Call { function, .. } => Some(*function),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn arg(&self, name: &str) -> Option<&Expr> {
        match self {
            Expr::Call { args, .. } => args.get(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry(Expr);

impl Geometry {
    pub fn point(point: &Point) -> Self {
        Geometry(Expr::call(
            "GeometryConstructors.Point",
            [("coordinates", Expr::constant(vec![point.lng, point.lat]))],
        ))
    }

    pub fn from_aoi(aoi: &AreaOfInterest) -> Self {
        match aoi {
            AreaOfInterest::Collection(members) => Geometry(Expr::call(
                "GeometryConstructors.MultiGeometry",
                [(
                    "geometries",
                    Expr::Array(members.iter().map(|m| Self::from_aoi(m).0).collect()),
                )],
            )),
            AreaOfInterest::Shape { kind, coordinates } => {
                let coordinates = Expr::Constant(coordinates.clone());
                let expr = match kind {
                    ShapeKind::Point => {
                        Expr::call("GeometryConstructors.Point", [("coordinates", coordinates)])
                    }
                    ShapeKind::MultiPoint => Expr::call(
                        "GeometryConstructors.MultiPoint",
                        [("coordinates", coordinates)],
                    ),
                    ShapeKind::LineString => Expr::call(
                        "GeometryConstructors.LineString",
                        [("coordinates", coordinates)],
                    ),
                    ShapeKind::MultiLineString => Expr::call(
                        "GeometryConstructors.MultiLineString",
                        [("coordinates", coordinates)],
                    ),
                    ShapeKind::Polygon => Expr::call(
                        "GeometryConstructors.Polygon",
                        [("coordinates", coordinates), ("evenOdd", Expr::constant(true))],
                    ),
                    ShapeKind::MultiPolygon => Expr::call(
                        "GeometryConstructors.MultiPolygon",
                        [("coordinates", coordinates), ("evenOdd", Expr::constant(true))],
                    ),
                };
                Geometry(expr)
            }
        }
    }

    #[cfg(test)]
    pub fn expr(&self) -> &Expr {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image(Expr);

impl Image {
    pub fn constant(value: f64) -> Self {
        Image(Expr::call("Image.constant", [("value", Expr::constant(value))]))
    }

    pub fn select(&self, bands: &[&str]) -> Self {
        Image(Expr::call(
            "Image.select",
            [("input", self.0.clone()), ("bandSelectors", Expr::constant(bands))],
        ))
    }

    fn binary(&self, function: &'static str, other: &Image) -> Self {
        Image(Expr::call(
            function,
            [("image1", self.0.clone()), ("image2", other.0.clone())],
        ))
    }

    pub fn multiply(&self, value: f64) -> Self {
        self.binary("Image.multiply", &Image::constant(value))
    }

    pub fn subtract(&self, value: f64) -> Self {
        self.binary("Image.subtract", &Image::constant(value))
    }

    pub fn divide(&self, value: f64) -> Self {
        self.binary("Image.divide", &Image::constant(value))
    }

    pub fn neq(&self, value: f64) -> Self {
        self.binary("Image.neq", &Image::constant(value))
    }

    pub fn and(&self, other: &Image) -> Self {
        self.binary("Image.and", other)
    }

    pub fn update_mask(&self, mask: &Image) -> Self {
        Image(Expr::call(
            "Image.updateMask",
            [("image", self.0.clone()), ("mask", mask.0.clone())],
        ))
    }

    pub fn normalized_difference(&self, first: &str, second: &str) -> Self {
        Image(Expr::call(
            "Image.normalizedDifference",
            [
                ("input", self.0.clone()),
                ("bandNames", Expr::constant(vec![first, second])),
            ],
        ))
    }

    pub fn rename(&self, name: &str) -> Self {
        Image(Expr::call(
            "Image.rename",
            [("input", self.0.clone()), ("names", Expr::constant(vec![name]))],
        ))
    }

    pub fn clip(&self, geometry: &Geometry) -> Self {
        Image(Expr::call(
            "Image.clip",
            [("input", self.0.clone()), ("geometry", geometry.0.clone())],
        ))
    }

    pub fn visualize(&self, min: f64, max: f64, palette: &[&str]) -> Self {
        Image(Expr::call(
            "Image.visualize",
            [
                ("image", self.0.clone()),
                ("min", Expr::constant(min)),
                ("max", Expr::constant(max)),
                ("palette", Expr::constant(palette)),
            ],
        ))
    }

    /// Value of `band` at the first sampled pixel under `region`.
    pub fn sample_band(&self, region: &Geometry, scale: f64, band: &str) -> Expr {
        let samples = Expr::call(
            "Image.sample",
            [
                ("image", self.0.clone()),
                ("region", region.0.clone()),
                ("scale", Expr::constant(scale)),
            ],
        );
        let first = Expr::call("Collection.first", [("collection", samples)]);
        Expr::call(
            "Element.get",
            [("object", first), ("property", Expr::constant(band))],
        )
    }

    /// Min/max dictionary over the image footprint.
    pub fn reduce_min_max(&self, scale: f64, max_pixels: f64) -> Expr {
        Expr::call(
            "Image.reduceRegion",
            [
                ("image", self.0.clone()),
                ("reducer", Expr::call("Reducer.minMax", [])),
                (
                    "geometry",
                    Expr::call("Image.geometry", [("feature", self.0.clone())]),
                ),
                ("scale", Expr::constant(scale)),
                ("maxPixels", Expr::constant(max_pixels)),
            ],
        )
    }

    #[cfg(test)]
    pub fn expr(&self) -> &Expr {
        &self.0
    }

    pub fn into_expr(self) -> Expr {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageCollection(Expr);

impl ImageCollection {
    pub fn load(id: &str) -> Self {
        ImageCollection(Expr::call("ImageCollection.load", [("id", Expr::constant(id))]))
    }

    pub fn filter_date(self, bounds: &DateBounds) -> Self {
        let range = Expr::call(
            "DateRange",
            [
                ("start", Expr::constant(bounds.start.as_str())),
                ("end", Expr::constant(bounds.end.as_str())),
            ],
        );
        let filter = Expr::call(
            "Filter.dateRangeContains",
            [
                ("leftValue", range),
                ("rightField", Expr::constant("system:time_start")),
            ],
        );
        ImageCollection(Expr::call(
            "Collection.filter",
            [("collection", self.0), ("filter", filter)],
        ))
    }

    /// Apply `f` to every image; the body is evaluated remotely per image.
    pub fn map(self, f: impl FnOnce(Image) -> Image) -> Self {
        let body = f(Image(Expr::ArgRef(MAPPING_VAR)));
        let algorithm = Expr::Lambda {
            params: vec![MAPPING_VAR],
            body: Box::new(body.0),
        };
        ImageCollection(Expr::call(
            "Collection.map",
            [("collection", self.0), ("baseAlgorithm", algorithm)],
        ))
    }

    /// Per-pixel mean, keeping band names.
    pub fn mean(self) -> Image {
        Image(Expr::call("reduce.mean", [("collection", self.0)]))
    }
}
