// Datasets served by this service and the queries composed against them
use crate::domain::cloud_mask::mask_s2_clouds;
use crate::domain::expression::{Expr, Geometry, Image, ImageCollection};
use crate::domain::geometry::{AreaOfInterest, Point};
use crate::domain::month::DateBounds;

/// Pixel budget for region statistics.
pub const MAX_PIXELS: f64 = 1e13;

const MODIS_LST_COLLECTION: &str = "MODIS/061/MOD11A2";
const MODIS_LST_BAND: &str = "LST_Day_1km";
const SENTINEL2_COLLECTION: &str = "COPERNICUS/S2_SR_HARMONIZED";
const NDVI_BAND: &str = "NDVI";

// MOD11A2 encodes Kelvin with a 0.02 scale factor
const LST_SCALE: f64 = 0.02;
const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    /// Daytime land surface temperature in degrees Celsius
    Lst,
    /// Cloud-masked Sentinel-2 vegetation index
    Ndvi,
}

/// Fixed rendering parameters for tile layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Visualization {
    pub min: f64,
    pub max: f64,
    pub palette: &'static [&'static str],
}

impl Dataset {
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Lst => "lst",
            Dataset::Ndvi => "ndvi",
        }
    }

    pub fn collection_id(&self) -> &'static str {
        match self {
            Dataset::Lst => MODIS_LST_COLLECTION,
            Dataset::Ndvi => SENTINEL2_COLLECTION,
        }
    }

    /// Band carried by the composite image.
    pub fn band(&self) -> &'static str {
        match self {
            Dataset::Lst => MODIS_LST_BAND,
            Dataset::Ndvi => NDVI_BAND,
        }
    }

    /// Nominal resolution in metres used for sampling and statistics.
    pub fn scale(&self) -> f64 {
        match self {
            Dataset::Lst => 1000.0,
            Dataset::Ndvi => 10.0,
        }
    }

    pub fn visualization(&self) -> Visualization {
        match self {
            Dataset::Lst => Visualization {
                min: 0.0,
                max: 40.0,
                palette: &["blue", "green", "yellow", "red"],
            },
            Dataset::Ndvi => Visualization {
                min: -1.0,
                max: 1.0,
                palette: &["red", "white", "green"],
            },
        }
    }

    /// Mean composite over the date bounds, in physical units.
    pub fn composite(&self, bounds: &DateBounds) -> Image {
        let collection = ImageCollection::load(self.collection_id()).filter_date(bounds);
        match self {
            Dataset::Lst => collection
                .mean()
                .select(&[MODIS_LST_BAND])
                .multiply(LST_SCALE)
                .subtract(KELVIN_OFFSET),
            Dataset::Ndvi => collection
                .map(|img| mask_s2_clouds(&img))
                .map(|img| img.normalized_difference("B8", "B4").rename(NDVI_BAND))
                .mean()
                .select(&[NDVI_BAND]),
        }
    }
}

/// How a composite is reduced before it leaves the remote service.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    Visualize(Visualization),
    Sample { point: Point, scale: f64 },
    MinMax { scale: f64, max_pixels: f64 },
}

/// One request's worth of work for the remote imagery service.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterQuery {
    pub dataset: Dataset,
    pub bounds: DateBounds,
    pub aoi: Option<AreaOfInterest>,
    pub reduction: Reduction,
}

impl RasterQuery {
    pub fn tiles(dataset: Dataset, bounds: DateBounds, aoi: Option<AreaOfInterest>) -> Self {
        Self {
            dataset,
            bounds,
            aoi,
            reduction: Reduction::Visualize(dataset.visualization()),
        }
    }

    pub fn sample(dataset: Dataset, bounds: DateBounds, point: Point) -> Self {
        Self {
            dataset,
            bounds,
            aoi: None,
            reduction: Reduction::Sample {
                point,
                scale: dataset.scale(),
            },
        }
    }

    pub fn min_max(dataset: Dataset, bounds: DateBounds, aoi: Option<AreaOfInterest>) -> Self {
        Self {
            dataset,
            bounds,
            aoi,
            reduction: Reduction::MinMax {
                scale: dataset.scale(),
                max_pixels: MAX_PIXELS,
            },
        }
    }

    /// Composite clipped to the area of interest, if any.
    pub fn image(&self) -> Image {
        let image = self.dataset.composite(&self.bounds);
        match &self.aoi {
            Some(aoi) => image.clip(&Geometry::from_aoi(aoi)),
            None => image,
        }
    }

    pub fn to_expression(&self) -> Expr {
        let image = self.image();
        match &self.reduction {
            Reduction::Visualize(vis) => image.visualize(vis.min, vis.max, vis.palette).into_expr(),
            Reduction::Sample { point, scale } => {
                image.sample_band(&Geometry::point(point), *scale, self.dataset.band())
            }
            Reduction::MinMax { scale, max_pixels } => image.reduce_min_max(*scale, *max_pixels),
        }
    }
}
