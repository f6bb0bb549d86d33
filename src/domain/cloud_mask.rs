// Sentinel-2 cloud and snow masking based on the scene classification layer
use crate::domain::expression::Image;

/// Scene classification band.
pub const SCL_BAND: &str = "SCL";

/// SCL classes excluded from composites: cloud shadow, cloud (medium and high
/// probability), thin cirrus and snow/ice.
pub const EXCLUDED_SCL_CLASSES: [u8; 5] = [3, 7, 8, 9, 10];

/// Surface reflectance is stored as integers in 0..=10000.
pub const REFLECTANCE_SCALE: f64 = 10_000.0;

/// Band algebra needed to mask a multi-band raster.
pub trait MaskableRaster: Sized {
    fn band(&self, name: &str) -> Self;
    fn not_equal(&self, value: f64) -> Self;
    fn and(&self, other: &Self) -> Self;
    fn update_mask(&self, mask: &Self) -> Self;
    fn divide(&self, value: f64) -> Self;
}

impl MaskableRaster for Image {
    fn band(&self, name: &str) -> Self {
        self.select(&[name])
    }

    fn not_equal(&self, value: f64) -> Self {
        self.neq(value)
    }

    fn and(&self, other: &Self) -> Self {
        Image::and(self, other)
    }

    fn update_mask(&self, mask: &Self) -> Self {
        Image::update_mask(self, mask)
    }

    fn divide(&self, value: f64) -> Self {
        Image::divide(self, value)
    }
}

/// Mask out cloud, cirrus, shadow and snow pixels, then rescale reflectance to 0.0..=1.0.
pub fn mask_s2_clouds<R: MaskableRaster>(image: &R) -> R {
    let scl = image.band(SCL_BAND);
    let mut keep = scl.not_equal(f64::from(EXCLUDED_SCL_CLASSES[0]));
    for class in &EXCLUDED_SCL_CLASSES[1..] {
        keep = keep.and(&scl.not_equal(f64::from(*class)));
    }
    image.update_mask(&keep).divide(REFLECTANCE_SCALE)
}
