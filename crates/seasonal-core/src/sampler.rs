//! Skin sampling: an ellipse inscribed in the face box, read out as HSV.
//!
//! The ellipse is narrower than the box and taller than it, which keeps most
//! samples on cheeks and forehead rather than hair, eyes or background.

use crate::config::SamplerConfig;
use crate::types::{FaceRegion, Hsv};
use image::{GrayImage, Luma, RgbImage};
use imageproc::drawing::draw_filled_ellipse_mut;

pub const MASK_INSIDE: u8 = 255;
pub const MASK_OUTSIDE: u8 = 0;

/// Elliptical region of interest in raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub center_x: u32,
    pub center_y: u32,
    pub semi_x: u32,
    pub semi_y: u32,
}

impl Ellipse {
    pub fn for_face(face: &FaceRegion, config: &SamplerConfig) -> Self {
        let (center_x, center_y) = face.center();
        Self {
            center_x,
            center_y,
            semi_x: (f64::from(face.width) * config.axis_x_fraction) as u32,
            semi_y: (f64::from(face.height) * config.axis_y_fraction) as u32,
        }
    }
}

/// Binary mask the size of the raster: 255 inside the ellipse, 0 elsewhere.
///
/// The ellipse is clipped to the raster. Its center pixel is always set, so a
/// face box inside the raster never yields an empty mask.
pub fn roi_mask(width: u32, height: u32, ellipse: &Ellipse) -> GrayImage {
    let mut mask = GrayImage::from_pixel(width, height, Luma([MASK_OUTSIDE]));
    draw_filled_ellipse_mut(
        &mut mask,
        (to_coord(ellipse.center_x), to_coord(ellipse.center_y)),
        to_coord(ellipse.semi_x),
        to_coord(ellipse.semi_y),
        Luma([MASK_INSIDE]),
    );
    if ellipse.center_x < width && ellipse.center_y < height {
        mask.put_pixel(ellipse.center_x, ellipse.center_y, Luma([MASK_INSIDE]));
    }
    mask
}

fn to_coord(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// HSV values of every raster pixel where the mask is set, in row-major order.
pub fn masked_pixels(raster: &RgbImage, mask: &GrayImage) -> Vec<Hsv> {
    raster
        .enumerate_pixels()
        .filter(|(x, y, _)| mask.get_pixel(*x, *y)[0] == MASK_INSIDE)
        .map(|(_, _, px)| Hsv::from_rgb(px.0))
        .collect()
}

/// Build the ROI for `face` and collect the skin samples inside it.
pub fn sample_skin(raster: &RgbImage, face: &FaceRegion, config: &SamplerConfig) -> Vec<Hsv> {
    let ellipse = Ellipse::for_face(face, config);
    let mask = roi_mask(raster.width(), raster.height(), &ellipse);
    let samples = masked_pixels(raster, &mask);
    tracing::debug!(?ellipse, samples = samples.len(), "sampled skin pixels");
    samples
}
