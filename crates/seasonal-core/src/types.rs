use palette::{FromColor, Srgb};
use serde::{Deserialize, Serialize};

/// Number of 8-bit hue steps (two degrees each).
const HUE_RANGE: u32 = 180;

/// Axis-aligned face rectangle in raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Detector score in [0, 1]; 1.0 when the backend reports none.
    pub confidence: f32,
}

impl FaceRegion {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Box center, using integer division on the extents.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// A color in OpenCV-style 8-bit HSV.
///
/// `hue` is degrees / 2 in [0, 180); `saturation` and `value` are in [0, 255].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hsv {
    pub hue: u8,
    pub saturation: u8,
    pub value: u8,
}

impl Hsv {
    pub const fn new(hue: u8, saturation: u8, value: u8) -> Self {
        Self { hue, saturation, value }
    }

    /// Converts an 8-bit sRGB triple, scaling palette's float HSV onto the
    /// 8-bit ranges.
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        let [r, g, b] = rgb;
        let hsv = palette::Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());

        let hue = (hsv.hue.into_positive_degrees() / 2.0).round() as u32 % HUE_RANGE;
        Self {
            hue: hue as u8,
            saturation: to_channel(hsv.saturation),
            value: to_channel(hsv.value),
        }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.hue, self.saturation, self.value]
    }
}

fn to_channel(unit: f32) -> u8 {
    (unit * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(Hsv::from_rgb([255, 0, 0]), Hsv::new(0, 255, 255));
        assert_eq!(Hsv::from_rgb([0, 255, 0]), Hsv::new(60, 255, 255));
        assert_eq!(Hsv::from_rgb([0, 0, 255]), Hsv::new(120, 255, 255));
    }

    #[test]
    fn test_hsv_achromatic() {
        assert_eq!(Hsv::from_rgb([0, 0, 0]), Hsv::new(0, 0, 0));
        assert_eq!(Hsv::from_rgb([255, 255, 255]), Hsv::new(0, 0, 255));
        assert_eq!(Hsv::from_rgb([90, 90, 90]), Hsv::new(0, 0, 90));
    }

    #[test]
    fn test_hsv_skin_tones() {
        // Warm red-orange: 10 degrees -> hue 5
        assert_eq!(Hsv::from_rgb([200, 69, 43]), Hsv::new(5, 200, 200));
        // Yellow-ish: 60 degrees -> hue 30 whichever of red/green leads
        assert_eq!(Hsv::from_rgb([180, 180, 67]), Hsv::new(30, 160, 180));
    }

    #[test]
    fn test_hsv_half_step_hue_rounding() {
        // 125 degrees in exact arithmetic; the f32 result lands just below the half step
        assert_eq!(Hsv::from_rgb([0, 12, 1]), Hsv::new(62, 255, 12));
        // 30.1 degrees -> hue 15, lower edge of the warm band
        assert_eq!(Hsv::from_rgb([255, 128, 0]), Hsv::new(15, 255, 255));
    }

    #[test]
    fn test_hsv_hue_wraps_below_180() {
        // 359 degrees rounds to 180 and must wrap to 0
        let hsv = Hsv::from_rgb([255, 0, 1]);
        assert!(hsv.hue < 180);
    }

    #[test]
    fn test_face_region_center_and_area() {
        let face = FaceRegion { x: 10, y: 20, width: 151, height: 200, confidence: 0.9 };
        assert_eq!(face.center(), (85, 120));
        assert_eq!(face.area(), 30_200);
    }
}
