//! End-to-end classification: bytes → raster → face → samples → color → season.
//!
//! Each call owns its raster, mask and samples. The only shared state is the
//! detector, which must be safe for concurrent read access.

use crate::classifier::{classify, Season};
use crate::config::PipelineConfig;
use crate::detector::{locate_face, FaceDetect};
use crate::error::Result;
use crate::loader;
use crate::reducer::{reduce, Clustering};
use crate::sampler::sample_skin;
use crate::types::{FaceRegion, Hsv};
use image::RgbImage;
use serde::Serialize;
use std::sync::Arc;

/// Everything a classification call produced, for display or debugging.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonReport {
    pub season: Season,
    pub face: FaceRegion,
    pub sample_count: usize,
    /// The first centroid of the clustering, not necessarily the largest cluster.
    pub dominant: Hsv,
    pub clustering: Clustering,
}

#[derive(Clone)]
pub struct SeasonAnalyzer {
    detector: Arc<dyn FaceDetect>,
    config: PipelineConfig,
}

impl SeasonAnalyzer {
    pub fn new(detector: Arc<dyn FaceDetect>, config: PipelineConfig) -> Self {
        Self { detector, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classify an uploaded JPEG or PNG.
    pub fn analyze(&self, bytes: &[u8]) -> Result<SeasonReport> {
        let raster = loader::decode(bytes)?;
        self.analyze_raster(&raster)
    }

    /// Classify an already decoded RGB raster.
    pub fn analyze_raster(&self, raster: &RgbImage) -> Result<SeasonReport> {
        let face = locate_face(self.detector.as_ref(), raster, &self.config.detector)?;
        let samples = sample_skin(raster, &face, &self.config.sampler);
        let clustering = reduce(&samples, &self.config.reducer)?;
        let dominant = clustering.dominant();
        let season = classify(dominant);

        tracing::info!(
            %season,
            hue = dominant.hue,
            saturation = dominant.saturation,
            value = dominant.value,
            samples = samples.len(),
            "classified skin tone"
        );

        Ok(SeasonReport {
            season,
            face,
            sample_count: samples.len(),
            dominant,
            clustering,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::FixedDetector;
    use crate::error::AnalysisError;
    use image::{DynamicImage, ImageFormat, Rgb};
    use std::io::Cursor;

    /// HSV (5, 200, 200).
    const WINTER_SKIN: Rgb<u8> = Rgb([200, 69, 43]);
    /// HSV (30, 160, 180).
    const SPRING_SKIN: Rgb<u8> = Rgb([180, 180, 67]);

    fn face(x: u32, y: u32, w: u32, h: u32) -> FaceRegion {
        FaceRegion { x, y, width: w, height: h, confidence: 0.95 }
    }

    fn analyzer(faces: Vec<FaceRegion>) -> SeasonAnalyzer {
        SeasonAnalyzer::new(Arc::new(FixedDetector(faces)), PipelineConfig::default())
    }

    fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img.clone()).write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_uniform_cool_fill_is_bright_winter() {
        let img = RgbImage::from_pixel(300, 300, WINTER_SKIN);
        let report = analyzer(vec![face(75, 50, 150, 200)])
            .analyze(&encode(&img, ImageFormat::Png))
            .unwrap();
        assert_eq!(report.dominant, Hsv::new(5, 200, 200));
        assert_eq!(report.season, Season::BrightWinter);
        assert!(report.sample_count > 0);
    }

    #[test]
    fn test_uniform_cool_fill_jpeg() {
        let img = RgbImage::from_pixel(300, 300, WINTER_SKIN);
        let report = analyzer(vec![face(75, 50, 150, 200)])
            .analyze(&encode(&img, ImageFormat::Jpeg))
            .unwrap();
        assert_eq!(report.season, Season::BrightWinter);
    }

    #[test]
    fn test_uniform_warm_fill_is_bright_spring() {
        let img = RgbImage::from_pixel(300, 300, SPRING_SKIN);
        let report = analyzer(vec![face(60, 60, 180, 180)])
            .analyze(&encode(&img, ImageFormat::Png))
            .unwrap();
        assert_eq!(report.dominant, Hsv::new(30, 160, 180));
        assert_eq!(report.season, Season::BrightSpring);
    }

    #[test]
    fn test_blank_image_has_no_face() {
        let img = RgbImage::from_pixel(300, 300, Rgb([255, 255, 255]));
        let result = analyzer(vec![]).analyze(&encode(&img, ImageFormat::Png));
        assert!(matches!(result, Err(AnalysisError::NoFaceDetected)));
    }

    #[test]
    fn test_only_small_faces_is_no_face() {
        let img = RgbImage::from_pixel(300, 300, WINTER_SKIN);
        let result = analyzer(vec![face(0, 0, 100, 100), face(150, 150, 149, 149)])
            .analyze_raster(&img);
        assert!(matches!(result, Err(AnalysisError::NoFaceDetected)));
    }

    #[test]
    fn test_largest_face_drives_classification() {
        // Left half cool, right half warm; the larger face sits on the right.
        let img = RgbImage::from_fn(800, 400, |x, _| if x < 400 { WINTER_SKIN } else { SPRING_SKIN });
        let small = face(100, 100, 160, 160);
        let large = face(450, 50, 300, 300);
        let report = analyzer(vec![small, large]).analyze_raster(&img).unwrap();
        assert_eq!(report.face, large);
        assert_eq!(report.season, Season::BrightSpring);
    }

    #[test]
    fn test_empty_raster_is_classification_error() {
        let result = analyzer(vec![face(0, 0, 200, 200)]).analyze_raster(&RgbImage::new(0, 0));
        assert!(matches!(result, Err(AnalysisError::Classification(_))));
    }

    #[test]
    fn test_corrupt_bytes_are_decode_errors() {
        let img = RgbImage::from_pixel(300, 300, WINTER_SKIN);
        let bytes = encode(&img, ImageFormat::Png);
        let analyzer = analyzer(vec![face(75, 75, 150, 150)]);

        assert!(matches!(analyzer.analyze(b"not an image"), Err(AnalysisError::Decode(_))));
        assert!(matches!(analyzer.analyze(&bytes[..40]), Err(AnalysisError::Decode(_))));
    }

    #[test]
    fn test_report_serializes() {
        let img = RgbImage::from_pixel(300, 300, WINTER_SKIN);
        let report = analyzer(vec![face(75, 75, 150, 150)]).analyze_raster(&img).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["season"], "Bright Winter");
        assert_eq!(json["dominant"]["hue"], 5);
        assert_eq!(json["clustering"]["centroids"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_concurrent_calls_share_detector() {
        let shared = analyzer(vec![face(75, 75, 150, 150)]);
        let winter = RgbImage::from_pixel(300, 300, WINTER_SKIN);
        let spring = RgbImage::from_pixel(300, 300, SPRING_SKIN);

        let (a, b) = std::thread::scope(|s| {
            let a = s.spawn(|| shared.analyze_raster(&winter).unwrap().season);
            let b = s.spawn(|| shared.analyze_raster(&spring).unwrap().season);
            (a.join().unwrap(), b.join().unwrap())
        });
        assert_eq!(a, Season::BrightWinter);
        assert_eq!(b, Season::BrightSpring);
    }

    #[test]
    fn test_repeat_calls_are_deterministic() {
        let img = RgbImage::from_fn(300, 300, |x, y| Rgb([150 + (x % 60) as u8, 90 + (y % 40) as u8, 60]));
        let analyzer = analyzer(vec![face(50, 50, 200, 200)]);
        let first = analyzer.analyze_raster(&img).unwrap();
        let second = analyzer.analyze_raster(&img).unwrap();
        assert_eq!(first.season, second.season);
        assert_eq!(first.clustering.centroids, second.clustering.centroids);
    }
}
