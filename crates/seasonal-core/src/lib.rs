//! seasonal-core — Skin-tone color-season classification.
//!
//! Decodes a photo, locates the principal face with SCRFD via ONNX Runtime,
//! samples skin inside an ellipse on the face, clusters the samples in HSV
//! and maps the dominant color to a season with a fixed threshold tree.

pub mod classifier;
pub mod config;
pub mod detector;
pub mod error;
pub mod knowledge;
pub mod loader;
pub mod pipeline;
pub mod reducer;
pub mod sampler;
pub mod types;

pub use classifier::{classify, Season};
pub use config::{default_model_dir, PipelineConfig, DETECTOR_MODEL_FILE};
pub use detector::{FaceDetect, LazyDetector, ScrfdDetector};
pub use error::{AnalysisError, Result};
pub use knowledge::{KnowledgeBase, SeasonEntry};
pub use pipeline::{SeasonAnalyzer, SeasonReport};
pub use types::{FaceRegion, Hsv};
