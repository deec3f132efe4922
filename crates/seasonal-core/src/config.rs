//! Tunable parameters for each pipeline stage.
//!
//! Defaults reproduce the reference behavior; hosts override individual
//! fields rather than building a config from scratch.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the SCRFD detection model inside the model directory.
pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub detector: DetectorConfig,
    pub sampler: SamplerConfig,
    pub reducer: ReducerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Faces narrower or shorter than this (pixels) are ignored.
    pub min_face_size: u32,
    /// Minimum detector score for a candidate (exclusive).
    pub confidence_threshold: f32,
    /// IoU above which overlapping candidates are merged.
    pub nms_threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_face_size: 150,
            confidence_threshold: 0.5,
            nms_threshold: 0.4,
        }
    }
}

/// Ellipse semi-axes as fractions of the face box extents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub axis_x_fraction: f64,
    pub axis_y_fraction: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            axis_x_fraction: 0.45,
            axis_y_fraction: 0.65,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReducerConfig {
    pub clusters: usize,
    /// Independent k-means runs; the lowest-inertia run is kept.
    pub runs: usize,
    pub max_iterations: usize,
    /// Convergence tolerance, relative to the mean per-channel variance.
    pub tolerance: f64,
    pub seed: u64,
}

impl ReducerConfig {
    pub const MIN_RUNS: usize = 10;
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            clusters: 3,
            runs: Self::MIN_RUNS,
            max_iterations: 300,
            tolerance: 1e-4,
            seed: 0,
        }
    }
}

/// `$XDG_DATA_HOME/seasonal/models`, or `~/.local/share/seasonal/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("seasonal")
        .join("models")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.detector.min_face_size, 150);
        assert_eq!(config.sampler.axis_x_fraction, 0.45);
        assert_eq!(config.sampler.axis_y_fraction, 0.65);
        assert_eq!(config.reducer.clusters, 3);
        assert!(config.reducer.runs >= ReducerConfig::MIN_RUNS);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let mut config = PipelineConfig::default();
        config.reducer.seed = 42;
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.reducer.seed, 42);
        assert_eq!(back.detector.min_face_size, 150);
    }
}
