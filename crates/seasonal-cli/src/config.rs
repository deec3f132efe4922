use seasonal_core::config::ReducerConfig;
use seasonal_core::{default_model_dir, PipelineConfig, DETECTOR_MODEL_FILE};
use std::path::PathBuf;

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// Directory containing the ONNX detection model.
    pub model_dir: PathBuf,
    /// Knowledge base file replacing the embedded table.
    pub knowledge_path: Option<PathBuf>,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from `SEASONAL_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("SEASONAL_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_model_dir());

        let knowledge_path = std::env::var("SEASONAL_KNOWLEDGE_PATH")
            .ok()
            .map(PathBuf::from);

        let mut pipeline = PipelineConfig::default();
        pipeline.detector.min_face_size =
            env_parse("SEASONAL_MIN_FACE_SIZE", pipeline.detector.min_face_size);
        pipeline.detector.confidence_threshold = env_parse(
            "SEASONAL_CONFIDENCE_THRESHOLD",
            pipeline.detector.confidence_threshold,
        );
        pipeline.reducer.runs = env_parse("SEASONAL_KMEANS_RUNS", pipeline.reducer.runs)
            .max(ReducerConfig::MIN_RUNS);
        pipeline.reducer.seed = env_parse("SEASONAL_KMEANS_SEED", pipeline.reducer.seed);

        Self {
            model_dir,
            knowledge_path,
            pipeline,
        }
    }

    /// Path to the SCRFD detection model.
    pub fn detector_model_path(&self) -> PathBuf {
        self.model_dir.join(DETECTOR_MODEL_FILE)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
