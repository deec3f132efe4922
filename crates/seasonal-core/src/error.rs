//! Top-level error taxonomy for a classification call.
//!
//! Each stage has its own error type; they collapse into [`AnalysisError`]
//! at the pipeline boundary so a host can map every failure to one of four
//! user-facing outcomes.

use crate::detector::DetectorError;
use crate::knowledge::KnowledgeError;
use crate::loader::DecodeError;
use crate::reducer::ReduceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("no face detected")]
    NoFaceDetected,
    #[error("classification failed: {0}")]
    Classification(String),
    #[error("season missing from knowledge base: {0}")]
    UnknownSeason(String),
}

impl AnalysisError {
    /// The user can fix these by supplying a different photo.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::NoFaceDetected)
    }

    /// Remediation text for display; distinct per variant.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Decode(_) => {
                "Could not read the image. Please upload a valid JPEG or PNG file."
            }
            Self::NoFaceDetected => {
                "No face detected. Try a clearer, well-lit frontal photo taken closer to the camera."
            }
            Self::Classification(_) => {
                "Something went wrong while analyzing the photo. Please try again."
            }
            Self::UnknownSeason(_) => {
                "Recommendations for this season are not configured. Please contact the site operator."
            }
        }
    }
}

impl From<DetectorError> for AnalysisError {
    fn from(err: DetectorError) -> Self {
        match err {
            DetectorError::NoFaceDetected => Self::NoFaceDetected,
            other => Self::Classification(other.to_string()),
        }
    }
}

impl From<ReduceError> for AnalysisError {
    fn from(err: ReduceError) -> Self {
        Self::Classification(err.to_string())
    }
}

impl From<KnowledgeError> for AnalysisError {
    fn from(err: KnowledgeError) -> Self {
        match err {
            KnowledgeError::UnknownSeason(name) => Self::UnknownSeason(name),
            other => Self::UnknownSeason(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_no_face_maps_to_no_face() {
        let err: AnalysisError = DetectorError::NoFaceDetected.into();
        assert!(matches!(err, AnalysisError::NoFaceDetected));
        assert!(err.is_user_correctable());
    }

    #[test]
    fn test_detector_fault_maps_to_classification() {
        let err: AnalysisError = DetectorError::InferenceFailed("bad tensor".into()).into();
        assert!(matches!(err, AnalysisError::Classification(_)));
        assert!(!err.is_user_correctable());
    }

    #[test]
    fn test_reduce_error_maps_to_classification() {
        let err: AnalysisError = ReduceError::EmptySample.into();
        assert!(matches!(err, AnalysisError::Classification(_)));
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let messages = [
            AnalysisError::Decode(DecodeError::UnsupportedFormat("gif".into())).user_message(),
            AnalysisError::NoFaceDetected.user_message(),
            AnalysisError::Classification("x".into()).user_message(),
            AnalysisError::UnknownSeason("x".into()).user_message(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
