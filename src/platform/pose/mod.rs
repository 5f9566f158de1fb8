// Pose landmark detection boundary
// Backends plug in behind the PoseLandmarker trait

#[cfg(feature = "ml-pyo3")]
pub mod mediapipe_bridge;

use crate::models::pose::{AnalysisResult, KeypointSet, VideoFrame};

/// Black-box landmark detector: one frame in, named 2D keypoints out
///
/// Implementations must emit the stable MediaPipe id scheme (33 ids; the
/// analyzer consumes 11, 13, 15, 23, 25, 27) and may return None when no
/// person is visible.
pub trait PoseLandmarker: Send + Sync {
    /// Run detection on a single frame
    fn detect(&self, frame: &VideoFrame) -> AnalysisResult<Option<KeypointSet>>;

    /// Check if the backend is ready
    fn is_initialized(&self) -> bool;

    /// Get backend info
    fn model_info(&self) -> String;
}

/// Backend that never detects a pose
///
/// Stands in when no ML feature is enabled; every frame is treated as a
/// detection gap, so sessions still finish with an empty report.
pub struct NullLandmarker;

impl PoseLandmarker for NullLandmarker {
    fn detect(&self, _frame: &VideoFrame) -> AnalysisResult<Option<KeypointSet>> {
        Ok(None)
    }

    fn is_initialized(&self) -> bool {
        false
    }

    fn model_info(&self) -> String {
        "Null landmarker (no ML inference - enable 'ml-pyo3' for MediaPipe)".to_string()
    }
}

#[cfg(feature = "ml-pyo3")]
pub type DefaultLandmarker = mediapipe_bridge::MediaPipeLandmarker;

#[cfg(not(feature = "ml-pyo3"))]
pub type DefaultLandmarker = NullLandmarker;
