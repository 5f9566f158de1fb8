// MediaPipe integration bridge
// Runs the Python MediaPipe Pose model through PyO3 and converts its
// landmark list into pixel-space keypoints

use super::PoseLandmarker;
use crate::models::pose::{AnalysisError, AnalysisResult, Keypoint, KeypointSet, VideoFrame};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};
use serde_json::Value;

/// MediaPipe Pose backend (Python, via PyO3)
///
/// Expects a `pose_inference` module on the Python path exposing
/// `detect_keypoints(image_bytes, width, height) -> str`, returning a JSON
/// array of `[id, x, y]` triples in pixel coordinates, empty when no pose
/// was found.
pub struct MediaPipeLandmarker {
    inference_module: PyObject,
    initialized: bool,
}

impl MediaPipeLandmarker {
    pub fn new() -> AnalysisResult<Self> {
        Python::with_gil(|py| {
            let sys = py
                .import("sys")
                .map_err(|e| AnalysisError::Detector(format!("Failed to import sys: {}", e)))?;

            let path_list = sys
                .getattr("path")
                .map_err(|e| AnalysisError::Detector(format!("Failed to get sys.path: {}", e)))?;

            let python_dir = std::env::current_dir().unwrap_or_default().join("python");

            path_list
                .call_method1("insert", (0, python_dir.to_string_lossy().as_ref()))
                .map_err(|e| {
                    AnalysisError::Detector(format!("Failed to add python dir to path: {}", e))
                })?;

            let inference_module = py.import("pose_inference").map_err(|e| {
                AnalysisError::Detector(format!(
                    "Failed to import pose_inference: {}. Make sure Python dependencies are installed (pip install -r requirements.txt)",
                    e
                ))
            })?;

            Ok(Self {
                inference_module: inference_module.into(),
                initialized: true,
            })
        })
    }

    fn parse_keypoints(json_str: &str) -> AnalysisResult<Option<KeypointSet>> {
        let result: Value = serde_json::from_str(json_str)
            .map_err(|e| AnalysisError::Detector(format!("Failed to parse JSON: {}", e)))?;

        let triples = result
            .as_array()
            .ok_or_else(|| AnalysisError::Detector("Expected a landmark array".to_string()))?;

        if triples.is_empty() {
            return Ok(None);
        }

        let points = triples
            .iter()
            .map(|triple| {
                let id = triple
                    .get(0)
                    .and_then(|v| v.as_u64())
                    .ok_or_else(|| AnalysisError::Detector("Missing landmark id".to_string()))?;
                let x = triple.get(1).and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
                let y = triple.get(2).and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
                Ok(Keypoint::new(id as u32, x, y))
            })
            .collect::<AnalysisResult<Vec<_>>>()?;

        Ok(Some(KeypointSet::new(points)))
    }
}

impl PoseLandmarker for MediaPipeLandmarker {
    fn detect(&self, frame: &VideoFrame) -> AnalysisResult<Option<KeypointSet>> {
        Python::with_gil(|py| {
            let module = self.inference_module.as_ref(py);

            let detect_fn = module.getattr("detect_keypoints").map_err(|e| {
                AnalysisError::Detector(format!("Failed to get detect_keypoints: {}", e))
            })?;

            let image_bytes = PyBytes::new(py, &frame.data);

            let kwargs = PyDict::new(py);
            kwargs
                .set_item("image_bytes", image_bytes)
                .map_err(|e| AnalysisError::Detector(format!("Failed to set image_bytes: {}", e)))?;
            kwargs
                .set_item("width", frame.width)
                .map_err(|e| AnalysisError::Detector(format!("Failed to set width: {}", e)))?;
            kwargs
                .set_item("height", frame.height)
                .map_err(|e| AnalysisError::Detector(format!("Failed to set height: {}", e)))?;

            let result_json = detect_fn
                .call((), Some(kwargs))
                .map_err(|e| AnalysisError::Detector(format!("MediaPipe inference failed: {}", e)))?;

            let json_str: String = result_json
                .extract()
                .map_err(|e| AnalysisError::Detector(format!("Failed to extract JSON: {}", e)))?;

            Self::parse_keypoints(&json_str)
        })
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn model_info(&self) -> String {
        "MediaPipe Pose bridge (Python backend, 33 landmarks)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_landmark_list_is_no_detection() {
        assert!(MediaPipeLandmarker::parse_keypoints("[]")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_parse_landmark_triples() {
        let set = MediaPipeLandmarker::parse_keypoints("[[0, 12.5, 30.0], [11, 40.0, 50.5]]")
            .unwrap()
            .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.points[1].id, 11);
        assert_eq!(set.points[1].y, 50.5);
    }

    #[test]
    fn test_parse_rejects_malformed_payload() {
        assert!(MediaPipeLandmarker::parse_keypoints("{\"not\": \"a list\"}").is_err());
        assert!(MediaPipeLandmarker::parse_keypoints("[[\"id\", 1.0, 2.0]]").is_err());
    }
}
