// Data models for pose keypoints, detector frames, and analysis errors

use serde::{Deserialize, Serialize};

// ==============================================================================
// Body Landmarks (33 keypoints)
// ==============================================================================

/// MediaPipe Pose landmark indices (33 total)
///
/// The analyzer consumes the left-side arm and leg joints; the full id
/// scheme is kept because detectors emit all 33 and the ids must stay
/// stable across backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyLandmark {
    /// Stable keypoint id as emitted by the detector
    pub fn id(self) -> u32 {
        self as u32
    }
}

// ==============================================================================
// Keypoints
// ==============================================================================

/// A detected 2D keypoint with a stable landmark id
///
/// Coordinates are in the detector's coordinate space (pixels for the
/// default backends). Visibility is present when the detector provides it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Keypoint {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            visibility: None,
        }
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility.map_or(true, |v| v >= threshold)
    }
}

/// One frame's detected keypoints, ordered as the detector emitted them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeypointSet {
    pub points: Vec<Keypoint>,
}

impl KeypointSet {
    pub fn new(points: Vec<Keypoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Look up a keypoint by its landmark id
    pub fn get(&self, landmark: BodyLandmark) -> Option<&Keypoint> {
        let id = landmark.id();
        self.points.iter().find(|kp| kp.id == id)
    }

    /// Look up a keypoint the analysis cannot proceed without
    pub fn require(&self, landmark: BodyLandmark) -> AnalysisResult<&Keypoint> {
        self.get(landmark)
            .ok_or(AnalysisError::MissingLandmark(landmark))
    }
}

// ==============================================================================
// Video Frames
// ==============================================================================

/// Pixel format of decoded video frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
    Bgra8,
}

/// A decoded video frame handed to a landmark detector
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub timestamp: i64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub format: PixelFormat,
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("required landmark missing: {0:?}")]
    MissingLandmark(BodyLandmark),

    #[error("unknown session: {0}")]
    SessionNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("landmark detection failed: {0}")]
    Detector(String),

    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint_visibility() {
        let mut keypoint = Keypoint::new(0, 10.0, 20.0);
        assert!(keypoint.is_visible(0.9), "no visibility means visible");

        keypoint.visibility = Some(0.8);
        assert!(keypoint.is_visible(0.5));
        assert!(!keypoint.is_visible(0.9));
    }

    #[test]
    fn test_landmark_lookup_by_id() {
        let set = KeypointSet::new(vec![
            Keypoint::new(BodyLandmark::LeftKnee.id(), 1.0, 2.0),
            Keypoint::new(BodyLandmark::LeftAnkle.id(), 3.0, 4.0),
        ]);

        let knee = set.get(BodyLandmark::LeftKnee).unwrap();
        assert_eq!(knee.x, 1.0);
        assert!(set.get(BodyLandmark::LeftHip).is_none());
    }

    #[test]
    fn test_require_reports_missing_landmark() {
        let set = KeypointSet::default();
        let err = set.require(BodyLandmark::LeftHip).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::MissingLandmark(BodyLandmark::LeftHip)
        ));
    }

    #[test]
    fn test_landmark_ids_match_detector_scheme() {
        assert_eq!(BodyLandmark::LeftShoulder.id(), 11);
        assert_eq!(BodyLandmark::LeftElbow.id(), 13);
        assert_eq!(BodyLandmark::LeftWrist.id(), 15);
        assert_eq!(BodyLandmark::LeftHip.id(), 23);
        assert_eq!(BodyLandmark::LeftKnee.id(), 25);
        assert_eq!(BodyLandmark::LeftAnkle.id(), 27);
    }
}
