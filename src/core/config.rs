use crate::models::pose::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Analyzer configuration
///
/// Offset thresholds are in the detector's coordinate space. The defaults
/// assume pixel-scaled keypoints; a detector emitting normalized [0, 1]
/// coordinates needs recalibrated offsets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzerConfig {
    /// EMA smoothing factor in (0, 1]; lower is smoother
    pub smoothing_alpha: f32,
    /// Joint angle above which a counter enters the Up stage (degrees)
    pub up_angle_threshold: f32,
    /// Joint angle below which an Up counter completes a rep (degrees)
    pub down_angle_threshold: f32,
    /// Joint angle below which a frame is labeled as that exercise (degrees)
    pub classify_angle_threshold: f32,
    /// Max knee-to-ankle horizontal offset before a squat rep is flagged
    pub squat_depth_threshold: f32,
    /// Max hip-to-shoulder vertical offset before a push-up rep is flagged
    pub pushup_alignment_threshold: f32,
    /// Frames accepted per session before the report is truncated
    pub max_frames: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: 0.2,
            up_angle_threshold: 160.0,
            down_angle_threshold: 90.0,
            classify_angle_threshold: 160.0,
            squat_depth_threshold: 40.0,
            pushup_alignment_threshold: 40.0,
            max_frames: 100_000,
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a JSON file
    pub fn load_from(path: &Path) -> AnalysisResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AnalyzerConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file, creating parent directories
    pub fn save_to(&self, path: &Path) -> AnalysisResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> AnalysisResult<()> {
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "Invalid smoothing alpha: {}. Must be in (0.0, 1.0]",
                self.smoothing_alpha
            )));
        }

        for (name, angle) in [
            ("up angle threshold", self.up_angle_threshold),
            ("down angle threshold", self.down_angle_threshold),
            ("classify angle threshold", self.classify_angle_threshold),
        ] {
            if !(0.0..=180.0).contains(&angle) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "Invalid {}: {}. Must be between 0 and 180 degrees",
                    name, angle
                )));
            }
        }

        // The deadband between the thresholds is what prevents double-counting
        if self.down_angle_threshold >= self.up_angle_threshold {
            return Err(AnalysisError::InvalidConfig(format!(
                "Down angle threshold {} must be below up angle threshold {}",
                self.down_angle_threshold, self.up_angle_threshold
            )));
        }

        for (name, offset) in [
            ("squat depth threshold", self.squat_depth_threshold),
            ("push-up alignment threshold", self.pushup_alignment_threshold),
        ] {
            if offset <= 0.0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "Invalid {}: {}. Must be positive",
                    name, offset
                )));
            }
        }

        if self.max_frames == 0 {
            return Err(AnalysisError::InvalidConfig(
                "Max frames must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
