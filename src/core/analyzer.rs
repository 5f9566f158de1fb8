// Per-session analysis pipeline: smooth, measure, count, record

use crate::core::config::AnalyzerConfig;
use crate::core::rep_counter::{ExerciseProfile, RepCounter};
use crate::core::smoother::LandmarkSmoother;
use crate::models::exercise::{
    FrameRecord, InferredExercise, JointAngles, RepEvent, SessionReport, SessionSummary,
};
use crate::models::pose::KeypointSet;
use tracing::{debug, info, warn};

/// Everything one accepted frame produced
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    pub record: FrameRecord,
    /// Reps completed on this frame, squat first when both fire
    pub reps: Vec<RepEvent>,
}

/// One video's analysis run
///
/// Owns the smoothing baseline and both counters, so concurrent sessions
/// never interfere. Frames must be fed in order; each frame's result
/// depends on the previous frame's smoothed baseline and stages.
pub struct AnalysisSession {
    video_id: String,
    config: AnalyzerConfig,
    smoother: LandmarkSmoother,
    squat: RepCounter,
    pushup: RepCounter,
    frames: Vec<FrameRecord>,
    truncated: bool,
}

impl AnalysisSession {
    pub fn new(video_id: impl Into<String>, config: AnalyzerConfig) -> Self {
        let squat = RepCounter::new(
            ExerciseProfile::squat(config.squat_depth_threshold),
            config.up_angle_threshold,
            config.down_angle_threshold,
        );
        let pushup = RepCounter::new(
            ExerciseProfile::pushup(config.pushup_alignment_threshold),
            config.up_angle_threshold,
            config.down_angle_threshold,
        );

        Self {
            video_id: video_id.into(),
            smoother: LandmarkSmoother::new(config.smoothing_alpha),
            squat,
            pushup,
            config,
            frames: Vec::new(),
            truncated: false,
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn frames_recorded(&self) -> usize {
        self.frames.len()
    }

    /// Feed one frame's detection result
    ///
    /// Frames with no detected pose are dropped without touching session
    /// state. Returns what the frame produced, or None if it was skipped.
    pub fn process_frame(
        &mut self,
        frame_index: usize,
        detection: Option<KeypointSet>,
    ) -> Option<FrameUpdate> {
        let keypoints = match detection {
            Some(keypoints) if !keypoints.is_empty() => keypoints,
            _ => {
                debug!(frame_index, "no pose detected, skipping frame");
                return None;
            }
        };

        if self.frames.len() >= self.config.max_frames {
            if !self.truncated {
                warn!(
                    video_id = %self.video_id,
                    max_frames = self.config.max_frames,
                    "frame bound reached, truncating session"
                );
            }
            self.truncated = true;
            return None;
        }

        let smoothed = self.smoother.smooth(keypoints);

        let (knee_angle, squat_rep) = advance_counter(&mut self.squat, &smoothed, frame_index);
        let (elbow_angle, pushup_rep) = advance_counter(&mut self.pushup, &smoothed, frame_index);

        let reps: Vec<RepEvent> = [squat_rep, pushup_rep].into_iter().flatten().collect();
        let is_form_ok = reps.iter().all(|rep| rep.form_ok);

        // Advisory label only; both counters already ran
        let threshold = self.config.classify_angle_threshold;
        let exercise = if knee_angle.is_some_and(|angle| angle < threshold) {
            InferredExercise::Squat
        } else if elbow_angle.is_some_and(|angle| angle < threshold) {
            InferredExercise::Pushup
        } else {
            InferredExercise::None
        };

        let rep_id = match exercise {
            InferredExercise::Squat => self.squat.rep_count(),
            InferredExercise::Pushup => self.pushup.rep_count(),
            InferredExercise::None => 0,
        };

        let record = FrameRecord {
            frame_index,
            exercise,
            rep_id,
            is_form_ok,
            angles: JointAngles {
                knee: knee_angle,
                elbow: elbow_angle,
            },
        };
        self.frames.push(record.clone());

        Some(FrameUpdate { record, reps })
    }

    /// Close the session and produce its report
    ///
    /// Always succeeds; a video with no usable frames reports zero reps
    /// and an empty frame log.
    pub fn finish(self) -> SessionReport {
        let summary = SessionSummary {
            squats: self.squat.summary(),
            pushups: self.pushup.summary(),
        };

        info!(
            video_id = %self.video_id,
            frames = self.frames.len(),
            squats = summary.squats.total_reps,
            pushups = summary.pushups.total_reps,
            truncated = self.truncated,
            "session finished"
        );

        SessionReport {
            video_id: self.video_id,
            summary,
            frame_data: self.frames,
            truncated: self.truncated,
            generated_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

fn advance_counter(
    counter: &mut RepCounter,
    keypoints: &KeypointSet,
    frame_index: usize,
) -> (Option<f32>, Option<RepEvent>) {
    match counter.advance(keypoints) {
        Ok(assessment) => (Some(assessment.angle), assessment.rep),
        Err(err) => {
            debug!(
                frame_index,
                exercise = counter.kind().as_str(),
                %err,
                "exercise skipped for frame"
            );
            (None, None)
        }
    }
}

/// Run an ordered detection sequence through a fresh session
pub fn analyze_detections<I>(
    video_id: impl Into<String>,
    config: AnalyzerConfig,
    detections: I,
) -> SessionReport
where
    I: IntoIterator<Item = Option<KeypointSet>>,
{
    let mut session = AnalysisSession::new(video_id, config);
    for (frame_index, detection) in detections.into_iter().enumerate() {
        session.process_frame(frame_index, detection);
    }
    session.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exercise::FormIssue;
    use crate::models::pose::{BodyLandmark, Keypoint};

    /// Full-body pose driving both counters: knee and elbow bend to the
    /// given angles, with clean form offsets.
    fn pose(knee_angle: f32, elbow_angle: f32) -> KeypointSet {
        full_pose(knee_angle, elbow_angle, 0.0, 0.0)
    }

    fn full_pose(knee_angle: f32, elbow_angle: f32, depth_dx: f32, hip_sag: f32) -> KeypointSet {
        let knee = (100.0_f32, 300.0_f32);
        let ankle = (knee.0 + depth_dx, knee.1 + 100.0);
        let ankle_dir = (ankle.1 - knee.1).atan2(ankle.0 - knee.0);
        let hip_dir = ankle_dir + knee_angle.to_radians();
        let hip = (knee.0 + 100.0 * hip_dir.cos(), knee.1 + 100.0 * hip_dir.sin());

        let elbow = (400.0_f32, 100.0_f32);
        let shoulder = (elbow.0 - 100.0, hip.1 - hip_sag);
        let shoulder_dir = (shoulder.1 - elbow.1).atan2(shoulder.0 - elbow.0);
        let wrist_dir = shoulder_dir - elbow_angle.to_radians();
        let wrist = (
            elbow.0 + 100.0 * wrist_dir.cos(),
            elbow.1 + 100.0 * wrist_dir.sin(),
        );

        KeypointSet::new(vec![
            Keypoint::new(BodyLandmark::LeftShoulder.id(), shoulder.0, shoulder.1),
            Keypoint::new(BodyLandmark::LeftElbow.id(), elbow.0, elbow.1),
            Keypoint::new(BodyLandmark::LeftWrist.id(), wrist.0, wrist.1),
            Keypoint::new(BodyLandmark::LeftHip.id(), hip.0, hip.1),
            Keypoint::new(BodyLandmark::LeftKnee.id(), knee.0, knee.1),
            Keypoint::new(BodyLandmark::LeftAnkle.id(), ankle.0, ankle.1),
        ])
    }

    /// Config with smoothing disabled so angle sequences hit the counters
    /// exactly as written
    fn passthrough_config() -> AnalyzerConfig {
        AnalyzerConfig {
            smoothing_alpha: 1.0,
            ..AnalyzerConfig::default()
        }
    }

    #[test]
    fn test_empty_session_reports_zeroes() {
        let report = analyze_detections("empty.mp4", AnalyzerConfig::default(), vec![None, None]);

        assert_eq!(report.summary.squats.total_reps, 0);
        assert_eq!(report.summary.squats.good_form_reps, 0);
        assert!(report.summary.squats.common_issues.is_empty());
        assert_eq!(report.summary.pushups.total_reps, 0);
        assert!(report.frame_data.is_empty());
        assert!(!report.truncated);
    }

    #[test]
    fn test_undetected_frames_are_not_recorded() {
        let detections = vec![None, Some(pose(170.0, 170.0)), None, Some(pose(165.0, 170.0))];
        let report = analyze_detections("gaps.mp4", passthrough_config(), detections);

        assert_eq!(report.frame_data.len(), 2);
        assert_eq!(report.frame_data[0].frame_index, 1);
        assert_eq!(report.frame_data[1].frame_index, 3);
    }

    #[test]
    fn test_counts_squat_reps_end_to_end() {
        let detections = vec![
            Some(pose(170.0, 170.0)),
            Some(pose(50.0, 170.0)),
            Some(pose(170.0, 170.0)),
            Some(pose(50.0, 170.0)),
        ];
        let report = analyze_detections("squats.mp4", passthrough_config(), detections);

        assert_eq!(report.summary.squats.total_reps, 2);
        assert_eq!(report.summary.squats.good_form_reps, 2);
        assert_eq!(report.summary.pushups.total_reps, 0);
    }

    #[test]
    fn test_both_exercises_count_independently() {
        // Knee and elbow both dip in the same frames
        let detections = vec![Some(pose(170.0, 170.0)), Some(pose(50.0, 50.0))];
        let report = analyze_detections("combo.mp4", passthrough_config(), detections);

        assert_eq!(report.summary.squats.total_reps, 1);
        assert_eq!(report.summary.pushups.total_reps, 1);
        // The advisory label favors squat when both are active
        assert_eq!(report.frame_data[1].exercise, InferredExercise::Squat);
        assert_eq!(report.frame_data[1].rep_id, 1);
    }

    #[test]
    fn test_classification_labels() {
        let mut session = AnalysisSession::new("labels.mp4", passthrough_config());

        let update = session.process_frame(0, Some(pose(170.0, 170.0))).unwrap();
        assert_eq!(update.record.exercise, InferredExercise::None);
        assert_eq!(update.record.rep_id, 0);

        let update = session.process_frame(1, Some(pose(170.0, 120.0))).unwrap();
        assert_eq!(update.record.exercise, InferredExercise::Pushup);
    }

    #[test]
    fn test_flawed_rep_marks_frame() {
        let detections = vec![
            Some(full_pose(170.0, 170.0, 0.0, 0.0)),
            Some(full_pose(50.0, 170.0, 41.0, 0.0)),
        ];
        let report = analyze_detections("depth.mp4", passthrough_config(), detections);

        assert!(!report.frame_data[1].is_form_ok);
        assert_eq!(report.summary.squats.total_reps, 1);
        assert_eq!(report.summary.squats.good_form_reps, 0);
        assert_eq!(
            report.summary.squats.common_issues,
            vec![FormIssue::InsufficientDepth]
        );
    }

    #[test]
    fn test_smoothing_dampens_single_frame_dip() {
        // With the default alpha one down-frame cannot drag the smoothed
        // angle below the rep threshold
        let detections = vec![
            Some(pose(170.0, 170.0)),
            Some(pose(170.0, 170.0)),
            Some(pose(50.0, 170.0)),
            Some(pose(170.0, 170.0)),
        ];
        let report = analyze_detections("jitter.mp4", AnalyzerConfig::default(), detections);

        assert_eq!(report.summary.squats.total_reps, 0);
    }

    #[test]
    fn test_truncation_bounds_session() {
        let config = AnalyzerConfig {
            smoothing_alpha: 1.0,
            max_frames: 2,
            ..AnalyzerConfig::default()
        };
        let detections = (0..5).map(|_| Some(pose(170.0, 170.0))).collect::<Vec<_>>();
        let report = analyze_detections("long.mp4", config, detections);

        assert_eq!(report.frame_data.len(), 2);
        assert!(report.truncated);
    }

    #[test]
    fn test_fresh_sessions_are_deterministic() {
        let detections = || {
            vec![
                Some(full_pose(170.0, 170.0, 0.0, 0.0)),
                Some(full_pose(50.0, 60.0, 41.0, 10.0)),
                None,
                Some(full_pose(170.0, 170.0, 0.0, 0.0)),
            ]
        };

        let first = analyze_detections("same.mp4", AnalyzerConfig::default(), detections());
        let second = analyze_detections("same.mp4", AnalyzerConfig::default(), detections());

        assert_eq!(first.summary, second.summary);
        assert_eq!(first.frame_data, second.frame_data);
        assert_eq!(
            serde_json::to_string(&first.summary).unwrap(),
            serde_json::to_string(&second.summary).unwrap()
        );
    }

    #[test]
    fn test_interleaved_sessions_match_isolated_runs() {
        let squats = vec![
            Some(pose(170.0, 170.0)),
            Some(pose(50.0, 170.0)),
            Some(pose(170.0, 170.0)),
        ];
        let pushups = vec![
            Some(pose(170.0, 170.0)),
            Some(pose(170.0, 50.0)),
            Some(pose(170.0, 170.0)),
        ];

        let isolated_a = analyze_detections("a.mp4", passthrough_config(), squats.clone());
        let isolated_b = analyze_detections("b.mp4", passthrough_config(), pushups.clone());

        let mut session_a = AnalysisSession::new("a.mp4", passthrough_config());
        let mut session_b = AnalysisSession::new("b.mp4", passthrough_config());
        for (index, (a, b)) in squats.into_iter().zip(pushups).enumerate() {
            session_a.process_frame(index, a);
            session_b.process_frame(index, b);
        }
        let interleaved_a = session_a.finish();
        let interleaved_b = session_b.finish();

        assert_eq!(isolated_a.summary, interleaved_a.summary);
        assert_eq!(isolated_a.frame_data, interleaved_a.frame_data);
        assert_eq!(isolated_b.summary, interleaved_b.summary);
        assert_eq!(isolated_b.frame_data, interleaved_b.frame_data);
    }
}
