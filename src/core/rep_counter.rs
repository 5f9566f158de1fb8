// Hysteresis rep counting with per-rep form checks

use crate::core::geometry::joint_angle;
use crate::models::exercise::{ExerciseKind, ExerciseSummary, FormIssue, RepEvent, Stage};
use crate::models::pose::{AnalysisResult, BodyLandmark, KeypointSet};
use std::collections::BTreeSet;

/// Axis along which a form rule measures its offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetAxis {
    Horizontal,
    Vertical,
}

/// Technique check evaluated at the moment a rep completes
///
/// Offset between two landmarks along one axis, compared against a
/// threshold in the keypoint coordinate space.
#[derive(Debug, Clone, Copy)]
pub struct FormRule {
    pub first: BodyLandmark,
    pub second: BodyLandmark,
    pub axis: OffsetAxis,
    pub max_offset: f32,
    pub issue: FormIssue,
}

impl FormRule {
    fn evaluate(&self, keypoints: &KeypointSet) -> AnalysisResult<Option<FormIssue>> {
        let a = keypoints.require(self.first)?;
        let b = keypoints.require(self.second)?;

        let offset = match self.axis {
            OffsetAxis::Horizontal => (a.x - b.x).abs(),
            OffsetAxis::Vertical => (a.y - b.y).abs(),
        };

        Ok((offset > self.max_offset).then_some(self.issue))
    }
}

/// Joint triple and form rule defining one exercise
///
/// Squat and push-up share the same state machine; only the landmarks,
/// thresholds, and issue code differ.
#[derive(Debug, Clone, Copy)]
pub struct ExerciseProfile {
    pub kind: ExerciseKind,
    pub first: BodyLandmark,
    pub vertex: BodyLandmark,
    pub end: BodyLandmark,
    pub form_rule: FormRule,
}

impl ExerciseProfile {
    /// Squat: knee bend from hip-knee-ankle, depth judged by how far the
    /// knee tracks past the ankle horizontally
    pub fn squat(max_depth_offset: f32) -> Self {
        Self {
            kind: ExerciseKind::Squat,
            first: BodyLandmark::LeftHip,
            vertex: BodyLandmark::LeftKnee,
            end: BodyLandmark::LeftAnkle,
            form_rule: FormRule {
                first: BodyLandmark::LeftKnee,
                second: BodyLandmark::LeftAnkle,
                axis: OffsetAxis::Horizontal,
                max_offset: max_depth_offset,
                issue: FormIssue::InsufficientDepth,
            },
        }
    }

    /// Push-up: elbow bend from shoulder-elbow-wrist, body line judged by
    /// hip sag relative to the shoulder
    pub fn pushup(max_alignment_offset: f32) -> Self {
        Self {
            kind: ExerciseKind::Pushup,
            first: BodyLandmark::LeftShoulder,
            vertex: BodyLandmark::LeftElbow,
            end: BodyLandmark::LeftWrist,
            form_rule: FormRule {
                first: BodyLandmark::LeftHip,
                second: BodyLandmark::LeftShoulder,
                axis: OffsetAxis::Vertical,
                max_offset: max_alignment_offset,
                issue: FormIssue::BodyLineBreak,
            },
        }
    }
}

/// What one frame looked like to a counter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAssessment {
    pub angle: f32,
    pub rep: Option<RepEvent>,
}

/// Two-threshold hysteresis rep counter
///
/// A rep counts only on an Up -> Down crossing; the deadband between the
/// thresholds absorbs oscillation at either boundary.
pub struct RepCounter {
    profile: ExerciseProfile,
    up_threshold: f32,
    down_threshold: f32,
    stage: Stage,
    rep_count: u32,
    flawed_reps: u32,
    issues: Vec<FormIssue>,
}

impl RepCounter {
    pub fn new(profile: ExerciseProfile, up_threshold: f32, down_threshold: f32) -> Self {
        Self {
            profile,
            up_threshold,
            down_threshold,
            stage: Stage::Unknown,
            rep_count: 0,
            flawed_reps: 0,
            issues: Vec::new(),
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.profile.kind
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    /// Advance the state machine by one frame of smoothed keypoints
    ///
    /// Fails with `MissingLandmark` before any state change when a joint
    /// this exercise needs is absent; the caller skips the frame for this
    /// exercise only.
    pub fn advance(&mut self, keypoints: &KeypointSet) -> AnalysisResult<FrameAssessment> {
        let a = keypoints.require(self.profile.first)?;
        let b = keypoints.require(self.profile.vertex)?;
        let c = keypoints.require(self.profile.end)?;
        let angle = joint_angle(a, b, c);

        if angle > self.up_threshold {
            self.stage = Stage::Up;
            return Ok(FrameAssessment { angle, rep: None });
        }

        if angle < self.down_threshold && self.stage == Stage::Up {
            // Resolve the form rule first so a missing landmark cannot
            // leave a half-counted rep behind
            let issue = self.profile.form_rule.evaluate(keypoints)?;

            self.stage = Stage::Down;
            self.rep_count += 1;
            if let Some(issue) = issue {
                self.flawed_reps += 1;
                self.issues.push(issue);
            }

            return Ok(FrameAssessment {
                angle,
                rep: Some(RepEvent {
                    exercise: self.profile.kind,
                    rep_index: self.rep_count,
                    form_ok: issue.is_none(),
                    issue,
                }),
            });
        }

        Ok(FrameAssessment { angle, rep: None })
    }

    /// Distinct issue codes observed, sorted for stable output
    pub fn distinct_issues(&self) -> Vec<FormIssue> {
        self.issues
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Roll the counter up into its report form
    ///
    /// Good-form reps subtract every flawed rep, not just distinct issue
    /// types, so repeating the same mistake is penalized each time.
    pub fn summary(&self) -> ExerciseSummary {
        ExerciseSummary {
            total_reps: self.rep_count,
            good_form_reps: self.rep_count - self.flawed_reps,
            common_issues: self.distinct_issues(),
        }
    }
}
