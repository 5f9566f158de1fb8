// Data models for exercise classification, rep events, and session reports

use serde::{Deserialize, Serialize};

// ==============================================================================
// Exercises
// ==============================================================================

/// Exercises the analyzer counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Squat,
    Pushup,
}

impl ExerciseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::Pushup => "pushup",
        }
    }
}

/// Rep counter stage
///
/// Two-threshold hysteresis: a rep only counts on an Up -> Down crossing,
/// so the deadband between the thresholds cannot double-count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Unknown,
    Up,
    Down,
}

// ==============================================================================
// Form Issues
// ==============================================================================

/// Fixed form issue codes
///
/// Wire strings are stable; downstream consumers match on them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormIssue {
    #[serde(rename = "INSUFFICIENT_DEPTH")]
    InsufficientDepth,
    #[serde(rename = "BODY_LINE_BREAK")]
    BodyLineBreak,
}

impl FormIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormIssue::InsufficientDepth => "INSUFFICIENT_DEPTH",
            FormIssue::BodyLineBreak => "BODY_LINE_BREAK",
        }
    }
}

// ==============================================================================
// Per-Frame Records
// ==============================================================================

/// A completed repetition emitted by a rep counter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepEvent {
    pub exercise: ExerciseKind,
    pub rep_index: u32,
    pub form_ok: bool,
    pub issue: Option<FormIssue>,
}

/// Advisory per-frame exercise label
///
/// Classification only labels the frame for reporting; both counters run
/// every frame regardless of the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredExercise {
    Squat,
    Pushup,
    None,
}

impl InferredExercise {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferredExercise::Squat => "squat",
            InferredExercise::Pushup => "pushup",
            InferredExercise::None => "none",
        }
    }
}

/// Joint angles recorded for a frame
///
/// An angle is absent when that exercise's landmarks were missing from
/// the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub knee: Option<f32>,
    pub elbow: Option<f32>,
}

/// One analyzed frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame_index: usize,
    pub exercise: InferredExercise,
    /// Current rep count of the labeled exercise, 0 when no exercise is active
    pub rep_id: u32,
    pub is_form_ok: bool,
    pub angles: JointAngles,
}

// ==============================================================================
// Session Summary
// ==============================================================================

/// Per-exercise rollup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub total_reps: u32,
    pub good_form_reps: u32,
    /// Distinct issue codes observed, sorted for stable output
    pub common_issues: Vec<FormIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub squats: ExerciseSummary,
    pub pushups: ExerciseSummary,
}

/// Complete output of one analysis session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub video_id: String,
    pub summary: SessionSummary,
    pub frame_data: Vec<FrameRecord>,
    /// True when the configured frame bound cut the session short
    pub truncated: bool,
    pub generated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_codes_serialize_as_fixed_strings() {
        assert_eq!(
            serde_json::to_string(&FormIssue::InsufficientDepth).unwrap(),
            "\"INSUFFICIENT_DEPTH\""
        );
        assert_eq!(
            serde_json::to_string(&FormIssue::BodyLineBreak).unwrap(),
            "\"BODY_LINE_BREAK\""
        );
    }

    #[test]
    fn test_exercise_labels_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&InferredExercise::Pushup).unwrap(),
            "\"pushup\""
        );
        assert_eq!(
            serde_json::to_string(&InferredExercise::None).unwrap(),
            "\"none\""
        );
    }

    #[test]
    fn test_summary_roundtrip() {
        let summary = SessionSummary {
            squats: ExerciseSummary {
                total_reps: 3,
                good_form_reps: 2,
                common_issues: vec![FormIssue::InsufficientDepth],
            },
            pushups: ExerciseSummary::default(),
        };

        let json = serde_json::to_string(&summary).unwrap();
        let back: SessionSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(summary, back);
    }
}
