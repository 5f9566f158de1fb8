// Temporal smoothing - reduces per-frame jitter in keypoint positions

use crate::models::pose::{Keypoint, KeypointSet};
use std::collections::HashMap;
use tracing::debug;

/// EMA landmark smoother
///
/// Owned by exactly one analysis session: the baseline is session state,
/// and sharing it across sessions would bleed one video's motion into
/// another's.
pub struct LandmarkSmoother {
    alpha: f32,
    previous: Option<KeypointSet>,
}

impl LandmarkSmoother {
    /// Create a smoother with the given EMA factor in (0, 1]
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            previous: None,
        }
    }

    /// Smooth one frame's keypoints against the session baseline
    ///
    /// The smoothed output (not the raw input) becomes the new baseline,
    /// so smoothing compounds recursively across frames. A baseline that
    /// no longer matches the input - detection lost and regained with a
    /// different keypoint count, or an id the baseline has never seen -
    /// is discarded and the raw input passes through unchanged.
    pub fn smooth(&mut self, current: KeypointSet) -> KeypointSet {
        if current.is_empty() {
            return current;
        }

        let previous = match self.previous.as_ref() {
            Some(previous) => previous,
            None => {
                self.previous = Some(current.clone());
                return current;
            }
        };

        if previous.len() != current.len() {
            debug!(
                previous = previous.len(),
                current = current.len(),
                "keypoint count changed, resetting smoothing baseline"
            );
            self.previous = Some(current.clone());
            return current;
        }

        let alpha = self.alpha;
        let baseline: HashMap<u32, Keypoint> =
            previous.points.iter().map(|kp| (kp.id, *kp)).collect();

        // None when the current set carries an id the baseline has not seen
        let blended: Option<Vec<Keypoint>> = current
            .points
            .iter()
            .map(|kp| {
                baseline.get(&kp.id).map(|prev| Keypoint {
                    id: kp.id,
                    x: alpha * kp.x + (1.0 - alpha) * prev.x,
                    y: alpha * kp.y + (1.0 - alpha) * prev.y,
                    visibility: kp.visibility,
                })
            })
            .collect();

        match blended {
            Some(points) => {
                let output = KeypointSet::new(points);
                self.previous = Some(output.clone());
                output
            }
            None => {
                debug!("unmatched keypoint id, resetting smoothing baseline");
                self.previous = Some(current.clone());
                current
            }
        }
    }

    /// Drop the baseline; the next frame passes through unsmoothed
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn set(points: &[(u32, f32, f32)]) -> KeypointSet {
        KeypointSet::new(
            points
                .iter()
                .map(|&(id, x, y)| Keypoint::new(id, x, y))
                .collect(),
        )
    }

    #[test]
    fn test_first_frame_passes_through() {
        let mut smoother = LandmarkSmoother::new(0.2);
        let current = set(&[(0, 10.0, 20.0), (1, 30.0, 40.0)]);

        let out = smoother.smooth(current.clone());
        assert_eq!(out, current, "first frame must pass through exactly");
    }

    #[test]
    fn test_output_is_convex_combination() {
        let mut smoother = LandmarkSmoother::new(0.2);
        smoother.smooth(set(&[(0, 0.0, 100.0)]));
        let out = smoother.smooth(set(&[(0, 10.0, 0.0)]));

        let kp = out.points[0];
        assert_approx_eq!(kp.x, 2.0, 1e-5);
        assert_approx_eq!(kp.y, 80.0, 1e-4);
        assert!(kp.x >= 0.0 && kp.x <= 10.0);
        assert!(kp.y >= 0.0 && kp.y <= 100.0);
    }

    #[test]
    fn test_smoothing_compounds_across_frames() {
        // The smoothed output becomes the baseline, not the raw input
        let mut smoother = LandmarkSmoother::new(0.5);
        smoother.smooth(set(&[(0, 0.0, 0.0)]));
        smoother.smooth(set(&[(0, 8.0, 0.0)]));
        let out = smoother.smooth(set(&[(0, 8.0, 0.0)]));

        assert_approx_eq!(out.points[0].x, 6.0, 1e-5);
    }

    #[test]
    fn test_length_mismatch_resets_baseline() {
        let mut smoother = LandmarkSmoother::new(0.2);
        smoother.smooth(set(&[(0, 0.0, 0.0), (1, 1.0, 1.0)]));

        let regained = set(&[(0, 50.0, 50.0)]);
        let out = smoother.smooth(regained.clone());
        assert_eq!(out, regained, "mismatched set must reset, not blend");

        // The reset baseline is the new set, so the next frame blends again
        let next = smoother.smooth(set(&[(0, 60.0, 50.0)]));
        assert_approx_eq!(next.points[0].x, 52.0, 1e-4);
    }

    #[test]
    fn test_unknown_id_resets_baseline() {
        let mut smoother = LandmarkSmoother::new(0.2);
        smoother.smooth(set(&[(0, 0.0, 0.0), (1, 1.0, 1.0)]));

        let reordered_ids = set(&[(0, 10.0, 10.0), (7, 2.0, 2.0)]);
        let out = smoother.smooth(reordered_ids.clone());
        assert_eq!(out, reordered_ids);
    }

    #[test]
    fn test_reordered_matching_ids_still_blend() {
        let mut smoother = LandmarkSmoother::new(0.2);
        smoother.smooth(set(&[(0, 0.0, 0.0), (1, 100.0, 0.0)]));

        // Same ids, different order: pairing is by id, not position
        let out = smoother.smooth(set(&[(1, 100.0, 0.0), (0, 10.0, 0.0)]));
        assert_eq!(out.points[0].id, 1);
        assert_approx_eq!(out.points[1].x, 2.0, 1e-5);
    }

    #[test]
    fn test_empty_set_does_not_touch_state() {
        let mut smoother = LandmarkSmoother::new(0.2);
        smoother.smooth(set(&[(0, 10.0, 10.0)]));
        smoother.smooth(KeypointSet::default());

        // Baseline survived the empty frame
        let out = smoother.smooth(set(&[(0, 20.0, 10.0)]));
        assert_approx_eq!(out.points[0].x, 12.0, 1e-5);
    }

    #[test]
    fn test_reset_clears_baseline() {
        let mut smoother = LandmarkSmoother::new(0.2);
        smoother.smooth(set(&[(0, 10.0, 10.0)]));
        smoother.reset();

        let fresh = set(&[(0, 99.0, 99.0)]);
        let out = smoother.smooth(fresh.clone());
        assert_eq!(out, fresh);
    }
}
