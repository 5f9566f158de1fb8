// Joint angle geometry

use crate::models::pose::Keypoint;

/// Angle in degrees at vertex `b` formed by the rays b->a and b->c
///
/// Result is folded into [0, 180]. Degenerate input (a or c coinciding
/// with b) silently collapses to 0 degrees because atan2 of a zero vector
/// is 0; callers treat that as "no bend", never as an error.
pub fn joint_angle(a: &Keypoint, b: &Keypoint, c: &Keypoint) -> f32 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let mut angle = radians.to_degrees().abs();

    if angle > 180.0 {
        angle = 360.0 - angle;
    }

    angle
}
