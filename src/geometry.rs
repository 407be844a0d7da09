//! Geometric primitives over landmark coordinates.
//!
//! Pure functions only; all engine state lives in [`crate::engine`].
//! Angles are in degrees, in image coordinates where y grows downward.

use crate::constants::DEGENERATE_RAY_EPSILON;
use crate::landmarks::Point2;

/// Angle at `vertex` between the rays `vertex -> a` and `vertex -> b`.
///
/// Uses the dot product formula: cos(θ) = (v1 · v2) / (|v1| × |v2|).
/// Returns degrees in [0, 180]; degenerate (zero-length) rays yield 0.
#[must_use]
pub fn angle_at(vertex: Point2, a: Point2, b: Point2) -> f32 {
    let v1 = (a.x - vertex.x, a.y - vertex.y);
    let v2 = (b.x - vertex.x, b.y - vertex.y);

    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();

    if mag1 < DEGENERATE_RAY_EPSILON || mag2 < DEGENERATE_RAY_EPSILON {
        return 0.0;
    }

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);

    cos_angle.acos().to_degrees()
}

/// Angle at `vertex` between the ray `vertex -> toward` and straight up.
///
/// "Up" is the negative y direction of image space, matching a reference
/// point directly above the vertex.
#[must_use]
pub fn vertical_angle(vertex: Point2, toward: Point2) -> f32 {
    let up = Point2::new(vertex.x, vertex.y - 1.0);
    angle_at(vertex, toward, up)
}

/// View-offset angle: how far the shoulder line is rotated toward the
/// camera, measured at the nose between the two shoulders. Small when the
/// subject presents a side profile, large when facing the camera.
#[must_use]
pub fn view_offset_angle(frame: &crate::landmarks::LandmarkFrame) -> f32 {
    angle_at(frame.nose, frame.left.shoulder, frame.right.shoulder)
}

/// Euclidean distance between two landmarks
#[must_use]
pub fn distance(a: Point2, b: Point2) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}
