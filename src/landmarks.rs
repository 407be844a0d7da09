//! Body landmark model.
//!
//! The pose-estimation service reports 2D landmark coordinates per frame.
//! This module holds the subset the engine tracks: the nose plus eight
//! joints on each side of the body, addressed by [`Joint`] and [`BodySide`].

use serde::{Deserialize, Serialize};

/// A 2D landmark coordinate in image space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Side of the body a landmark belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodySide {
    Left,
    Right,
}

/// Named body landmarks tracked by the engine.
///
/// `Nose` is a midline landmark and resolves to the same point regardless
/// of the side it is looked up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    Ear,
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
    Foot,
}

/// Landmarks for one side of the body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideLandmarks {
    pub ear: Point2,
    pub shoulder: Point2,
    pub elbow: Point2,
    pub wrist: Point2,
    pub hip: Point2,
    pub knee: Point2,
    pub ankle: Point2,
    pub foot: Point2,
}

impl SideLandmarks {
    /// Look up a joint on this side. `Nose` is not side-local; see
    /// [`LandmarkFrame::joint`].
    #[must_use]
    pub fn joint(&self, joint: Joint) -> Option<Point2> {
        match joint {
            Joint::Nose => None,
            Joint::Ear => Some(self.ear),
            Joint::Shoulder => Some(self.shoulder),
            Joint::Elbow => Some(self.elbow),
            Joint::Wrist => Some(self.wrist),
            Joint::Hip => Some(self.hip),
            Joint::Knee => Some(self.knee),
            Joint::Ankle => Some(self.ankle),
            Joint::Foot => Some(self.foot),
        }
    }
}

/// One frame's worth of detected body landmarks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub nose: Point2,
    pub left: SideLandmarks,
    pub right: SideLandmarks,
}

impl LandmarkFrame {
    /// Landmarks for the given side
    #[must_use]
    pub fn side(&self, side: BodySide) -> &SideLandmarks {
        match side {
            BodySide::Left => &self.left,
            BodySide::Right => &self.right,
        }
    }

    /// Side-resolved joint lookup
    #[must_use]
    pub fn joint(&self, side: BodySide, joint: Joint) -> Point2 {
        match joint {
            Joint::Nose => self.nose,
            other => self
                .side(side)
                .joint(other)
                .expect("non-nose joints are side-local"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> LandmarkFrame {
        let mut side = SideLandmarks {
            ear: Point2::new(0.0, 0.0),
            shoulder: Point2::new(1.0, 1.0),
            elbow: Point2::new(2.0, 2.0),
            wrist: Point2::new(3.0, 3.0),
            hip: Point2::new(4.0, 4.0),
            knee: Point2::new(5.0, 5.0),
            ankle: Point2::new(6.0, 6.0),
            foot: Point2::new(7.0, 7.0),
        };
        let left = side;
        side.shoulder = Point2::new(10.0, 10.0);
        LandmarkFrame {
            nose: Point2::new(-1.0, -1.0),
            left,
            right: side,
        }
    }

    #[test]
    fn test_joint_lookup_is_side_resolved() {
        let f = frame();
        assert_eq!(f.joint(BodySide::Left, Joint::Shoulder), Point2::new(1.0, 1.0));
        assert_eq!(f.joint(BodySide::Right, Joint::Shoulder), Point2::new(10.0, 10.0));
    }

    #[test]
    fn test_nose_is_midline() {
        let f = frame();
        assert_eq!(f.joint(BodySide::Left, Joint::Nose), f.joint(BodySide::Right, Joint::Nose));
    }
}
