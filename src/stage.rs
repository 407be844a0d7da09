//! Stage classification.
//!
//! Maps one primary-angle measurement to one of the three discrete exercise
//! stages via the profile's angle bands. The bands are checked in a fixed
//! priority order (NORMAL, then TRANS, then PASS) so overlapping intervals
//! in a profile resolve deterministically.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete phase of an exercise repetition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Full extension / rest (the NORMAL band)
    One,
    /// Transitional range (the TRANS band)
    Two,
    /// Full contraction (the PASS band)
    Three,
}

impl Stage {
    /// Stage number as displayed to the user
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Stage::One => 1,
            Stage::Two => 2,
            Stage::Three => 3,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Inclusive integer angle interval in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AngleBand {
    pub lo: i32,
    pub hi: i32,
}

impl AngleBand {
    #[must_use]
    pub fn new(lo: i32, hi: i32) -> Self {
        Self { lo, hi }
    }

    /// Whether the truncated angle lies within the band (inclusive)
    #[must_use]
    pub fn contains(&self, angle: i32) -> bool {
        self.lo <= angle && angle <= self.hi
    }
}

/// The three angle bands that drive staging.
///
/// Intervals need not be disjoint in profile data; [`classify`] checks them
/// in NORMAL, TRANS, PASS order and the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageBands {
    /// Maps to stage 1
    pub normal: AngleBand,
    /// Maps to stage 2
    pub trans: AngleBand,
    /// Maps to stage 3
    pub pass: AngleBand,
}

/// Classify a primary angle into a stage.
///
/// The angle is truncated to an integer before the band check. Returns
/// `None` when the angle falls outside every band.
#[must_use]
pub fn classify(angle: f32, bands: &StageBands) -> Option<Stage> {
    let angle = angle as i32;
    if bands.normal.contains(angle) {
        Some(Stage::One)
    } else if bands.trans.contains(angle) {
        Some(Stage::Two)
    } else if bands.pass.contains(angle) {
        Some(Stage::Three)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curl_bands() -> StageBands {
        StageBands {
            normal: AngleBand::new(110, 145),
            trans: AngleBand::new(75, 109),
            pass: AngleBand::new(10, 50),
        }
    }

    #[test]
    fn test_classify_each_band() {
        let bands = curl_bands();
        assert_eq!(classify(120.0, &bands), Some(Stage::One));
        assert_eq!(classify(90.0, &bands), Some(Stage::Two));
        assert_eq!(classify(30.0, &bands), Some(Stage::Three));
        assert_eq!(classify(60.0, &bands), None);
        assert_eq!(classify(170.0, &bands), None);
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let bands = curl_bands();
        assert_eq!(classify(110.0, &bands), Some(Stage::One));
        assert_eq!(classify(145.0, &bands), Some(Stage::One));
        assert_eq!(classify(109.0, &bands), Some(Stage::Two));
        assert_eq!(classify(10.0, &bands), Some(Stage::Three));
    }

    #[test]
    fn test_angle_is_truncated_before_matching() {
        let bands = curl_bands();
        // 109.9 truncates to 109, still TRANS.
        assert_eq!(classify(109.9, &bands), Some(Stage::Two));
        // 9.9 truncates to 9, below the PASS band.
        assert_eq!(classify(9.9, &bands), None);
    }

    #[test]
    fn test_overlapping_bands_resolve_in_fixed_order() {
        let bands = StageBands {
            normal: AngleBand::new(0, 100),
            trans: AngleBand::new(50, 150),
            pass: AngleBand::new(120, 180),
        };
        assert_eq!(classify(80.0, &bands), Some(Stage::One));
        assert_eq!(classify(130.0, &bands), Some(Stage::Two));
        assert_eq!(classify(160.0, &bands), Some(Stage::Three));
    }
}
