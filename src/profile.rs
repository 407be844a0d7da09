//! Exercise profiles.
//!
//! A profile is pure configuration: the angle bands that drive staging, the
//! plan for deriving measurements from landmarks, the posture rules with
//! their thresholds, and the feedback-message slots. The engine is generic
//! over a profile; adding an exercise is a data change, not a code change.
//!
//! Profiles load from YAML (see [`ExerciseProfile::from_file`]) or come
//! from the built-in constructors. A profile is validated once at load
//! time; the engine never sees an invalid one.

use crate::constants::{
    DEFAULT_DISPLAY_FRAME_THRESHOLD, DEFAULT_INACTIVE_THRESHOLD_SECS, DEFAULT_OFFSET_THRESHOLD,
};
use crate::error::{Error, Result};
use crate::geometry::{angle_at, vertical_angle};
use crate::landmarks::{BodySide, Joint, LandmarkFrame};
use crate::stage::{AngleBand, StageBands};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// How to derive one named angle from a frame's landmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleSpec {
    /// Angle at `vertex` between the rays toward `first` and `second`
    ThreePoint {
        first: Joint,
        vertex: Joint,
        second: Joint,
    },
    /// Angle at `vertex` between the ray toward `toward` and straight up
    Vertical { vertex: Joint, toward: Joint },
}

impl AngleSpec {
    /// Measure this angle on the tracked side of a landmark frame
    #[must_use]
    pub fn measure(&self, frame: &LandmarkFrame, side: BodySide) -> f32 {
        match *self {
            AngleSpec::ThreePoint {
                first,
                vertex,
                second,
            } => angle_at(
                frame.joint(side, vertex),
                frame.joint(side, first),
                frame.joint(side, second),
            ),
            AngleSpec::Vertical { vertex, toward } => {
                vertical_angle(frame.joint(side, vertex), frame.joint(side, toward))
            }
        }
    }
}

/// Which measurements a profile derives from landmarks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnglePlan {
    /// Tracked side is the one with the larger vertical extent
    /// `|a.y - b.y|` between these two joints
    pub side_metric: (Joint, Joint),
    /// The staging angle
    pub primary: AngleSpec,
    /// Named angles consumed only by posture rules
    pub auxiliary: BTreeMap<String, AngleSpec>,
}

impl AnglePlan {
    /// Pick the body side to track this frame.
    ///
    /// The side presenting the larger vertical extent is the one better
    /// aligned with the camera's side profile; ties go right, as does a
    /// perfectly symmetric body.
    #[must_use]
    pub fn tracked_side(&self, frame: &LandmarkFrame) -> BodySide {
        let (a, b) = self.side_metric;
        let left = (frame.joint(BodySide::Left, a).y - frame.joint(BodySide::Left, b).y).abs();
        let right = (frame.joint(BodySide::Right, a).y - frame.joint(BodySide::Right, b).y).abs();
        if left > right {
            BodySide::Left
        } else {
            BodySide::Right
        }
    }
}

/// Threshold predicate of a posture rule. All comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Fires when the measurement exceeds the threshold
    Above { threshold: f32 },
    /// Fires when the measurement is below the threshold
    Below { threshold: f32 },
    /// Fires when the measurement lies strictly inside (lo, hi)
    Within { lo: f32, hi: f32 },
}

impl Condition {
    /// Whether the predicate holds for a measurement
    #[must_use]
    pub fn holds(&self, value: f32) -> bool {
        match *self {
            Condition::Above { threshold } => value > threshold,
            Condition::Below { threshold } => value < threshold,
            Condition::Within { lo, hi } => lo < value && value < hi,
        }
    }
}

/// One corrective-feedback rule.
///
/// Declaration order in the profile is cue priority: every true rule sets
/// its feedback slot, but only the first true rule with a cue sounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureRule {
    /// Key into the plan's auxiliary measurements
    pub measure: String,
    pub condition: Condition,
    /// Feedback slot set while the rule fires
    pub slot: usize,
    /// Audio cue id, or `None` for a display-only hint
    #[serde(default)]
    pub cue: Option<String>,
    /// Whether firing marks the current repetition incorrect
    #[serde(default = "default_true")]
    pub sets_fault: bool,
    /// Rule applies only while exactly one s2 token has been recorded this
    /// cycle (mid-descent)
    #[serde(default)]
    pub only_mid_descent: bool,
}

fn default_true() -> bool {
    true
}

/// When posture rules run relative to repetition resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureEval {
    /// Rules run on every aligned frame, including resolving s1 frames
    /// (the barbell curl's policy)
    EveryAlignedFrame,
    /// Rules run only on frames that do not resolve a repetition
    NonResolvingFrames,
}

/// On-screen descriptor of one feedback message. Opaque to the engine
/// beyond the slot index; the renderer owns its interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSlot {
    pub message: String,
    /// (x, y) position in pixels
    pub position: (i32, i32),
    /// RGB text color
    pub text_color: (u8, u8, u8),
    /// RGB background color
    pub background: (u8, u8, u8),
}

impl FeedbackSlot {
    fn warning(message: &str, position: (i32, i32)) -> Self {
        Self {
            message: message.to_string(),
            position,
            text_color: (255, 255, 230),
            background: (255, 80, 80),
        }
    }
}

/// Complete per-exercise configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProfile {
    pub name: String,
    pub bands: StageBands,
    pub plan: AnglePlan,
    pub posture_rules: Vec<PostureRule>,
    pub posture_eval: PostureEval,
    /// Degrees; larger view offsets mean the body faces the camera
    #[serde(default = "default_offset_threshold")]
    pub offset_threshold: f32,
    /// Seconds of inactivity before the counters reset
    #[serde(default = "default_inactive_threshold")]
    pub inactive_threshold_secs: f32,
    /// Consecutive frames a feedback message stays visible
    #[serde(default = "default_display_threshold")]
    pub display_frame_threshold: u32,
    pub feedback_slots: Vec<FeedbackSlot>,
}

fn default_offset_threshold() -> f32 {
    DEFAULT_OFFSET_THRESHOLD
}

fn default_inactive_threshold() -> f32 {
    DEFAULT_INACTIVE_THRESHOLD_SECS
}

fn default_display_threshold() -> u32 {
    DEFAULT_DISPLAY_FRAME_THRESHOLD
}

impl ExerciseProfile {
    /// Barbell curl: staging on elbow flexion, back-straightness rule on
    /// the hip-vertical angle, evaluated on every aligned frame.
    #[must_use]
    pub fn barbell_curl() -> Self {
        let mut auxiliary = BTreeMap::new();
        auxiliary.insert(
            "hip_vertical".to_string(),
            AngleSpec::Vertical {
                vertex: Joint::Hip,
                toward: Joint::Shoulder,
            },
        );
        Self {
            name: "barbell curl".to_string(),
            bands: StageBands {
                normal: AngleBand::new(110, 145),
                trans: AngleBand::new(75, 109),
                pass: AngleBand::new(10, 50),
            },
            plan: AnglePlan {
                side_metric: (Joint::Hip, Joint::Shoulder),
                primary: AngleSpec::ThreePoint {
                    first: Joint::Wrist,
                    vertex: Joint::Elbow,
                    second: Joint::Shoulder,
                },
                auxiliary,
            },
            posture_rules: vec![PostureRule {
                measure: "hip_vertical".to_string(),
                condition: Condition::Above { threshold: 10.0 },
                slot: 0,
                cue: Some("Barbellcurl_1".to_string()),
                sets_fault: true,
                only_mid_descent: false,
            }],
            posture_eval: PostureEval::EveryAlignedFrame,
            offset_threshold: 80.0,
            inactive_threshold_secs: DEFAULT_INACTIVE_THRESHOLD_SECS,
            display_frame_threshold: DEFAULT_DISPLAY_FRAME_THRESHOLD,
            feedback_slots: vec![
                FeedbackSlot::warning("KEEP YOUR BACK STRAIGHT", (30, 170)),
                FeedbackSlot::warning("AVOID EXCESSIVE SWING", (30, 125)),
            ],
        }
    }

    /// Bent-over row: staging on the elbow-shoulder-hip angle; rules for
    /// knees over toes, back straightness, and torso depth.
    #[must_use]
    pub fn bent_over_row() -> Self {
        let mut auxiliary = BTreeMap::new();
        auxiliary.insert(
            "hip_vertical".to_string(),
            AngleSpec::Vertical {
                vertex: Joint::Hip,
                toward: Joint::Shoulder,
            },
        );
        auxiliary.insert(
            "ankle_vertical".to_string(),
            AngleSpec::Vertical {
                vertex: Joint::Ankle,
                toward: Joint::Knee,
            },
        );
        auxiliary.insert(
            "torso_line".to_string(),
            AngleSpec::ThreePoint {
                first: Joint::Ear,
                vertex: Joint::Shoulder,
                second: Joint::Hip,
            },
        );
        Self {
            name: "bent-over row".to_string(),
            bands: StageBands {
                normal: AngleBand::new(30, 55),
                trans: AngleBand::new(10, 29),
                pass: AngleBand::new(0, 9),
            },
            plan: AnglePlan {
                side_metric: (Joint::Foot, Joint::Hip),
                primary: AngleSpec::ThreePoint {
                    first: Joint::Elbow,
                    vertex: Joint::Shoulder,
                    second: Joint::Hip,
                },
                auxiliary,
            },
            // Declaration order is cue priority: ankle, then torso, then hip.
            posture_rules: vec![
                PostureRule {
                    measure: "ankle_vertical".to_string(),
                    condition: Condition::Above { threshold: 45.0 },
                    slot: 1,
                    cue: Some("Bentover_1".to_string()),
                    sets_fault: true,
                    only_mid_descent: false,
                },
                PostureRule {
                    measure: "torso_line".to_string(),
                    condition: Condition::Below { threshold: 145.0 },
                    slot: 2,
                    cue: Some("Bentover_2".to_string()),
                    sets_fault: true,
                    only_mid_descent: false,
                },
                PostureRule {
                    measure: "hip_vertical".to_string(),
                    condition: Condition::Below { threshold: 40.0 },
                    slot: 0,
                    cue: Some("Bentover_0".to_string()),
                    sets_fault: true,
                    only_mid_descent: false,
                },
            ],
            posture_eval: PostureEval::NonResolvingFrames,
            offset_threshold: 55.0,
            inactive_threshold_secs: DEFAULT_INACTIVE_THRESHOLD_SECS,
            display_frame_threshold: DEFAULT_DISPLAY_FRAME_THRESHOLD,
            feedback_slots: vec![
                FeedbackSlot::warning("LOWER YOUR TORSO", (30, 80)),
                FeedbackSlot::warning("AVOID KNEES OVER TOES", (30, 170)),
                FeedbackSlot::warning("KEEP YOUR BACK STRAIGHT", (30, 200)),
            ],
        }
    }

    /// Weighted squat: staging on the knee-vertical angle; depth and
    /// knees-over-toes rules plus a display-only mid-descent hint.
    #[must_use]
    pub fn weighted_squat() -> Self {
        let knee_vertical = AngleSpec::Vertical {
            vertex: Joint::Knee,
            toward: Joint::Hip,
        };
        let mut auxiliary = BTreeMap::new();
        // Posture rules read the auxiliary map only, so the staging angle
        // is registered there as well.
        auxiliary.insert("knee_vertical".to_string(), knee_vertical);
        auxiliary.insert(
            "ankle_vertical".to_string(),
            AngleSpec::Vertical {
                vertex: Joint::Ankle,
                toward: Joint::Knee,
            },
        );
        Self {
            name: "weighted squat".to_string(),
            bands: StageBands {
                normal: AngleBand::new(0, 32),
                trans: AngleBand::new(35, 65),
                pass: AngleBand::new(80, 95),
            },
            plan: AnglePlan {
                side_metric: (Joint::Foot, Joint::Hip),
                primary: knee_vertical,
                auxiliary,
            },
            posture_rules: vec![
                PostureRule {
                    measure: "knee_vertical".to_string(),
                    condition: Condition::Within { lo: 70.0, hi: 80.0 },
                    slot: 0,
                    cue: None,
                    sets_fault: false,
                    only_mid_descent: true,
                },
                PostureRule {
                    measure: "knee_vertical".to_string(),
                    condition: Condition::Above { threshold: 95.0 },
                    slot: 2,
                    cue: Some("Squat_2".to_string()),
                    sets_fault: true,
                    only_mid_descent: false,
                },
                PostureRule {
                    measure: "ankle_vertical".to_string(),
                    condition: Condition::Above { threshold: 45.0 },
                    slot: 1,
                    cue: Some("Squat_1".to_string()),
                    sets_fault: true,
                    only_mid_descent: false,
                },
            ],
            posture_eval: PostureEval::NonResolvingFrames,
            offset_threshold: 55.0,
            inactive_threshold_secs: DEFAULT_INACTIVE_THRESHOLD_SECS,
            display_frame_threshold: DEFAULT_DISPLAY_FRAME_THRESHOLD,
            feedback_slots: vec![
                FeedbackSlot {
                    message: "RISE UP".to_string(),
                    position: (30, 80),
                    text_color: (0, 0, 0),
                    background: (255, 255, 0),
                },
                FeedbackSlot::warning("AVOID KNEES OVER TOES", (30, 170)),
                FeedbackSlot::warning("SQUAT IS TOO DEEP", (30, 125)),
            ],
        }
    }

    /// Look up a built-in profile by short name
    pub fn builtin(name: &str) -> Result<Self> {
        match name {
            "curl" | "barbell_curl" => Ok(Self::barbell_curl()),
            "row" | "bent_over_row" => Ok(Self::bent_over_row()),
            "squat" | "weighted_squat" => Ok(Self::weighted_squat()),
            other => Err(Error::Profile(format!("unknown built-in profile: {other}"))),
        }
    }

    /// Load and validate a profile from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let profile: Self = serde_yaml::from_str(&content)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Save a profile to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the profile.
    ///
    /// Must succeed before a session binds the profile; the engine assumes
    /// a valid one.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Profile("profile name must not be empty".to_string()));
        }
        for (label, band) in [
            ("normal", self.bands.normal),
            ("trans", self.bands.trans),
            ("pass", self.bands.pass),
        ] {
            if band.lo > band.hi {
                return Err(Error::Profile(format!(
                    "{label} band is inverted: [{}, {}]",
                    band.lo, band.hi
                )));
            }
        }
        if self.offset_threshold <= 0.0 {
            return Err(Error::Profile(format!(
                "offset threshold must be positive, got {}",
                self.offset_threshold
            )));
        }
        if self.inactive_threshold_secs <= 0.0 {
            return Err(Error::Profile(format!(
                "inactivity threshold must be positive, got {}",
                self.inactive_threshold_secs
            )));
        }
        if self.display_frame_threshold == 0 {
            return Err(Error::Profile(
                "display frame threshold must be greater than 0".to_string(),
            ));
        }
        for (idx, rule) in self.posture_rules.iter().enumerate() {
            if !self.plan.auxiliary.contains_key(&rule.measure) {
                return Err(Error::Profile(format!(
                    "rule {idx} reads measurement '{}' which the plan does not derive",
                    rule.measure
                )));
            }
            if rule.slot >= self.feedback_slots.len() {
                return Err(Error::Profile(format!(
                    "rule {idx} targets feedback slot {} but only {} slots exist",
                    rule.slot,
                    self.feedback_slots.len()
                )));
            }
            if let Condition::Within { lo, hi } = rule.condition {
                if lo >= hi {
                    return Err(Error::Profile(format!(
                        "rule {idx} has an empty interval ({lo}, {hi})"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Example profile file content
pub const EXAMPLE_PROFILE: &str = r#"# Barbell curl profile
name: barbell curl
bands:
  normal: { lo: 110, hi: 145 }
  trans: { lo: 75, hi: 109 }
  pass: { lo: 10, hi: 50 }
plan:
  side_metric: [hip, shoulder]
  primary: !three_point { first: wrist, vertex: elbow, second: shoulder }
  auxiliary:
    hip_vertical: !vertical { vertex: hip, toward: shoulder }
posture_rules:
  - measure: hip_vertical
    condition: !above { threshold: 10.0 }
    slot: 0
    cue: Barbellcurl_1
posture_eval: every_aligned_frame
offset_threshold: 80.0
inactive_threshold_secs: 10.0
display_frame_threshold: 50
feedback_slots:
  - message: KEEP YOUR BACK STRAIGHT
    position: [30, 170]
    text_color: [255, 255, 230]
    background: [255, 80, 80]
  - message: AVOID EXCESSIVE SWING
    position: [30, 125]
    text_color: [255, 255, 230]
    background: [255, 80, 80]
"#;
