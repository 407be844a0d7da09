//! Per-repetition form feedback for free-weight exercises.
//!
//! This library counts correct and incorrect repetitions and raises
//! corrective cues ("keep your back straight") from a stream of body
//! landmarks. The core is the [`engine::RepEngine`]: a per-exercise state
//! machine that consumes one measurement frame at a time and emits the
//! exercise stage, both repetition counts, the active feedback messages,
//! and at most one symbolic cue per frame.
//!
//! Pose estimation, video capture, rendering, and audio playback live
//! outside this crate; the engine's boundary is purely in-process. Per
//! frame the pipeline is:
//!
//! 1. The pose service reports landmark coordinates, or "no detection".
//! 2. [`engine::FrameInput::from_detection`] picks the tracked body side
//!    and derives the profile's angles.
//! 3. [`engine::RepEngine::process`] advances the state machine.
//! 4. The caller renders the output and maps the cue id to a sound file.
//!
//! # Examples
//!
//! ## Counting a repetition from raw measurements
//!
//! ```
//! use rep_coach::engine::{Cue, FrameInput, RepEngine};
//! use rep_coach::profile::ExerciseProfile;
//! use std::collections::BTreeMap;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = RepEngine::new(ExerciseProfile::barbell_curl())?;
//!
//! // A side-on subject (small offset) curling through the full range:
//! // rest (s1), transition (s2), full contraction (s3), and back.
//! let frame = |elbow_angle: f32| FrameInput::Detected {
//!     offset_angle: 30.0,
//!     primary_angle: elbow_angle,
//!     auxiliary: BTreeMap::from([("hip_vertical".to_string(), 5.0)]),
//! };
//!
//! for angle in [120.0, 90.0, 30.0, 90.0] {
//!     engine.process(&frame(angle));
//! }
//! let out = engine.process(&frame(120.0));
//! assert_eq!(out.correct, 1);
//! assert_eq!(out.cue, Some(Cue::Rep(1)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Driving the engine from landmarks
//!
//! ```no_run
//! use rep_coach::engine::{FrameInput, RepEngine};
//! use rep_coach::profile::ExerciseProfile;
//! use rep_coach::trace::Trace;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let profile = ExerciseProfile::weighted_squat();
//! let plan = profile.plan.clone();
//! let mut engine = RepEngine::new(profile)?;
//!
//! let trace = Trace::from_file("session.yaml")?;
//! for frame in &trace.frames {
//!     let input = FrameInput::from_detection(frame.as_ref(), &plan);
//!     let out = engine.process(&input);
//!     if let Some(cue) = &out.cue {
//!         println!("play {}", cue.audio_key());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Body landmark model
pub mod landmarks;

/// Geometric primitives over landmark coordinates
pub mod geometry;

/// Stage classification from angle bands
pub mod stage;

/// Exercise profiles: bands, angle plans, posture rules, feedback slots
pub mod profile;

/// Feedback debounce table
pub mod feedback;

/// The repetition state engine
pub mod engine;

/// Recorded landmark traces for offline replay
pub mod trace;

pub use error::{Error, Result};
