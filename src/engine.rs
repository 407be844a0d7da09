//! Repetition state engine.
//!
//! The per-exercise state machine that consumes one measurement frame at a
//! time and emits the discrete exercise stage, correct/incorrect repetition
//! counts, the active corrective-feedback slots, and at most one symbolic
//! cue. One engine instance serves one session; it is a plain owned value
//! mutated exactly once per frame, so confining it to a single thread (or
//! serializing calls externally) gives sequential consistency for free.
//!
//! Every input is a valid domain value. Loss of detection and a misaligned
//! view are operating modes, not errors, each with its own branch:
//!
//! - **not detected**: the session is paused; the side-inactivity timer
//!   runs and eventually resets the counters.
//! - **detected, misaligned**: the body faces the camera, joint geometry
//!   is unreliable; the front-inactivity timer runs, staging is suspended.
//! - **detected, aligned**: the main path, covering staging, repetition
//!   resolution, posture rules, and feedback debounce.

use crate::error::Result;
use crate::feedback::FeedbackTable;
use crate::geometry::view_offset_angle;
use crate::landmarks::LandmarkFrame;
use crate::profile::{AnglePlan, ExerciseProfile, PostureEval};
use crate::stage::{classify, Stage};
use log::debug;
use std::collections::BTreeMap;
use std::time::Instant;

/// One frame of input to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    /// No body visible this frame
    NotDetected,
    /// A body was detected and measured
    Detected {
        /// View-offset angle in degrees, >= 0
        offset_angle: f32,
        /// The staging angle
        primary_angle: f32,
        /// Named auxiliary angles consumed by posture rules
        auxiliary: BTreeMap<String, f32>,
    },
}

impl FrameInput {
    /// Derive a frame's measurements from detected landmarks using the
    /// profile's angle plan: pick the tracked side, compute the view
    /// offset, the primary angle, and every auxiliary angle.
    #[must_use]
    pub fn from_landmarks(frame: &LandmarkFrame, plan: &AnglePlan) -> Self {
        let side = plan.tracked_side(frame);
        let auxiliary = plan
            .auxiliary
            .iter()
            .map(|(name, spec)| (name.clone(), spec.measure(frame, side)))
            .collect();
        FrameInput::Detected {
            offset_angle: view_offset_angle(frame),
            primary_angle: plan.primary.measure(frame, side),
            auxiliary,
        }
    }

    /// Convenience for the common "maybe detected" shape of a pose
    /// service's per-frame result
    #[must_use]
    pub fn from_detection(frame: Option<&LandmarkFrame>, plan: &AnglePlan) -> Self {
        match frame {
            Some(frame) => Self::from_landmarks(frame, plan),
            None => FrameInput::NotDetected,
        }
    }
}

/// Symbolic cue for the caller to map to an audio/visual effect.
/// The engine never performs playback itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    /// A correct repetition was counted; carries the new count
    Rep(u32),
    /// An incorrect repetition was counted
    Incorrect,
    /// Inactivity reset both counters
    ResetCounters,
    /// A posture rule fired; carries the rule's cue id
    Posture(String),
}

impl Cue {
    /// The audio clip key the caller resolves to a sound file
    #[must_use]
    pub fn audio_key(&self) -> String {
        match self {
            Cue::Rep(count) => count.to_string(),
            Cue::Incorrect => "incorrect".to_string(),
            Cue::ResetCounters => "reset_counters".to_string(),
            Cue::Posture(id) => id.clone(),
        }
    }
}

/// Engine output for one processed frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    /// Classified stage, or `None` when no body is staged this frame
    pub stage: Option<Stage>,
    pub correct: u32,
    pub incorrect: u32,
    /// Indices of feedback slots to display
    pub feedback: Vec<usize>,
    /// At most one cue per frame
    pub cue: Option<Cue>,
}

/// Elapsed-seconds accumulator with a paired anchor timestamp.
///
/// Time only advances through the timestamps handed to the engine, so
/// tests drive inactivity with simulated instants.
#[derive(Debug, Clone)]
struct InactivityTimer {
    elapsed: f32,
    anchor: Instant,
}

impl InactivityTimer {
    fn new(now: Instant) -> Self {
        Self {
            elapsed: 0.0,
            anchor: now,
        }
    }

    /// Add the time since the anchor and move the anchor forward
    fn accumulate(&mut self, now: Instant) {
        self.elapsed += now.saturating_duration_since(self.anchor).as_secs_f32();
        self.anchor = now;
    }

    fn reset(&mut self, now: Instant) {
        self.elapsed = 0.0;
        self.anchor = now;
    }

    fn expired(&self, threshold_secs: f32) -> bool {
        self.elapsed >= threshold_secs
    }
}

/// Mutable session state, owned exclusively by its engine
#[derive(Debug, Clone)]
struct EngineState {
    /// Stage tokens since the last resolved repetition (at most s2, s3, s2)
    stage_sequence: Vec<Stage>,
    current_stage: Option<Stage>,
    previous_stage: Option<Stage>,
    /// Which posture rules fired during the current cycle
    fired_rules: Vec<bool>,
    correct: u32,
    incorrect: u32,
    feedback: FeedbackTable,
    side_timer: InactivityTimer,
    front_timer: InactivityTimer,
}

/// The repetition state machine for one exercise session
pub struct RepEngine {
    profile: ExerciseProfile,
    state: EngineState,
}

impl RepEngine {
    /// Create an engine for a validated profile, anchoring its timers now
    pub fn new(profile: ExerciseProfile) -> Result<Self> {
        Self::new_at(profile, Instant::now())
    }

    /// Create an engine with an explicit initial timer anchor
    pub fn new_at(profile: ExerciseProfile, now: Instant) -> Result<Self> {
        profile.validate()?;
        let state = EngineState {
            stage_sequence: Vec::with_capacity(crate::constants::MAX_STAGE_SEQUENCE),
            current_stage: None,
            previous_stage: None,
            fired_rules: vec![false; profile.posture_rules.len()],
            correct: 0,
            incorrect: 0,
            feedback: FeedbackTable::new(profile.feedback_slots.len()),
            side_timer: InactivityTimer::new(now),
            front_timer: InactivityTimer::new(now),
        };
        Ok(Self { profile, state })
    }

    /// The bound profile
    #[must_use]
    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    /// (correct, incorrect) repetition counts
    #[must_use]
    pub fn counts(&self) -> (u32, u32) {
        (self.state.correct, self.state.incorrect)
    }

    /// Stage classified on the last processed frame
    #[must_use]
    pub fn current_stage(&self) -> Option<Stage> {
        self.state.current_stage
    }

    /// Stage tokens accumulated in the current cycle
    #[must_use]
    pub fn stage_sequence(&self) -> &[Stage] {
        &self.state.stage_sequence
    }

    /// Which posture rules have fired during the current cycle, by rule
    /// index. Useful for analytics: reports *which* fault voided a rep.
    #[must_use]
    pub fn fired_rules(&self) -> &[bool] {
        &self.state.fired_rules
    }

    /// Process one frame, sampling the clock internally
    pub fn process(&mut self, input: &FrameInput) -> FrameOutput {
        self.process_at(input, Instant::now())
    }

    /// Process one frame at an explicit monotonic timestamp.
    ///
    /// Must be called with non-decreasing timestamps; the engine never
    /// blocks or suspends.
    pub fn process_at(&mut self, input: &FrameInput, now: Instant) -> FrameOutput {
        match input {
            FrameInput::NotDetected => self.frame_not_detected(now),
            FrameInput::Detected { offset_angle, .. }
                if *offset_angle > self.profile.offset_threshold =>
            {
                self.frame_misaligned(now)
            }
            FrameInput::Detected {
                primary_angle,
                auxiliary,
                ..
            } => self.frame_aligned(*primary_angle, auxiliary, now),
        }
    }

    /// No body visible: treat as "session paused". The side timer keeps
    /// running and eventually resets the counters; staging state and
    /// feedback clear, but the stage sequence survives a detection gap.
    fn frame_not_detected(&mut self, now: Instant) -> FrameOutput {
        let mut cue = None;

        self.state.side_timer.accumulate(now);
        if self
            .state
            .side_timer
            .expired(self.profile.inactive_threshold_secs)
        {
            self.reset_counts();
            cue = Some(Cue::ResetCounters);
            self.state.side_timer.reset(now);
        }

        self.state.current_stage = None;
        self.state.previous_stage = None;
        self.state.fired_rules.fill(false);
        self.state.feedback.clear();
        self.state.front_timer.reset(now);

        FrameOutput {
            stage: None,
            correct: self.state.correct,
            incorrect: self.state.incorrect,
            feedback: Vec::new(),
            cue,
        }
    }

    /// Body detected but facing the camera: joint geometry is unreliable,
    /// so staging is suspended and the front timer runs. Counter resets
    /// here are silent; the renderer is already showing "turn sideways".
    fn frame_misaligned(&mut self, now: Instant) -> FrameOutput {
        self.state.front_timer.accumulate(now);
        if self
            .state
            .front_timer
            .expired(self.profile.inactive_threshold_secs)
        {
            self.reset_counts();
            self.state.front_timer.reset(now);
        }

        self.state.side_timer.reset(now);
        self.state.stage_sequence.clear();
        self.state.current_stage = None;
        self.state.previous_stage = None;

        FrameOutput {
            stage: None,
            correct: self.state.correct,
            incorrect: self.state.incorrect,
            feedback: Vec::new(),
            cue: None,
        }
    }

    /// The main path. Stages the frame and advances the repetition cycle.
    fn frame_aligned(
        &mut self,
        primary_angle: f32,
        auxiliary: &BTreeMap<String, f32>,
        now: Instant,
    ) -> FrameOutput {
        self.state.front_timer.reset(now);

        let stage = classify(primary_angle, &self.profile.bands);
        self.state.current_stage = stage;
        self.update_sequence(stage);

        let mut cue = if stage == Some(Stage::One) {
            self.resolve_repetition()
        } else {
            None
        };

        let run_rules = stage != Some(Stage::One)
            || self.profile.posture_eval == PostureEval::EveryAlignedFrame;
        if run_rules {
            let posture_cue = self.evaluate_posture_rules(auxiliary);
            // Resolution cues take precedence on the rare frames where a
            // profile evaluates rules while resolving.
            if cue.is_none() {
                cue = posture_cue.map(Cue::Posture);
            }
        }

        if self.state.current_stage == self.state.previous_stage {
            self.state.side_timer.accumulate(now);
            if self
                .state
                .side_timer
                .expired(self.profile.inactive_threshold_secs)
            {
                self.reset_counts();
                cue = Some(Cue::ResetCounters);
                self.state.side_timer.reset(now);
            }
        } else {
            self.state.side_timer.reset(now);
        }

        self.state.feedback.advance();
        let feedback = self.state.feedback.active_slots();
        self.state
            .feedback
            .expire(self.profile.display_frame_threshold);

        self.state.previous_stage = self.state.current_stage;

        FrameOutput {
            stage,
            correct: self.state.correct,
            incorrect: self.state.incorrect,
            feedback,
            cue,
        }
    }

    /// Record the frame's stage in the cycle sequence.
    ///
    /// The sequence admits exactly one s2 before full range, one s3, and
    /// one more s2 after returning through full range; a complete cycle is
    /// the three-token pattern [s2, s3, s2]. s1 is never recorded; it
    /// triggers resolution instead.
    fn update_sequence(&mut self, stage: Option<Stage>) {
        let seq = &mut self.state.stage_sequence;
        match stage {
            Some(Stage::Two) => {
                let has_three = seq.contains(&Stage::Three);
                let twos = seq.iter().filter(|s| **s == Stage::Two).count();
                if (!has_three && twos == 0) || (has_three && twos == 1) {
                    seq.push(Stage::Two);
                }
            }
            Some(Stage::Three) => {
                if !seq.contains(&Stage::Three) && seq.contains(&Stage::Two) {
                    seq.push(Stage::Three);
                }
            }
            _ => {}
        }
    }

    /// Score the cycle on return to stage 1.
    ///
    /// Priority: a full three-token sequence without a fault counts
    /// correct; a single-token sequence (motion reversed before full
    /// range) counts incorrect; otherwise a recorded fault with more than
    /// one token counts incorrect. The sequence and the per-cycle fault
    /// flags always clear, even when nothing is counted.
    fn resolve_repetition(&mut self) -> Option<Cue> {
        let seq_len = self.state.stage_sequence.len();
        let fault = self
            .state
            .fired_rules
            .iter()
            .zip(&self.profile.posture_rules)
            .any(|(fired, rule)| *fired && rule.sets_fault);

        let cue = if seq_len == 3 && !fault {
            self.state.correct += 1;
            debug!(
                "correct repetition #{} ({})",
                self.state.correct, self.profile.name
            );
            Some(Cue::Rep(self.state.correct))
        } else if seq_len == 1 {
            self.state.incorrect += 1;
            debug!(
                "incomplete repetition, incorrect #{} ({})",
                self.state.incorrect, self.profile.name
            );
            Some(Cue::Incorrect)
        } else if fault && seq_len > 1 {
            self.state.incorrect += 1;
            debug!(
                "posture fault voided repetition, incorrect #{} ({})",
                self.state.incorrect, self.profile.name
            );
            Some(Cue::Incorrect)
        } else {
            None
        };

        self.state.stage_sequence.clear();
        self.state.fired_rules.fill(false);
        cue
    }

    /// Run every posture rule against the frame's auxiliary measurements.
    /// All true rules set their feedback slot and (if fault-setting) their
    /// cycle flag; the first true rule carrying a cue id wins the frame's
    /// posture cue.
    fn evaluate_posture_rules(&mut self, auxiliary: &BTreeMap<String, f32>) -> Option<String> {
        let mid_descent = self
            .state
            .stage_sequence
            .iter()
            .filter(|s| **s == Stage::Two)
            .count()
            == 1;

        let mut posture_cue: Option<String> = None;
        for (idx, rule) in self.profile.posture_rules.iter().enumerate() {
            if rule.only_mid_descent && !mid_descent {
                continue;
            }
            // A measurement absent from a hand-built input simply cannot
            // fire its rule; extraction always supplies the full plan.
            let Some(value) = auxiliary.get(&rule.measure) else {
                continue;
            };
            if rule.condition.holds(*value) {
                self.state.feedback.flag(rule.slot);
                self.state.fired_rules[idx] = true;
                if posture_cue.is_none() {
                    posture_cue.clone_from(&rule.cue);
                }
            }
        }
        posture_cue
    }

    fn reset_counts(&mut self) {
        debug!(
            "inactivity reset: correct {} incorrect {} -> 0 ({})",
            self.state.correct, self.state.incorrect, self.profile.name
        );
        self.state.correct = 0;
        self.state.incorrect = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ExerciseProfile;
    use std::time::Duration;

    fn curl_input(primary: f32, hip_vertical: f32) -> FrameInput {
        let mut auxiliary = BTreeMap::new();
        auxiliary.insert("hip_vertical".to_string(), hip_vertical);
        FrameInput::Detected {
            offset_angle: 0.0,
            primary_angle: primary,
            auxiliary,
        }
    }

    fn engine() -> (RepEngine, Instant) {
        let now = Instant::now();
        let engine = RepEngine::new_at(ExerciseProfile::barbell_curl(), now).expect("engine");
        (engine, now)
    }

    #[test]
    fn test_sequence_admits_one_descend_before_full_range() {
        let (mut engine, now) = engine();
        // s1 angle 120, s2 angle 90 for the curl bands.
        engine.process_at(&curl_input(120.0, 0.0), now);
        engine.process_at(&curl_input(90.0, 0.0), now);
        engine.process_at(&curl_input(90.0, 0.0), now);
        assert_eq!(engine.stage_sequence(), &[Stage::Two]);
    }

    #[test]
    fn test_sequence_full_cycle_pattern() {
        let (mut engine, now) = engine();
        for angle in [120.0, 90.0, 30.0, 30.0, 90.0] {
            engine.process_at(&curl_input(angle, 0.0), now);
        }
        assert_eq!(engine.stage_sequence(), &[Stage::Two, Stage::Three, Stage::Two]);
    }

    #[test]
    fn test_three_is_not_recorded_without_two() {
        let (mut engine, now) = engine();
        engine.process_at(&curl_input(30.0, 0.0), now);
        assert!(engine.stage_sequence().is_empty());
    }

    #[test]
    fn test_correct_rep_counts_and_cues() {
        let (mut engine, now) = engine();
        engine.process_at(&curl_input(120.0, 0.0), now);
        engine.process_at(&curl_input(90.0, 0.0), now);
        engine.process_at(&curl_input(30.0, 0.0), now);
        engine.process_at(&curl_input(90.0, 0.0), now);
        let out = engine.process_at(&curl_input(120.0, 0.0), now);
        assert_eq!(out.correct, 1);
        assert_eq!(out.incorrect, 0);
        assert_eq!(out.cue, Some(Cue::Rep(1)));
        assert_eq!(out.cue.unwrap().audio_key(), "1");
        assert!(engine.stage_sequence().is_empty());
    }

    #[test]
    fn test_reversed_rep_is_incorrect() {
        let (mut engine, now) = engine();
        engine.process_at(&curl_input(120.0, 0.0), now);
        engine.process_at(&curl_input(90.0, 0.0), now);
        let out = engine.process_at(&curl_input(120.0, 0.0), now);
        assert_eq!(out.incorrect, 1);
        assert_eq!(out.cue, Some(Cue::Incorrect));
    }

    #[test]
    fn test_posture_fault_voids_full_cycle() {
        let (mut engine, now) = engine();
        engine.process_at(&curl_input(120.0, 0.0), now);
        engine.process_at(&curl_input(90.0, 0.0), now);
        // Leaning during the curl: hip-vertical beyond the 10 degree rule.
        engine.process_at(&curl_input(30.0, 20.0), now);
        engine.process_at(&curl_input(90.0, 0.0), now);
        let out = engine.process_at(&curl_input(120.0, 0.0), now);
        assert_eq!(out.correct, 0);
        assert_eq!(out.incorrect, 1);
        assert_eq!(out.cue, Some(Cue::Incorrect));
    }

    #[test]
    fn test_fired_rules_reports_the_specific_fault() {
        let (mut engine, now) = engine();
        engine.process_at(&curl_input(90.0, 20.0), now);
        assert_eq!(engine.fired_rules(), &[true]);
        // Resolution clears the per-cycle record.
        engine.process_at(&curl_input(120.0, 0.0), now);
        assert_eq!(engine.fired_rules(), &[false]);
    }

    #[test]
    fn test_misaligned_view_suspends_staging() {
        let (mut engine, now) = engine();
        engine.process_at(&curl_input(120.0, 0.0), now);
        engine.process_at(&curl_input(90.0, 0.0), now);
        let out = engine.process_at(
            &FrameInput::Detected {
                offset_angle: 85.0,
                primary_angle: 90.0,
                auxiliary: BTreeMap::new(),
            },
            now,
        );
        assert_eq!(out.stage, None);
        assert!(engine.stage_sequence().is_empty());
        assert_eq!(engine.current_stage(), None);
    }

    #[test]
    fn test_front_inactivity_resets_counts_silently() {
        let (mut engine, t0) = engine();
        // Bank one incorrect rep.
        engine.process_at(&curl_input(120.0, 0.0), t0);
        engine.process_at(&curl_input(90.0, 0.0), t0);
        engine.process_at(&curl_input(120.0, 0.0), t0);
        assert_eq!(engine.counts(), (0, 1));

        let facing = FrameInput::Detected {
            offset_angle: 85.0,
            primary_angle: 90.0,
            auxiliary: BTreeMap::new(),
        };
        engine.process_at(&facing, t0);
        let out = engine.process_at(&facing, t0 + Duration::from_secs(11));
        assert_eq!(out.correct, 0);
        assert_eq!(out.incorrect, 0);
        assert_eq!(out.cue, None);
    }

    #[test]
    fn test_not_detected_keeps_stage_sequence() {
        let (mut engine, now) = engine();
        engine.process_at(&curl_input(120.0, 0.0), now);
        engine.process_at(&curl_input(90.0, 0.0), now);
        engine.process_at(&FrameInput::NotDetected, now);
        // A detection gap pauses the session without forgetting progress.
        assert_eq!(engine.stage_sequence(), &[Stage::Two]);
        assert_eq!(engine.current_stage(), None);
    }
}
