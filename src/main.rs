//! Trace replay front end for the repetition feedback engine.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use rep_coach::engine::{FrameInput, RepEngine};
use rep_coach::profile::ExerciseProfile;
use rep_coach::trace::Trace;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Exercise profile: curl, row, squat, or a path to a profile YAML file
    #[arg(short, long, default_value = "curl")]
    profile: String,

    /// Landmark trace file to replay (YAML)
    #[arg(short, long)]
    trace: PathBuf,

    /// Override the trace's frame rate
    #[arg(long)]
    fps: Option<f64>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("rep-coach - trace replay");

    let profile = load_profile(&args.profile)
        .with_context(|| format!("failed to load profile '{}'", args.profile))?;
    info!("profile: {}", profile.name);

    let mut trace = Trace::from_file(&args.trace)
        .with_context(|| format!("failed to load trace {}", args.trace.display()))?;
    if let Some(fps) = args.fps {
        trace.fps = fps;
        trace.validate()?;
    }
    info!("replaying {} frames at {} fps", trace.len(), trace.fps);

    let plan = profile.plan.clone();
    let mut engine = RepEngine::new(profile)?;

    // Frame timestamps are synthesized from the trace's frame rate so a
    // replay behaves identically regardless of how fast it runs.
    let start = Instant::now();
    let interval = trace.frame_interval();

    for (index, frame) in trace.frames.iter().enumerate() {
        let input = FrameInput::from_detection(frame.as_ref(), &plan);
        let now = start + interval * index as u32;
        let out = engine.process_at(&input, now);

        debug!(
            "frame {index}: stage {} correct {} incorrect {} feedback {:?}",
            out.stage.map_or("-".to_string(), |s| s.to_string()),
            out.correct,
            out.incorrect,
            out.feedback,
        );
        if let Some(cue) = &out.cue {
            info!("frame {index}: cue '{}'", cue.audio_key());
        }
    }

    let (correct, incorrect) = engine.counts();
    info!("replay finished: {correct} correct, {incorrect} incorrect");

    Ok(())
}

/// Resolve a built-in profile name, falling back to a YAML file path
fn load_profile(name: &str) -> rep_coach::Result<ExerciseProfile> {
    ExerciseProfile::builtin(name).or_else(|_| ExerciseProfile::from_file(name))
}
