//! Recorded landmark traces.
//!
//! A trace is the offline stand-in for the live camera + pose-estimation
//! front end: a frame rate and one optional [`LandmarkFrame`] per frame
//! (`null` frames are "no body detected"). Traces replay through the
//! engine with simulated timestamps derived from the frame rate.

use crate::constants::DEFAULT_FPS;
use crate::error::{Error, Result};
use crate::landmarks::LandmarkFrame;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// A recorded landmark stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    /// Frames per second the trace was recorded at
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// Per-frame detections; `None` means no body was visible
    pub frames: Vec<Option<LandmarkFrame>>,
}

fn default_fps() -> f64 {
    DEFAULT_FPS
}

impl Trace {
    /// Load and validate a trace from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let trace: Self = serde_yaml::from_str(&content)?;
        trace.validate()?;
        Ok(trace)
    }

    /// Validate the trace
    pub fn validate(&self) -> Result<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(Error::Trace(format!(
                "frame rate must be positive, got {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// Wall-clock interval between consecutive frames
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }

    /// Number of frames in the trace
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
