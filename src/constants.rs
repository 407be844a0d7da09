//! Constants used throughout the library

/// Default view-offset threshold in degrees; above this the body is facing
/// the camera and joint geometry is unreliable
pub const DEFAULT_OFFSET_THRESHOLD: f32 = 55.0;

/// Default inactivity threshold in seconds before counters reset
pub const DEFAULT_INACTIVE_THRESHOLD_SECS: f32 = 10.0;

/// Default number of consecutive frames a feedback message stays visible
pub const DEFAULT_DISPLAY_FRAME_THRESHOLD: u32 = 50;

/// A complete repetition records at most three stage tokens (s2, s3, s2)
pub const MAX_STAGE_SEQUENCE: usize = 3;

/// Default frames per second assumption for trace replay
pub const DEFAULT_FPS: f64 = 30.0;

/// Rays shorter than this are treated as degenerate in angle calculations
pub const DEGENERATE_RAY_EPSILON: f32 = 1e-4;
