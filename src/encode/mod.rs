//! Frame sinks and artifact encoders.
//!
//! Sinks consume rendered frames in step order; the render loop never knows
//! which artifact it is feeding.

/// ffmpeg-based MP4 sink (requires `ffmpeg` on PATH).
pub mod ffmpeg;
/// Reduced-rate animated GIF export.
pub mod gif;
/// Frame sink trait and built-in sinks.
pub mod sink;
