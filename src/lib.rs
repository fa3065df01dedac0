//! navcam: synthetic first-person video from recorded 2D navigation episodes.
//!
//! The renderer turns a time-ordered robot pose trajectory plus obstacle
//! geometry into a first-person MP4 through a hand-built pinhole pipeline:
//! world-to-camera transform, near-plane clipping, painter's-algorithm depth
//! sorting and procedural shading, with a world-anchored ground grid and a
//! HUD overlay. There is no z-buffer, no anti-aliasing and no texturing;
//! frames are a pure function of the episode and the step index.

#![forbid(unsafe_code)]

pub mod assemble;
pub mod camera;
pub mod clip;
pub mod config;
pub mod depth;
pub mod encode;
pub mod episode;
pub mod export;
pub mod foundation;
pub mod pipeline;
pub mod raster;
pub mod scene;

pub use config::RenderConfig;
pub use episode::EpisodeRecord;
pub use foundation::error::{NavcamError, NavcamResult};
pub use pipeline::{OutputOpts, RenderProgress, render_episode, render_episode_to_mp4};
pub use raster::FrameRgb;
