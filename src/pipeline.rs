use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::{info, warn};

use crate::{
    assemble::render_step,
    camera::Projector,
    config::RenderConfig,
    encode::{
        ffmpeg::{FfmpegSink, FfmpegSinkOpts},
        gif::GifCollector,
        sink::{FrameSink, SinkConfig},
    },
    episode::EpisodeRecord,
    export,
    foundation::error::{NavcamError, NavcamResult},
    raster::FrameRgb,
};

/// Progress report delivered once per rendered frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderProgress {
    /// 0-based frame just completed.
    pub frame_index: usize,
    /// Total frames in the episode.
    pub frames_total: usize,
}

/// Render every step of `record` into `sink`, in strictly increasing step
/// order, reporting progress after each frame.
pub fn render_episode(
    record: &EpisodeRecord,
    cfg: &RenderConfig,
    sink: &mut dyn FrameSink,
    mut progress: impl FnMut(RenderProgress),
) -> NavcamResult<()> {
    cfg.validate()?;
    let frames_total = record.len_steps();
    if frames_total == 0 {
        return Err(NavcamError::episode(
            "episode record has no robot trajectory",
        ));
    }

    for id in record.orphan_trajectory_ids() {
        warn!(id, "obstacle trajectory references no known obstacle; skipping");
    }

    let proj = Projector::new(cfg);
    sink.begin(SinkConfig {
        width: cfg.image_width,
        height: cfg.image_height,
        fps: cfg.fps,
    })?;
    for step in 0..frames_total {
        let frame = render_step(record, step, cfg, &proj);
        sink.push_frame(step, &frame)?;
        progress(RenderProgress {
            frame_index: step,
            frames_total,
        });
    }
    sink.end()
}

/// Artifacts produced by [`render_episode_outputs`] besides the MP4.
#[derive(Clone, Debug, Default)]
pub struct OutputOpts {
    /// Save every Nth frame as a PNG next to the video.
    pub stills_every: Option<usize>,
    /// Animated GIF path (reduced rate).
    pub gif: Option<PathBuf>,
}

/// Sink wrapper that feeds the MP4 encoder and fans frames out to the
/// optional still/GIF exporters.
struct FanoutSink {
    inner: FfmpegSink,
    stills_every: Option<usize>,
    stills_dir: PathBuf,
    gif: Option<GifCollector>,
}

impl FrameSink for FanoutSink {
    fn begin(&mut self, cfg: SinkConfig) -> NavcamResult<()> {
        self.inner.begin(cfg)
    }

    fn push_frame(&mut self, step: usize, frame: &FrameRgb) -> NavcamResult<()> {
        self.inner.push_frame(step, frame)?;
        if let Some(every) = self.stills_every
            && every > 0
            && step % every == 0
        {
            save_png(&self.stills_dir.join(format!("frame_{step}.png")), frame)?;
        }
        if let Some(gif) = self.gif.as_mut() {
            gif.offer(step, frame);
        }
        Ok(())
    }

    fn end(&mut self) -> NavcamResult<()> {
        self.inner.end()
    }
}

/// Render `record` to an MP4 at `video_path`, plus the optional artifacts in
/// `opts`. Progress is logged per tenth of the episode.
pub fn render_episode_to_mp4(
    record: &EpisodeRecord,
    cfg: &RenderConfig,
    video_path: &Path,
    opts: OutputOpts,
) -> NavcamResult<()> {
    let stills_dir = video_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let gif_path = opts.gif.clone();

    let mut sink = FanoutSink {
        inner: FfmpegSink::new(FfmpegSinkOpts::new(video_path)),
        stills_every: opts.stills_every,
        stills_dir,
        gif: gif_path.as_ref().map(|_| GifCollector::new(cfg.fps)),
    };

    let total = record.len_steps();
    let tick = (total / 10).max(1);
    render_episode(record, cfg, &mut sink, |p| {
        if (p.frame_index + 1) % tick == 0 || p.frame_index + 1 == p.frames_total {
            info!(
                frame = p.frame_index + 1,
                total = p.frames_total,
                "rendered"
            );
        }
    })?;

    if let (Some(gif), Some(path)) = (sink.gif.take(), gif_path) {
        gif.finish(&path)?;
    }
    Ok(())
}

/// Save one frame as a PNG.
pub fn save_png(path: &Path, frame: &FrameRgb) -> NavcamResult<()> {
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("save frame '{}'", path.display()))?;
    Ok(())
}

/// Write the sidecar artifacts (task metadata, step info, scene map) next to
/// the video, named after its file stem.
pub fn write_sidecars(record: &EpisodeRecord, video_path: &Path) -> NavcamResult<()> {
    let dir = video_path.parent().unwrap_or_else(|| Path::new("."));
    let stem = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("episode");
    export::write_task_metadata(record, &dir.join(format!("{stem}.json")))?;
    export::write_step_info(record, &dir.join(format!("{stem}_info.json")))?;
    export::write_scene_map(record, &dir.join("scene_map.png"), 1000)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::sink::InMemorySink;
    use crate::episode::Pose2D;

    fn straight_line_record(steps: usize) -> EpisodeRecord {
        EpisodeRecord {
            robot_trajectory: (0..steps)
                .map(|i| Pose2D {
                    x: i as f64 * 0.5,
                    y: 0.0,
                    theta: 0.0,
                })
                .collect(),
            ..EpisodeRecord::default()
        }
    }

    #[test]
    fn renders_one_frame_per_step_in_order() {
        let record = straight_line_record(4);
        let cfg = RenderConfig::default();
        let mut sink = InMemorySink::new();
        let mut seen = Vec::new();
        render_episode(&record, &cfg, &mut sink, |p| seen.push(p.frame_index)).unwrap();

        assert_eq!(sink.frames().len(), 4);
        assert!(sink.frames().windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_trajectory_is_an_episode_error() {
        let record = EpisodeRecord::default();
        let cfg = RenderConfig::default();
        let mut sink = InMemorySink::new();
        let err = render_episode(&record, &cfg, &mut sink, |_| {}).unwrap_err();
        assert!(err.to_string().starts_with("episode error"));
        // The sink was never started.
        assert!(sink.config().is_none());
    }

    #[test]
    fn invalid_config_is_rejected_before_any_frame() {
        let record = straight_line_record(2);
        let cfg = RenderConfig {
            fps: 0,
            ..RenderConfig::default()
        };
        let mut sink = InMemorySink::new();
        assert!(render_episode(&record, &cfg, &mut sink, |_| {}).is_err());
        assert!(sink.frames().is_empty());
    }

    #[test]
    fn progress_counts_the_whole_episode() {
        let record = straight_line_record(3);
        let cfg = RenderConfig::default();
        let mut sink = InMemorySink::new();
        let mut last = None;
        render_episode(&record, &cfg, &mut sink, |p| last = Some(p)).unwrap();
        assert_eq!(
            last,
            Some(RenderProgress {
                frame_index: 2,
                frames_total: 3
            })
        );
    }
}
