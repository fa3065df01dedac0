use std::fs::File;
use std::path::Path;

use anyhow::Context as _;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use tracing::info;

use crate::foundation::error::{NavcamError, NavcamResult};
use crate::raster::FrameRgb;

/// Keep every `GIF_FRAME_STRIDE`-th frame of the episode.
pub const GIF_FRAME_STRIDE: usize = 2;

/// Collects a reduced-rate subset of rendered frames and writes an animated
/// GIF on [`finish`](GifCollector::finish). The GIF plays at half the video
/// rate, matching the halved frame count.
pub struct GifCollector {
    fps: u32,
    frames: Vec<FrameRgb>,
}

impl GifCollector {
    pub fn new(fps: u32) -> Self {
        Self {
            fps,
            frames: Vec::new(),
        }
    }

    /// Offer one rendered frame; only every second step is retained.
    pub fn offer(&mut self, step: usize, frame: &FrameRgb) {
        if step % GIF_FRAME_STRIDE == 0 {
            self.frames.push(frame.clone());
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Encode the collected frames to `path`.
    pub fn finish(self, path: &Path) -> NavcamResult<()> {
        if self.frames.is_empty() {
            return Err(NavcamError::encode("no frames collected for gif export"));
        }
        if self.fps == 0 {
            return Err(NavcamError::validation("gif fps must be non-zero"));
        }

        let file =
            File::create(path).with_context(|| format!("create gif '{}'", path.display()))?;
        let mut encoder = GifEncoder::new_with_speed(file, 10);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| NavcamError::encode(format!("gif repeat setup: {e}")))?;

        // Half the video rate: stride * 1000 / fps milliseconds per frame.
        let delay = Delay::from_numer_denom_ms((GIF_FRAME_STRIDE * 1000) as u32, self.fps);

        let count = self.frames.len();
        for frame in self.frames {
            let rgba = rgb_to_rgba(&frame)?;
            encoder
                .encode_frame(Frame::from_parts(rgba, 0, 0, delay))
                .map_err(|e| NavcamError::encode(format!("gif frame encode: {e}")))?;
        }
        info!(out = %path.display(), frames = count, "gif export complete");
        Ok(())
    }
}

fn rgb_to_rgba(frame: &FrameRgb) -> NavcamResult<RgbaImage> {
    let mut data = Vec::with_capacity(frame.data.len() / 3 * 4);
    for px in frame.data.chunks_exact(3) {
        data.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    RgbaImage::from_raw(frame.width, frame.height, data)
        .ok_or_else(|| NavcamError::encode("gif frame buffer size mismatch"))
}
