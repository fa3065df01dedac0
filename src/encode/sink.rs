use crate::foundation::error::NavcamResult;
use crate::raster::FrameRgb;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: u32,
}

/// Sink contract for consuming rendered frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing step
/// order for the rendered episode.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> NavcamResult<()>;
    /// Push one frame in strictly increasing step order.
    fn push_frame(&mut self, step: usize, frame: &FrameRgb) -> NavcamResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> NavcamResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(usize, FrameRgb)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(usize, FrameRgb)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> NavcamResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, step: usize, frame: &FrameRgb) -> NavcamResult<()> {
        self.frames.push((step, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> NavcamResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_captures_frames_in_order() {
        let mut sink = InMemorySink::new();
        sink.begin(SinkConfig {
            width: 4,
            height: 4,
            fps: 10,
        })
        .unwrap();
        for i in 0..3 {
            sink.push_frame(i, &FrameRgb::new(4, 4)).unwrap();
        }
        sink.end().unwrap();

        assert_eq!(sink.frames().len(), 3);
        assert!(sink.frames().windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(sink.config().unwrap().fps, 10);
    }
}
