use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use tracing::{info, warn};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{NavcamError, NavcamResult};
use crate::raster::FrameRgb;

/// H.264 encoders tried in order before falling back to the baseline.
const CODEC_PREFERENCE: [&str; 3] = ["libx264", "libopenh264", "mpeg4"];

/// Always-available fallback codec.
const BASELINE_CODEC: &str = "mpeg4";

/// An MP4 below this size almost certainly failed to encode.
const MIN_ARTIFACT_BYTES: u64 = 1024;

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw RGB24 frames to its
/// stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    last_step: Option<usize>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_step: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> NavcamResult<()> {
        if cfg.fps == 0 {
            return Err(NavcamError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(NavcamError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(NavcamError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(NavcamError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(NavcamError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let codec = select_codec();
        info!(codec, out = %self.opts.out_path.display(), "starting mp4 encode");

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if self.opts.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            codec,
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]);
        cmd.arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            NavcamError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| NavcamError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| NavcamError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_step = None;
        Ok(())
    }

    fn push_frame(&mut self, step: usize, frame: &FrameRgb) -> NavcamResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| NavcamError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_step
            && step <= last
        {
            return Err(NavcamError::encode(
                "ffmpeg sink received out-of-order frame step",
            ));
        }
        self.last_step = Some(step);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(NavcamError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != (cfg.width * cfg.height * 3) as usize {
            return Err(NavcamError::validation(
                "frame.data size mismatch with width*height*3",
            ));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(NavcamError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            NavcamError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> NavcamResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| NavcamError::encode("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| NavcamError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| NavcamError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| NavcamError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(NavcamError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        verify_artifact(&self.opts.out_path);
        self.cfg = None;
        Ok(())
    }
}

/// Pick the first preferred codec the local ffmpeg advertises; fall back to
/// the baseline with a diagnostic when probing fails or nothing matches.
fn select_codec() -> &'static str {
    let probe = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stderr(Stdio::null())
        .output();
    match probe {
        Ok(out) => {
            let listing = String::from_utf8_lossy(&out.stdout);
            for codec in CODEC_PREFERENCE {
                if listing.contains(codec) {
                    return codec;
                }
            }
            warn!(
                fallback = BASELINE_CODEC,
                "no preferred h264 encoder available"
            );
            BASELINE_CODEC
        }
        Err(e) => {
            warn!(fallback = BASELINE_CODEC, error = %e, "ffmpeg encoder probe failed");
            BASELINE_CODEC
        }
    }
}

/// Post-encode sanity check: the artifact must exist and be big enough to
/// plausibly hold video data.
fn verify_artifact(path: &Path) {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() >= MIN_ARTIFACT_BYTES => {
            info!(out = %path.display(), bytes = meta.len(), "mp4 encode complete");
        }
        Ok(meta) => {
            warn!(
                out = %path.display(),
                bytes = meta.len(),
                "encoded mp4 is suspiciously small; encoding may have failed"
            );
        }
        Err(e) => {
            warn!(out = %path.display(), error = %e, "encoded mp4 missing after ffmpeg exit");
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> NavcamResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
