use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::warn;

use navcam::{
    EpisodeRecord, NavcamError, OutputOpts, RenderConfig,
    camera::Projector,
    pipeline::{self, write_sidecars},
};

#[derive(Parser, Debug)]
#[command(name = "navcam", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single episode step as a PNG.
    Frame(FrameArgs),
    /// Render the full episode as an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input episode record JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Step index (0-based).
    #[arg(long)]
    step: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Optional render config JSON overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input episode record JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Optional render config JSON overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write an animated GIF at half rate, next to the video.
    #[arg(long)]
    gif: bool,

    /// Save every Nth frame as a PNG next to the video.
    #[arg(long)]
    stills_every: Option<usize>,

    /// Also write task metadata, step info and the top-view scene map.
    #[arg(long)]
    sidecars: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn read_config(path: Option<&PathBuf>) -> anyhow::Result<RenderConfig> {
    let Some(path) = path else {
        return Ok(RenderConfig::default());
    };
    let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    let cfg: RenderConfig =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse render config JSON")?;
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let record = EpisodeRecord::from_json_file(&args.in_path)?;
    let cfg = read_config(args.config.as_ref())?;

    if args.step >= record.len_steps() {
        return Err(NavcamError::episode(format!(
            "step {} out of range (episode has {} steps)",
            args.step,
            record.len_steps()
        ))
        .into());
    }

    let proj = Projector::new(&cfg);
    let frame = navcam::assemble::render_step(&record, args.step, &cfg, &proj);
    pipeline::save_png(&args.out, &frame)?;
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let record = EpisodeRecord::from_json_file(&args.in_path)?;
    let cfg = read_config(args.config.as_ref())?;

    let opts = OutputOpts {
        stills_every: args.stills_every,
        gif: args.gif.then(|| args.out.with_extension("gif")),
    };

    if let Err(err) = navcam::render_episode_to_mp4(&record, &cfg, &args.out, opts) {
        // A trajectory-less episode is a bad input, not a renderer fault;
        // report it and exit cleanly so batch callers can continue.
        if matches!(err, NavcamError::Episode(_)) {
            warn!(%err, episode = %args.in_path.display(), "skipping episode");
            return Ok(());
        }
        return Err(err.into());
    }

    if args.sidecars {
        write_sidecars(&record, &args.out)?;
    }
    Ok(())
}
