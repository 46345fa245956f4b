use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "meteorcap", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Play the animation in real time and record it (requires `ffmpeg` on PATH by default).
    Record(RecordArgs),
}

#[derive(clap::Args, Debug)]
struct SceneArgs {
    /// Canvas width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Seed for the meteor field.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// TTF/OTF font for the reveal text. Text is skipped without one.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Scene time in milliseconds; the text reveal starts at 0.
    #[arg(long, default_value_t = 0)]
    time_ms: u64,

    #[command(flatten)]
    scene: SceneArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EncoderKind {
    /// WebM/VP8 through the system `ffmpeg`.
    Ffmpeg,
    /// Uncompressed RGBA frames, no external tools. Saved with a `.rgba` extension.
    Raw,
}

#[derive(Parser, Debug)]
struct RecordArgs {
    /// Directory the recording is downloaded into.
    #[arg(long)]
    out_dir: PathBuf,

    /// How long to record, in milliseconds.
    #[arg(long, default_value_t = 3_000)]
    duration_ms: u64,

    /// Capture config JSON overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Encoder backend.
    #[arg(long, value_enum, default_value_t = EncoderKind::Ffmpeg)]
    encoder: EncoderKind,

    #[command(flatten)]
    scene: SceneArgs,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("meteorcap=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Record(args) => cmd_record(args),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let canvas = meteorcap::Canvas::new(args.scene.width, args.scene.height);
    let mut renderer = meteorcap::SceneRenderer::new(canvas)?;
    if let Some(font) = args.scene.font.as_ref() {
        renderer = renderer.with_font_file(font)?;
    }

    let mut scene = meteorcap::Scene::new(args.scene.seed);
    scene.reveal_mut().restart(Duration::ZERO);
    scene.advance(Duration::from_millis(args.time_ms));
    let frame = renderer.render(&scene)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_record(args: RecordArgs) -> anyhow::Result<()> {
    let mut capture = match args.config.as_ref() {
        Some(path) => meteorcap::CaptureConfig::from_json_path(path)
            .with_context(|| format!("load capture config '{}'", path.display()))?,
        None => meteorcap::CaptureConfig::default(),
    };
    if matches!(args.encoder, EncoderKind::Raw) {
        capture.file_name = raw_file_name(&capture.file_name);
        tracing::info!(file = %capture.file_name, "raw encoder writes uncompressed RGBA frames");
    }
    let dt = capture.fps.frame_duration();
    let frames = capture
        .fps
        .secs_to_frames_floor(Duration::from_millis(args.duration_ms).as_secs_f64());

    let backend: Box<dyn meteorcap::EncoderBackend> = match args.encoder {
        EncoderKind::Ffmpeg => Box::new(meteorcap::FfmpegEncoderBackend::new()),
        EncoderKind::Raw => Box::new(meteorcap::RawEncoderBackend::new()),
    };
    let opts = meteorcap::StudioOpts {
        canvas: meteorcap::Canvas::new(args.scene.width, args.scene.height),
        seed: args.scene.seed,
        font: args.scene.font.clone(),
        capture,
    };
    let mut studio = meteorcap::Studio::new(
        opts,
        backend,
        Box::new(meteorcap::FileSaver::new(&args.out_dir)),
    )?;

    studio.toggle_recording().context("start recording")?;
    let started = Instant::now();
    for i in 1..=frames {
        studio.tick(dt)?;
        // Hold the tick rate to the wall clock.
        let due = started + dt.mul_f64(i as f64);
        if let Some(wait) = due.checked_duration_since(Instant::now()) {
            std::thread::sleep(wait);
        }
    }
    studio.toggle_recording()?;

    let dropped = studio.surface().dropped_frames();
    if dropped > 0 {
        tracing::warn!(dropped, "encoder fell behind, frames were dropped");
    }

    match studio.download().context("download recording")? {
        Some(artifact) => {
            let path = args.out_dir.join(artifact.file_name());
            eprintln!("wrote {} ({} bytes)", path.display(), artifact.len());
        }
        None => eprintln!("nothing was recorded"),
    }
    Ok(())
}

/// Raw output is not WebM; give it a `.rgba` extension.
fn raw_file_name(name: &str) -> String {
    Path::new(name)
        .with_extension("rgba")
        .to_string_lossy()
        .into_owned()
}
