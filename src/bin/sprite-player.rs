use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use sprite_player::{
    CpuBackend, CpuBackendOpts, FixedIntervalTicker, FrameIndex, FramePresenter, FrameRGBA,
    PlayerOpts, RendererError, RendererPort, ResourceHandle, Rgba8Premul, SpritePlayer,
    SurfaceDesc,
};

#[derive(Parser, Debug)]
#[command(name = "sprite-player", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a resource and print its metadata.
    Inspect(InspectArgs),
    /// Play a resource in real time, optionally writing presented frames as PNGs.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input sprite document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Cpu,
    Gpu,
    GpuGl,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input sprite document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Playback length. Defaults to one pass through the animation.
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Tick interval.
    #[arg(long, default_value_t = 16)]
    interval_ms: u64,

    /// Present every frame even when behind schedule.
    #[arg(long, default_value_t = false)]
    no_skip_frame: bool,

    /// Write each presented frame here as PNG.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Renderer backend.
    #[arg(long, value_enum, default_value_t = BackendArg::Cpu)]
    backend: BackendArg,

    /// Surface size as WIDTHxHEIGHT. Defaults to the resource canvas.
    #[arg(long)]
    size: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let model = sprite_player::decode(&ResourceHandle::from_path(&args.in_path))
        .with_context(|| format!("decode '{}'", args.in_path.display()))?;
    let fps = model.fps();
    println!("canvas: {}x{}", model.canvas().width, model.canvas().height);
    println!("fps: {}/{} ({:.3})", fps.num, fps.den, fps.as_f64());
    println!("frames: {}", model.frame_count());
    println!("loop: {:?}", model.loop_mode());
    println!("assets: {}", model.assets().len());
    println!("duration_ms: {}", model.total_duration().as_millis());
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let handle = ResourceHandle::from_path(&args.in_path);
    let model = sprite_player::decode(&handle)
        .with_context(|| format!("decode '{}'", args.in_path.display()))?;

    let (width, height) = match args.size.as_deref() {
        Some(s) => parse_size(s)?,
        None => (model.canvas().width, model.canvas().height),
    };
    let surface = SurfaceDesc::new(width, height);

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
    }
    let presenter = args.out_dir.clone().map(PngDirPresenter::new);
    let backend = build_backend(args.backend, presenter)?;

    let opts = PlayerOpts {
        skip_frame: !args.no_skip_frame,
        ..PlayerOpts::default()
    };
    let mut player = SpritePlayer::new(backend, surface, opts)?;
    player.play(handle);

    let duration = args
        .duration_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| model.total_duration());
    let summary = FixedIntervalTicker::new(Duration::from_millis(args.interval_ms))
        .with_deadline(duration)
        .run(&mut player);
    player.destroy();

    eprintln!(
        "played {} ms on {}: {} ticks, {} frames presented, {} failed",
        duration.as_millis(),
        backend_label(args.backend),
        summary.ticks,
        summary.submitted,
        summary.failed
    );
    if let Some(dir) = &args.out_dir {
        eprintln!("wrote frames to {}", dir.display());
    }
    Ok(())
}

fn backend_label(b: BackendArg) -> &'static str {
    match b {
        BackendArg::Cpu => "cpu",
        BackendArg::Gpu => "gpu",
        BackendArg::GpuGl => "gpu-gl",
    }
}

fn build_backend(
    kind: BackendArg,
    presenter: Option<PngDirPresenter>,
) -> anyhow::Result<Box<dyn RendererPort>> {
    match kind {
        BackendArg::Cpu => {
            let b = CpuBackend::new(CpuBackendOpts::default());
            Ok(match presenter {
                Some(p) => Box::new(b.with_presenter(p)),
                None => Box::new(b),
            })
        }
        #[cfg(feature = "gpu")]
        BackendArg::Gpu | BackendArg::GpuGl => {
            let api = match kind {
                BackendArg::GpuGl => sprite_player::GpuApi::Legacy,
                _ => sprite_player::GpuApi::Modern,
            };
            let b = sprite_player::GpuBackend::new(sprite_player::GpuBackendOpts { api });
            Ok(match presenter {
                Some(p) => Box::new(b.with_presenter(p)),
                None => Box::new(b),
            })
        }
        #[cfg(not(feature = "gpu"))]
        BackendArg::Gpu | BackendArg::GpuGl => {
            anyhow::bail!("gpu backends require building with `--features gpu`")
        }
    }
}

fn parse_size(s: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .with_context(|| format!("size '{s}' must look like WIDTHxHEIGHT"))?;
    let w = w.trim().parse().with_context(|| format!("bad width in '{s}'"))?;
    let h = h.trim().parse().with_context(|| format!("bad height in '{s}'"))?;
    Ok((w, h))
}

/// Writes every presented frame to `<dir>/frame_<seq>_<index>.png`.
struct PngDirPresenter {
    dir: PathBuf,
    seq: u64,
}

impl PngDirPresenter {
    fn new(dir: PathBuf) -> Self {
        Self { dir, seq: 0 }
    }
}

impl FramePresenter for PngDirPresenter {
    fn present(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> Result<(), RendererError> {
        let path = self
            .dir
            .join(format!("frame_{:06}_{:04}.png", self.seq, idx.0));
        self.seq += 1;
        write_png(&path, frame).map_err(|e| RendererError::rejected(format!("{e:#}")))
    }
}

fn write_png(path: &Path, frame: &FrameRGBA) -> anyhow::Result<()> {
    let straight: Vec<u8> = if frame.premultiplied {
        frame
            .data
            .chunks_exact(4)
            .flat_map(|px| {
                Rgba8Premul {
                    r: px[0],
                    g: px[1],
                    b: px[2],
                    a: px[3],
                }
                .to_straight_rgba()
            })
            .collect()
    } else {
        frame.data.clone()
    };
    image::save_buffer_with_format(
        path,
        &straight,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
