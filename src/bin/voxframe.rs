use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use voxframe::{
    AverageImages, ExecutionOpts, Image, ImageDocument, InputRequestPolicy, PipelineRunner,
    ReferenceNormalize, SupportWindow, TemporalRegion, VolumeToFrameSequence,
};

#[derive(Parser, Debug)]
#[command(name = "voxframe", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). Overrides RUST_LOG.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a volume into one frame per position along an axis.
    Frames(FramesArgs),
    /// Divide an image by a 1-D reference profile indexed along axis 0.
    Normalize(NormalizeArgs),
    /// Pixelwise mean of same-extent images.
    Average(AverageArgs),
    /// Per-pixel spectral support windows from a side-line count image.
    Windows(WindowsArgs),
}

#[derive(Args, Debug)]
struct ExecArgs {
    /// Override worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Run every work unit on the calling thread.
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

impl ExecArgs {
    fn opts(&self) -> ExecutionOpts {
        ExecutionOpts {
            parallel: !self.sequential,
            threads: self.threads,
            ..ExecutionOpts::default()
        }
    }
}

#[derive(Parser, Debug)]
struct FramesArgs {
    /// Input volume document (JSON).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory receiving one document per frame.
    #[arg(long)]
    out_dir: PathBuf,

    /// Input axis mapped to time.
    #[arg(long, default_value_t = 0)]
    axis: usize,

    /// First requested frame (defaults to the first available).
    #[arg(long, requires = "duration")]
    start: Option<i64>,

    /// Number of requested frames.
    #[arg(long, requires = "start")]
    duration: Option<u64>,

    /// Request only the slices behind the requested frames from the input.
    #[arg(long, default_value_t = false)]
    streaming: bool,

    /// Also write 2-D frames as grayscale PNG.
    #[arg(long, default_value_t = false)]
    png: bool,

    #[command(flatten)]
    exec: ExecArgs,
}

#[derive(Parser, Debug)]
struct NormalizeArgs {
    /// Primary image document (JSON).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// 1-D reference profile document (JSON).
    #[arg(long)]
    reference: PathBuf,

    /// Output document path.
    #[arg(long)]
    out: PathBuf,

    /// Scanlines per work unit.
    #[arg(long, default_value_t = 16)]
    rows_per_batch: usize,

    #[command(flatten)]
    exec: ExecArgs,
}

#[derive(Parser, Debug)]
struct AverageArgs {
    /// Input documents (JSON), repeated.
    #[arg(long = "in", required = true)]
    in_paths: Vec<PathBuf>,

    /// Output document path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    exec: ExecArgs,
}

#[derive(Parser, Debug)]
struct WindowsArgs {
    /// Side-line count document (JSON).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output document path; each pixel holds its list of window start indices.
    #[arg(long)]
    out: PathBuf,

    /// Nominal window length along the FFT direction.
    #[arg(long, default_value_t = 32)]
    fft_size: usize,

    /// Compute a window for every n-th pixel along the FFT direction.
    #[arg(long, default_value_t = 1)]
    step: usize,

    /// Axis the windows run along.
    #[arg(long, default_value_t = 0)]
    fft_direction: usize,

    /// Axis the side lines are taken along.
    #[arg(long, default_value_t = 1)]
    side_line_direction: usize,

    #[command(flatten)]
    exec: ExecArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Frames(args) => cmd_frames(args),
        Command::Normalize(args) => cmd_normalize(args),
        Command::Average(args) => cmd_average(args),
        Command::Windows(args) => cmd_windows(args),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_image(path: &Path) -> anyhow::Result<Image<f32>> {
    let doc = ImageDocument::<f32>::from_path(path)
        .with_context(|| format!("read image document '{}'", path.display()))?;
    doc.into_image()
        .with_context(|| format!("invalid image document '{}'", path.display()))
}

fn write_image<P: Clone + serde::Serialize>(path: &Path, image: &Image<P>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    ImageDocument::from_image(image)?
        .to_path(path)
        .with_context(|| format!("write image document '{}'", path.display()))?;
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let mut volume = read_image(&args.in_path)?;
    let runner = PipelineRunner::new(&args.exec.opts())?;

    let policy = if args.streaming {
        InputRequestPolicy::AxisRangeUnion
    } else {
        InputRequestPolicy::LargestPossible
    };
    let mut stage = VolumeToFrameSequence::new()
        .with_input(&mut volume)
        .with_frame_axis(args.axis)
        .with_input_request_policy(policy);
    if let (Some(start), Some(duration)) = (args.start, args.duration) {
        stage.set_requested_temporal_region(TemporalRegion::new(start, duration));
    }
    runner.update(&mut stage)?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    let frames = stage.into_output().into_frames();
    for (index, frame) in &frames {
        let path = args.out_dir.join(format!("frame_{index:05}.json"));
        write_image(&path, frame)?;
        if args.png {
            write_png(&args.out_dir.join(format!("frame_{index:05}.png")), frame)?;
        }
    }

    eprintln!(
        "wrote {} frames to {}",
        frames.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn write_png(path: &Path, frame: &Image<f32>) -> anyhow::Result<()> {
    let region = frame
        .buffered_region()
        .context("frame has no buffered pixels")?;
    let &[width, height] = region.size() else {
        anyhow::bail!(
            "png export needs 2-D frames, got {} dimensions",
            region.dimension()
        );
    };

    let (lo, hi) = frame
        .data()
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let scale = if hi > lo { 255.0 / (hi - lo) } else { 0.0 };
    let gray: Vec<u8> = frame
        .data()
        .iter()
        .map(|&v| ((v - lo) * scale).round().clamp(0.0, 255.0) as u8)
        .collect();

    image::save_buffer_with_format(
        path,
        &gray,
        u32::try_from(width).context("frame too wide for png")?,
        u32::try_from(height).context("frame too tall for png")?,
        image::ColorType::L8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

fn cmd_normalize(args: NormalizeArgs) -> anyhow::Result<()> {
    let mut primary = read_image(&args.in_path)?;
    let mut reference = read_image(&args.reference)?;
    let opts = ExecutionOpts {
        rows_per_batch: args.rows_per_batch,
        ..args.exec.opts()
    };
    let runner = PipelineRunner::new(&opts)?;

    let mut stage = ReferenceNormalize::new()
        .with_input(&mut primary)
        .with_reference(&mut reference);
    runner.update(&mut stage)?;

    write_image(&args.out, stage.output())?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_average(args: AverageArgs) -> anyhow::Result<()> {
    let mut inputs = args
        .in_paths
        .iter()
        .map(|p| read_image(p))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let runner = PipelineRunner::new(&args.exec.opts())?;

    let mut stage = AverageImages::new();
    for input in &mut inputs {
        stage.add_input(input);
    }
    runner.update(&mut stage)?;

    write_image(&args.out, stage.output())?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_windows(args: WindowsArgs) -> anyhow::Result<()> {
    let mut counts = read_image(&args.in_path)?;
    let runner = PipelineRunner::new(&args.exec.opts())?;

    let mut stage = SupportWindow::new()
        .with_input(&mut counts)
        .with_fft_size(args.fft_size)
        .with_step(args.step)
        .with_fft_direction(args.fft_direction)
        .with_side_line_direction(args.side_line_direction);
    runner.update(&mut stage)?;

    write_image(&args.out, stage.output())?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
