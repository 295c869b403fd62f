use std::io::Read as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chartrender", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render in an isolated pipeline process and print the image locator.
    Render(RenderArgs),
    /// Compile in-process and write the SVG.
    Svg(SvgArgs),
    /// Run the in-process pipeline (no isolation) and write the PNG.
    Png(PngArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Chart spec JSON (`-` for stdin).
    #[arg(long)]
    spec: PathBuf,

    /// Output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Orchestrator config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the output root directory.
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Override the pipeline binary path.
    #[arg(long)]
    pipeline: Option<PathBuf>,

    /// Override the pipeline timeout.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Parser, Debug)]
struct SvgArgs {
    /// Chart spec JSON (`-` for stdin).
    #[arg(long)]
    spec: PathBuf,

    /// Output SVG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PngArgs {
    /// Chart spec JSON (`-` for stdin).
    #[arg(long)]
    spec: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Output width in pixels.
    #[arg(long, default_value_t = chartrender::DEFAULT_OUTPUT_WIDTH)]
    width: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Svg(args) => cmd_svg(args),
        Command::Png(args) => cmd_png(args),
    }
}

fn read_spec(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read chart spec from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("read chart spec '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut opts = match &args.config {
        Some(path) => chartrender::OrchestratorOpts::from_path(path)?,
        None => chartrender::OrchestratorOpts::default(),
    };
    if let Some(root) = args.output_root {
        opts.output_root = root;
    }
    if let Some(program) = args.pipeline {
        opts.locator = chartrender::PipelineLocator::at(program);
    }
    if let Some(ms) = args.timeout_ms {
        opts.timeout_ms = ms;
    }

    let text = read_spec(&args.spec)?;
    let chart = chartrender::RenderOrchestrator::new(opts).render(&text, args.width)?;
    println!("{}", chart.locator);
    tracing::info!(path = %chart.path.display(), width = chart.width, height = chart.height, "done");
    Ok(())
}

fn cmd_svg(args: SvgArgs) -> anyhow::Result<()> {
    let text = read_spec(&args.spec)?;
    let doc = chartrender::render_chart_svg(&text)?;
    std::fs::write(&args.out, doc.svg)
        .with_context(|| format!("write svg to '{}'", args.out.display()))?;
    Ok(())
}

fn cmd_png(args: PngArgs) -> anyhow::Result<()> {
    let text = read_spec(&args.spec)?;
    let image = chartrender::render_chart(&chartrender::Rasterizer::new(), &text, args.width)?;
    std::fs::write(&args.out, &image.png)
        .with_context(|| format!("write png to '{}'", args.out.display()))?;
    tracing::info!(width = image.width, height = image.height, "wrote {}", args.out.display());
    Ok(())
}
