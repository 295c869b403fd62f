//! Isolated render unit: `chartrender-pipeline <input.json> <output.png> [width]`.
//!
//! Exit code 0 means the PNG was written. Any failure, argument errors included, exits 1 with
//! the diagnostic on stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chartrender-pipeline", version)]
struct Args {
    /// Chart spec JSON file.
    input: PathBuf,

    /// Output PNG path.
    output: PathBuf,

    /// Output width in pixels.
    #[arg(default_value_t = chartrender::DEFAULT_OUTPUT_WIDTH)]
    width: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("invalid input: {}", e.render().to_string().trim());
            return ExitCode::from(1);
        }
    };

    match chartrender::run_pipeline_files(&args.input, &args.output, args.width) {
        Ok(image) => {
            tracing::info!(width = image.width, height = image.height, "wrote {}", args.output.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(1)
        }
    }
}
