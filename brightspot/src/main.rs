// Command-line runner for the engine: analyse one image file, write the
// annotated copy, and print the response payload and metadata record as JSON.

use anyhow::Context;
use brightspot::{AnalysisPipeline, PipelineConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Find and circle the brightest and darkest pixels of an image")]
struct Args {
    /// JPEG or PNG file to analyse.
    input: PathBuf,

    /// Directory the annotated image is written to.
    #[arg(short = 'o', long, default_value = "results")]
    results_dir: PathBuf,

    /// Name to derive the output file name from (defaults to the input's file name).
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Create the results directory if it does not exist.
    #[arg(long)]
    create_dir: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.create_dir {
        std::fs::create_dir_all(&args.results_dir)
            .with_context(|| format!("creating {}", args.results_dir.display()))?;
    }

    let name = match args.name {
        Some(name) => name,
        None => args
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("input path has no file name")?,
    };

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    info!("Analysing {} ({} bytes)", args.input.display(), bytes.len());

    let pipeline = AnalysisPipeline::new(PipelineConfig {
        results_dir: args.results_dir,
    });
    let report = pipeline.process(&bytes, &name)?;
    info!("Annotated image written to {}", report.artifact.path.display());

    let output = serde_json::json!({
        "analysis": report.response(),
        "record": report.record,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
