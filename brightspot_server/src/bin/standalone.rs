use brightspot_server::{ServerConfig, start_server};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP service for brightspot image analysis")]
struct Args {
    #[arg(short = 'b', long, env = "BRIGHTSPOT_BIND", default_value = "127.0.0.1:8000")]
    bind: String,

    #[arg(long, env = "BRIGHTSPOT_RESULTS_DIR", default_value = "results")]
    results_dir: PathBuf,

    #[arg(long, env = "BRIGHTSPOT_RECORDS", default_value = "records.jsonl")]
    records: PathBuf,

    /// Largest accepted upload, in MiB.
    #[arg(long, env = "BRIGHTSPOT_MAX_UPLOAD_MIB", default_value = "25")]
    max_upload_mib: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = ServerConfig {
        bind_addr: args.bind,
        results_dir: args.results_dir,
        records_path: args.records,
        max_upload_bytes: args.max_upload_mib * 1024 * 1024,
    };

    let handle = start_server(cfg).await?;
    handle.await?;
    Ok(())
}
