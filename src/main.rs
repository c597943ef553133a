//! Job tracker API server.
//!
//! ```text
//!   HTTP request ──▶ request id / trace / timeout ──▶ /health  ──▶ manager.snapshot()
//!                                                  └▶ /api/*  ──▶ guard: manager.status()
//!                                                                 ├─ connected → handler
//!                                                                 └─ otherwise → 503 degraded
//!
//!   ConnectionManager ◀── events ── TcpTransport ── heartbeat ──▶ document store
//!          └── connect() / backoff timer ──────────▶
//! ```

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "job-tracker")]
#[command(about = "Job application tracker API", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "JOB_TRACKER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    job_tracker_api::lifecycle::startup::run(args.config.as_deref()).await?;
    Ok(())
}
