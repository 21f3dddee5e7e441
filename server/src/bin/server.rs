//! Status code counter server binary.

use clap::Parser;
use counter::{SharedCounterSegment, StatusRange};
use server::banner::{print_banner, BannerConfig};
use server::config::Config;
use server::{http, logging, signal, workers};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "status-counter-server")]
#[command(about = "Pre-fork HTTP server with per-status-code response counting")]
struct Args {
    /// Path to configuration file (defaults apply when omitted)
    config: Option<PathBuf>,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() {
    let args = Args::parse();

    if args.print_config {
        print_default_config();
        return;
    }

    let config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    logging::init(&config.logging);

    if let Err(e) = run(config) {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let worker_count = config.worker_count();

    print_banner(&BannerConfig {
        version: env!("CARGO_PKG_VERSION"),
        workers: worker_count,
        listener: config.listener.address,
        report_path: if config.report.enabled {
            Some(config.report.path.as_str())
        } else {
            None
        },
        range: StatusRange::DEFAULT,
    });

    // The segment must exist before the first fork so every worker inherits
    // the mapping.
    let segment = Arc::new(SharedCounterSegment::allocate(StatusRange::DEFAULT)?);

    let spawned = workers::spawn_workers(worker_count, |worker_id| {
        worker_main(worker_id, segment.clone(), &config);
    })?;

    // Installed after forking so the children keep default signal
    // dispositions and exit on the master's SIGTERM.
    let shutdown = signal::install_signal_handler();

    workers::supervise(spawned, &shutdown);

    tracing::info!("all workers exited, releasing counter segment");
    drop(segment);

    Ok(())
}

/// Worker process entry point. Never returns to the master's control flow.
fn worker_main(worker_id: usize, segment: Arc<SharedCounterSegment>, config: &Config) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(worker_id, error = %e, "failed to build worker runtime");
            std::process::exit(1);
        }
    };

    let app = http::router(segment, &config.report);

    if let Err(e) = runtime.block_on(http::serve(config.listener.address, app)) {
        tracing::error!(worker_id, error = %e, "worker listener failed");
        std::process::exit(1);
    }
}

fn print_default_config() {
    let config = r#"# Status Counter Server Configuration

[listener]
# Address every worker binds with SO_REUSEPORT
address = "0.0.0.0:8080"

[workers]
# Number of worker processes (default: number of CPUs)
# count = 4

[report]
# Install the plain-text status report handler
enabled = true
# Path the report is served at
path = "/status"

[logging]
# Log level: "error", "warn", "info", "debug", "trace"
# Can be overridden with RUST_LOG environment variable
level = "info"
# Log format: "pretty" (human-readable), "json", or "compact"
format = "pretty"
# Include timestamps
timestamps = true
# Include module target
target = true
"#;
    print!("{}", config);
}
