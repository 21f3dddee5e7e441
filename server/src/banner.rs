//! Startup banner utilities.

use counter::StatusRange;
use std::fmt::Write;
use std::net::SocketAddr;

/// Configuration for the startup banner.
pub struct BannerConfig<'a> {
    /// Version string
    pub version: &'a str,
    /// Number of worker processes
    pub workers: usize,
    /// Listener address
    pub listener: SocketAddr,
    /// Report endpoint path, when enabled
    pub report_path: Option<&'a str>,
    /// Tracked status code range
    pub range: StatusRange,
}

/// Print a startup banner to stdout.
pub fn print_banner(config: &BannerConfig) {
    let mut output = String::with_capacity(256);

    let name = "status-counter-server";
    writeln!(output, "{} v{}", name, config.version).unwrap();
    writeln!(
        output,
        "{}",
        "=".repeat(name.len() + config.version.len() + 2)
    )
    .unwrap();
    writeln!(output).unwrap();

    writeln!(output, "Workers:  {}", config.workers).unwrap();
    writeln!(output, "Listener: {}", config.listener).unwrap();
    match config.report_path {
        Some(path) => writeln!(output, "Report:   {}", path).unwrap(),
        None => writeln!(output, "Report:   disabled").unwrap(),
    }
    writeln!(output, "Tracked:  {}", config.range).unwrap();
    writeln!(output).unwrap();

    print!("{}", output);
}
