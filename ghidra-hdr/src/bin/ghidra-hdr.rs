//! CLI entry point for ghidra-hdr.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

/// Generate C++ headers from a Ghidra data type dump.
#[derive(Parser, Debug)]
#[command(name = "ghidra-hdr", version, about)]
struct Cli {
    /// Path to the StructureConfig.json configuration file.
    #[arg(default_value = "StructureConfig.json")]
    config: PathBuf,

    /// Header output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Keep running and regenerate whenever the config or an input changes.
    #[arg(short, long)]
    watch: bool,

    /// Poll interval for --watch, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ghidra_hdr=info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.watch {
        let watcher = ghidra_hdr::watch::Watcher::new(&cli.config, cli.output_dir.as_deref())?;
        watcher.watch(Duration::from_millis(cli.interval_ms))?;
    } else {
        ghidra_hdr::run(&cli.config, cli.output_dir.as_deref())?;
    }
    Ok(())
}
