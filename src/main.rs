//! Framecast CLI
//!
//! Streams the built-in test pattern to an RTMP endpoint. Real deployments
//! use the library crate and plug their own renderer into the capture
//! driver.

use clap::Parser;
use framecast::{session, spawn_capture, RetryConfig, StreamConfig, TestPattern};

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "framecast")]
#[command(about = "Fixed-rate frame pipeline - encode and push over RTMP")]
#[command(version)]
struct Cli {
    /// Destination RTMP URL; falls back to the RTMP_URL environment variable
    #[arg(short, long)]
    url: Option<String>,

    /// TOML configuration file (CLI flags override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frame width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Target framerate
    #[arg(short, long)]
    fps: Option<u32>,

    /// Target bitrate in kbps
    #[arg(short, long)]
    bitrate: Option<u32>,

    /// Producer render tick in milliseconds
    #[arg(long, default_value = "7")]
    tick_ms: u64,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("framecast=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StreamConfig::from_file(path)?,
        None => StreamConfig::default(),
    };

    if let Some(url) = cli.url {
        config.url = url;
    } else if config.url.is_empty() {
        config.url = std::env::var("RTMP_URL").unwrap_or_default();
    }
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }
    if let Some(bitrate) = cli.bitrate {
        config.bitrate_kbps = bitrate;
    }

    // Invalid configuration is fatal; the process exits non-zero here.
    config.validate()?;

    tracing::info!(
        "streaming to {} at {} @ {} fps, {} kbps",
        config.url_masked(),
        config.resolution(),
        config.fps,
        config.bitrate_kbps
    );

    let (writer_tx, writer_rx) = crossbeam_channel::bounded(1);
    let capture = spawn_capture(
        TestPattern::default(),
        Duration::from_millis(cli.tick_ms),
        writer_rx,
    );

    let stop = AtomicBool::new(false);
    let result = session::run(&config, &RetryConfig::default(), &stop, &writer_tx);

    // Dropping the last sender lets the capture thread exit.
    drop(writer_tx);
    let _ = capture.join();

    result?;
    Ok(())
}
