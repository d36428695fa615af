//! bgrefine CLI Tool
//!
//! Command-line interface for refining background-removal cutouts and
//! compositing them over new backgrounds.

#[cfg(feature = "cli")]
use bgrefine::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
