//! Mask refinement CLI tool
//!
//! Takes a photo and its cutout (from a file or the remote removal service),
//! optionally replays a stroke script over the mask, then exports the result
//! over the chosen background.

use super::{config::CliConfigBuilder, script::StrokeScript};
use crate::{
    loader::RasterLoader,
    remote::RemoteRemover,
    services::RasterIO,
    tracing_config::{events, init_cli_tracing, spans, TracingFormat},
    workspace::EditorWorkspace,
    OutputEncoding,
};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// Refine a background-removal cutout and composite it over a new background
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgrefine")]
pub struct Cli {
    /// Original photo
    #[arg(long, value_name = "PATH")]
    pub original: PathBuf,

    /// Existing cutout of the photo (PNG with alpha)
    #[arg(long, value_name = "PATH", conflicts_with = "remote")]
    pub cutout: Option<PathBuf>,

    /// Base URL of the background removal service to request a cutout from
    #[arg(long, value_name = "URL")]
    pub remote: Option<String>,

    /// JSON stroke script to replay over the mask before export
    #[arg(long, value_name = "PATH")]
    pub strokes: Option<PathBuf>,

    /// Background color: transparent, a color name or #rgb / #rrggbb
    #[arg(long, value_name = "COLOR", conflicts_with = "background_image")]
    pub background: Option<String>,

    /// Background image, scaled to cover the output
    #[arg(long, value_name = "PATH")]
    pub background_image: Option<PathBuf>,

    /// Directory the composite is written into
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// File name prefix of the composite [default: removed_bg]
    #[arg(long)]
    pub prefix: Option<String>,

    /// Also write the refined cutout as PNG to this path
    #[arg(long, value_name = "PATH")]
    pub save_cutout: Option<PathBuf>,

    /// JPEG quality (1-100) for opaque exports
    #[arg(long, default_value_t = 92)]
    pub jpeg_quality: u8,

    /// Remote request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Plain log output without colors
    #[arg(long)]
    pub compact_logs: bool,

    /// Emit logs as JSON lines
    #[cfg(feature = "tracing-json")]
    #[arg(long, conflicts_with = "compact_logs")]
    pub json_logs: bool,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_cli_tracing(cli.verbose, log_format(&cli)).context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;
    let background = CliConfigBuilder::background_from_cli(&cli)?;

    let start_time = Instant::now();
    let mut workspace = EditorWorkspace::new(config);

    let photo = tokio::fs::read(&cli.original)
        .await
        .with_context(|| format!("Failed to read {}", cli.original.display()))?;
    let file_name = cli
        .original
        .file_name()
        .map_or_else(|| "image".to_string(), |name| name.to_string_lossy().into_owned());
    workspace
        .set_original(photo, file_name)
        .with_context(|| format!("Failed to decode {}", cli.original.display()))?;

    obtain_cutout(&cli, &mut workspace).await?;

    if let Some(script_path) = &cli.strokes {
        refine_with_script(script_path, &mut workspace).await?;
    }

    if let Some(path) = &cli.save_cutout {
        if let Some(cutout) = workspace.cutout() {
            RasterIO::save_raster(cutout, path, OutputEncoding::Png, 100)
                .with_context(|| format!("Failed to save cutout to {}", path.display()))?;
            info!("Cutout saved to {}", path.display());
        }
    }

    workspace.set_background(background);
    let output_path = {
        let dimensions = workspace.cutout().map_or((0, 0), |cutout| cutout.dimensions());
        let span = spans::export(workspace.background().kind(), dimensions);
        let _guard = span.enter();

        let output = workspace.export().context("Failed to composite output")?;
        output
            .save_to_dir(&cli.output_dir)
            .with_context(|| format!("Failed to write into {}", cli.output_dir.display()))?
    };

    info!(
        "Exported {} in {:.2}s",
        output_path.display(),
        start_time.elapsed().as_secs_f64()
    );
    println!("{}", output_path.display());

    Ok(())
}

fn log_format(cli: &Cli) -> TracingFormat {
    #[cfg(feature = "tracing-json")]
    {
        if cli.json_logs {
            return TracingFormat::Json;
        }
    }

    if cli.compact_logs {
        TracingFormat::Compact
    } else {
        TracingFormat::Console
    }
}

/// Load the cutout from disk or ask the remote service for one
async fn obtain_cutout(cli: &Cli, workspace: &mut EditorWorkspace) -> Result<()> {
    if let Some(path) = &cli.cutout {
        let cutout = RasterIO::load_raster(path)
            .with_context(|| format!("Failed to load cutout {}", path.display()))?;
        workspace.set_cutout(cutout);
        return Ok(());
    }

    let remover = RemoteRemover::new(workspace.config()).context("Failed to create remote client")?;
    let span = spans::remote_request(remover.endpoint());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .context("Invalid progress template")?,
    );
    spinner.set_message("Removing background...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = workspace
        .request_cutout(&remover)
        .instrument(span)
        .await
        .map(|_| ());
    match result {
        Ok(()) => {
            spinner.finish_with_message("Background removed");
            Ok(())
        },
        Err(e) => {
            spinner.abandon_with_message("Background removal failed");
            events::error_with_context(&e, "remote cutout request");
            let message = workspace.error().unwrap_or("Background removal failed").to_string();
            Err(anyhow::Error::new(e).context(message))
        },
    }
}

/// Replay a stroke script in a mask editing session and keep the result
async fn refine_with_script(script_path: &Path, workspace: &mut EditorWorkspace) -> Result<()> {
    let script = StrokeScript::load(script_path)?;
    let span = spans::mask_editing(script_path, script.steps.len());

    let loader =
        RasterLoader::from_config(workspace.config()).context("Failed to create image loader")?;
    let mut session = workspace
        .open_mask_editor(&loader)
        .instrument(span.clone())
        .await
        .context("Failed to open mask editor")?;

    let outcome = span.in_scope(|| script.run(&mut session))?;
    debug!(
        applications = outcome.applications,
        pixels = outcome.pixels_touched,
        "Stroke script replayed"
    );

    if outcome.cancelled {
        warn!("Stroke script cancelled the edit; keeping the unedited cutout");
        return Ok(());
    }

    let saved = session.save().context("Failed to save mask edit")?;
    events::progress(&format!(
        "Mask refined with {} brush applications",
        outcome.applications
    ));
    workspace.commit_mask_edit(saved);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_struct_creation() {
        let cli = Cli::parse_from([
            "bgrefine",
            "--original",
            "photo.jpg",
            "--cutout",
            "cut.png",
            "--background",
            "white",
            "-vv",
        ]);
        assert_eq!(cli.original, PathBuf::from("photo.jpg"));
        assert_eq!(cli.cutout, Some(PathBuf::from("cut.png")));
        assert_eq!(cli.background.as_deref(), Some("white"));
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert_eq!(cli.verbose, 2);
        assert_eq!(log_format(&cli), TracingFormat::Console);

        let cli = Cli::parse_from(["bgrefine", "--original", "a.jpg", "--compact-logs"]);
        assert_eq!(log_format(&cli), TracingFormat::Compact);
    }

    #[test]
    fn test_cutout_conflicts_with_remote() {
        let result = Cli::try_parse_from([
            "bgrefine",
            "--original",
            "photo.jpg",
            "--cutout",
            "cut.png",
            "--remote",
            "http://localhost:8000",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_background_conflicts_with_background_image() {
        let result = Cli::try_parse_from([
            "bgrefine",
            "--original",
            "photo.jpg",
            "--cutout",
            "cut.png",
            "--background",
            "white",
            "--background-image",
            "beach.jpg",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_obtain_cutout_from_file() {
        use crate::types::Raster;
        use image::Rgba;

        let dir = tempfile::TempDir::new().unwrap();
        let photo = Raster::filled(3, 3, Rgba([10, 20, 30, 255]));
        let cutout = Raster::filled(3, 3, Rgba([10, 20, 30, 0]));
        let cutout_path = dir.path().join("cut.png");
        RasterIO::save_raster(&cutout, &cutout_path, OutputEncoding::Png, 100).unwrap();

        let cli = Cli::parse_from([
            "bgrefine",
            "--original",
            "photo.png",
            "--cutout",
            cutout_path.to_str().unwrap(),
        ]);
        let mut workspace = EditorWorkspace::default();
        workspace
            .set_original(RasterIO::encode_png(&photo).unwrap(), "photo.png")
            .unwrap();

        obtain_cutout(&cli, &mut workspace).await.unwrap();
        assert_eq!(workspace.cutout(), Some(&cutout));
    }
}
