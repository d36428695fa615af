//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::{
    config::EditorConfig,
    services::RasterIO,
    types::{BackgroundSpec, Raster},
};
use anyhow::{Context, Result};

/// Convert CLI arguments to an `EditorConfig` and a background
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the editor configuration from CLI arguments
    pub(crate) fn from_cli(cli: &Cli) -> Result<EditorConfig> {
        let mut builder = EditorConfig::builder()
            .jpeg_quality(cli.jpeg_quality)
            .request_timeout_secs(cli.timeout);

        if let Some(prefix) = &cli.prefix {
            builder = builder.file_prefix(prefix.clone());
        }
        if let Some(endpoint) = &cli.remote {
            builder = builder.remote_endpoint(endpoint.clone());
        }

        builder.build().context("Invalid editor configuration")
    }

    /// Validate argument combinations clap cannot express
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if cli.cutout.is_none() && cli.remote.is_none() {
            anyhow::bail!("Either --cutout or --remote is required to obtain a cutout");
        }

        if cli.jpeg_quality == 0 || cli.jpeg_quality > 100 {
            anyhow::bail!("JPEG quality must be between 1 and 100, got {}", cli.jpeg_quality);
        }

        if cli.timeout == 0 {
            anyhow::bail!("Request timeout must be at least one second");
        }

        if let Some(prefix) = &cli.prefix {
            if prefix.is_empty() || prefix.contains(['/', '\\']) {
                anyhow::bail!("Invalid file prefix '{}'", prefix);
            }
        }

        Ok(())
    }

    /// Resolve the export background from `--background` / `--background-image`
    pub(crate) fn background_from_cli(cli: &Cli) -> Result<BackgroundSpec> {
        if let Some(path) = &cli.background_image {
            let raster: Raster = RasterIO::load_raster(path)
                .with_context(|| format!("Failed to load background image {}", path.display()))?;
            return Ok(BackgroundSpec::Image(raster));
        }

        match &cli.background {
            Some(value) => BackgroundSpec::parse_color(value)
                .with_context(|| format!("Invalid background color '{}'", value)),
            None => Ok(BackgroundSpec::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["bgrefine"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_from_cli_defaults() {
        let cli = parse(&["--original", "photo.jpg", "--cutout", "cut.png"]);
        let config = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(config.jpeg_quality, 92);
        assert_eq!(config.file_prefix, "removed_bg");
        assert_eq!(config.remote_endpoint, "http://localhost:8000");
    }

    #[test]
    fn test_from_cli_overrides() {
        let cli = parse(&[
            "--original",
            "photo.jpg",
            "--remote",
            "http://10.0.0.2:9000",
            "--prefix",
            "studio",
            "--jpeg-quality",
            "80",
        ]);
        let config = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(config.jpeg_quality, 80);
        assert_eq!(config.file_prefix, "studio");
        assert_eq!(config.remote_endpoint, "http://10.0.0.2:9000");
    }

    #[test]
    fn test_validate_requires_cutout_source() {
        let cli = parse(&["--original", "photo.jpg"]);
        assert!(CliConfigBuilder::validate_cli(&cli).is_err());

        let cli = parse(&["--original", "photo.jpg", "--cutout", "cut.png"]);
        assert!(CliConfigBuilder::validate_cli(&cli).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cli = parse(&["--original", "a.jpg", "--cutout", "b.png", "--jpeg-quality", "0"]);
        assert!(CliConfigBuilder::validate_cli(&cli).is_err());

        let cli = parse(&["--original", "a.jpg", "--cutout", "b.png", "--prefix", "a/b"]);
        assert!(CliConfigBuilder::validate_cli(&cli).is_err());
    }

    #[test]
    fn test_background_resolution() {
        let cli = parse(&["--original", "a.jpg", "--cutout", "b.png"]);
        assert!(CliConfigBuilder::background_from_cli(&cli).unwrap().is_transparent());

        let cli = parse(&["--original", "a.jpg", "--cutout", "b.png", "--background", "#ff0000"]);
        assert_eq!(
            CliConfigBuilder::background_from_cli(&cli).unwrap().kind(),
            "color"
        );

        let cli = parse(&["--original", "a.jpg", "--cutout", "b.png", "--background", "chartreuse-ish"]);
        assert!(CliConfigBuilder::background_from_cli(&cli).is_err());
    }
}
