//! Raster I/O operations service
//!
//! Separates file and stream handling from the editing logic.

use crate::{
    config::OutputEncoding,
    error::{RefineError, Result},
    services::OutputEncodingHandler,
    types::Raster,
};
use image::DynamicImage;
use std::path::Path;

/// Service for reading and writing rasters
pub struct RasterIO;

impl RasterIO {
    /// Load an image from a file path
    ///
    /// Falls back to content-based format detection when the extension is
    /// missing or wrong.
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(RefineError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref)
                    .map_err(|io_err| RefineError::file_io_error("read image data", path_ref, &io_err))?;
                Self::load_from_bytes(&data)
            },
        }
    }

    /// Load a raster from a file path
    pub fn load_raster<P: AsRef<Path>>(path: P) -> Result<Raster> {
        Self::load_image(path).map(Raster::from_dynamic)
    }

    /// Decode an image from memory with content-based format detection
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(RefineError::Image(image::ImageError::IoError(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "empty image data",
            ))));
        }
        Ok(image::load_from_memory(bytes)?)
    }

    /// Read a whole async stream and decode it
    pub async fn load_from_reader<R: tokio::io::AsyncRead + Unpin>(mut reader: R) -> Result<DynamicImage> {
        let mut buffer = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut buffer).await?;
        Self::load_from_bytes(&buffer)
    }

    /// Encode a raster as PNG, keeping alpha
    pub fn encode_png(raster: &Raster) -> Result<Vec<u8>> {
        OutputEncodingHandler::encode(raster.to_image(), OutputEncoding::Png, 100)
    }

    /// Write encoded bytes to a file, creating parent directories
    pub fn write_bytes<P: AsRef<Path>>(bytes: &[u8], path: P) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| RefineError::file_io_error("create output directory", parent, &e))?;
            }
        }

        std::fs::write(path_ref, bytes).map_err(|e| RefineError::file_io_error("write image", path_ref, &e))?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), path_ref.display());
        Ok(())
    }

    /// Encode and save a raster
    pub fn save_raster<P: AsRef<Path>>(
        raster: &Raster,
        path: P,
        encoding: OutputEncoding,
        jpeg_quality: u8,
    ) -> Result<()> {
        if !OutputEncodingHandler::supports_transparency(encoding) && !raster.is_fully_opaque() {
            log::warn!(
                "Saving a raster with transparent pixels as {}; alpha will be dropped",
                encoding
            );
        }
        let bytes = OutputEncodingHandler::encode(raster.to_image(), encoding, jpeg_quality)?;
        Self::write_bytes(&bytes, path)
    }
}
