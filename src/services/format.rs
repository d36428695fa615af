//! Output encoding handling service
//!
//! Keeps encoding details (extensions, MIME types, alpha handling) apart from
//! the compositing logic.

use crate::{
    config::OutputEncoding,
    error::{RefineError, Result},
};
use image::{
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
    DynamicImage, RgbaImage,
};

/// Service for handling output encodings
pub struct OutputEncodingHandler;

impl OutputEncodingHandler {
    /// Convert an RGBA image to the pixel layout the encoding stores
    ///
    /// JPEG has no alpha channel, so alpha is dropped. Callers are expected
    /// to have flattened the image onto an opaque background first.
    pub fn convert(rgba_image: RgbaImage, encoding: OutputEncoding) -> DynamicImage {
        match encoding {
            OutputEncoding::Png => DynamicImage::ImageRgba8(rgba_image),
            OutputEncoding::Jpeg => DynamicImage::ImageRgba8(rgba_image).to_rgb8().into(),
        }
    }

    /// Encode an RGBA image to bytes
    ///
    /// # Arguments
    /// * `rgba_image` - Flattened output pixels
    /// * `encoding` - Target encoding
    /// * `jpeg_quality` - Quality (0-100), only used for JPEG
    pub fn encode(rgba_image: RgbaImage, encoding: OutputEncoding, jpeg_quality: u8) -> Result<Vec<u8>> {
        let image = Self::convert(rgba_image, encoding);
        let mut bytes = Vec::new();

        let result = match encoding {
            OutputEncoding::Png => image.write_with_encoder(PngEncoder::new(&mut bytes)),
            OutputEncoding::Jpeg => image.write_with_encoder(JpegEncoder::new_with_quality(
                &mut bytes,
                jpeg_quality.clamp(1, 100),
            )),
        };

        result.map_err(|e| RefineError::encoding(format!("Failed to encode {}: {}", encoding, e)))?;
        Ok(bytes)
    }

    /// File extension (without the dot)
    ///
    /// # Examples
    /// ```rust
    /// use bgrefine::{services::OutputEncodingHandler, OutputEncoding};
    ///
    /// assert_eq!(OutputEncodingHandler::get_extension(OutputEncoding::Png), "png");
    /// assert_eq!(OutputEncodingHandler::get_extension(OutputEncoding::Jpeg), "jpg");
    /// ```
    pub fn get_extension(encoding: OutputEncoding) -> &'static str {
        match encoding {
            OutputEncoding::Png => "png",
            OutputEncoding::Jpeg => "jpg",
        }
    }

    /// MIME type of the encoded output
    pub fn mime_type(encoding: OutputEncoding) -> &'static str {
        match encoding {
            OutputEncoding::Png => "image/png",
            OutputEncoding::Jpeg => "image/jpeg",
        }
    }

    /// Check if an encoding preserves the alpha channel
    pub fn supports_transparency(encoding: OutputEncoding) -> bool {
        match encoding {
            OutputEncoding::Png => true,
            OutputEncoding::Jpeg => false,
        }
    }

    /// Pick the encoding for a composite
    ///
    /// Alpha is only worth keeping when no opaque background was baked in.
    pub fn for_background(transparent_background: bool) -> OutputEncoding {
        if transparent_background {
            OutputEncoding::Png
        } else {
            OutputEncoding::Jpeg
        }
    }
}
