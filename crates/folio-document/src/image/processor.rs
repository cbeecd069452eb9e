// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, flatten transparency, and encode raster images
// with the `image` crate.

use std::io::Cursor;
use std::path::Path;

use folio_core::error::{FolioError, Result};
use folio_core::types::ImageFormat;
use image::{DynamicImage, GenericImageView, ImageReader, Rgb, RgbImage};
use tracing::{debug, info, instrument};

/// Wraps a single decoded image.
///
/// Transformations consume `self` and return a new processor so calls chain:
///
/// ```ignore
/// let jpeg = ImageProcessor::open("scan.png")?
///     .flatten_onto_white()
///     .to_jpeg_bytes(80)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file, detecting the format from its content.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|err| {
                FolioError::ImageError(format!("failed to open {}: {}", path.display(), err))
            })?
            .decode()
            .map_err(|err| {
                FolioError::ImageError(format!("failed to decode {}: {}", path.display(), err))
            })?;
        info!(width = image.width(), height = image.height(), "Image loaded");
        Ok(Self { image })
    }

    /// Decode an image from encoded bytes of any supported format.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data)
            .map_err(|err| FolioError::ImageError(format!("failed to decode image: {}", err)))?;
        debug!(width = image.width(), height = image.height(), "Image decoded from bytes");
        Ok(Self { image })
    }

    /// Decode a JPEG stream, as embedded in a PDF with /DCTDecode.
    pub fn from_jpeg_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
            .map_err(|err| FolioError::ImageError(format!("failed to decode JPEG: {}", err)))?;
        Ok(Self { image })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether the pixel format carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Composite the image over an opaque white background and drop alpha.
    ///
    /// Images without alpha are converted to RGB unchanged.
    #[instrument(skip(self))]
    pub fn flatten_onto_white(self) -> Self {
        if !self.has_alpha() {
            return Self {
                image: DynamicImage::ImageRgb8(self.image.to_rgb8()),
            };
        }

        let (width, height) = self.image.dimensions();
        let rgba = self.image.to_rgba8();
        let flattened = RgbImage::from_fn(width, height, |x, y| {
            let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            let alpha = a as u32;
            let blend = |channel: u8| -> u8 {
                ((channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
            };
            Rgb([blend(r), blend(g), blend(b)])
        });
        debug!(width, height, "Alpha flattened onto white");

        Self {
            image: DynamicImage::ImageRgb8(flattened),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as PNG.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .map_err(|err| FolioError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode as an RGB JPEG with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| FolioError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode as a single-channel JPEG with the given quality (1-100).
    pub fn to_gray_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let luma = self.image.to_luma8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        luma.write_with_encoder(encoder)
            .map_err(|err| FolioError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode in `format` and write to `path`. `quality` applies to JPEG only.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn save_as(&self, path: &Path, format: ImageFormat, quality: u8) -> Result<()> {
        let bytes = match format {
            ImageFormat::Png => self.to_png_bytes()?,
            // JPEG has no alpha channel.
            ImageFormat::Jpeg if self.has_alpha() => Self::from_dynamic(self.image.clone())
                .flatten_onto_white()
                .to_jpeg_bytes(quality)?,
            ImageFormat::Jpeg => self.to_jpeg_bytes(quality)?,
        };
        std::fs::write(path, &bytes)?;
        debug!(bytes = bytes.len(), "Image written");
        Ok(())
    }
}
