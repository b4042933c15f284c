//! Image processing and encoding utilities.
//!
//! This module cuts the committed selection out of a capture and encodes it
//! for transmission to the Gemini API.
//!
//! # Coordinate Mapping
//!
//! The overlay displays the capture at logical pixel sizes (e.g., 1920x1080)
//! while the captured image may be at a different resolution (e.g., 3840x2160).
//! A single scale factor maps selection coordinates into capture pixels.

use crate::capture::CaptureImage;
use crate::error::{AppError, Result};
use crate::selection::SelectionRect;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{ImageFormat, RgbaImage, imageops};
use std::io::Cursor;

const PNG_MIME: &str = "image/png";

/// The selected region, PNG-encoded as a data URI.
///
/// Consumed once by the answer client and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct CroppedImage {
    width: u32,
    height: u32,
    data_uri: String,
}

impl CroppedImage {
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mime_type(&self) -> &'static str {
        PNG_MIME
    }
}

impl std::fmt::Debug for CroppedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CroppedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("encoded_len", &self.data_uri.len())
            .finish()
    }
}

/// Image processing utilities for the selection workflow.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Crops a capture to a selection and encodes the result as PNG.
    ///
    /// The output is `round(width * scale)` by `round(height * scale)` pixels.
    /// Parts of the selection that fall outside the capture are clipped and
    /// left fully transparent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageProcessing`] if `scale` is not a positive
    /// number or PNG encoding fails, and [`AppError::EmptySelection`] if the
    /// scaled selection rounds to zero pixels.
    pub fn crop(capture: &CaptureImage, selection: SelectionRect, scale: f32) -> Result<CroppedImage> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(AppError::image(format!("Invalid display scale {}", scale)));
        }

        let dest_width = (selection.width * scale).round();
        let dest_height = (selection.height * scale).round();
        if dest_width < 1.0 || dest_height < 1.0 {
            return Err(AppError::EmptySelection);
        }
        let (dest_width, dest_height) = (dest_width as u32, dest_height as u32);

        // Sampling origin in capture pixels; may be negative or past the edge.
        let origin_x = (selection.x * scale).round() as i64;
        let origin_y = (selection.y * scale).round() as i64;

        let source = capture.image();
        let src_x0 = origin_x.max(0);
        let src_y0 = origin_y.max(0);
        let src_x1 = (origin_x + dest_width as i64).min(source.width() as i64);
        let src_y1 = (origin_y + dest_height as i64).min(source.height() as i64);

        let mut dest = RgbaImage::new(dest_width, dest_height);

        if src_x1 > src_x0 && src_y1 > src_y0 {
            let clipped = source
                .crop_imm(
                    src_x0 as u32,
                    src_y0 as u32,
                    (src_x1 - src_x0) as u32,
                    (src_y1 - src_y0) as u32,
                )
                .to_rgba8();
            imageops::replace(&mut dest, &clipped, src_x0 - origin_x, src_y0 - origin_y);
        } else {
            log::warn!(
                "Selection {:?} lies entirely outside the {}x{} capture",
                selection,
                source.width(),
                source.height()
            );
        }

        let data_uri = Self::encode_to_data_uri(&dest)?;

        Ok(CroppedImage {
            width: dest_width,
            height: dest_height,
            data_uri,
        })
    }

    /// Encodes an RGBA buffer to a PNG data URI.
    fn encode_to_data_uri(image: &RgbaImage) -> Result<String> {
        let mut buffer: Vec<u8> = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;

        Ok(format!("data:{};base64,{}", PNG_MIME, BASE64.encode(buffer)))
    }
}
