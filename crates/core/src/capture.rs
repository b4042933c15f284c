//! Screen capture functionality.
//!
//! This module provides the [`CaptureImage`] snapshot held by a solving
//! session and the [`CaptureProvider`] implementations that produce it:
//! live monitors through the `screenshots` crate, or image files on disk.
//!
//! # Example
//!
//! ```ignore
//! use oversolve_core::capture::{CaptureProvider, DisplayCapture};
//!
//! let snapshot = DisplayCapture::primary().capture()?;
//! println!("{}x{}", snapshot.width(), snapshot.height());
//! ```

use crate::error::{AppError, Result};
use crate::gemini::split_data_uri;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat};
use screenshots::Screen;
use std::io::Cursor;
use std::path::PathBuf;

/// One full-screen snapshot.
///
/// Immutable once produced. A session owns it from capture until the
/// selection is committed or cancelled.
#[derive(Clone)]
pub struct CaptureImage {
    image: DynamicImage,
}

impl CaptureImage {
    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Decodes a data URI (`data:image/png;base64,...`) or raw base64 string.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ScreenCapture`] for empty input, invalid base64 or
    /// bytes that are not a supported image.
    pub fn from_encoded(encoded: &str) -> Result<Self> {
        let (_, data) = split_data_uri(encoded.trim());
        if data.is_empty() {
            return Err(AppError::capture("Capture returned an empty image"));
        }

        let bytes = BASE64
            .decode(data)
            .map_err(|e| AppError::capture(format!("Capture is not valid base64: {}", e)))?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| AppError::capture(format!("Capture is not a readable image: {}", e)))?;

        Ok(Self { image })
    }

    /// Encodes the snapshot as a PNG data URI.
    pub fn to_data_uri(&self) -> Result<String> {
        let mut buffer: Vec<u8> = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| AppError::image(format!("Failed to encode capture: {}", e)))?;
        Ok(format!("data:image/png;base64,{}", BASE64.encode(buffer)))
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl std::fmt::Debug for CaptureImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Source of full-screen snapshots.
///
/// Providers are called from a worker thread, hence the `Send + Sync` bound.
pub trait CaptureProvider: Send + Sync {
    fn capture(&self) -> Result<CaptureImage>;
}

/// Screen capturer that provides multi-monitor screenshot capabilities.
///
/// This struct wraps the `screenshots` crate and provides a convenient API
/// for enumerating and capturing screens.
pub struct ScreenCapturer {
    screens: Vec<Screen>,
}

impl ScreenCapturer {
    /// Initializes the screen capturer by detecting available screens.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ScreenCapture`] if:
    /// - Screen enumeration fails (e.g., no display server available)
    /// - No screens are detected
    pub fn new() -> Result<Self> {
        let screens = Screen::all()
            .map_err(|e| AppError::capture(format!("Failed to enumerate screens: {}", e)))?;

        if screens.is_empty() {
            return Err(AppError::capture("No screens detected"));
        }

        Ok(Self { screens })
    }

    /// Lists available screens with their dimensions and metadata.
    pub fn list_screen(&self) -> Vec<String> {
        self.screens
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    "Monitor {}: {}x{} (scale: {}){}",
                    i,
                    s.display_info.width,
                    s.display_info.height,
                    s.display_info.scale_factor,
                    if s.display_info.is_primary { " [primary]" } else { "" }
                )
            })
            .collect()
    }

    /// Index of the screen the OS reports as primary, falling back to the first.
    pub fn primary_index(&self) -> usize {
        self.screens
            .iter()
            .position(|s| s.display_info.is_primary)
            .unwrap_or(0)
    }

    /// Captures a specific screen by its index.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`AppError::ScreenNotFound`] if the index is out of bounds
    /// - [`AppError::ScreenCapture`] if the capture operation fails
    pub fn capture_screen_by_index(&self, index: usize) -> Result<CaptureImage> {
        let screen = self
            .screens
            .get(index)
            .ok_or(AppError::ScreenNotFound(index))?;

        let captured = screen
            .capture()
            .map_err(|e| AppError::capture(format!("Failed to capture screen: {}", e)))?;

        // Convert screenshots::Image to image::DynamicImage
        let width = captured.width();
        let height = captured.height();
        let rgba_data = captured.into_raw();

        let img_buffer = image::ImageBuffer::from_raw(width, height, rgba_data)
            .ok_or_else(|| AppError::capture("Failed to create image buffer"))?;

        Ok(CaptureImage::from_image(DynamicImage::ImageRgba8(img_buffer)))
    }

    /// Returns the number of available screens.
    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    /// Gets the dimensions of the primary screen.
    pub fn primary_screen_dimensions(&self) -> Option<(u32, u32)> {
        self.screens
            .get(self.primary_index())
            .map(|s| (s.display_info.width, s.display_info.height))
    }
}

/// Captures a live monitor.
///
/// Screens are re-enumerated on every call so the provider itself holds no
/// platform handles and can move freely between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayCapture {
    monitor_index: Option<usize>,
}

impl DisplayCapture {
    pub fn primary() -> Self {
        Self { monitor_index: None }
    }

    pub fn monitor(index: usize) -> Self {
        Self {
            monitor_index: Some(index),
        }
    }
}

impl CaptureProvider for DisplayCapture {
    fn capture(&self) -> Result<CaptureImage> {
        let capturer = ScreenCapturer::new()?;
        let index = self
            .monitor_index
            .unwrap_or_else(|| capturer.primary_index());
        log::debug!("Capturing monitor {}", index);
        capturer.capture_screen_by_index(index)
    }
}

/// Loads a previously saved screenshot instead of capturing the screen.
#[derive(Debug, Clone)]
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CaptureProvider for FileCapture {
    fn capture(&self) -> Result<CaptureImage> {
        let image = image::open(&self.path).map_err(|e| {
            AppError::capture(format!("Failed to load {}: {}", self.path.display(), e))
        })?;
        Ok(CaptureImage::from_image(image))
    }
}
