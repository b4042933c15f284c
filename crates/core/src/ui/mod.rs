//! User interface components for OverSolve.
//!
//! This module provides the overlay window that walks a user through one
//! capture → select → solve → result session at a time.
//!
//! # Architecture
//!
//! The UI is split into focused submodules:
//! - [`state`]: Messages from background workers
//! - [`rendering`]: Drawing utilities for overlays, borders and answer cards
//! - [`selection`]: egui pointer handling for the region selector
//! - [`overlay`]: Main application logic
//!
//! All session decisions live in [`crate::session::Controller`]; this module
//! only renders its phase and feeds it events.
//!
//! # Usage
//!
//! ```ignore
//! use oversolve_core::{ui, Config, capture::DisplayCapture};
//! use std::sync::Arc;
//!
//! let config = Config::load()?;
//! ui::run_overlay(config, Arc::new(DisplayCapture::primary()))?;
//! ```

mod overlay;
mod rendering;
mod selection;
mod state;

pub use overlay::OverlayApp;
pub use selection::{PointerEvent, read_pointer_event, route_pointer_event, to_egui_rect, to_point};

use crate::capture::CaptureProvider;
use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;

/// Opens the overlay window and blocks until the user quits.
///
/// # Arguments
/// * `config` - Application configuration with the API key and model
/// * `provider` - Where screenshots come from
///
/// # Errors
/// Returns [`crate::AppError::Ui`] if the native window cannot be created.
pub fn run_overlay(config: Config, provider: Arc<dyn CaptureProvider>) -> Result<()> {
    overlay::run(config, provider)
}
