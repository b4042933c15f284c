//! OverSolve Core Library
//!
//! This library provides the core functionality for the OverSolve
//! multiple-choice solver: screen capture, region selection, cropping and
//! Gemini-backed answering.
//!
//! # Overview
//!
//! A user captures the screen, drags a rectangle around a question, and gets
//! back the question text, its options, the correct option and a short
//! explanation. The library handles:
//!
//! - **Screen Capture**: Monitor snapshots via the [`capture`] module
//! - **Region Selection**: Pointer gestures to rectangles via [`selection`]
//! - **Cropping**: Scale-aware region extraction via [`image_processing`]
//! - **Answering**: Gemini calls and answer validation via [`gemini`] and [`answer`]
//! - **Sessions**: The phase state machine in [`session`]
//! - **User Interface**: The overlay window via [`ui`]
//!
//! # Quick Start
//!
//! ```ignore
//! use oversolve_core::OverSolve;
//!
//! let app = OverSolve::new()?;
//! app.run_interactive()?;
//! ```
//!
//! # Module Structure
//!
//! - [`answer`]: Answer types and schema validation
//! - [`capture`]: Screen capture functionality
//! - [`config`]: Configuration loading and management
//! - [`error`]: Error types and result aliases
//! - [`gemini`]: Gemini answer client
//! - [`image_processing`]: Cropping and encoding
//! - [`lifecycle`]: Window close vs. quit handling
//! - [`pipeline`]: Headless session driver
//! - [`selection`]: Region selector
//! - [`session`]: Session controller
//! - [`ui`]: User interface components

pub mod answer;
pub mod capture;
pub mod config;
pub mod error;
pub mod gemini;
pub mod image_processing;
pub mod lifecycle;
pub mod pipeline;
pub mod selection;
pub mod session;
pub mod ui;

// Re-export primary types for convenience
pub use answer::{AnswerOption, AnswerResult};
pub use capture::{CaptureImage, CaptureProvider, DisplayCapture, FileCapture, ScreenCapturer};
pub use config::Config;
pub use error::{AppError, Result};
pub use gemini::{AnswerClient, GeminiTransport};
pub use pipeline::{Gesture, SessionOutcome};
pub use selection::{Point, SelectionRect};
pub use session::{Controller, Phase};

use std::sync::Arc;

/// Main entry point for the OverSolve application.
///
/// This struct provides a facade over the various subsystems,
/// handling initialization and orchestration.
///
/// # Example
///
/// ```ignore
/// use oversolve_core::OverSolve;
///
/// let answer = OverSolve::new()?.solve_region(SelectionRect::new(100.0, 100.0, 150.0, 80.0)).await?;
/// ```
pub struct OverSolve {
    config: Config,
    provider: Arc<dyn CaptureProvider>,
}

impl OverSolve {
    /// Creates a new instance capturing the primary monitor.
    ///
    /// Loads configuration from environment variables (including `.env` files).
    ///
    /// # Errors
    ///
    /// Returns an error if the environment holds an invalid display scale.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Ok(Self::with_config(config))
    }

    /// Creates an instance with custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            provider: Arc::new(DisplayCapture::primary()),
        }
    }

    /// Replaces the screenshot source (a specific monitor, or a file).
    pub fn with_provider(mut self, provider: Arc<dyn CaptureProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Launches the overlay window and blocks until the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the UI cannot be initialized.
    pub fn run_interactive(&self) -> Result<()> {
        ui::run_overlay(self.config.clone(), Arc::clone(&self.provider))
    }

    /// Runs one session without a window, selecting `region`.
    ///
    /// The region is in display coordinates; the configured display scale
    /// (1.0 when unset) maps it into capture pixels.
    pub async fn solve_region(&self, region: SelectionRect) -> Result<SessionOutcome> {
        let mut controller = Controller::new(self.config.display_scale.unwrap_or(1.0));
        let client = AnswerClient::from_config(&self.config);
        pipeline::run_session(
            &mut controller,
            self.provider.as_ref(),
            &client,
            &Gesture::over(region),
        )
        .await
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}
