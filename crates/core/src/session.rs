//! Session state machine for one capture → select → solve → result cycle.
//!
//! The [`Controller`] owns the only capture, selection and answer in flight.
//! Every operation is legal in exactly one [`Phase`]; anything else returns
//! [`AppError::InvalidTransition`] and leaves the state untouched.
//!
//! ```text
//! Idle --request_capture--> Capturing --ok--> Selecting --commit--> Analyzing --ok--> Result
//!   ^                           |err              |cancel/too small      |err            |dismiss
//!   +---------------------------+-----------------+----------------------+---------------+
//! ```

use crate::answer::AnswerResult;
use crate::capture::CaptureImage;
use crate::error::{AppError, Result};
use crate::image_processing::{CroppedImage, ImageProcessor};
use crate::selection::{Point, RegionSelector, SelectionRect, SelectorOutcome};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Capturing,
    Selecting,
    Analyzing,
    Result,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Capturing => "capturing",
            Phase::Selecting => "selecting",
            Phase::Analyzing => "analyzing",
            Phase::Result => "showing a result",
        };
        f.write_str(name)
    }
}

/// Per-phase data. Each phase carries only what it needs.
#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Capturing,
    Selecting {
        capture: CaptureImage,
        selector: RegionSelector,
    },
    Analyzing {
        selection: SelectionRect,
    },
    Result {
        answer: AnswerResult,
    },
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        match self {
            SessionState::Idle => Phase::Idle,
            SessionState::Capturing => Phase::Capturing,
            SessionState::Selecting { .. } => Phase::Selecting,
            SessionState::Analyzing { .. } => Phase::Analyzing,
            SessionState::Result { .. } => Phase::Result,
        }
    }
}

/// A blocking, user-facing error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
}

impl Alert {
    fn for_analysis(error: &AppError) -> Self {
        let message = match error {
            AppError::UnparsableResponse => "Failed to parse AI response.".to_string(),
            other => format!("AI Error: {}", other),
        };
        Self { message }
    }
}

/// Result of releasing the pointer while selecting.
#[derive(Debug)]
pub enum PointerUpOutcome {
    /// The crop is ready; the session is now analyzing it.
    Analyze(CroppedImage),
    /// Selection too small; back to idle.
    Discarded,
    /// Cropping failed; back to idle with an alert raised.
    Aborted,
}

pub struct Controller {
    state: SessionState,
    display_scale: f32,
    alert: Option<Alert>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Controller {
    pub fn new(display_scale: f32) -> Self {
        Self {
            state: SessionState::Idle,
            display_scale,
            alert: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn display_scale(&self) -> f32 {
        self.display_scale
    }

    /// Sets the pointer-to-capture scale used for the next crop.
    pub fn set_display_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.display_scale = scale;
        } else {
            log::warn!("Ignoring invalid display scale {}", scale);
        }
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn acknowledge_alert(&mut self) -> Option<Alert> {
        self.alert.take()
    }

    /// The capture being selected on, while selecting.
    pub fn capture(&self) -> Option<&CaptureImage> {
        match &self.state {
            SessionState::Selecting { capture, .. } => Some(capture),
            _ => None,
        }
    }

    /// The rectangle to draw: in progress while selecting, committed while analyzing.
    pub fn selection(&self) -> Option<SelectionRect> {
        match &self.state {
            SessionState::Selecting { selector, .. } => selector.current(),
            SessionState::Analyzing { selection } => Some(*selection),
            _ => None,
        }
    }

    pub fn answer(&self) -> Option<&AnswerResult> {
        match &self.state {
            SessionState::Result { answer } => Some(answer),
            _ => None,
        }
    }

    fn expect(&self, phase: Phase, action: &'static str) -> Result<()> {
        if self.phase() == phase {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                from: self.phase(),
                action,
            })
        }
    }

    pub fn request_capture(&mut self) -> Result<()> {
        self.expect(Phase::Idle, "start a capture")?;
        self.alert = None;
        self.state = SessionState::Capturing;
        log::info!("Capture requested");
        Ok(())
    }

    /// Capture failures are logged and end the session silently.
    pub fn capture_finished(&mut self, result: Result<CaptureImage>) -> Result<()> {
        self.expect(Phase::Capturing, "finish a capture")?;
        self.state = match result {
            Ok(capture) => {
                log::info!("Captured {}x{} screen", capture.width(), capture.height());
                SessionState::Selecting {
                    capture,
                    selector: RegionSelector::new(),
                }
            }
            Err(e) => {
                log::error!("Capture failed: {}", e);
                SessionState::Idle
            }
        };
        Ok(())
    }

    pub fn pointer_down(&mut self, at: Point) -> Result<()> {
        match &mut self.state {
            SessionState::Selecting { selector, .. } => {
                selector.pointer_down(at);
                Ok(())
            }
            other => Err(AppError::InvalidTransition {
                from: other.phase(),
                action: "start a selection",
            }),
        }
    }

    pub fn pointer_move(&mut self, at: Point) -> Result<()> {
        match &mut self.state {
            SessionState::Selecting { selector, .. } => {
                selector.pointer_move(at);
                Ok(())
            }
            other => Err(AppError::InvalidTransition {
                from: other.phase(),
                action: "drag a selection",
            }),
        }
    }

    /// Finishes the drag. A committed rectangle is cropped immediately and
    /// the capture is released.
    pub fn pointer_up(&mut self, at: Point) -> Result<PointerUpOutcome> {
        let (capture, mut selector) = match std::mem::take(&mut self.state) {
            SessionState::Selecting { capture, selector } => (capture, selector),
            other => {
                let from = other.phase();
                self.state = other;
                return Err(AppError::InvalidTransition {
                    from,
                    action: "commit a selection",
                });
            }
        };

        let selection = match selector.pointer_up(at) {
            SelectorOutcome::Committed(rect) => rect,
            SelectorOutcome::Discarded => {
                log::info!("Selection cancelled");
                return Ok(PointerUpOutcome::Discarded);
            }
        };

        match ImageProcessor::crop(&capture, selection, self.display_scale) {
            Ok(cropped) => {
                let (w, h) = cropped.dimensions();
                log::info!("Cropped {}x{} region, analyzing", w, h);
                self.state = SessionState::Analyzing { selection };
                Ok(PointerUpOutcome::Analyze(cropped))
            }
            Err(e) => {
                log::error!("Crop failed: {}", e);
                self.alert = Some(Alert {
                    message: e.to_string(),
                });
                Ok(PointerUpOutcome::Aborted)
            }
        }
    }

    /// Abandons the selection without cropping.
    pub fn cancel_selection(&mut self) -> Result<()> {
        self.expect(Phase::Selecting, "cancel a selection")?;
        self.state = SessionState::Idle;
        log::info!("Selection cancelled");
        Ok(())
    }

    pub fn analysis_finished(&mut self, result: Result<AnswerResult>) -> Result<()> {
        self.expect(Phase::Analyzing, "finish an analysis")?;
        self.state = match result {
            Ok(answer) => {
                log::info!("Answer received: {}", answer.answer_label);
                SessionState::Result { answer }
            }
            Err(e) => {
                log::error!("Analysis failed: {}", e);
                self.alert = Some(Alert::for_analysis(&e));
                SessionState::Idle
            }
        };
        Ok(())
    }

    pub fn dismiss(&mut self) -> Result<()> {
        self.expect(Phase::Result, "dismiss a result")?;
        self.state = SessionState::Idle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::AnswerOption;
    use image::{DynamicImage, RgbaImage};

    fn capture() -> CaptureImage {
        CaptureImage::from_image(DynamicImage::ImageRgba8(RgbaImage::new(400, 300)))
    }

    fn answer() -> AnswerResult {
        AnswerResult {
            question: "Capital of France?".into(),
            options: vec![
                AnswerOption { label: "A".into(), text: "Paris".into() },
                AnswerOption { label: "B".into(), text: "Rome".into() },
            ],
            answer_label: "A".into(),
            explanation: "Paris is the capital.".into(),
        }
    }

    fn selecting() -> Controller {
        let mut controller = Controller::default();
        controller.request_capture().unwrap();
        controller.capture_finished(Ok(capture())).unwrap();
        controller
    }

    #[test]
    fn full_cycle_returns_to_idle() {
        let mut controller = selecting();
        assert_eq!(controller.phase(), Phase::Selecting);
        assert!(controller.capture().is_some());

        controller.pointer_down(Point::new(10.0, 10.0)).unwrap();
        controller.pointer_move(Point::new(60.0, 40.0)).unwrap();
        assert_eq!(
            controller.selection(),
            Some(SelectionRect::new(10.0, 10.0, 50.0, 30.0))
        );

        let outcome = controller.pointer_up(Point::new(60.0, 40.0)).unwrap();
        assert!(matches!(outcome, PointerUpOutcome::Analyze(ref c) if c.dimensions() == (50, 30)));
        assert_eq!(controller.phase(), Phase::Analyzing);
        assert!(controller.capture().is_none());

        controller.analysis_finished(Ok(answer())).unwrap();
        assert_eq!(controller.phase(), Phase::Result);
        assert_eq!(controller.answer().unwrap().answer_label, "A");

        controller.dismiss().unwrap();
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn capture_failure_is_silent() {
        let mut controller = Controller::default();
        controller.request_capture().unwrap();
        controller
            .capture_finished(Err(AppError::capture("no display")))
            .unwrap();
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.alert().is_none());
    }

    #[test]
    fn small_selection_returns_to_idle() {
        let mut controller = selecting();
        controller.pointer_down(Point::new(50.0, 50.0)).unwrap();
        let outcome = controller.pointer_up(Point::new(52.0, 51.0)).unwrap();
        assert!(matches!(outcome, PointerUpOutcome::Discarded));
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn cancel_drops_the_capture() {
        let mut controller = selecting();
        controller.cancel_selection().unwrap();
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.capture().is_none());
    }

    #[test]
    fn analysis_errors_raise_alerts() {
        let mut controller = selecting();
        controller.pointer_down(Point::new(0.0, 0.0)).unwrap();
        controller.pointer_up(Point::new(100.0, 100.0)).unwrap();
        controller
            .analysis_finished(Err(AppError::UnparsableResponse))
            .unwrap();
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(
            controller.alert().unwrap().message,
            "Failed to parse AI response."
        );

        controller.request_capture().unwrap();
        assert!(controller.alert().is_none());
        controller.capture_finished(Ok(capture())).unwrap();
        controller.pointer_down(Point::new(0.0, 0.0)).unwrap();
        controller.pointer_up(Point::new(100.0, 100.0)).unwrap();
        controller
            .analysis_finished(Err(AppError::gemini("timeout")))
            .unwrap();
        let alert = controller.acknowledge_alert().unwrap();
        assert_eq!(alert.message, "AI Error: Gemini API error: timeout");
        assert!(controller.alert().is_none());
    }

    #[test]
    fn only_one_session_at_a_time() {
        let mut controller = selecting();
        let err = controller.request_capture().unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition { from: Phase::Selecting, .. }
        ));

        controller.pointer_down(Point::new(0.0, 0.0)).unwrap();
        controller.pointer_up(Point::new(40.0, 40.0)).unwrap();
        assert!(controller.request_capture().is_err());
        assert!(controller.pointer_down(Point::new(1.0, 1.0)).is_err());
        assert!(controller.dismiss().is_err());
        assert_eq!(controller.phase(), Phase::Analyzing);
    }

    #[test]
    fn invalid_transition_message_names_phase() {
        let mut controller = Controller::default();
        let err = controller.dismiss().unwrap_err();
        assert_eq!(err.to_string(), "Cannot dismiss a result while idle");
    }

    #[test]
    fn scale_applies_to_crop() {
        let mut controller = selecting();
        controller.set_display_scale(2.0);
        controller.set_display_scale(-1.0);
        assert_eq!(controller.display_scale(), 2.0);

        controller.pointer_down(Point::new(0.0, 0.0)).unwrap();
        let outcome = controller.pointer_up(Point::new(20.0, 15.0)).unwrap();
        assert!(matches!(outcome, PointerUpOutcome::Analyze(ref c) if c.dimensions() == (40, 30)));
    }
}
