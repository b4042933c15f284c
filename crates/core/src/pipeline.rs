//! Headless driver that runs one full session without a window.
//!
//! Used by the CLI's `--region` mode and by the integration tests. The steps
//! are the same ones the overlay performs, in the same order.

use crate::answer::AnswerResult;
use crate::capture::CaptureProvider;
use crate::error::Result;
use crate::gemini::{AnswerClient, InferenceTransport};
use crate::selection::{Point, SelectionRect};
use crate::session::{Controller, Phase, PointerUpOutcome};

/// A scripted pointer gesture in display coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    pub down: Point,
    pub moves: Vec<Point>,
    pub up: Point,
}

impl Gesture {
    /// A straight drag from `from` to `to` with a single intermediate move.
    pub fn drag(from: Point, to: Point) -> Self {
        Self {
            down: from,
            moves: vec![to],
            up: to,
        }
    }

    /// The drag that selects exactly `rect`.
    pub fn over(rect: SelectionRect) -> Self {
        Self::drag(
            Point::new(rect.x, rect.y),
            Point::new(rect.max_x(), rect.max_y()),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Answered(AnswerResult),
    /// The selection was too small; nothing was cropped or sent.
    Cancelled,
    /// The capture provider failed; the error was logged.
    CaptureFailed,
    /// Cropping or analysis failed with this user-facing message.
    Failed(String),
}

/// Runs capture, selection, crop and classification in sequence.
///
/// On [`SessionOutcome::Answered`] the controller is left showing the result;
/// in every other case it is back to idle.
///
/// # Errors
///
/// Returns [`crate::AppError::InvalidTransition`] if `controller` is not idle.
pub async fn run_session<P, T>(
    controller: &mut Controller,
    provider: &P,
    client: &AnswerClient<T>,
    gesture: &Gesture,
) -> Result<SessionOutcome>
where
    P: CaptureProvider + ?Sized,
    T: InferenceTransport,
{
    controller.request_capture()?;
    controller.capture_finished(provider.capture())?;
    if controller.phase() != Phase::Selecting {
        return Ok(SessionOutcome::CaptureFailed);
    }

    controller.pointer_down(gesture.down)?;
    for point in &gesture.moves {
        controller.pointer_move(*point)?;
    }

    let cropped = match controller.pointer_up(gesture.up)? {
        PointerUpOutcome::Analyze(cropped) => cropped,
        PointerUpOutcome::Discarded => return Ok(SessionOutcome::Cancelled),
        PointerUpOutcome::Aborted => return Ok(failed(controller)),
    };

    let result = client.solve(&cropped).await;
    controller.analysis_finished(result)?;

    Ok(match controller.answer() {
        Some(answer) => SessionOutcome::Answered(answer.clone()),
        None => failed(controller),
    })
}

fn failed(controller: &mut Controller) -> SessionOutcome {
    let message = controller
        .acknowledge_alert()
        .map(|alert| alert.message)
        .unwrap_or_else(|| "Unknown error".to_string());
    SessionOutcome::Failed(message)
}
