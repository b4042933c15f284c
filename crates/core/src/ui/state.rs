//! Messages passed from background workers to the UI thread.

use crate::answer::AnswerResult;
use crate::capture::CaptureImage;
use crate::error::Result;

/// Completion of one of the two single-shot background calls.
///
/// Workers send exactly one event each through a channel; the overlay
/// forwards it to the session controller on the next frame.
pub(crate) enum WorkerEvent {
    /// The capture provider finished.
    Captured(Result<CaptureImage>),
    /// The answer service finished.
    Answered(Result<AnswerResult>),
}
