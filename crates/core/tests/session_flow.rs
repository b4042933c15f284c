//! End-to-end session tests.
//!
//! Each test drives a full capture → select → crop → solve cycle through the
//! public API with an in-memory capture and a scripted answer service.

use futures::future::BoxFuture;
use image::{DynamicImage, Rgba, RgbaImage};
use oversolve_core::gemini::{InferenceRequest, InferenceTransport};
use oversolve_core::pipeline::run_session;
use oversolve_core::{
    AppError, AnswerClient, CaptureImage, CaptureProvider, Config, Controller, Gesture, Phase,
    Point, Result, SessionOutcome,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

const ADDITION: &str = r#"{"question":"2+2=?","options":[{"label":"A","text":"3"},{"label":"B","text":"4"}],"answerLabel":"B","explanation":"Basic addition."}"#;

// ── Fakes ───────────────────────────────────────────────────────────

struct StillScreen {
    width: u32,
    height: u32,
    calls: AtomicUsize,
}

impl StillScreen {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: AtomicUsize::new(0),
        }
    }
}

impl CaptureProvider for StillScreen {
    fn capture(&self) -> Result<CaptureImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let img = RgbaImage::from_pixel(self.width, self.height, Rgba([240, 240, 240, 255]));
        Ok(CaptureImage::from_image(DynamicImage::ImageRgba8(img)))
    }
}

struct BrokenScreen;

impl CaptureProvider for BrokenScreen {
    fn capture(&self) -> Result<CaptureImage> {
        CaptureImage::from_encoded("")
    }
}

/// Replies with fixed text and records the image sizes it was sent.
struct ScriptedModel {
    reply: String,
    calls: AtomicUsize,
    images: Mutex<Vec<(u32, u32)>>,
}

impl ScriptedModel {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            images: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InferenceTransport for ScriptedModel {
    fn generate<'a>(&'a self, request: InferenceRequest<'a>) -> BoxFuture<'a, Result<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let uri = format!("data:{};base64,{}", request.mime_type, request.image_data);
        let sent = CaptureImage::from_encoded(&uri).expect("client sent a decodable PNG");
        self.images
            .lock()
            .unwrap()
            .push((sent.width(), sent.height()));
        let reply = self.reply.clone();
        Box::pin(async move { Ok(reply) })
    }
}

fn config(api_key: &str) -> Config {
    Config::builder().with_api_key(api_key).build().unwrap()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn drag_crop_and_solve_reaches_result() {
    let screen = StillScreen::new(1920, 1080);
    let client = AnswerClient::with_transport(
        &config("test-key"),
        ScriptedModel::replying(&format!("```json\n{}\n```", ADDITION)),
    );
    let mut controller = Controller::default();

    let gesture = Gesture::drag(Point::new(100.0, 100.0), Point::new(250.0, 180.0));
    let outcome = run_session(&mut controller, &screen, &client, &gesture)
        .await
        .unwrap();

    let SessionOutcome::Answered(answer) = outcome else {
        panic!("expected an answer, got {:?}", outcome);
    };
    assert_eq!(answer.question, "2+2=?");
    assert_eq!(answer.correct_option().unwrap().label, "B");

    assert_eq!(controller.phase(), Phase::Result);
    assert_eq!(controller.answer(), Some(&answer));
    assert_eq!(*client.transport().images.lock().unwrap(), vec![(150, 80)]);

    controller.dismiss().unwrap();
    assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn tiny_selection_never_reaches_the_model() {
    let screen = StillScreen::new(1920, 1080);
    let client = AnswerClient::with_transport(&config("test-key"), ScriptedModel::replying(ADDITION));
    let mut controller = Controller::default();

    let gesture = Gesture {
        down: Point::new(50.0, 50.0),
        moves: vec![],
        up: Point::new(52.0, 51.0),
    };
    let outcome = run_session(&mut controller, &screen, &client, &gesture)
        .await
        .unwrap();

    assert_eq!(outcome, SessionOutcome::Cancelled);
    assert_eq!(controller.phase(), Phase::Idle);
    assert_eq!(client.transport().calls(), 0);
    assert!(controller.alert().is_none());
}

#[tokio::test]
async fn missing_key_fails_before_any_call() {
    let screen = StillScreen::new(800, 600);
    let client = AnswerClient::with_transport(&config(""), ScriptedModel::replying(ADDITION));
    let mut controller = Controller::default();

    let gesture = Gesture::drag(Point::new(10.0, 10.0), Point::new(200.0, 120.0));
    let outcome = run_session(&mut controller, &screen, &client, &gesture)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SessionOutcome::Failed("AI Error: Gemini API Key is missing.".to_string())
    );
    assert_eq!(client.transport().calls(), 0);
    assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn prose_reply_surfaces_generic_parse_alert() {
    let screen = StillScreen::new(800, 600);
    let client = AnswerClient::with_transport(
        &config("test-key"),
        ScriptedModel::replying("I think the answer is B, since 2+2 is 4."),
    );
    let mut controller = Controller::default();

    let gesture = Gesture::drag(Point::new(10.0, 10.0), Point::new(200.0, 120.0));
    let outcome = run_session(&mut controller, &screen, &client, &gesture)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SessionOutcome::Failed("Failed to parse AI response.".to_string())
    );
    assert_eq!(client.transport().calls(), 1);
}

#[tokio::test]
async fn capture_failure_ends_session_quietly() {
    let client = AnswerClient::with_transport(&config("test-key"), ScriptedModel::replying(ADDITION));
    let mut controller = Controller::default();

    let gesture = Gesture::drag(Point::new(10.0, 10.0), Point::new(200.0, 120.0));
    let outcome = run_session(&mut controller, &BrokenScreen, &client, &gesture)
        .await
        .unwrap();

    assert_eq!(outcome, SessionOutcome::CaptureFailed);
    assert_eq!(controller.phase(), Phase::Idle);
    assert!(controller.alert().is_none());
    assert_eq!(client.transport().calls(), 0);
}

#[tokio::test]
async fn busy_controller_rejects_a_second_session() {
    let screen = StillScreen::new(800, 600);
    let client = AnswerClient::with_transport(&config("test-key"), ScriptedModel::replying(ADDITION));
    let mut controller = Controller::default();
    controller.request_capture().unwrap();

    let gesture = Gesture::drag(Point::new(10.0, 10.0), Point::new(200.0, 120.0));
    let result = run_session(&mut controller, &screen, &client, &gesture).await;

    assert!(matches!(result, Err(AppError::InvalidTransition { .. })));
    assert_eq!(screen.calls.load(Ordering::SeqCst), 0);
    assert_eq!(controller.phase(), Phase::Capturing);
}

#[tokio::test]
async fn hidpi_scale_crops_in_capture_pixels() {
    let screen = StillScreen::new(3840, 2160);
    let client = AnswerClient::with_transport(&config("test-key"), ScriptedModel::replying(ADDITION));
    let mut controller = Controller::new(2.0);

    let gesture = Gesture::drag(Point::new(100.0, 100.0), Point::new(250.0, 180.0));
    run_session(&mut controller, &screen, &client, &gesture)
        .await
        .unwrap();

    assert_eq!(*client.transport().images.lock().unwrap(), vec![(300, 160)]);
}
