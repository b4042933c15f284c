//! Main overlay application.
//!
//! This module contains the `OverlayApp` struct which implements the
//! `eframe::App` trait. It renders whatever phase the session controller is
//! in and runs the capture and answer calls on background threads.

use super::rendering::{
    DIM_ALPHA, SELECTION_COLOR, draw_hint, draw_selection_border, draw_selection_overlay,
    option_style,
};
use super::selection::{read_pointer_event, route_pointer_event, to_egui_rect};
use super::state::WorkerEvent;
use crate::capture::{CaptureImage, CaptureProvider};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::gemini::AnswerClient;
use crate::image_processing::CroppedImage;
use crate::lifecycle::{AppLifecycle, CloseAction};
use crate::selection::Point;
use crate::session::{Controller, Phase, PointerUpOutcome};
use eframe::egui;
use egui_commonmark::{CommonMarkCache, CommonMarkViewer};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;
use std::time::Duration;

/// Time given to the window manager to minimise us before capturing.
const HIDE_DELAY: Duration = Duration::from_millis(300);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct OverlayApp {
    controller: Controller,
    provider: Arc<dyn CaptureProvider>,
    client: Arc<AnswerClient>,
    lifecycle: AppLifecycle,
    /// Derive the display scale from the overlay size when not configured.
    auto_scale: bool,

    // Capture texture, present only while selecting
    texture: Option<egui::TextureHandle>,
    pending_image: Option<egui::ColorImage>,
    last_pointer: Option<Point>,

    tx: Sender<WorkerEvent>,
    rx: Receiver<WorkerEvent>,

    markdown_cache: CommonMarkCache,
    copied: bool,
}

impl OverlayApp {
    pub fn new(config: Config, provider: Arc<dyn CaptureProvider>) -> Self {
        let (tx, rx) = channel();
        let client = Arc::new(AnswerClient::from_config(&config));

        Self {
            controller: Controller::new(config.display_scale.unwrap_or(1.0)),
            provider,
            client,
            lifecycle: AppLifecycle::new(),
            auto_scale: config.display_scale.is_none(),
            texture: None,
            pending_image: None,
            last_pointer: None,
            tx,
            rx,
            markdown_cache: CommonMarkCache::default(),
            copied: false,
        }
    }

    /// Minimises the window and captures the screen on a worker thread.
    fn start_capture(&mut self, ctx: &egui::Context) {
        if let Err(e) = self.controller.request_capture() {
            log::warn!("{}", e);
            return;
        }
        self.copied = false;
        ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true));

        let tx = self.tx.clone();
        let provider = Arc::clone(&self.provider);
        let ctx = ctx.clone();

        thread::spawn(move || {
            thread::sleep(HIDE_DELAY);
            let _ = tx.send(WorkerEvent::Captured(provider.capture()));
            ctx.request_repaint();
        });
    }

    /// Sends the cropped question to Gemini on a worker thread.
    fn submit_analysis(&mut self, ctx: &egui::Context, cropped: CroppedImage) {
        let tx = self.tx.clone();
        let client = Arc::clone(&self.client);
        let ctx = ctx.clone();

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();

            let result = match runtime {
                Ok(rt) => rt.block_on(client.solve(&cropped)),
                Err(e) => Err(AppError::Io(e)),
            };

            let _ = tx.send(WorkerEvent::Answered(result));
            ctx.request_repaint();
        });
    }

    /// Processes completed worker calls.
    fn process_worker_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                WorkerEvent::Captured(result) => self.on_captured(ctx, result),
                WorkerEvent::Answered(result) => {
                    if let Err(e) = self.controller.analysis_finished(result) {
                        log::warn!("{}", e);
                    }
                }
            }
        }
    }

    fn on_captured(&mut self, ctx: &egui::Context, result: Result<CaptureImage>) {
        if let Ok(capture) = &result {
            self.pending_image = Some(to_color_image(capture));
        }
        if let Err(e) = self.controller.capture_finished(result) {
            log::warn!("{}", e);
        }

        ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(false));
        if self.controller.phase() == Phase::Selecting {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(true));
            ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
        } else {
            self.pending_image = None;
        }
    }

    /// Returns from the fullscreen overlay to the panel window.
    fn leave_overlay(&mut self, ctx: &egui::Context) {
        self.texture = None;
        self.pending_image = None;
        self.last_pointer = None;
        ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(false));
    }

    fn finish_selection(&mut self, ctx: &egui::Context, at: Point) {
        match self.controller.pointer_up(at) {
            Ok(PointerUpOutcome::Analyze(cropped)) => {
                self.leave_overlay(ctx);
                self.submit_analysis(ctx, cropped);
            }
            Ok(PointerUpOutcome::Discarded | PointerUpOutcome::Aborted) => self.leave_overlay(ctx),
            Err(e) => log::warn!("{}", e),
        }
    }

    fn handle_close_request(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.viewport().close_requested()) {
            return;
        }
        match self.lifecycle.on_close_requested() {
            CloseAction::Quit => {}
            CloseAction::Hide => {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true));
            }
        }
    }

    /// Renders the fullscreen screenshot with the drag-to-select overlay.
    fn render_selecting(&mut self, ctx: &egui::Context) {
        if let Some(color_image) = self.pending_image.take() {
            self.texture = Some(ctx.load_texture(
                "screenshot",
                color_image,
                egui::TextureOptions::LINEAR,
            ));
        }

        let panel_frame = egui::Frame::default()
            .inner_margin(egui::Margin::same(0))
            .outer_margin(egui::Margin::same(0));

        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| {
                let screen_rect = ui.max_rect();

                if self.auto_scale {
                    let capture_width = self.controller.capture().map(|c| c.width());
                    if let Some(width) = capture_width {
                        if screen_rect.width() > 0.0 {
                            self.controller
                                .set_display_scale(width as f32 / screen_rect.width());
                        }
                    }
                }

                if let Some(texture) = &self.texture {
                    ui.painter().image(
                        texture.id(),
                        screen_rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }

                let response = ui.interact(
                    screen_rect,
                    ui.id().with("selection"),
                    egui::Sense::click_and_drag(),
                );

                let event = read_pointer_event(&response, &mut self.last_pointer);
                if let Some(at) = route_pointer_event(&mut self.controller, event) {
                    self.finish_selection(ctx, at);
                }

                if ctx.input(|i| i.key_pressed(egui::Key::Escape))
                    && self.controller.cancel_selection().is_ok()
                {
                    self.leave_overlay(ctx);
                }

                match self.controller.selection() {
                    Some(selection) => {
                        let selection_rect = to_egui_rect(selection);
                        draw_selection_overlay(ui.painter(), screen_rect, selection_rect, DIM_ALPHA);
                        draw_selection_border(ui.painter(), selection_rect, 2.0, SELECTION_COLOR);
                    }
                    None => {
                        ui.painter().rect_filled(
                            screen_rect,
                            0.0,
                            egui::Color32::from_black_alpha(DIM_ALPHA),
                        );
                    }
                }

                draw_hint(ui.painter(), screen_rect, "Drag to select the question...");
            });
    }

    /// Renders the windowed panel for every phase except selecting.
    fn render_panel(&mut self, ctx: &egui::Context, phase: Phase) {
        egui::TopBottomPanel::top("title_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new("OverSolve")
                        .strong()
                        .color(SELECTION_COLOR),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Quit").clicked() {
                        self.lifecycle.request_quit();
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                    if ui.button("Hide").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true));
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading("MCQ Solver");
                ui.label(
                    egui::RichText::new("Snap a picture of any multiple-choice question.")
                        .color(egui::Color32::GRAY),
                );
                ui.add_space(16.0);
            });

            match phase {
                Phase::Idle => self.render_idle(ui, ctx),
                Phase::Capturing => render_busy(ui, "Capturing screen..."),
                Phase::Analyzing => {
                    let message = format!("Analyzing with {}...", self.client.model());
                    render_busy(ui, &message);
                }
                Phase::Result => self.render_result(ui),
                Phase::Selecting => {}
            }
        });

        self.render_alert(ctx);
    }

    fn render_idle(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.vertical_centered(|ui| {
            let button = egui::Button::new(egui::RichText::new("Click to Capture Screen").size(18.0))
                .min_size(egui::vec2(320.0, 120.0));
            let enabled = self.controller.alert().is_none();
            if ui.add_enabled(enabled, button).clicked() {
                self.start_capture(ctx);
            }
        });
    }

    fn render_result(&mut self, ui: &mut egui::Ui) {
        let Some(answer) = self.controller.answer().cloned() else {
            return;
        };

        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.label(egui::RichText::new(&answer.question).size(17.0).strong());
            ui.add_space(10.0);

            for option in &answer.options {
                let (fill, stroke, text_color) = option_style(answer.is_correct(option));
                egui::Frame::default()
                    .fill(fill)
                    .stroke(stroke)
                    .corner_radius(6.0)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new(&option.label).strong().color(text_color));
                            ui.label(egui::RichText::new(&option.text).color(text_color));
                        });
                    });
                ui.add_space(4.0);
            }

            ui.add_space(10.0);
            ui.label(egui::RichText::new("Explanation").strong().color(SELECTION_COLOR));
            CommonMarkViewer::new().show(ui, &mut self.markdown_cache, &answer.explanation);

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Copy answer").clicked() {
                    self.copied = copy_answer(&answer);
                }
                if self.copied {
                    ui.label(egui::RichText::new("Copied").color(egui::Color32::GRAY));
                }
                if ui.button("Solve Another").clicked() {
                    self.copied = false;
                    if let Err(e) = self.controller.dismiss() {
                        log::warn!("{}", e);
                    }
                }
            });
        });
    }

    /// Blocking error window; capture stays disabled until acknowledged.
    fn render_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.controller.alert().map(|a| a.message.clone()) else {
            return;
        };

        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(message).color(egui::Color32::LIGHT_RED));
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    self.controller.acknowledge_alert();
                }
            });
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Enforce dark mode
        ctx.set_visuals(egui::Visuals::dark());

        self.process_worker_events(ctx);
        self.handle_close_request(ctx);

        let phase = self.controller.phase();
        match phase {
            Phase::Selecting => self.render_selecting(ctx),
            _ => self.render_panel(ctx, phase),
        }

        if matches!(phase, Phase::Capturing | Phase::Analyzing) {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}

fn render_busy(ui: &mut egui::Ui, message: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(40.0);
        ui.spinner();
        ui.label(egui::RichText::new(message).color(SELECTION_COLOR));
    });
}

fn copy_answer(answer: &crate::answer::AnswerResult) -> bool {
    let Some(option) = answer.correct_option() else {
        return false;
    };
    let text = format!("{}. {}", option.label, option.text);
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to copy to clipboard: {}", e);
            false
        }
    }
}

/// Converts the capture for texture upload.
fn to_color_image(capture: &CaptureImage) -> egui::ColorImage {
    let image_buffer = capture.image().to_rgba8();
    let size = [capture.width() as usize, capture.height() as usize];
    let pixels = image_buffer.as_flat_samples();
    egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice())
}

/// Opens the overlay window and blocks until the user quits.
pub fn run(config: Config, provider: Arc<dyn CaptureProvider>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("OverSolve")
            .with_inner_size([900.0, 600.0])
            .with_min_inner_size([400.0, 300.0])
            .with_always_on_top(),
        ..Default::default()
    };

    eframe::run_native(
        "OverSolve",
        options,
        Box::new(move |_cc| Ok(Box::new(OverlayApp::new(config, provider)) as Box<dyn eframe::App>)),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))
}
