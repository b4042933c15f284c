//! UI rendering helpers for the capture overlay and the answer card.

use eframe::egui;

/// Dimming applied around the selection, and over everything before a drag.
pub const DIM_ALPHA: u8 = 128;

pub const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(96, 165, 250);

/// Draws the dark overlay with a transparent "cutout" for the selection area.
///
/// # Arguments
/// * `painter` - The egui painter to draw with
/// * `screen_rect` - The full screen rectangle
/// * `selection_rect` - The selected area to keep clear
/// * `alpha` - Darkness level (0-255, higher = darker)
pub fn draw_selection_overlay(
    painter: &egui::Painter,
    screen_rect: egui::Rect,
    selection_rect: egui::Rect,
    alpha: u8,
) {
    let color = egui::Color32::from_black_alpha(alpha);
    let sel = selection_rect.intersect(screen_rect);

    // Above, below, left, right of the selection
    let bands = [
        egui::Rect::from_min_max(screen_rect.min, egui::pos2(screen_rect.max.x, sel.min.y)),
        egui::Rect::from_min_max(egui::pos2(screen_rect.min.x, sel.max.y), screen_rect.max),
        egui::Rect::from_min_max(
            egui::pos2(screen_rect.min.x, sel.min.y),
            egui::pos2(sel.min.x, sel.max.y),
        ),
        egui::Rect::from_min_max(
            egui::pos2(sel.max.x, sel.min.y),
            egui::pos2(screen_rect.max.x, sel.max.y),
        ),
    ];

    for band in bands {
        if band.is_positive() {
            painter.rect_filled(band, 0.0, color);
        }
    }
}

/// Draws a border around the selection rectangle.
pub fn draw_selection_border(
    painter: &egui::Painter,
    selection_rect: egui::Rect,
    stroke_width: f32,
    color: egui::Color32,
) {
    painter.rect_stroke(
        selection_rect,
        0.0,
        egui::Stroke::new(stroke_width, color),
        egui::StrokeKind::Middle,
    );
}

/// Draws the instruction pill centred at the top of the overlay.
pub fn draw_hint(painter: &egui::Painter, screen_rect: egui::Rect, text: &str) {
    let font = egui::FontId::proportional(15.0);
    let galley = painter.layout_no_wrap(text.to_string(), font, egui::Color32::WHITE);
    let size = galley.size() + egui::vec2(32.0, 16.0);
    let pill = egui::Rect::from_center_size(
        egui::pos2(screen_rect.center().x, screen_rect.min.y + 16.0 + size.y / 2.0),
        size,
    );

    painter.rect_filled(pill, size.y / 2.0, egui::Color32::from_black_alpha(204));
    painter.galley(pill.center() - galley.size() / 2.0, galley, egui::Color32::WHITE);
}

/// Colours for one answer option: (fill, stroke, text).
pub fn option_style(is_answer: bool) -> (egui::Color32, egui::Stroke, egui::Color32) {
    if is_answer {
        (
            egui::Color32::from_rgba_unmultiplied(34, 197, 94, 26),
            egui::Stroke::new(1.0, egui::Color32::from_rgb(34, 197, 94)),
            egui::Color32::from_rgb(220, 252, 231),
        )
    } else {
        (
            egui::Color32::from_rgb(51, 65, 85),
            egui::Stroke::new(1.0, egui::Color32::from_rgb(71, 85, 105)),
            egui::Color32::from_rgb(203, 213, 225),
        )
    }
}
