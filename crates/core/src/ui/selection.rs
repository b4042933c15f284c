//! Bridges egui pointer responses to the region selector.

use crate::selection::{Point, SelectionRect};
use crate::session::Controller;
use eframe::egui;

pub fn to_point(pos: egui::Pos2) -> Point {
    Point::new(pos.x, pos.y)
}

pub fn to_egui_rect(rect: SelectionRect) -> egui::Rect {
    egui::Rect::from_min_size(
        egui::pos2(rect.x, rect.y),
        egui::vec2(rect.width, rect.height),
    )
}

/// Pointer activity on the overlay during one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Drag began; carries the original press position.
    Pressed(Point),
    Moved(Point),
    Released(Point),
    /// Press and release with no drag in between.
    Clicked(Point),
    None,
}

/// Reads the drag state of `response`.
///
/// egui only reports a drag once the pointer has travelled past its drag
/// threshold, so the anchor is taken from the press origin rather than the
/// position at which the drag was recognised. `last` remembers the latest
/// pointer position for frames where egui no longer reports one.
pub fn read_pointer_event(response: &egui::Response, last: &mut Option<Point>) -> PointerEvent {
    let current = response.interact_pointer_pos().map(to_point);

    if response.drag_started() {
        let origin = response
            .ctx
            .input(|i| i.pointer.press_origin())
            .map(to_point)
            .or(current);
        *last = current.or(origin);
        return match origin {
            Some(origin) => PointerEvent::Pressed(origin),
            None => PointerEvent::None,
        };
    }

    if response.dragged() {
        if let Some(pos) = current {
            *last = Some(pos);
            return PointerEvent::Moved(pos);
        }
        return PointerEvent::None;
    }

    if response.drag_stopped() {
        let end = current.or(*last);
        *last = None;
        return match end {
            Some(pos) => PointerEvent::Released(pos),
            None => PointerEvent::None,
        };
    }

    if response.clicked() {
        if let Some(pos) = current {
            return PointerEvent::Clicked(pos);
        }
    }

    PointerEvent::None
}

/// Feeds press and move events to `controller`.
///
/// Returns the release point when the gesture ended this frame; the caller
/// finishes the selection with it.
pub fn route_pointer_event(controller: &mut Controller, event: PointerEvent) -> Option<Point> {
    let (result, release) = match event {
        PointerEvent::Pressed(at) => (controller.pointer_down(at), None),
        PointerEvent::Moved(at) => (controller.pointer_move(at), None),
        PointerEvent::Clicked(at) => (controller.pointer_down(at), Some(at)),
        PointerEvent::Released(at) => return Some(at),
        PointerEvent::None => return None,
    };
    if let Err(e) = result {
        log::warn!("{}", e);
    }
    release
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureImage;
    use crate::session::Phase;
    use image::{DynamicImage, RgbaImage};

    fn selecting() -> Controller {
        let mut controller = Controller::default();
        controller.request_capture().unwrap();
        let screen = RgbaImage::new(400, 300);
        controller
            .capture_finished(Ok(CaptureImage::from_image(DynamicImage::ImageRgba8(screen))))
            .unwrap();
        controller
    }

    #[test]
    fn routes_press_and_move_into_the_selector() {
        let mut controller = selecting();
        let press = PointerEvent::Pressed(Point::new(10.0, 10.0));
        assert_eq!(route_pointer_event(&mut controller, press), None);
        let drag = PointerEvent::Moved(Point::new(60.0, 40.0));
        assert_eq!(route_pointer_event(&mut controller, drag), None);
        assert_eq!(
            controller.selection(),
            Some(SelectionRect::new(10.0, 10.0, 50.0, 30.0))
        );

        let release = PointerEvent::Released(Point::new(60.0, 40.0));
        assert_eq!(
            route_pointer_event(&mut controller, release),
            Some(Point::new(60.0, 40.0))
        );
    }

    #[test]
    fn pointer_outside_selecting_is_rejected_without_state_change() {
        let mut controller = Controller::default();
        let press = PointerEvent::Pressed(Point::new(10.0, 10.0));
        assert_eq!(route_pointer_event(&mut controller, press), None);
        let drag = PointerEvent::Moved(Point::new(60.0, 40.0));
        assert_eq!(route_pointer_event(&mut controller, drag), None);
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.selection().is_none());
    }

    #[test]
    fn click_presses_then_asks_for_release() {
        let mut controller = selecting();
        let click = PointerEvent::Clicked(Point::new(5.0, 5.0));
        assert_eq!(
            route_pointer_event(&mut controller, click),
            Some(Point::new(5.0, 5.0))
        );
        assert_eq!(
            controller.selection(),
            Some(SelectionRect::new(5.0, 5.0, 0.0, 0.0))
        );
    }

    #[test]
    fn rect_conversion_keeps_geometry() {
        let rect = to_egui_rect(SelectionRect::new(100.0, 100.0, 150.0, 80.0));
        assert_eq!(rect.min, egui::pos2(100.0, 100.0));
        assert_eq!(rect.max, egui::pos2(250.0, 180.0));
        assert_eq!(to_point(egui::pos2(3.5, 4.0)), Point::new(3.5, 4.0));
    }
}
