//! Pointer-driven region selection.
//!
//! Converts a pointer-down / pointer-move / pointer-up sequence into a single
//! committed rectangle, in the coordinate space of the displayed capture.

/// Minimum width and height (in display pixels) of a usable selection.
pub const MIN_SELECTION_SIZE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle with non-negative width and height.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SelectionRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Bounding box of two corners, whatever direction the drag went.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn is_too_small(&self) -> bool {
        self.width < MIN_SELECTION_SIZE || self.height < MIN_SELECTION_SIZE
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }
}

/// What a pointer release produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectorOutcome {
    /// A usable rectangle; the selector is now spent.
    Committed(SelectionRect),
    /// Too small, or released without a press.
    Discarded,
}

/// Tracks one drag gesture over the capture overlay.
#[derive(Debug, Clone, Default)]
pub struct RegionSelector {
    anchor: Option<Point>,
    current: Option<SelectionRect>,
    committed: bool,
}

impl RegionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the selector still accepts pointer input.
    pub fn is_live(&self) -> bool {
        !self.committed
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    /// The in-progress (or committed) rectangle, if any.
    pub fn current(&self) -> Option<SelectionRect> {
        self.current
    }

    pub fn pointer_down(&mut self, at: Point) -> Option<SelectionRect> {
        if self.committed {
            return None;
        }
        let rect = SelectionRect::new(at.x, at.y, 0.0, 0.0);
        self.anchor = Some(at);
        self.current = Some(rect);
        Some(rect)
    }

    pub fn pointer_move(&mut self, at: Point) -> Option<SelectionRect> {
        let anchor = self.anchor?;
        if self.committed {
            return None;
        }
        let rect = SelectionRect::from_corners(anchor, at);
        self.current = Some(rect);
        Some(rect)
    }

    /// Finishes the gesture at `at`. The result depends only on the press
    /// and release points.
    pub fn pointer_up(&mut self, at: Point) -> SelectorOutcome {
        let Some(anchor) = self.anchor.take() else {
            return SelectorOutcome::Discarded;
        };
        if self.committed {
            return SelectorOutcome::Discarded;
        }

        let rect = SelectionRect::from_corners(anchor, at);
        if rect.is_too_small() {
            log::debug!(
                "Selection {}x{} below minimum, discarding",
                rect.width,
                rect.height
            );
            self.current = None;
            return SelectorOutcome::Discarded;
        }

        self.current = Some(rect);
        self.committed = true;
        SelectorOutcome::Committed(rect)
    }
}
