use std::ops::{Add, Sub};

use tracing::trace;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub anchor: Point,
    pub surface_origin: Point,
    pub current_offset: Point,
}

impl DragState {
    fn position(&self) -> Point {
        self.surface_origin + self.current_offset
    }
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    gesture: Option<DragState>,
    resting: Option<Point>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, anchor: Point, surface_origin: Point) {
        trace!(x = anchor.x, y = anchor.y, "drag: begin");
        self.gesture = Some(DragState {
            anchor,
            surface_origin,
            current_offset: Point::default(),
        });
    }

    /// Returns the surface's new absolute position, or `None` outside a gesture.
    pub fn move_to(&mut self, current: Point) -> Option<Point> {
        let gesture = self.gesture.as_mut()?;
        // Always re-derived from the anchor so rounding never accumulates.
        gesture.current_offset = current - gesture.anchor;
        Some(gesture.position())
    }

    pub fn end(&mut self) -> Option<Point> {
        let gesture = self.gesture.take()?;
        let position = gesture.position();
        trace!(x = position.x, y = position.y, "drag: end");
        self.resting = Some(position);
        Some(position)
    }

    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn gesture(&self) -> Option<&DragState> {
        self.gesture.as_ref()
    }

    pub fn position(&self) -> Option<Point> {
        self.gesture
            .as_ref()
            .map(DragState::position)
            .or(self.resting)
    }

    pub fn resting_position(&self) -> Option<Point> {
        self.resting
    }

    pub fn reset(&mut self) {
        self.gesture = None;
        self.resting = None;
    }
}

#[cfg(test)]
#[path = "tests/drag_tests.rs"]
mod tests;
