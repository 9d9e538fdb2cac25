use serde::{Deserialize, Serialize};

/// A position on the plan canvas, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PlanPos {
    pub x: f64,
    pub y: f64,
}

impl PlanPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle on the plan canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

pub const DEFAULT_CARD_WIDTH: f64 = 400.0;
pub const DEFAULT_CARD_BASE_HEIGHT: f64 = 180.0;
pub const DEFAULT_CARD_HEIGHT_PER_SLOT: f64 = 60.0;
pub const DEFAULT_CARD_VERTICAL_GAP: f64 = 40.0;
pub const DEFAULT_CARD_HORIZONTAL_GAP: f64 = 120.0;

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Open-interval overlap test: rectangles that only touch along an edge
    /// do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }

    /// Open-interval overlap test on the X axis only.
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        !(self.right() <= other.x || other.right() <= self.x)
    }
}
