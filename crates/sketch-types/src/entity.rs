use serde::{Deserialize, Serialize};

/// Length below which a line direction is considered degenerate.
const DEGENERATE_LENGTH: f64 = 1e-12;

/// The shape of a sketch entity together with its numeric parameters.
///
/// Each variant carries a fixed number of parameters, addressable by slot
/// index through [`Geometry::param`] / [`Geometry::set_param`]:
/// point `[x, y]`, line `[x1, y1, x2, y2]`, circle `[cx, cy, radius]`,
/// arc `[cx, cy, radius, start_angle, end_angle]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        x: f64,
        y: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        radius: f64,
    },
    Arc {
        cx: f64,
        cy: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
}

/// Classification of entity types for constraint dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Point,
    Line,
    Circle,
    Arc,
}

impl Geometry {
    pub fn kind(&self) -> EntityKind {
        match self {
            Geometry::Point { .. } => EntityKind::Point,
            Geometry::Line { .. } => EntityKind::Line,
            Geometry::Circle { .. } => EntityKind::Circle,
            Geometry::Arc { .. } => EntityKind::Arc,
        }
    }

    /// Number of numeric parameters this geometry contributes.
    pub fn param_count(&self) -> usize {
        match self {
            Geometry::Point { .. } => 2,
            Geometry::Line { .. } => 4,
            Geometry::Circle { .. } => 3,
            Geometry::Arc { .. } => 5,
        }
    }

    /// Read parameter `slot`. Panics if `slot >= param_count()`.
    pub fn param(&self, slot: usize) -> f64 {
        match (self, slot) {
            (Geometry::Point { x, .. }, 0) => *x,
            (Geometry::Point { y, .. }, 1) => *y,
            (Geometry::Line { x1, .. }, 0) => *x1,
            (Geometry::Line { y1, .. }, 1) => *y1,
            (Geometry::Line { x2, .. }, 2) => *x2,
            (Geometry::Line { y2, .. }, 3) => *y2,
            (Geometry::Circle { cx, .. }, 0) => *cx,
            (Geometry::Circle { cy, .. }, 1) => *cy,
            (Geometry::Circle { radius, .. }, 2) => *radius,
            (Geometry::Arc { cx, .. }, 0) => *cx,
            (Geometry::Arc { cy, .. }, 1) => *cy,
            (Geometry::Arc { radius, .. }, 2) => *radius,
            (Geometry::Arc { start_angle, .. }, 3) => *start_angle,
            (Geometry::Arc { end_angle, .. }, 4) => *end_angle,
            _ => panic!("parameter slot {} out of range for {:?}", slot, self.kind()),
        }
    }

    /// Write parameter `slot`. Panics if `slot >= param_count()`.
    pub fn set_param(&mut self, slot: usize, value: f64) {
        match (self, slot) {
            (Geometry::Point { x, .. }, 0) => *x = value,
            (Geometry::Point { y, .. }, 1) => *y = value,
            (Geometry::Line { x1, .. }, 0) => *x1 = value,
            (Geometry::Line { y1, .. }, 1) => *y1 = value,
            (Geometry::Line { x2, .. }, 2) => *x2 = value,
            (Geometry::Line { y2, .. }, 3) => *y2 = value,
            (Geometry::Circle { cx, .. }, 0) => *cx = value,
            (Geometry::Circle { cy, .. }, 1) => *cy = value,
            (Geometry::Circle { radius, .. }, 2) => *radius = value,
            (Geometry::Arc { cx, .. }, 0) => *cx = value,
            (Geometry::Arc { cy, .. }, 1) => *cy = value,
            (Geometry::Arc { radius, .. }, 2) => *radius = value,
            (Geometry::Arc { start_angle, .. }, 3) => *start_angle = value,
            (Geometry::Arc { end_angle, .. }, 4) => *end_angle = value,
            (geom, _) => panic!("parameter slot {} out of range for {:?}", slot, geom.kind()),
        }
    }

    /// All parameters in slot order.
    pub fn params(&self) -> Vec<f64> {
        (0..self.param_count()).map(|i| self.param(i)).collect()
    }

    /// Representative point: the first point for points and lines, the
    /// center for circles and arcs.
    pub fn anchor_point(&self) -> (f64, f64) {
        match self {
            Geometry::Point { x, y } => (*x, *y),
            Geometry::Line { x1, y1, .. } => (*x1, *y1),
            Geometry::Circle { cx, cy, .. } => (*cx, *cy),
            Geometry::Arc { cx, cy, .. } => (*cx, *cy),
        }
    }

    /// Normalized direction vector. Only lines carry a meaningful
    /// direction; every other kind (and a zero-length line) falls back to
    /// the x axis `(1, 0)`.
    pub fn direction(&self) -> (f64, f64) {
        if let Geometry::Line { x1, y1, x2, y2 } = self {
            let dx = x2 - x1;
            let dy = y2 - y1;
            let len = (dx * dx + dy * dy).sqrt();
            if len > DEGENERATE_LENGTH {
                return (dx / len, dy / len);
            }
        }
        (1.0, 0.0)
    }
}

/// A geometric entity in a sketch.
///
/// Fixed entities contribute no free parameters: the solver reads them
/// but never writes them back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchEntity {
    pub id: u32,
    pub geometry: Geometry,
    #[serde(default)]
    pub fixed: bool,
}
