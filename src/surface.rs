//! Drawing surface seam: the primitives the game draws with, a recording
//! implementation, and shape silhouettes in surface pixels (y grows downwards).

use crate::grid::{Hue, ShapeKind};

/// Which outline is being drawn; the theme picks the colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Selection,
    Cursor,
}

/// 2D drawing surface in logical pixels. `(x, y)` is the top-left of a `size`×`size` box.
pub trait Surface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn clear(&mut self);
    fn fill_shape(&mut self, kind: ShapeKind, x: f64, y: f64, size: f64, hue: Hue);
    fn outline_shape(&mut self, kind: ShapeKind, x: f64, y: f64, size: f64, width: f64, stroke: Stroke);
    fn draw_text(&mut self, text: &str, x: f64, y: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Fill {
        kind: ShapeKind,
        x: f64,
        y: f64,
        size: f64,
        hue: Hue,
    },
    Outline {
        kind: ShapeKind,
        x: f64,
        y: f64,
        size: f64,
        width: f64,
        stroke: Stroke,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
    },
}

/// Surface that records commands; the terminal UI replays them onto a canvas.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    width: f64,
    height: f64,
    pub cmds: Vec<DrawCmd>,
}

impl DisplayList {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            cmds: Vec::new(),
        }
    }
}

impl Surface for DisplayList {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self) {
        self.cmds.clear();
    }

    fn fill_shape(&mut self, kind: ShapeKind, x: f64, y: f64, size: f64, hue: Hue) {
        self.cmds.push(DrawCmd::Fill { kind, x, y, size, hue });
    }

    fn outline_shape(&mut self, kind: ShapeKind, x: f64, y: f64, size: f64, width: f64, stroke: Stroke) {
        self.cmds.push(DrawCmd::Outline {
            kind,
            x,
            y,
            size,
            width,
            stroke,
        });
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64) {
        self.cmds.push(DrawCmd::Text {
            text: text.to_string(),
            x,
            y,
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Silhouette {
    Circle { cx: f64, cy: f64, r: f64 },
    Polygon(Vec<(f64, f64)>),
}

/// Outline of a shape inside the box at `(x, y)` with side `size`.
pub fn silhouette(kind: ShapeKind, x: f64, y: f64, size: f64) -> Silhouette {
    let s = size;
    match kind {
        ShapeKind::Circle => Silhouette::Circle {
            cx: x + s / 2.0,
            cy: y + s / 2.0,
            r: s / 2.0,
        },
        ShapeKind::Square => Silhouette::Polygon(vec![(x, y), (x + s, y), (x + s, y + s), (x, y + s)]),
        ShapeKind::Triangle => {
            Silhouette::Polygon(vec![(x + s / 2.0, y), (x + s, y + s), (x, y + s)])
        }
        ShapeKind::Diamond => Silhouette::Polygon(vec![
            (x + s / 2.0, y),
            (x + s, y + s / 2.0),
            (x + s / 2.0, y + s),
            (x, y + s / 2.0),
        ]),
        ShapeKind::Hexagon => Silhouette::Polygon(vec![
            (x + s / 2.0, y),
            (x + s, y + s / 4.0),
            (x + s, y + 3.0 * s / 4.0),
            (x + s / 2.0, y + s),
            (x, y + 3.0 * s / 4.0),
            (x, y + s / 4.0),
        ]),
    }
}

impl Silhouette {
    /// Point-in-shape test (ray casting for polygons).
    pub fn contains(&self, px: f64, py: f64) -> bool {
        match self {
            Self::Circle { cx, cy, r } => {
                let (dx, dy) = (px - cx, py - cy);
                dx * dx + dy * dy <= r * r
            }
            Self::Polygon(points) => {
                let mut inside = false;
                let n = points.len();
                let mut j = n.wrapping_sub(1);
                for i in 0..n {
                    let (xi, yi) = points[i];
                    let (xj, yj) = points[j];
                    if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
                        inside = !inside;
                    }
                    j = i;
                }
                inside
            }
        }
    }

    /// (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        match self {
            Self::Circle { cx, cy, r } => (cx - r, cy - r, cx + r, cy + r),
            Self::Polygon(points) => points.iter().fold(
                (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
                |(ax, ay, bx, by), &(x, y)| (ax.min(x), ay.min(y), bx.max(x), by.max(y)),
            ),
        }
    }

    /// Sample points inside the shape on a grid with the given steps, at sample centres.
    pub fn raster(&self, step_x: f64, step_y: f64) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        if step_x <= 0.0 || step_y <= 0.0 {
            return out;
        }
        let (x0, y0, x1, y1) = self.bounds();
        let mut y = (y0 / step_y).floor() * step_y + step_y / 2.0;
        while y <= y1 {
            let mut x = (x0 / step_x).floor() * step_x + step_x / 2.0;
            while x <= x1 {
                if self.contains(x, y) {
                    out.push((x, y));
                }
                x += step_x;
            }
            y += step_y;
        }
        out
    }

    /// Same silhouette pulled in by `inset` px on every side, for thick outlines.
    pub fn inset(&self, inset: f64) -> Self {
        match self {
            Self::Circle { cx, cy, r } => Self::Circle {
                cx: *cx,
                cy: *cy,
                r: (r - inset).max(0.0),
            },
            Self::Polygon(points) => {
                let (x0, y0, x1, y1) = self.bounds();
                let (cx, cy) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
                let half = ((x1 - x0).max(y1 - y0) / 2.0).max(f64::EPSILON);
                let k = ((half - inset) / half).max(0.0);
                Self::Polygon(
                    points
                        .iter()
                        .map(|&(x, y)| (cx + (x - cx) * k, cy + (y - cy) * k))
                        .collect(),
                )
            }
        }
    }
}
