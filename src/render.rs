//! Per-frame redraw of the game onto a [`Surface`].

use crate::game::GameEngine;
use crate::surface::{Stroke, Surface};
use std::time::Instant;

/// Outline width of the selected cell.
pub const SELECTION_STROKE_PX: f64 = 2.0;
const CURSOR_STROKE_PX: f64 = 1.0;
const SCORE_X: f64 = 10.0;
/// Score baseline offset from the bottom edge.
const SCORE_FROM_BOTTOM: f64 = 40.0;

/// Draw one frame: live cells, the keyboard cursor, shatter particles, then the score.
/// Holes (animating cells) are left blank; their particles stand in for them.
pub fn draw_frame<S: Surface + ?Sized>(engine: &GameEngine, surface: &mut S, now: Instant) {
    surface.clear();
    let cell_px = engine.cell_px();
    let grid = engine.grid();

    for pos in grid.positions() {
        let Some(cell) = grid.cell(pos) else { continue };
        if cell.animating {
            continue;
        }
        let Some(shape) = cell.shape else { continue };
        let x = pos.col as f64 * cell_px;
        let y = pos.row as f64 * cell_px;
        surface.fill_shape(shape.kind, x, y, cell_px, shape.hue);
        if cell.selected {
            surface.outline_shape(shape.kind, x, y, cell_px, SELECTION_STROKE_PX, Stroke::Selection);
        }
    }

    if engine.cursor_visible {
        let cursor = engine.cursor();
        surface.outline_shape(
            crate::grid::ShapeKind::Square,
            cursor.col as f64 * cell_px,
            cursor.row as f64 * cell_px,
            cell_px,
            CURSOR_STROKE_PX,
            Stroke::Cursor,
        );
    }

    for p in engine.shatter().particle_frames(now) {
        surface.fill_shape(p.kind, p.x, p.y, p.size, p.hue);
    }

    let text_y = surface.height() - SCORE_FROM_BOTTOM;
    surface.draw_text(&format!("Score: {}", engine.score()), SCORE_X, text_y);
}
