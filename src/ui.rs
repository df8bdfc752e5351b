//! Layout and drawing: board canvas, status line, pause overlay, score flash.

use crate::ScorePolicy;
use crate::game::{GameEngine, SCORE_STRIP_PX};
use crate::surface::{DisplayList, DrawCmd, Silhouette, Surface, silhouette};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Duration of the score-strip flash (TachyonFX) in ms.
const SCORE_FLASH_MS: u32 = 350;
const STATUS_HEIGHT: u16 = 1;

/// Board size in terminal cells (inside the border) that fits the terminal area while
/// keeping the surface aspect ratio. Half-blocks give two pixels per cell vertically.
pub fn board_size_for_area(area_w: u16, area_h: u16, surface_w: f64, surface_h: f64) -> (u16, u16) {
    let avail_w = area_w.saturating_sub(2) as f64;
    let avail_h = area_h.saturating_sub(2 + STATUS_HEIGHT) as f64 * 2.0;
    if avail_w <= 0.0 || avail_h <= 0.0 || surface_w <= 0.0 || surface_h <= 0.0 {
        return (0, 0);
    }
    let scale = (avail_w / surface_w).min(avail_h / surface_h);
    let cols = (surface_w * scale).floor() as u16;
    let rows = (surface_h * scale / 2.0).floor() as u16;
    (cols.max(1), rows.max(1))
}

/// Surface-local pixel offset of the centre of terminal cell (column, row); None outside the board.
pub fn terminal_to_surface(
    board: Rect,
    column: u16,
    row: u16,
    surface_w: f64,
    surface_h: f64,
) -> Option<(f64, f64)> {
    if board.is_empty() || !board.contains(Position::new(column, row)) {
        return None;
    }
    let x = ((column - board.x) as f64 + 0.5) * surface_w / board.width as f64;
    let y = ((row - board.y) as f64 + 0.5) * surface_h / board.height as f64;
    Some((x, y))
}

/// Terminal rows covering the score strip at the bottom of the board.
fn score_strip_rect(board: Rect, surface_h: f64) -> Rect {
    let rows = (board.height as f64 * SCORE_STRIP_PX / surface_h).ceil() as u16;
    let rows = rows.clamp(1, board.height.max(1));
    Rect {
        x: board.x,
        y: board.y + board.height.saturating_sub(rows),
        width: board.width,
        height: rows.min(board.height),
    }
}

/// Fade flash over the score strip, restarted whenever the score goes up.
#[derive(Default)]
pub struct ScoreFlash {
    effect: Option<Effect>,
    /// Last time we processed the effect (for delta).
    process_time: Option<Instant>,
}

impl ScoreFlash {
    pub fn trigger(&mut self, theme: &Theme) {
        self.effect = Some(fx::fade_from(
            theme.title,
            theme.bg,
            (SCORE_FLASH_MS, Interpolation::QuadOut),
        ));
        self.process_time = None;
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, now: Instant) {
        let delta = self
            .process_time
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
        self.process_time = Some(now);

        let Some(effect) = self.effect.as_mut() else {
            return;
        };
        frame.render_effect(effect, area, TfxDuration::from_millis(delta_ms));
        if effect.done() {
            self.effect = None;
            self.process_time = None;
        }
    }
}

/// Draw the board, status line and (when paused) the pause overlay. Returns the board's
/// inner rect so mouse positions can be mapped back onto the surface.
pub fn draw(
    frame: &mut Frame,
    engine: &GameEngine,
    theme: &Theme,
    list: &DisplayList,
    flash: &mut ScoreFlash,
    paused: bool,
    now: Instant,
) -> Rect {
    let area = frame.area();
    let (cols, rows) = board_size_for_area(area.width, area.height, list.width(), list.height());

    // Center horizontally
    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(cols + 2),
            Constraint::Fill(1),
        ])
        .split(area);

    // Center vertically, status line under the board
    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(rows + 2),
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);

    let outer = vert_chunks[1];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Shapeshatter ", theme.title));
    let board = block.inner(outer);
    block.render(outer, frame.buffer_mut());

    if !board.is_empty() {
        draw_board(frame, theme, list, board);
        flash.render(frame, score_strip_rect(board, list.height()), now);
    }
    draw_status(frame, engine, theme, vert_chunks[2]);
    if paused {
        draw_pause_overlay(frame, theme, outer);
    }
    board
}

fn draw_board(frame: &mut Frame, theme: &Theme, list: &DisplayList, board: Rect) {
    let (w, h) = (list.width(), list.height());
    let step_x = w / board.width as f64;
    let step_y = h / (board.height as f64 * 2.0);
    let canvas = Canvas::default()
        .background_color(theme.bg)
        .marker(Marker::HalfBlock)
        .x_bounds([0.0, w])
        .y_bounds([0.0, h])
        .paint(|ctx| paint_display_list(ctx, list, theme, step_x, step_y));
    frame.render_widget(canvas, board);
}

/// Replay recorded commands; canvas y grows upwards so every y is flipped.
fn paint_display_list(ctx: &mut Context, list: &DisplayList, theme: &Theme, step_x: f64, step_y: f64) {
    let h = list.height();
    for cmd in &list.cmds {
        match cmd {
            DrawCmd::Fill {
                kind,
                x,
                y,
                size,
                hue,
            } => {
                let coords: Vec<(f64, f64)> = silhouette(*kind, *x, *y, *size)
                    .raster(step_x, step_y)
                    .into_iter()
                    .map(|(px, py)| (px, h - py))
                    .collect();
                ctx.draw(&Points {
                    coords: &coords,
                    color: theme.hue_color(*hue),
                });
            }
            DrawCmd::Outline {
                kind,
                x,
                y,
                size,
                width,
                stroke,
            } => {
                // Stroke widths are surface pixels, well under one terminal pixel:
                // draw one ring per pixel of width instead.
                let shape = silhouette(*kind, *x, *y, *size);
                let color = theme.stroke_color(*stroke);
                let rings = width.round().max(1.0) as usize;
                for ring in 0..rings {
                    stroke_silhouette(ctx, &shape.inset(ring as f64 * step_x), color, h);
                }
            }
            DrawCmd::Text { .. } => {}
        }
    }
    ctx.layer();
    for cmd in &list.cmds {
        if let DrawCmd::Text { text, x, y } = cmd {
            ctx.print(
                *x,
                h - *y,
                Line::styled(text.clone(), Style::default().fg(theme.main_fg).bold()),
            );
        }
    }
}

fn stroke_silhouette(ctx: &mut Context, shape: &Silhouette, color: Color, h: f64) {
    match shape {
        Silhouette::Circle { cx, cy, r } => ctx.draw(&Circle {
            x: *cx,
            y: h - *cy,
            radius: *r,
            color,
        }),
        Silhouette::Polygon(points) => {
            for (i, &(x1, y1)) in points.iter().enumerate() {
                let (x2, y2) = points[(i + 1) % points.len()];
                ctx.draw(&CanvasLine::new(x1, h - y1, x2, h - y2, color));
            }
        }
    }
}

fn draw_status(frame: &mut Frame, engine: &GameEngine, theme: &Theme, area: Rect) {
    let config = engine.config();
    let policy = match config.score_policy {
        ScorePolicy::PerRun => "per-run",
        ScorePolicy::UniqueCells => "unique-cells",
    };
    let n = engine.grid().size();
    let line = Line::from(vec![
        Span::styled(
            format!(" Score {} ", engine.score()),
            Style::default().fg(theme.title).bold(),
        ),
        Span::styled(
            format!(" runs {}  shattered {} ", engine.runs_matched, engine.cells_destroyed),
            Style::default().fg(theme.main_fg),
        ),
        Span::styled(
            format!(" {n}×{n}  seed {}  {policy} ", engine.seed()),
            Style::default().fg(theme.div_line),
        ),
    ]);
    Paragraph::new(line)
        .alignment(Alignment::Center)
        .render(area, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 34u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P Resume   R Restart   Q Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        );
    Clear.render(popup, frame.buffer_mut());
    p.render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn board_keeps_surface_aspect() {
        // 600x650 surface in a 100x40 terminal: height-bound (74 half-block pixels).
        let (cols, rows) = board_size_for_area(100, 40, 600.0, 650.0);
        assert!(rows <= 37);
        assert!(cols <= 98);
        let aspect = cols as f64 / (rows as f64 * 2.0);
        assert!((aspect - 600.0 / 650.0).abs() < 0.1);
        assert_eq!(board_size_for_area(2, 2, 600.0, 650.0), (0, 0));
    }

    #[test]
    fn terminal_cells_map_to_surface_pixels() {
        let board = Rect::new(10, 5, 60, 65);
        assert_eq!(terminal_to_surface(board, 10, 5, 600.0, 650.0), Some((5.0, 5.0)));
        assert_eq!(
            terminal_to_surface(board, 69, 69, 600.0, 650.0),
            Some((595.0, 645.0))
        );
        assert_eq!(terminal_to_surface(board, 9, 5, 600.0, 650.0), None);
        assert_eq!(terminal_to_surface(board, 10, 70, 600.0, 650.0), None);
    }

    #[test]
    fn score_strip_sits_at_the_bottom() {
        let board = Rect::new(0, 0, 60, 65);
        assert_eq!(score_strip_rect(board, 650.0), Rect::new(0, 60, 60, 5));
        let tiny = Rect::new(0, 0, 4, 1);
        assert_eq!(score_strip_rect(tiny, 650.0), Rect::new(0, 0, 4, 1));
    }

    #[test]
    fn draws_board_title_and_status() {
        let config = GameConfig {
            seed: Some(5),
            ..GameConfig::default()
        };
        let engine = GameEngine::new(&config);
        let (w, h) = engine.surface_size();
        let mut list = DisplayList::new(w, h);
        crate::render::draw_frame(&engine, &mut list, Instant::now());
        let theme = Theme::default();
        let mut flash = ScoreFlash::default();
        flash.trigger(&theme);

        let mut terminal = Terminal::new(TestBackend::new(80, 40)).unwrap();
        let mut board = Rect::default();
        terminal
            .draw(|f| {
                board = draw(f, &engine, &theme, &list, &mut flash, true, Instant::now());
            })
            .unwrap();
        assert!(!board.is_empty());
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Shapeshatter"));
        assert!(text.contains("seed 5"));
        assert!(text.contains("Paused"));
    }
}
