//! Game engine: grid, score, selection, shatter registry and RNG behind one owner.
//!
//! Lifecycle is construct (`new`) → run (the app calls `scan` on its timer and
//! `advance` every frame) → `stop`.

use crate::grid::{CellPos, Grid};
use crate::input::{ClickOutcome, Selection, cell_at};
use crate::scanner::find_runs;
use crate::shatter::ShatterEngine;
use crate::{GameConfig, ScorePolicy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// Height of the strip below the grid that holds the score.
pub const SCORE_STRIP_PX: f64 = 50.0;

#[derive(Debug)]
pub struct GameEngine {
    config: GameConfig,
    grid: Grid,
    selection: Selection,
    shatter: ShatterEngine,
    rng: StdRng,
    seed: u64,
    score: u32,
    /// Runs matched since start (both axes counted).
    pub runs_matched: u32,
    /// Cells turned into holes since start.
    pub cells_destroyed: u32,
    cursor: CellPos,
    /// Cursor outline is shown once the keyboard is used; a mouse click hides it.
    pub cursor_visible: bool,
    running: bool,
}

impl GameEngine {
    pub fn new(config: &GameConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);
        let grid = Grid::new(config.grid_size, &mut rng);
        log::info!(
            "new game: {}x{} grid, seed {}, {:?} scoring",
            config.grid_size,
            config.grid_size,
            seed,
            config.score_policy
        );
        Self {
            config: config.clone(),
            shatter: Self::shatter_for(config),
            grid,
            selection: Selection::Idle,
            rng,
            seed,
            score: 0,
            runs_matched: 0,
            cells_destroyed: 0,
            cursor: CellPos::new(0, 0),
            cursor_visible: false,
            running: true,
        }
    }

    /// Engine over a prepared grid; the grid size overrides `config.grid_size`.
    #[cfg(test)]
    pub fn with_grid(config: &GameConfig, grid: Grid, seed: u64) -> Self {
        let config = GameConfig {
            grid_size: grid.size(),
            ..config.clone()
        };
        Self {
            shatter: Self::shatter_for(&config),
            config,
            grid,
            selection: Selection::Idle,
            rng: StdRng::seed_from_u64(seed),
            seed,
            score: 0,
            runs_matched: 0,
            cells_destroyed: 0,
            cursor: CellPos::new(0, 0),
            cursor_visible: false,
            running: true,
        }
    }

    fn shatter_for(config: &GameConfig) -> ShatterEngine {
        ShatterEngine::new(
            config.grid_size,
            config.cell_px,
            config.shatter_duration,
            config.no_animation,
        )
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn shatter(&self) -> &ShatterEngine {
        &self.shatter
    }

    #[cfg(test)]
    #[inline]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn cursor(&self) -> CellPos {
        self.cursor
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn cell_px(&self) -> f64 {
        self.config.cell_px
    }

    /// Logical surface size: the grid plus the score strip.
    pub fn surface_size(&self) -> (f64, f64) {
        let side = self.grid.size() as f64 * self.config.cell_px;
        (side, side + SCORE_STRIP_PX)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!("game stopped with score {}", self.score);
        }
        self.running = false;
    }

    /// Fresh grid and zero score; in-flight animations are dropped.
    pub fn restart(&mut self) {
        self.selection.reset(&mut self.grid);
        self.shatter.cancel_all(&mut self.grid, &mut self.rng);
        self.grid = Grid::new(self.config.grid_size, &mut self.rng);
        self.shatter = Self::shatter_for(&self.config);
        self.score = 0;
        self.runs_matched = 0;
        self.cells_destroyed = 0;
        log::info!("game restarted");
    }

    /// One match-scan pass: every run of three or more is scored and its cells are
    /// destroyed. Returns the number of runs found.
    pub fn scan(&mut self, now: Instant) -> usize {
        let runs = find_runs(&self.grid);
        if runs.is_empty() {
            return 0;
        }
        let score_before = self.score;
        for run in &runs {
            log::trace!(
                "{:?} run of {} {:?} at line {}, start {}",
                run.axis,
                run.len,
                run.kind,
                run.line,
                run.start
            );
            if self.config.score_policy == ScorePolicy::PerRun {
                self.score = self.score.saturating_add(run.len as u32);
            }
            for pos in run.cells() {
                if self.shatter.destroy(&mut self.grid, pos) {
                    self.cells_destroyed += 1;
                    if self.config.score_policy == ScorePolicy::UniqueCells {
                        self.score = self.score.saturating_add(1);
                    }
                }
            }
        }
        self.runs_matched += runs.len() as u32;
        self.drop_selection_on_hole();
        self.shatter.start_pending(now, &mut self.rng);
        log::debug!(
            "scan found {} run(s), score {} -> {}, {} hole(s) waiting",
            runs.len(),
            score_before,
            self.score,
            self.shatter.queued_holes()
        );
        runs.len()
    }

    /// Central animation step: finish due shatter batches, cascade them, and rescan when
    /// anything completed. Returns the number of completed batches.
    pub fn advance(&mut self, now: Instant) -> usize {
        let completed = self.shatter.advance(&mut self.grid, now, &mut self.rng);
        if completed > 0 {
            // A queued hole may have shifted onto the armed cell.
            self.drop_selection_on_hole();
            self.scan(now);
        }
        completed
    }

    /// An armed cell that became a hole is no longer selectable.
    fn drop_selection_on_hole(&mut self) {
        if let Some(armed) = self.selection.armed() {
            if self.grid.is_animating(armed) {
                log::debug!("selection at ({}, {}) dropped", armed.row, armed.col);
                self.selection.reset(&mut self.grid);
            }
        }
    }

    /// Click at a surface-local pixel offset.
    pub fn click(&mut self, offset_x: f64, offset_y: f64) -> ClickOutcome {
        self.cursor_visible = false;
        match cell_at(offset_x, offset_y, self.config.cell_px, self.grid.size()) {
            Some(pos) => self.click_cell(pos),
            None => ClickOutcome::Ignored,
        }
    }

    pub fn click_cell(&mut self, pos: CellPos) -> ClickOutcome {
        let outcome = self.selection.click(&mut self.grid, pos);
        if let ClickOutcome::Swapped(a, b) = outcome {
            log::debug!("swapped ({}, {}) <-> ({}, {})", a.row, a.col, b.row, b.col);
        }
        outcome
    }

    /// Move the keyboard cursor, clamped to the grid.
    pub fn move_cursor(&mut self, d_row: isize, d_col: isize) {
        let last = self.grid.size().saturating_sub(1) as isize;
        let row = (self.cursor.row as isize + d_row).clamp(0, last);
        let col = (self.cursor.col as isize + d_col).clamp(0, last);
        self.cursor = CellPos::new(row as usize, col as usize);
        self.cursor_visible = true;
    }

    pub fn select_at_cursor(&mut self) -> ClickOutcome {
        self.cursor_visible = true;
        self.click_cell(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ShapeKind::{self, Circle as A, Diamond as D, Hexagon as H, Square as B, Triangle as C};
    use crate::grid::PALETTE;
    use std::time::Duration;

    fn quiet_rows() -> Vec<Vec<ShapeKind>> {
        let base = [A, B, C, D, H];
        (0..5)
            .map(|r| (0..5).map(|c| base[(r * 2 + c) % 5]).collect())
            .collect()
    }

    fn engine(rows: Vec<Vec<ShapeKind>>, policy: ScorePolicy) -> GameEngine {
        let config = GameConfig {
            score_policy: policy,
            ..GameConfig::default()
        };
        GameEngine::with_grid(&config, Grid::from_kinds(&rows), 42)
    }

    #[test]
    fn new_engine_fills_the_configured_grid() {
        let config = GameConfig {
            seed: Some(1),
            ..GameConfig::default()
        };
        let engine = GameEngine::new(&config);
        assert_eq!(engine.grid().size(), 12);
        assert_eq!(engine.seed(), 1);
        assert_eq!(engine.surface_size(), (600.0, 650.0));
        assert!(engine.grid().positions().all(|p| PALETTE.contains(&engine.grid().shape(p).unwrap())));
        assert!(engine.is_running());
    }

    #[test]
    fn same_seed_same_grid() {
        let config = GameConfig {
            seed: Some(99),
            ..GameConfig::default()
        };
        let a = GameEngine::new(&config);
        let b = GameEngine::new(&config);
        assert!(a.grid().positions().all(|p| a.grid().shape(p) == b.grid().shape(p)));
    }

    #[test]
    fn row_of_three_scores_three_and_pair_scores_nothing() {
        let mut rows = quiet_rows();
        rows[0] = vec![A, A, A, B, B];
        let mut engine = engine(rows, ScorePolicy::PerRun);
        assert_eq!(engine.scan(Instant::now()), 1);
        assert_eq!(engine.score(), 3);
        for col in 0..3 {
            assert!(engine.grid().is_animating(CellPos::new(0, col)));
        }
        assert!(!engine.grid().is_animating(CellPos::new(0, 3)));
        assert!(!engine.grid().is_animating(CellPos::new(0, 4)));
    }

    #[test]
    fn crossing_runs_double_count_under_per_run() {
        let rows = vec![
            vec![B, C, A, D, H],
            vec![A, A, A, B, C],
            vec![D, H, A, C, B],
            vec![C, B, D, H, A],
            vec![H, D, C, A, B],
        ];
        let mut per_run = engine(rows.clone(), ScorePolicy::PerRun);
        per_run.scan(Instant::now());
        assert_eq!(per_run.score(), 6);
        assert_eq!(per_run.cells_destroyed, 5);

        let mut unique = engine(rows, ScorePolicy::UniqueCells);
        unique.scan(Instant::now());
        assert_eq!(unique.score(), 5);
    }

    #[test]
    fn score_never_decreases_across_scans() {
        let config = GameConfig {
            seed: Some(2024),
            grid_size: 8,
            ..GameConfig::default()
        };
        let mut engine = GameEngine::new(&config);
        let t0 = Instant::now();
        let mut last = engine.score();
        for i in 0..50u64 {
            let now = t0 + Duration::from_millis(100 * i);
            engine.scan(now);
            engine.advance(now);
            assert!(engine.score() >= last);
            last = engine.score();
        }
    }

    #[test]
    fn full_column_clears_and_refills() {
        // Column 0 is all circles; nothing else matches.
        let rows = vec![
            vec![A, B, C, D, H],
            vec![A, D, H, B, C],
            vec![A, H, B, C, D],
            vec![A, C, D, H, B],
            vec![A, B, C, D, H],
        ];
        let mut engine = engine(rows, ScorePolicy::PerRun);
        let t0 = Instant::now();
        assert_eq!(engine.scan(t0), 1);
        assert_eq!(engine.score(), 5);
        for row in 0..5 {
            let pos = CellPos::new(row, 0);
            assert!(engine.grid().is_animating(pos));
            assert!(engine.grid().shape(pos).is_none());
        }
        assert_eq!(engine.shatter().particle_frames(t0).len(), 25);

        // The refill may itself match and start another batch; keep advancing.
        let mut now = t0;
        for _ in 0..20 {
            now += Duration::from_millis(1000);
            engine.advance(now);
            if engine.shatter().is_idle() {
                break;
            }
        }
        assert!(engine.shatter().is_idle());
        let grid = engine.grid();
        assert!(grid.positions().all(|p| grid.shape(p).is_some() && !grid.is_animating(p)));
        assert!(engine.score() >= 5);
    }

    #[test]
    fn clicks_map_pixels_and_swap() {
        let mut engine = engine(quiet_rows(), ScorePolicy::PerRun);
        let x = CellPos::new(0, 1);
        let y = CellPos::new(3, 4);
        let sx = engine.grid().shape(x);
        let sy = engine.grid().shape(y);
        assert_eq!(engine.click(60.0, 10.0), ClickOutcome::Armed(x));
        assert_eq!(engine.click(240.0, 170.0), ClickOutcome::Swapped(x, y));
        assert_eq!(engine.grid().shape(x), sy);
        assert_eq!(engine.grid().shape(y), sx);
        assert_eq!(engine.selection(), Selection::Idle);
    }

    #[test]
    fn destroying_the_armed_cell_drops_the_selection() {
        let mut rows = quiet_rows();
        rows[0] = vec![A, A, A, B, B];
        let mut engine = engine(rows, ScorePolicy::PerRun);
        engine.click_cell(CellPos::new(0, 1));
        engine.scan(Instant::now());
        assert_eq!(engine.selection(), Selection::Idle);
        assert!(!engine.grid().cell(CellPos::new(0, 1)).unwrap().selected);
    }

    fn selected_cells(engine: &GameEngine) -> Vec<CellPos> {
        let grid = engine.grid();
        grid.positions().filter(|&p| grid.cell(p).unwrap().selected).collect()
    }

    #[test]
    fn hole_shifting_onto_the_armed_cell_clears_its_selection() {
        let mut engine = engine(quiet_rows(), ScorePolicy::PerRun);
        let t0 = Instant::now();
        engine.shatter.destroy(&mut engine.grid, CellPos::new(4, 0));
        engine.shatter.start_pending(t0, &mut engine.rng);
        // Queued behind the active batch in column 0.
        engine.shatter.destroy(&mut engine.grid, CellPos::new(1, 0));
        assert_eq!(engine.click_cell(CellPos::new(2, 0)), ClickOutcome::Armed(CellPos::new(2, 0)));

        // The first batch cascades; the queued hole moves from row 1 onto row 2.
        let t1 = t0 + Duration::from_millis(1000);
        engine.advance(t1);
        assert!(engine.grid().is_animating(CellPos::new(2, 0)));
        assert_eq!(engine.selection(), Selection::Idle);
        assert!(selected_cells(&engine).is_empty());

        let mut now = t1;
        for _ in 0..20 {
            now += Duration::from_millis(1000);
            engine.advance(now);
            if engine.shatter().is_idle() {
                break;
            }
        }
        let target = CellPos::new(3, 3);
        assert_eq!(engine.click_cell(target), ClickOutcome::Armed(target));
        assert_eq!(selected_cells(&engine), vec![target]);
    }

    #[test]
    fn cursor_clamps_and_selects() {
        let mut engine = engine(quiet_rows(), ScorePolicy::PerRun);
        engine.move_cursor(-3, 10);
        assert_eq!(engine.cursor(), CellPos::new(0, 4));
        assert_eq!(engine.select_at_cursor(), ClickOutcome::Armed(CellPos::new(0, 4)));
        assert!(engine.cursor_visible);
    }

    #[test]
    fn restart_and_stop() {
        let mut rows = quiet_rows();
        rows[0] = vec![A, A, A, B, B];
        let mut engine = engine(rows, ScorePolicy::PerRun);
        engine.scan(Instant::now());
        engine.restart();
        assert_eq!(engine.score(), 0);
        assert!(engine.shatter().is_idle());
        assert!(engine.grid().positions().all(|p| !engine.grid().is_animating(p)));
        engine.stop();
        assert!(!engine.is_running());
    }
}
