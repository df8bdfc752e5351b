//! Destroy/cascade engine: shatter animations and per-column cascade + refill.
//!
//! Destroyed cells become holes (shape cleared, `animating` set). Holes are animated in
//! batches, at most one batch per column; holes destroyed while their column is busy
//! wait in that column's queue. When a batch finishes, each hole is cascaded (shapes
//! above shift down one row, a fresh shape lands on row 0) from the top hole downwards,
//! and queued holes above a cascaded row follow the shift.

use crate::grid::{CellPos, Grid, Hue, ShapeKind, random_shape};
use rand::Rng;
use std::time::{Duration, Instant};

pub const PARTICLES_PER_CELL: usize = 5;
/// Particle velocity components are drawn from `[-PARTICLE_SPEED, PARTICLE_SPEED)`.
pub const PARTICLE_SPEED: f64 = 5.0;
/// Downward drift added on top of particle velocity.
pub const FALL_PX_PER_SEC: f64 = 300.0;
pub const DEFAULT_SHATTER_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShatterParticle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Kind at destruction time; `None` draws nothing.
    pub kind: Option<ShapeKind>,
}

impl ShatterParticle {
    /// Position after `progress` (0..1) of the animation with `fall` px of drift.
    #[inline]
    pub fn position(&self, progress: f64, fall: f64) -> (f64, f64) {
        (self.x + self.vx * progress, self.y + self.vy * progress + fall)
    }
}

/// A destroyed cell waiting for its cascade.
#[derive(Debug, Clone)]
pub struct Hole {
    pub row: usize,
    pub hue: Hue,
    pub kind: Option<ShapeKind>,
    /// Spawned when the hole's batch starts.
    pub particles: Vec<ShatterParticle>,
}

/// In-flight animation of one column.
#[derive(Debug, Clone)]
pub struct ShatterBatch {
    pub col: usize,
    pub started: Instant,
    pub holes: Vec<Hole>,
}

impl ShatterBatch {
    pub fn progress(&self, now: Instant, duration: Duration) -> f64 {
        if duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
    }
}

/// One particle ready to draw: top-left of its box, box size, silhouette and hue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleFrame {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub kind: ShapeKind,
    pub hue: Hue,
}

/// Registry of shatter animations, advanced by the game loop.
#[derive(Debug, Clone)]
pub struct ShatterEngine {
    duration: Duration,
    cell_px: f64,
    /// Finish every batch on the next advance.
    instant: bool,
    active: Vec<Option<ShatterBatch>>,
    queued: Vec<Vec<Hole>>,
}

impl ShatterEngine {
    pub fn new(columns: usize, cell_px: f64, duration: Duration, instant: bool) -> Self {
        Self {
            duration,
            cell_px,
            instant,
            active: vec![None; columns],
            queued: vec![Vec::new(); columns],
        }
    }

    pub fn active_batches(&self) -> impl Iterator<Item = &ShatterBatch> {
        self.active.iter().flatten()
    }

    pub fn queued_holes(&self) -> usize {
        self.queued.iter().map(Vec::len).sum()
    }

    /// True when nothing is animating or waiting.
    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        self.active.iter().all(Option::is_none) && self.queued.iter().all(Vec::is_empty)
    }

    /// Turn a cell into a hole and queue it. Returns false (and changes nothing) when the
    /// position is outside the grid or the cell is already a hole.
    pub fn destroy(&mut self, grid: &mut Grid, pos: CellPos) -> bool {
        let Some(cell) = grid.cell_mut(pos) else {
            return false;
        };
        if cell.animating {
            log::trace!("destroy ignored, ({}, {}) already shattering", pos.row, pos.col);
            return false;
        }
        let (hue, kind) = match cell.shape {
            Some(shape) => (shape.hue, Some(shape.kind)),
            None => (Hue::Neutral, None),
        };
        cell.shape = None;
        cell.animating = true;
        cell.selected = false;
        if let Some(queue) = self.queued.get_mut(pos.col) {
            queue.push(Hole {
                row: pos.row,
                hue,
                kind,
                particles: Vec::new(),
            });
        }
        true
    }

    /// Start a batch in every idle column that has queued holes.
    pub fn start_pending<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> usize {
        let mut started = 0;
        for col in 0..self.active.len() {
            if self.active[col].is_some() || self.queued[col].is_empty() {
                continue;
            }
            let mut holes = std::mem::take(&mut self.queued[col]);
            for hole in &mut holes {
                hole.particles = spawn_particles(hole.row, col, hole.kind, self.cell_px, rng);
            }
            self.active[col] = Some(ShatterBatch {
                col,
                started: now,
                holes,
            });
            started += 1;
        }
        started
    }

    /// Complete every batch whose time is up, cascading its holes. Returns how many
    /// batches completed; queued holes in freed columns start right away.
    pub fn advance<R: Rng + ?Sized>(&mut self, grid: &mut Grid, now: Instant, rng: &mut R) -> usize {
        let mut completed = 0;
        for col in 0..self.active.len() {
            let done = self.active[col]
                .as_ref()
                .is_some_and(|b| self.instant || b.progress(now, self.duration) >= 1.0);
            if !done {
                continue;
            }
            let Some(batch) = self.active[col].take() else {
                continue;
            };
            let mut rows: Vec<usize> = batch.holes.iter().map(|h| h.row).collect();
            rows.sort_unstable();
            rows.dedup();
            for row in rows {
                cascade(grid, CellPos::new(row, col), rng);
                self.follow_shift(grid, col, row);
            }
            log::debug!("column {} cascaded {} hole(s)", batch.col, batch.holes.len());
            completed += 1;
        }
        if completed > 0 {
            self.start_pending(now, rng);
        }
        completed
    }

    /// Queued holes above `row` in `col` moved down one row with the cascade.
    fn follow_shift(&mut self, grid: &mut Grid, col: usize, row: usize) {
        let queue = &mut self.queued[col];
        let moved: Vec<usize> = queue
            .iter()
            .enumerate()
            .filter(|(_, h)| h.row < row)
            .map(|(i, _)| i)
            .collect();
        for &i in &moved {
            grid.set_animating(CellPos::new(queue[i].row, col), false);
        }
        for &i in &moved {
            queue[i].row += 1;
            let pos = CellPos::new(queue[i].row, col);
            grid.set_animating(pos, true);
            grid.set_selected(pos, false);
        }
    }

    /// Particles of every active batch at `now`.
    pub fn particle_frames(&self, now: Instant) -> Vec<ParticleFrame> {
        let size = self.cell_px / 2.0;
        let mut frames = Vec::new();
        for batch in self.active_batches() {
            let progress = batch.progress(now, self.duration);
            let fall = now.saturating_duration_since(batch.started).as_secs_f64() * FALL_PX_PER_SEC;
            for hole in &batch.holes {
                for p in &hole.particles {
                    let Some(kind) = p.kind else { continue };
                    let (x, y) = p.position(progress, fall);
                    frames.push(ParticleFrame {
                        x: x - size / 2.0,
                        y: y - size / 2.0,
                        size,
                        kind,
                        hue: hole.hue,
                    });
                }
            }
        }
        frames
    }

    /// Drop every animation and refill every hole in place.
    pub fn cancel_all<R: Rng + ?Sized>(&mut self, grid: &mut Grid, rng: &mut R) {
        for col in 0..self.active.len() {
            let active = self.active[col].take().map(|b| b.holes).unwrap_or_default();
            let queued = std::mem::take(&mut self.queued[col]);
            for hole in active.iter().chain(queued.iter()) {
                let pos = CellPos::new(hole.row, col);
                grid.set_shape(pos, Some(random_shape(rng)));
                grid.set_animating(pos, false);
            }
        }
    }
}

/// Shift the column above `pos` down one row into the hole and refill row 0.
pub fn cascade<R: Rng + ?Sized>(grid: &mut Grid, pos: CellPos, rng: &mut R) {
    if !grid.contains(pos) {
        return;
    }
    for k in (1..=pos.row).rev() {
        let above = grid.shape(CellPos::new(k - 1, pos.col));
        grid.set_shape(CellPos::new(k, pos.col), above);
    }
    grid.set_shape(CellPos::new(0, pos.col), Some(random_shape(rng)));
    grid.set_animating(pos, false);
}

fn spawn_particles<R: Rng + ?Sized>(
    row: usize,
    col: usize,
    kind: Option<ShapeKind>,
    cell_px: f64,
    rng: &mut R,
) -> Vec<ShatterParticle> {
    let x0 = col as f64 * cell_px;
    let y0 = row as f64 * cell_px;
    (0..PARTICLES_PER_CELL)
        .map(|_| ShatterParticle {
            x: x0 + rng.random::<f64>() * cell_px,
            y: y0 + rng.random::<f64>() * cell_px,
            vx: rng.random::<f64>() * 2.0 * PARTICLE_SPEED - PARTICLE_SPEED,
            vy: rng.random::<f64>() * 2.0 * PARTICLE_SPEED - PARTICLE_SPEED,
            kind,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{PALETTE, Shape};
    use crate::grid::ShapeKind::{Circle as A, Diamond as D, Hexagon as H, Square as B, Triangle as C};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const MS: Duration = Duration::from_millis(1000);

    fn grid5() -> Grid {
        let base = [A, B, C, D, H];
        let rows: Vec<Vec<ShapeKind>> = (0..5)
            .map(|r| (0..5).map(|c| base[(r * 2 + c) % 5]).collect())
            .collect();
        Grid::from_kinds(&rows)
    }

    fn column(grid: &Grid, col: usize) -> Vec<Option<Shape>> {
        (0..grid.size()).map(|r| grid.shape(CellPos::new(r, col))).collect()
    }

    #[test]
    fn destroy_captures_and_clears_the_cell() {
        let mut grid = grid5();
        let mut fx = ShatterEngine::new(5, 50.0, MS, false);
        let mut rng = StdRng::seed_from_u64(3);
        let pos = CellPos::new(2, 1);
        let before = grid.shape(pos).unwrap();
        assert!(fx.destroy(&mut grid, pos));
        let cell = grid.cell(pos).unwrap();
        assert!(cell.shape.is_none());
        assert!(cell.animating);

        let t0 = Instant::now();
        assert_eq!(fx.start_pending(t0, &mut rng), 1);
        let batch = fx.active_batches().next().unwrap();
        assert_eq!(batch.holes[0].hue, before.hue);
        assert_eq!(batch.holes[0].particles.len(), PARTICLES_PER_CELL);
        for p in &batch.holes[0].particles {
            assert!(p.x >= 50.0 && p.x < 100.0);
            assert!(p.y >= 100.0 && p.y < 150.0);
            assert!(p.vx >= -PARTICLE_SPEED && p.vx < PARTICLE_SPEED);
            assert_eq!(p.kind, Some(before.kind));
        }
    }

    #[test]
    fn destroying_a_hole_twice_is_a_no_op() {
        let mut grid = grid5();
        let mut fx = ShatterEngine::new(5, 50.0, MS, false);
        let pos = CellPos::new(0, 0);
        assert!(fx.destroy(&mut grid, pos));
        assert!(!fx.destroy(&mut grid, pos));
        assert_eq!(fx.queued_holes(), 1);
        assert!(!fx.destroy(&mut grid, CellPos::new(9, 9)));
    }

    #[test]
    fn empty_cell_shatters_with_neutral_hue_and_no_particle_shapes() {
        let mut grid = grid5();
        let mut fx = ShatterEngine::new(5, 50.0, MS, false);
        let mut rng = StdRng::seed_from_u64(5);
        let pos = CellPos::new(1, 1);
        grid.set_shape(pos, None);
        assert!(fx.destroy(&mut grid, pos));
        let t0 = Instant::now();
        fx.start_pending(t0, &mut rng);
        let batch = fx.active_batches().next().unwrap();
        assert_eq!(batch.holes[0].hue, Hue::Neutral);
        assert!(fx.particle_frames(t0).is_empty());
    }

    #[test]
    fn isolated_cascade_shifts_column_and_refills_top() {
        let mut grid = grid5();
        let mut fx = ShatterEngine::new(5, 50.0, MS, false);
        let mut rng = StdRng::seed_from_u64(11);
        let before = column(&grid, 2);
        let pos = CellPos::new(3, 2);
        fx.destroy(&mut grid, pos);
        let t0 = Instant::now();
        fx.start_pending(t0, &mut rng);

        assert_eq!(fx.advance(&mut grid, t0 + Duration::from_millis(999), &mut rng), 0);
        assert!(grid.shape(pos).is_none());

        assert_eq!(fx.advance(&mut grid, t0 + MS, &mut rng), 1);
        let after = column(&grid, 2);
        assert_eq!(after.len(), 5);
        for k in 1..=3 {
            assert_eq!(after[k], before[k - 1]);
        }
        assert_eq!(after[4], before[4]);
        assert!(PALETTE.contains(&after[0].unwrap()));
        assert!(!grid.is_animating(pos));
        assert!(fx.is_idle());
    }

    #[test]
    fn busy_column_queues_until_the_active_batch_completes() {
        let mut grid = grid5();
        let mut fx = ShatterEngine::new(5, 50.0, MS, false);
        let mut rng = StdRng::seed_from_u64(2);
        let t0 = Instant::now();
        fx.destroy(&mut grid, CellPos::new(4, 0));
        fx.start_pending(t0, &mut rng);

        // Second hole above the first while column 0 is busy.
        let t1 = t0 + Duration::from_millis(300);
        fx.destroy(&mut grid, CellPos::new(1, 0));
        assert_eq!(fx.start_pending(t1, &mut rng), 0);
        assert_eq!(fx.queued_holes(), 1);
        assert!(fx.active_batches().any(|b| b.col == 0));

        grid.set_selected(CellPos::new(2, 0), true);

        // First batch ends: the queued hole rides the shift from row 1 to row 2.
        assert_eq!(fx.advance(&mut grid, t0 + MS, &mut rng), 1);
        assert!(grid.shape(CellPos::new(2, 0)).is_none());
        assert!(grid.is_animating(CellPos::new(2, 0)));
        assert!(!grid.cell(CellPos::new(2, 0)).unwrap().selected);
        assert!(!grid.is_animating(CellPos::new(1, 0)));
        assert!(grid.shape(CellPos::new(1, 0)).is_some());
        let batch = fx.active_batches().next().unwrap();
        assert_eq!(batch.holes[0].row, 2);
        assert_eq!(batch.started, t0 + MS);

        fx.advance(&mut grid, t0 + MS * 2, &mut rng);
        assert!(fx.is_idle());
        assert!(grid.positions().all(|p| grid.shape(p).is_some() && !grid.is_animating(p)));
    }

    #[test]
    fn batch_cascades_several_holes_top_down() {
        let mut grid = grid5();
        let mut fx = ShatterEngine::new(5, 50.0, MS, false);
        let mut rng = StdRng::seed_from_u64(9);
        let before = column(&grid, 3);
        for row in [2, 3, 4] {
            fx.destroy(&mut grid, CellPos::new(row, 3));
        }
        let t0 = Instant::now();
        assert_eq!(fx.start_pending(t0, &mut rng), 1);
        fx.advance(&mut grid, t0 + MS, &mut rng);
        let after = column(&grid, 3);
        // Rows 0 and 1 fall to the bottom; three fresh shapes on top.
        assert_eq!(after[3], before[0]);
        assert_eq!(after[4], before[1]);
        assert!(after.iter().all(Option::is_some));
    }

    #[test]
    fn particles_drift_down_over_time() {
        let mut grid = grid5();
        let mut fx = ShatterEngine::new(5, 50.0, MS, false);
        let mut rng = StdRng::seed_from_u64(4);
        fx.destroy(&mut grid, CellPos::new(0, 0));
        let t0 = Instant::now();
        fx.start_pending(t0, &mut rng);
        let early = fx.particle_frames(t0);
        let late = fx.particle_frames(t0 + Duration::from_millis(500));
        assert_eq!(early.len(), PARTICLES_PER_CELL);
        for (a, b) in early.iter().zip(&late) {
            assert!(b.y > a.y + 100.0);
            assert_eq!(a.size, 25.0);
        }
    }

    #[test]
    fn instant_mode_completes_on_next_advance() {
        let mut grid = grid5();
        let mut fx = ShatterEngine::new(5, 50.0, MS, true);
        let mut rng = StdRng::seed_from_u64(8);
        fx.destroy(&mut grid, CellPos::new(2, 2));
        let t0 = Instant::now();
        fx.start_pending(t0, &mut rng);
        assert_eq!(fx.advance(&mut grid, t0, &mut rng), 1);
        assert!(fx.is_idle());
    }

    #[test]
    fn cancel_all_refills_holes_in_place() {
        let mut grid = grid5();
        let mut fx = ShatterEngine::new(5, 50.0, MS, false);
        let mut rng = StdRng::seed_from_u64(6);
        fx.destroy(&mut grid, CellPos::new(1, 1));
        fx.start_pending(Instant::now(), &mut rng);
        fx.destroy(&mut grid, CellPos::new(0, 1));
        fx.cancel_all(&mut grid, &mut rng);
        assert!(fx.is_idle());
        assert!(grid.positions().all(|p| grid.shape(p).is_some() && !grid.is_animating(p)));
    }
}
