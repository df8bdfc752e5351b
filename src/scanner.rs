//! Match scanner: run-length scan over shape kinds, rows then columns.

use crate::grid::{CellPos, Grid, ShapeKind};

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

/// A maximal run of one kind along a row or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub axis: Axis,
    /// Row index for `Axis::Row`, column index for `Axis::Column`.
    pub line: usize,
    /// Index of the first cell along the line.
    pub start: usize,
    pub len: usize,
    pub kind: ShapeKind,
}

impl Run {
    pub fn cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        (self.start..self.start + self.len).map(move |i| match self.axis {
            Axis::Row => CellPos::new(self.line, i),
            Axis::Column => CellPos::new(i, self.line),
        })
    }
}

/// Every run of at least [`MIN_RUN`] in the grid: rows top-to-bottom, then columns
/// left-to-right. Runs are read from the grid as it is now; nothing is mutated, so a
/// cell shared by a row run and a column run is reported twice.
pub fn find_runs(grid: &Grid) -> Vec<Run> {
    let mut runs = Vec::new();
    for row in 0..grid.size() {
        scan_line(grid.row_kinds(row), Axis::Row, row, &mut runs);
    }
    for col in 0..grid.size() {
        scan_line(grid.column_kinds(col), Axis::Column, col, &mut runs);
    }
    runs
}

/// Run-length scan of one line. An empty cell ends the current run and starts none.
fn scan_line<I>(kinds: I, axis: Axis, line: usize, out: &mut Vec<Run>)
where
    I: Iterator<Item = Option<ShapeKind>>,
{
    let mut current: Option<ShapeKind> = None;
    let mut count = 0usize;
    let mut start = 0usize;

    let mut flush = |current: Option<ShapeKind>, start: usize, count: usize| {
        if let Some(kind) = current {
            if count >= MIN_RUN {
                out.push(Run { axis, line, start, len: count, kind });
            }
        }
    };

    for (i, kind) in kinds.enumerate() {
        match kind {
            Some(k) if current == Some(k) => count += 1,
            Some(k) => {
                flush(current, start, count);
                current = Some(k);
                start = i;
                count = 1;
            }
            None => {
                flush(current, start, count);
                current = None;
                count = 0;
            }
        }
    }
    // trailing run
    flush(current, start, count);
}
