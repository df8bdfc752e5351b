//! Grid store: the N×N cell array and the fixed shape palette.

use rand::Rng;

/// Default number of rows/columns.
pub const DEFAULT_GRID_SIZE: usize = 12;

/// Silhouette of a shape. Matching compares kinds only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Circle,
    Square,
    Triangle,
    Diamond,
    Hexagon,
}

#[cfg(test)]
impl ShapeKind {
    pub const ALL: [Self; 5] = [
        Self::Circle,
        Self::Square,
        Self::Triangle,
        Self::Diamond,
        Self::Hexagon,
    ];
}

/// Colour slot of a shape; the theme turns it into a terminal colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hue {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    /// Used for particles of a cell that was already empty when destroyed.
    Neutral,
}

/// Immutable (kind, hue) pair. Every live cell holds one of [`PALETTE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub kind: ShapeKind,
    pub hue: Hue,
}

pub const PALETTE: [Shape; 5] = [
    Shape { kind: ShapeKind::Circle, hue: Hue::Red },
    Shape { kind: ShapeKind::Square, hue: Hue::Blue },
    Shape { kind: ShapeKind::Triangle, hue: Hue::Green },
    Shape { kind: ShapeKind::Diamond, hue: Hue::Yellow },
    Shape { kind: ShapeKind::Hexagon, hue: Hue::Purple },
];

#[cfg(test)]
impl Shape {
    /// Palette entry for a kind.
    pub fn of(kind: ShapeKind) -> Self {
        PALETTE
            .iter()
            .copied()
            .find(|s| s.kind == kind)
            .unwrap_or(PALETTE[0])
    }
}

/// Uniformly random palette shape.
pub fn random_shape<R: Rng + ?Sized>(rng: &mut R) -> Shape {
    PALETTE[rng.random_range(0..PALETTE.len())]
}

/// (row, col) position; row 0 is the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    /// `None` only while the cell is a hole waiting for its cascade.
    pub shape: Option<Shape>,
    pub selected: bool,
    pub animating: bool,
}

impl Cell {
    pub fn with_shape(shape: Shape) -> Self {
        Self {
            shape: Some(shape),
            selected: false,
            animating: false,
        }
    }
}

/// Square matrix of cells. rows[0] is the top row.
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// Fills every cell with a uniformly random palette shape.
    pub fn new<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let rows = (0..size)
            .map(|_| (0..size).map(|_| Cell::with_shape(random_shape(rng))).collect())
            .collect();
        Self { size, rows }
    }

    /// Grid built from explicit kinds, `rows[r][c]`. Non-square input is padded/truncated
    /// to the number of rows.
    #[cfg(test)]
    pub fn from_kinds(kinds: &[Vec<ShapeKind>]) -> Self {
        let size = kinds.len();
        let rows = kinds
            .iter()
            .map(|row| {
                (0..size)
                    .map(|c| {
                        let kind = row.get(c).copied().unwrap_or(ShapeKind::ALL[c % 5]);
                        Cell::with_shape(Shape::of(kind))
                    })
                    .collect()
            })
            .collect();
        Self { size, rows }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn contains(&self, pos: CellPos) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    #[inline]
    pub fn cell(&self, pos: CellPos) -> Option<&Cell> {
        self.rows.get(pos.row).and_then(|row| row.get(pos.col))
    }

    #[inline]
    pub fn cell_mut(&mut self, pos: CellPos) -> Option<&mut Cell> {
        self.rows.get_mut(pos.row).and_then(|row| row.get_mut(pos.col))
    }

    #[inline]
    pub fn shape(&self, pos: CellPos) -> Option<Shape> {
        self.cell(pos).and_then(|c| c.shape)
    }

    pub fn set_shape(&mut self, pos: CellPos, shape: Option<Shape>) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.shape = shape;
        }
    }

    pub fn set_selected(&mut self, pos: CellPos, selected: bool) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.selected = selected;
        }
    }

    pub fn set_animating(&mut self, pos: CellPos, animating: bool) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.animating = animating;
        }
    }

    pub fn is_animating(&self, pos: CellPos) -> bool {
        self.cell(pos).is_some_and(|c| c.animating)
    }

    /// Exchange the shapes of two cells. Flags stay where they are.
    pub fn swap_shapes(&mut self, a: CellPos, b: CellPos) {
        if !self.contains(a) || !self.contains(b) {
            return;
        }
        let sa = self.rows[a.row][a.col].shape;
        let sb = self.rows[b.row][b.col].shape;
        self.rows[a.row][a.col].shape = sb;
        self.rows[b.row][b.col].shape = sa;
    }

    /// Kinds along a row, left to right.
    pub fn row_kinds(&self, row: usize) -> impl Iterator<Item = Option<ShapeKind>> + '_ {
        self.rows
            .get(row)
            .into_iter()
            .flatten()
            .map(|c| c.shape.map(|s| s.kind))
    }

    /// Kinds down a column, top to bottom.
    pub fn column_kinds(&self, col: usize) -> impl Iterator<Item = Option<ShapeKind>> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| row.get(col))
            .map(|c| c.shape.map(|s| s.kind))
    }

    /// Every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = CellPos> + '_ {
        (0..self.size).flat_map(move |row| (0..self.size).map(move |col| CellPos::new(row, col)))
    }
}
