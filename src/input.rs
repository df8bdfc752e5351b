//! Input: key bindings (normal and vim-style), pixel → cell mapping, and the
//! two-click swap selection.

use crate::grid::{CellPos, Grid};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    /// Click the cell under the keyboard cursor.
    Select,
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Supports both normal (arrows, enter) and vim (hjkl, space).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('r') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::CursorLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::CursorRight,
        KeyCode::Up | KeyCode::Char('k') => Action::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => Action::CursorDown,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        _ => Action::None,
    }
}

/// Cell under a surface-local pixel offset. Offsets past the last row/column clamp to
/// it (the score strip below the grid maps to the bottom row); negative or non-finite
/// offsets map to nothing.
pub fn cell_at(offset_x: f64, offset_y: f64, cell_px: f64, size: usize) -> Option<CellPos> {
    if size == 0 || cell_px <= 0.0 || !offset_x.is_finite() || !offset_y.is_finite() {
        return None;
    }
    if offset_x < 0.0 || offset_y < 0.0 {
        return None;
    }
    let last = size - 1;
    let col = ((offset_x / cell_px).floor() as usize).min(last);
    let row = ((offset_y / cell_px).floor() as usize).min(last);
    Some(CellPos::new(row, col))
}

/// Two-click swap state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Idle,
    Armed(CellPos),
}

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Armed(CellPos),
    Swapped(CellPos, CellPos),
    /// Armed cell released without a swap because a hole was involved.
    Cancelled,
    Ignored,
}

impl Selection {
    /// Feed one click. Idle arms the clicked cell; Armed swaps shapes with the clicked cell
    /// (any cell, itself included) and returns to Idle. Holes are never swapped.
    pub fn click(&mut self, grid: &mut Grid, pos: CellPos) -> ClickOutcome {
        if !grid.contains(pos) {
            return ClickOutcome::Ignored;
        }
        match *self {
            Self::Idle => {
                if grid.is_animating(pos) {
                    log::trace!("click on shattering cell ({}, {}) ignored", pos.row, pos.col);
                    return ClickOutcome::Ignored;
                }
                grid.set_selected(pos, true);
                *self = Self::Armed(pos);
                ClickOutcome::Armed(pos)
            }
            Self::Armed(first) => {
                grid.set_selected(first, false);
                *self = Self::Idle;
                if grid.is_animating(first) || grid.is_animating(pos) {
                    return ClickOutcome::Cancelled;
                }
                grid.swap_shapes(first, pos);
                ClickOutcome::Swapped(first, pos)
            }
        }
    }

    pub fn armed(&self) -> Option<CellPos> {
        match self {
            Self::Armed(pos) => Some(*pos),
            Self::Idle => None,
        }
    }

    /// Drop the selection and its highlight.
    pub fn reset(&mut self, grid: &mut Grid) {
        if let Self::Armed(pos) = *self {
            grid.set_selected(pos, false);
        }
        *self = Self::Idle;
    }
}
