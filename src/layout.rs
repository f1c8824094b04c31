//! Panel layout templates for 1-8 panels.
//!
//! Each template is a set of columns; each column stacks cells whose heights
//! are expressed in grid units out of [`GRID_ROWS`]. Cell indices are the
//! fixed slot positions the navigator's adjacency tables refer to.

use ratatui::layout::{Constraint, Layout, Rect};

use crate::error::{Result, TodoError};

pub const MIN_PANELS: usize = 1;
pub const MAX_PANELS: usize = 8;

/// Every column's cells sum to this many rows
pub const GRID_ROWS: u16 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Slot index
    pub index: usize,
    /// Height in grid rows
    pub rows: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub count: usize,
    pub columns: Vec<Column>,
}

fn column(cells: &[(usize, u16)]) -> Column {
    Column {
        cells: cells
            .iter()
            .map(|&(index, rows)| Cell { index, rows })
            .collect(),
    }
}

/// Check a requested panel count
pub fn validate_count(count: usize) -> Result<usize> {
    if (MIN_PANELS..=MAX_PANELS).contains(&count) {
        Ok(count)
    } else {
        Err(TodoError::validation(format!(
            "Panel count must be between {} and {}",
            MIN_PANELS, MAX_PANELS
        )))
    }
}

/// The hand-authored template for `count` panels
pub fn template(count: usize) -> Result<Template> {
    validate_count(count)?;
    let columns = match count {
        1 => vec![column(&[(0, 12)])],
        2 => vec![column(&[(0, 12)]), column(&[(1, 12)])],
        // big left, two stacked right
        3 => vec![column(&[(0, 12)]), column(&[(1, 6), (2, 6)])],
        // 2x2, numbered row-major
        4 => vec![column(&[(0, 6), (2, 6)]), column(&[(1, 6), (3, 6)])],
        // tall left with a short panel under it, three stacked right
        5 => vec![column(&[(0, 8), (4, 4)]), column(&[(1, 4), (2, 4), (3, 4)])],
        // 2x3, numbered row-major
        6 => vec![
            column(&[(0, 4), (2, 4), (4, 4)]),
            column(&[(1, 4), (3, 4), (5, 4)]),
        ],
        7 => vec![
            column(&[(0, 4), (1, 4), (2, 4)]),
            column(&[(3, 3), (4, 3), (5, 3), (6, 3)]),
        ],
        _ => vec![
            column(&[(0, 3), (1, 3), (2, 3), (3, 3)]),
            column(&[(4, 3), (5, 3), (6, 3), (7, 3)]),
        ],
    };
    Ok(Template { count, columns })
}

impl Template {
    /// Split `area` into one rect per panel, indexed by slot
    pub fn split(&self, area: Rect) -> Vec<Rect> {
        let mut rects = vec![Rect::default(); self.count];
        let cols = self.columns.len() as u32;
        let col_areas = Layout::horizontal(
            self.columns
                .iter()
                .map(|_| Constraint::Ratio(1, cols))
                .collect::<Vec<_>>(),
        )
        .split(area);

        for (col, col_area) in self.columns.iter().zip(col_areas.iter()) {
            let cell_areas = Layout::vertical(
                col.cells
                    .iter()
                    .map(|c| Constraint::Ratio(c.rows as u32, GRID_ROWS as u32))
                    .collect::<Vec<_>>(),
            )
            .split(*col_area);
            for (cell, cell_area) in col.cells.iter().zip(cell_areas.iter()) {
                rects[cell.index] = *cell_area;
            }
        }
        rects
    }

    /// Grid placement of a slot: (column, first row, row span)
    pub fn placement(&self, index: usize) -> Option<(usize, u16, u16)> {
        for (c, col) in self.columns.iter().enumerate() {
            let mut row = 0;
            for cell in &col.cells {
                if cell.index == index {
                    return Some((c, row, cell.rows));
                }
                row += cell.rows;
            }
        }
        None
    }
}
