//! Rectangular grid of hexes backing a battlefield.
//!
//! The grid is a dense row-major `Vec<Hex>`. Indexed access comes in two
//! flavors: `hex`/`hex_mut` panic on out-of-range cells because an index
//! computed from game state that falls off the grid means the state is
//! already corrupt, while `get_hex` returns `None` for speculative lookups
//! such as range scans that probe beyond the edge.

use crate::hex::{Cell, Hex};
use serde::{Deserialize, Serialize};

/// Dense rectangular grid of hexes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    rows: u32,
    cols: u32,
    hexes: Vec<Hex>,
}

impl Grid {
    /// Create a grid of empty clear hexes
    pub fn new(rows: u32, cols: u32) -> Self {
        let mut hexes = Vec::with_capacity((rows * cols) as usize);
        for row in 0..rows {
            for col in 0..cols {
                hexes.push(Hex::new(Cell::new(row as i32, col as i32)));
            }
        }
        Self { rows, cols, hexes }
    }

    /// Number of rows
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Whether a cell lies on the grid
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0
            && cell.col >= 0
            && (cell.row as u32) < self.rows
            && (cell.col as u32) < self.cols
    }

    /// The hex at a cell.
    ///
    /// Panics if the cell is off the grid.
    pub fn hex(&self, cell: Cell) -> &Hex {
        assert!(
            self.in_bounds(cell),
            "cell ({}, {}) outside {}x{} grid",
            cell.row,
            cell.col,
            self.rows,
            self.cols
        );
        &self.hexes[self.index(cell)]
    }

    /// Mutable access to the hex at a cell.
    ///
    /// Panics if the cell is off the grid.
    pub(crate) fn hex_mut(&mut self, cell: Cell) -> &mut Hex {
        assert!(
            self.in_bounds(cell),
            "cell ({}, {}) outside {}x{} grid",
            cell.row,
            cell.col,
            self.rows,
            self.cols
        );
        let index = self.index(cell);
        &mut self.hexes[index]
    }

    /// The hex at a cell, or `None` if the cell is off the grid
    pub fn get_hex(&self, cell: Cell) -> Option<&Hex> {
        if self.in_bounds(cell) {
            Some(&self.hexes[self.index(cell)])
        } else {
            None
        }
    }

    /// Iterate over all cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.cols).map(move |col| Cell::new(row as i32, col as i32))
        })
    }

    /// Iterate over all hexes in row-major order
    pub fn hexes(&self) -> impl Iterator<Item = &Hex> {
        self.hexes.iter()
    }

    fn index(&self, cell: Cell) -> usize {
        (cell.row as u32 * self.cols + cell.col as u32) as usize
    }
}
