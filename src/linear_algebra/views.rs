//! Defines zero-copy views over a [Matrix].
//!
//! A view shares the storage of the matrix it was created from. Reading through a view reads
//! the source matrix, writing through one of the mutable views writes the source matrix. Call
//! [MatrixView::copy] to obtain a standalone matrix that no longer aliases the source.

use super::matrix::{Matrix, MatrixView, MatrixViewMut};

#[cfg(test)]
#[path = "views_tests.rs"]
mod views_tests;

/// Panics if the given index lies outside a view with the given dimensions.
#[inline]
fn check_view_index(row: usize, col: usize, rows: usize, cols: usize) {
    assert!(
        row < rows && col < cols,
        "Matrix: index ({}, {}) is out of range for a {}x{} view",
        row,
        col,
        rows,
        cols
    );
}

/// Panics if the given region does not fit within the source matrix.
fn check_region(source: &Matrix, row: usize, col: usize, rows: usize, cols: usize) {
    assert!(
        row + rows <= source.nrows() && col + cols <= source.ncols(),
        "Matrix: a {}x{} block at ({}, {}) does not fit in a {}x{} matrix",
        rows,
        cols,
        row,
        col,
        source.nrows(),
        source.ncols()
    );
}

/// A read-only view of the transpose of a [Matrix].
#[derive(Clone, Copy, Debug)]
pub struct Transposed<'a> {
    source: &'a Matrix,
}

impl<'a> Transposed<'a> {
    /// Creates a new transposed view of 'source'.
    pub fn new(source: &'a Matrix) -> Self {
        Self { source }
    }
}

impl MatrixView for Transposed<'_> {
    fn dim(&self) -> (usize, usize) {
        (self.source.ncols(), self.source.nrows())
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.source.get(col, row)
    }
}

/// A mutable view of the transpose of a [Matrix].
#[derive(Debug)]
pub struct TransposedMut<'a> {
    source: &'a mut Matrix,
}

impl<'a> TransposedMut<'a> {
    /// Creates a new mutable transposed view of 'source'.
    pub fn new(source: &'a mut Matrix) -> Self {
        Self { source }
    }
}

impl MatrixView for TransposedMut<'_> {
    fn dim(&self) -> (usize, usize) {
        (self.source.ncols(), self.source.nrows())
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.source.get(col, row)
    }
}

impl MatrixViewMut for TransposedMut<'_> {
    fn set(&mut self, row: usize, col: usize, value: f64) {
        self.source.set(col, row, value)
    }
}

/// A read-only view of a rectangular region of a [Matrix].
#[derive(Clone, Copy, Debug)]
pub struct Submatrix<'a> {
    source: &'a Matrix,
    row0: usize,
    col0: usize,
    rows: usize,
    cols: usize,
}

impl<'a> Submatrix<'a> {
    /// Creates a view of the 'rows' x 'cols' region of 'source' that starts at
    /// ('row', 'col').
    ///
    /// ## Panics
    ///
    /// Panics if the region does not fit within 'source'.
    pub fn new(source: &'a Matrix, row: usize, col: usize, rows: usize, cols: usize) -> Self {
        check_region(source, row, col, rows, cols);
        Self {
            source,
            row0: row,
            col0: col,
            rows,
            cols,
        }
    }
}

impl MatrixView for Submatrix<'_> {
    fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        check_view_index(row, col, self.rows, self.cols);
        self.source.get(self.row0 + row, self.col0 + col)
    }
}

/// A mutable view of a rectangular region of a [Matrix].
#[derive(Debug)]
pub struct SubmatrixMut<'a> {
    source: &'a mut Matrix,
    row0: usize,
    col0: usize,
    rows: usize,
    cols: usize,
}

impl<'a> SubmatrixMut<'a> {
    /// Creates a mutable view of the 'rows' x 'cols' region of 'source' that starts at
    /// ('row', 'col').
    ///
    /// ## Panics
    ///
    /// Panics if the region does not fit within 'source'.
    pub fn new(source: &'a mut Matrix, row: usize, col: usize, rows: usize, cols: usize) -> Self {
        check_region(source, row, col, rows, cols);
        Self {
            source,
            row0: row,
            col0: col,
            rows,
            cols,
        }
    }
}

impl MatrixView for SubmatrixMut<'_> {
    fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        check_view_index(row, col, self.rows, self.cols);
        self.source.get(self.row0 + row, self.col0 + col)
    }
}

impl MatrixViewMut for SubmatrixMut<'_> {
    fn set(&mut self, row: usize, col: usize, value: f64) {
        check_view_index(row, col, self.rows, self.cols);
        self.source.set(self.row0 + row, self.col0 + col, value)
    }
}
