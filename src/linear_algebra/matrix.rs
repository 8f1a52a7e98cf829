//! Defines a small dense matrix type with row-major storage.
//!
//! The [Matrix] type owns its data. Transposed and block views of a matrix are provided
//! by the [views](super::views) module. Views borrow the matrix they are created from, so
//! the borrow checker guarantees that a view never outlives its source. Only the mutable
//! views write through to the source matrix.
//!
//! All shape related preconditions are checked at the call site. A violation indicates a
//! programming error and results in a panic. Nothing is ever silently truncated or padded.

use std::{
    fmt::Display,
    ops::{AddAssign, Mul, SubAssign},
};

use nalgebra::{Dim, RawStorage};

use super::views::{Submatrix, SubmatrixMut, Transposed, TransposedMut};

#[cfg(test)]
#[path = "matrix_tests.rs"]
mod matrix_tests;

/// Defines read access to a two dimensional collection of numbers.
///
/// Implemented by the owning [Matrix], by the views in the [views](super::views) module and
/// by the nalgebra matrix types so that nalgebra vectors can be written into a [Matrix]
/// through a view.
pub trait MatrixView {
    /// Returns the number of rows and columns.
    fn dim(&self) -> (usize, usize);

    /// Returns the element at the given row and column.
    ///
    /// ## Panics
    ///
    /// Panics if the row or column is out of range.
    fn get(&self, row: usize, col: usize) -> f64;

    /// Materializes the values into a new, standalone [Matrix].
    fn copy(&self) -> Matrix {
        let (rows, cols) = self.dim();
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(self.get(r, c));
            }
        }

        Matrix::new(rows, cols, data)
    }

    /// Returns a value indicating if the given index is outside the collection.
    fn is_out_of_range(&self, row: usize, col: usize) -> bool {
        let (rows, cols) = self.dim();
        row >= rows || col >= cols
    }
}

/// Defines write access to a two dimensional collection of numbers.
pub trait MatrixViewMut: MatrixView {
    /// Sets the element at the given row and column.
    ///
    /// ## Panics
    ///
    /// Panics if the row or column is out of range.
    fn set(&mut self, row: usize, col: usize, value: f64);

    /// Copies all values from 'values' into the current collection.
    ///
    /// ## Panics
    ///
    /// Panics if the dimensions of 'values' are not identical to the dimensions
    /// of the current collection.
    fn insert(&mut self, values: &impl MatrixView) -> &mut Self
    where
        Self: Sized,
    {
        let (rows, cols) = self.dim();
        let (value_rows, value_cols) = values.dim();
        assert!(
            rows == value_rows && cols == value_cols,
            "Matrix: cannot insert a {}x{} matrix into a {}x{} region",
            value_rows,
            value_cols,
            rows,
            cols
        );

        for r in 0..rows {
            for c in 0..cols {
                self.set(r, c, values.get(r, c));
            }
        }

        self
    }
}

/// A dense matrix with row-major storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    /// The number of rows.
    rows: usize,

    /// The number of columns.
    cols: usize,

    /// The elements, stored row by row.
    data: Vec<f64>,
}

impl Matrix {
    /// Returns the index of the element in the flat storage without checking the bounds.
    #[inline]
    pub(crate) fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Panics with a descriptive message if the given index is outside the matrix.
    #[inline]
    fn check_index(&self, row: usize, col: usize) {
        assert!(
            row < self.rows && col < self.cols,
            "Matrix: index ({}, {}) is out of range for a {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
    }

    /// Returns a view of the rectangular region that starts at the given position.
    ///
    /// ## Panics
    ///
    /// Panics if the region does not fit within the matrix.
    pub fn block(&self, row: usize, col: usize, rows: usize, cols: usize) -> Submatrix<'_> {
        Submatrix::new(self, row, col, rows, cols)
    }

    /// Returns a mutable view of the rectangular region that starts at the given position.
    /// Writes through the view change the current matrix.
    ///
    /// ## Panics
    ///
    /// Panics if the region does not fit within the matrix.
    pub fn block_mut(
        &mut self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    ) -> SubmatrixMut<'_> {
        SubmatrixMut::new(self, row, col, rows, cols)
    }

    /// Returns a view of the given column.
    pub fn col(&self, col: usize) -> Submatrix<'_> {
        self.block(0, col, self.rows, 1)
    }

    /// Returns a mutable view of the given column.
    pub fn col_mut(&mut self, col: usize) -> SubmatrixMut<'_> {
        let rows = self.rows;
        self.block_mut(0, col, rows, 1)
    }

    /// Returns a matrix where every element is the given value.
    pub fn constant(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Copies the values of 'source' into the current matrix.
    ///
    /// ## Panics
    ///
    /// Panics if 'source' does not have the same dimensions as the current matrix.
    pub fn copy_from(&mut self, source: &Matrix) {
        assert!(
            self.rows == source.rows && self.cols == source.cols,
            "Matrix: cannot copy a {}x{} matrix into a {}x{} matrix",
            source.rows,
            source.cols,
            self.rows,
            self.cols
        );

        self.data.copy_from_slice(&source.data);
    }

    /// Returns the cross product of two vectors with three elements.
    ///
    /// ## Panics
    ///
    /// Panics if either matrix does not have exactly three elements.
    pub fn cross(&self, other: &Matrix) -> Matrix {
        assert!(
            self.data.len() == 3 && other.data.len() == 3,
            "Matrix: the cross product requires two vectors of length 3"
        );

        let a = &self.data;
        let b = &other.data;
        Matrix::from_vec(vec![
            a[1] * b[2] - b[1] * a[2],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - b[0] * a[1],
        ])
    }

    /// Returns the dot product of two matrices with the same number of elements.
    ///
    /// ## Panics
    ///
    /// Panics if the matrices contain a different number of elements.
    pub fn dot(&self, other: &Matrix) -> f64 {
        assert!(
            self.data.len() == other.data.len(),
            "Matrix: the dot product requires vectors of equal length, got {} and {}",
            self.data.len(),
            other.data.len()
        );

        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Returns a matrix with ones on the main diagonal and zeros everywhere else.
    pub fn eye(rows: usize, cols: usize) -> Self {
        let mut result = Self::zeros(rows, cols);
        for i in 0..rows.min(cols) {
            let index = result.offset(i, i);
            result.data[index] = 1.0;
        }

        result
    }

    /// Creates a column vector from the given values.
    pub fn from_vec(values: Vec<f64>) -> Self {
        let rows = values.len();
        Self::new(rows, 1, values)
    }

    /// Returns the element at the given row and column.
    ///
    /// ## Panics
    ///
    /// Panics if the row or column is out of range.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.check_index(row, col);
        self.data[self.offset(row, col)]
    }

    /// Returns the number of columns.
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Creates a new matrix from row-major data.
    ///
    /// ## Panics
    ///
    /// Panics if the length of 'data' is not equal to 'rows' * 'cols'.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert!(
            data.len() == rows * cols,
            "Matrix: expected {} elements for a {}x{} matrix, got {}",
            rows * cols,
            rows,
            cols,
            data.len()
        );

        Self { rows, cols, data }
    }

    /// Returns the euclidean norm of all elements.
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Returns the number of rows.
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Returns a view of the given row.
    pub fn row(&self, row: usize) -> Submatrix<'_> {
        self.block(row, 0, 1, self.cols)
    }

    /// Returns a mutable view of the given row.
    pub fn row_mut(&mut self, row: usize) -> SubmatrixMut<'_> {
        let cols = self.cols;
        self.block_mut(row, 0, 1, cols)
    }

    /// Multiplies every element by 'factor'.
    pub fn scale(&mut self, factor: f64) -> &mut Self {
        self.data.iter_mut().for_each(|v| *v *= factor);
        self
    }

    /// Sets the element at the given row and column.
    ///
    /// ## Panics
    ///
    /// Panics if the row or column is out of range.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.check_index(row, col);
        let index = self.offset(row, col);
        self.data[index] = value;
    }

    /// Returns a transposed view of the matrix.
    pub fn t(&self) -> Transposed<'_> {
        Transposed::new(self)
    }

    /// Returns a mutable transposed view of the matrix. Writes through the view change
    /// the current matrix.
    pub fn t_mut(&mut self) -> TransposedMut<'_> {
        TransposedMut::new(self)
    }

    /// Returns the element of a vector at the given position.
    ///
    /// ## Panics
    ///
    /// Panics if the index is outside the flat storage.
    pub fn vget(&self, index: usize) -> f64 {
        assert!(
            index < self.data.len(),
            "Matrix: vector index {} is out of range for {} elements",
            index,
            self.data.len()
        );
        self.data[index]
    }

    /// Sets the element of a vector at the given position.
    ///
    /// ## Panics
    ///
    /// Panics if the index is outside the flat storage.
    pub fn vset(&mut self, index: usize, value: f64) {
        assert!(
            index < self.data.len(),
            "Matrix: vector index {} is out of range for {} elements",
            index,
            self.data.len()
        );
        self.data[index] = value;
    }

    /// Returns a matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::constant(rows, cols, 0.0)
    }
}

impl Display for Matrix {
    #[cfg_attr(test, mutants::skip)] // Output is only used for diagnostics
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for r in 0..self.rows {
            let start = r * self.cols;
            writeln!(f, "{:?}", &self.data[start..start + self.cols])?;
        }

        Ok(())
    }
}

impl MatrixView for Matrix {
    fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        Matrix::get(self, row, col)
    }

    fn copy(&self) -> Matrix {
        self.clone()
    }
}

impl MatrixViewMut for Matrix {
    fn set(&mut self, row: usize, col: usize, value: f64) {
        Matrix::set(self, row, col, value)
    }
}

impl<R, C, S> MatrixView for nalgebra::Matrix<f64, R, C, S>
where
    R: Dim,
    C: Dim,
    S: RawStorage<f64, R, C>,
{
    fn dim(&self) -> (usize, usize) {
        self.shape()
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        assert!(
            !MatrixView::is_out_of_range(self, row, col),
            "Matrix: index ({}, {}) is out of range for a {:?} matrix",
            row,
            col,
            self.shape()
        );
        self[(row, col)]
    }
}

/// Panics if the two collections do not have identical dimensions.
fn assert_same_dim(a: &impl MatrixView, b: &impl MatrixView) {
    let (r1, c1) = a.dim();
    let (r2, c2) = b.dim();
    assert!(
        r1 == r2 && c1 == c2,
        "Matrix: dimensions {}x{} and {}x{} are not compatible",
        r1,
        c1,
        r2,
        c2
    );
}

impl<M: MatrixView> AddAssign<&M> for Matrix {
    fn add_assign(&mut self, other: &M) {
        assert_same_dim(self, other);
        for r in 0..self.rows {
            for c in 0..self.cols {
                let index = self.offset(r, c);
                self.data[index] += other.get(r, c);
            }
        }
    }
}

impl<M: MatrixView> SubAssign<&M> for Matrix {
    fn sub_assign(&mut self, other: &M) {
        assert_same_dim(self, other);
        for r in 0..self.rows {
            for c in 0..self.cols {
                let index = self.offset(r, c);
                self.data[index] -= other.get(r, c);
            }
        }
    }
}

impl Mul<&Matrix> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        mul(self, rhs)
    }
}

/// Multiplies two matrices and returns the result as a new [Matrix].
///
/// ## Panics
///
/// Panics if the number of columns of 'a' is not equal to the number of rows of 'b'.
///
/// ## Example
///
/// ```
/// use serial_chain_dynamics::linear_algebra::matrix::{mul, Matrix};
///
/// let a = Matrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
/// let b = Matrix::new(2, 2, vec![5.0, 6.0, 7.0, 8.0]);
/// assert_eq!(mul(&a, &b), Matrix::new(2, 2, vec![19.0, 22.0, 43.0, 50.0]));
/// ```
pub fn mul(a: &impl MatrixView, b: &impl MatrixView) -> Matrix {
    let (r1, c1) = a.dim();
    let (r2, c2) = b.dim();
    assert!(
        c1 == r2,
        "Matrix: cannot multiply a {}x{} matrix with a {}x{} matrix",
        r1,
        c1,
        r2,
        c2
    );

    let mut data = Vec::with_capacity(r1 * c2);
    for r in 0..r1 {
        for c in 0..c2 {
            let mut sum = 0.0;
            for k in 0..c1 {
                sum += a.get(r, k) * b.get(k, c);
            }
            data.push(sum);
        }
    }

    Matrix::new(r1, c2, data)
}

/// Multiplies a sequence of matrices. The product is accumulated from the last matrix
/// towards the first, which keeps the intermediate results small when the last element
/// is a vector.
///
/// ## Panics
///
/// Panics if 'matrices' is empty or if two neighbouring matrices are not compatible.
pub fn product(matrices: &[&Matrix]) -> Matrix {
    assert!(
        !matrices.is_empty(),
        "Matrix: the product of an empty sequence is undefined"
    );

    let last = matrices.len() - 1;
    matrices[..last]
        .iter()
        .rev()
        .fold(matrices[last].clone(), |acc, m| mul(*m, &acc))
}

/// Adds a sequence of matrices.
///
/// ## Panics
///
/// Panics if 'matrices' is empty or if the matrices do not have identical dimensions.
pub fn sum(matrices: &[&Matrix]) -> Matrix {
    assert!(
        !matrices.is_empty(),
        "Matrix: the sum of an empty sequence is undefined"
    );

    let mut result = matrices[0].clone();
    for m in &matrices[1..] {
        result += *m;
    }

    result
}
