/// Defines the owning dense matrix and the capability traits shared with the views
pub mod matrix;

/// Defines the zero-copy transposed and block views over a matrix
pub mod views;
