//! Conversions between the crate's ndarray types and the solver's nalgebra
//! types.
//!
//! The crate stores tables, curves, and residuals as ndarray values; the
//! external Levenberg-Marquardt solver speaks nalgebra. Conversions happen
//! only at that boundary.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

/// Convert an ndarray vector to a nalgebra vector
pub(crate) fn ndarray_to_nalgebra(arr: &Array1<f64>) -> DVector<f64> {
    DVector::from_iterator(arr.len(), arr.iter().copied())
}

/// Convert a nalgebra vector to an ndarray vector
pub(crate) fn nalgebra_to_ndarray(vec: &DVector<f64>) -> Array1<f64> {
    Array1::from_iter(vec.iter().copied())
}

/// Convert a nalgebra matrix to an ndarray matrix
#[allow(dead_code)]
pub(crate) fn nalgebra_to_ndarray_matrix(mat: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}
