//! Internal utilities: numerical differentiation and conversions at the
//! solver boundary.

pub(crate) mod finite_difference;
pub(crate) mod matrix_convert;
