//! Parameter uncertainty estimation
//!
//! Standard errors for fitted parameters are derived from the Jacobian of
//! the residual vector at the optimum, following the usual nonlinear
//! least-squares estimate:
//!
//! ```text
//! covar = redchi * inv(J^T * J)        redchi = chi^2 / (ndata - nvarys)
//! ```
//!
//! Standard errors are the square roots of the covariance diagonal. A
//! singular `J^T J` yields `None`; callers report NaN standard errors in
//! that case rather than failing the fit.

use nalgebra::DMatrix;

/// Calculate the covariance matrix from the Jacobian at the optimum.
///
/// Returns `None` when `J^T J` is singular.
pub fn covariance(jacobian: &DMatrix<f64>, redchi: f64) -> Option<DMatrix<f64>> {
    let jtj = jacobian.transpose() * jacobian;
    jtj.try_inverse().map(|inv| inv * redchi)
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements; a negative
/// diagonal entry (numerically indefinite covariance) maps to NaN.
pub fn standard_errors(covar: &DMatrix<f64>) -> Vec<f64> {
    (0..covar.nrows())
        .map(|i| {
            let d = covar[(i, i)];
            if d >= 0.0 {
                d.sqrt()
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Reduced chi-square for a fit: `chi^2 / (ndata - nvarys)`.
///
/// Degrees of freedom are floored at one, matching the convention for
/// saturated fits.
pub fn reduced_chi_square(chisqr: f64, ndata: usize, nvarys: usize) -> f64 {
    let nfree = if ndata > nvarys { ndata - nvarys } else { 1 };
    chisqr / nfree as f64
}
