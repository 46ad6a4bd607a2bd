//! Finite difference methods for numerical differentiation.
//!
//! The external solver consumes a Jacobian of the residual vector with
//! respect to the varying parameters. Models here are arbitrary closures, so
//! the Jacobian is approximated by forward differences with a step scaled to
//! each parameter's magnitude.

use crate::error::{Result, TabFitError};
use nalgebra::{DMatrix, DVector};

/// Default step size for finite differences.
const DEFAULT_EPSILON: f64 = 1e-8;

/// Compute the Jacobian matrix using forward finite differences.
///
/// `J[i, j] = ∂residual[i] / ∂param[j]`, evaluated by perturbing one
/// parameter at a time.
///
/// # Arguments
///
/// * `eval` - Evaluates the residual vector at a given parameter vector
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The step size for finite differences (optional)
pub(crate) fn jacobian<F>(
    eval: F,
    params: &DVector<f64>,
    epsilon: Option<f64>,
) -> Result<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> Result<DVector<f64>>,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();

    let residuals = eval(params)?;
    let n_residuals = residuals.len();

    let mut jac = DMatrix::zeros(n_residuals, n_params);

    for j in 0..n_params {
        let mut perturbed = params.clone();

        // Adapt epsilon to parameter scale
        let param_j = params[j];
        let eps_j = if param_j.abs() > eps {
            param_j.abs() * eps
        } else {
            eps
        };

        perturbed[j] += eps_j;

        let residuals_perturbed = eval(&perturbed)?;
        if residuals_perturbed.len() != n_residuals {
            return Err(TabFitError::DimensionMismatch(format!(
                "expected {} residuals, got {}",
                n_residuals,
                residuals_perturbed.len()
            )));
        }

        for i in 0..n_residuals {
            jac[(i, j)] = (residuals_perturbed[i] - residuals[i]) / eps_j;
        }
    }

    Ok(jac)
}
