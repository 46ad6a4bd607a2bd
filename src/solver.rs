//! Integration with the external nonlinear solver.
//!
//! The Levenberg-Marquardt minimization is delegated wholesale to the
//! `levenberg-marquardt` crate; nothing here iterates, damps, or steps. This
//! module adapts one column's objective to that crate's
//! [`LeastSquaresProblem`] interface: the varying subset of a [`Parameters`]
//! snapshot maps onto the solver's flat parameter vector, values proposed by
//! the solver are clamped into each parameter's bounds, and the Jacobian is
//! approximated by finite differences over the residual closure.
//!
//! Convergence failure is reported, never swallowed: the solver's
//! termination status travels back to the fit driver on [`SolverOutput`].

use crate::error::{Result, TabFitError};
use crate::parameters::Parameters;
use crate::residual::{self, ResidualConfig};
use crate::uncertainty;
use crate::utils::{finite_difference, matrix_convert};
use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{storage::Owned, DMatrix, DVector, Dyn};
use ndarray::Array1;

/// The outcome of one column's minimization.
pub(crate) struct SolverOutput {
    /// Parameter set at the optimum, standard errors attached where available
    pub params: Parameters,
    /// Residual vector at the optimum (weighted, as minimized)
    pub residuals: Array1<f64>,
    /// Whether the solver's termination criteria were satisfied
    pub success: bool,
    /// The solver's termination status, for diagnostics
    pub message: String,
}

/// Adapter exposing one column's residual objective to the solver.
struct ColumnProblem<'a, M> {
    model: &'a M,
    x: &'a Array1<f64>,
    y: &'a Array1<f64>,
    weights: Option<&'a Array1<f64>>,
    config: &'a ResidualConfig,
    /// Full parameter set; the solver drives only the varying subset
    base: Parameters,
    /// Current varying values, in parameter insertion order
    varying: DVector<f64>,
}

impl<M> Clone for ColumnProblem<'_, M> {
    fn clone(&self) -> Self {
        Self {
            model: self.model,
            x: self.x,
            y: self.y,
            weights: self.weights,
            config: self.config,
            base: self.base.clone(),
            varying: self.varying.clone(),
        }
    }
}

impl<M> ColumnProblem<'_, M>
where
    M: Fn(f64, &Parameters) -> f64,
{
    /// Evaluate the residual vector at an arbitrary varying-parameter vector.
    fn residuals_at(&self, v: &DVector<f64>) -> Result<DVector<f64>> {
        let mut params = self.base.clone();
        params.update_varying(v.as_slice())?;

        let e = residual::residuals(
            self.model,
            &params,
            self.x,
            self.y,
            self.weights,
            self.config,
        )?;

        Ok(matrix_convert::ndarray_to_nalgebra(&e))
    }
}

impl<M> LeastSquaresProblem<f64, Dyn, Dyn> for ColumnProblem<'_, M>
where
    M: Fn(f64, &Parameters) -> f64,
{
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, x: &DVector<f64>) {
        // update_varying clamps into bounds; report the clamped values back
        // to the solver so its state matches what is actually evaluated
        if self.base.update_varying(x.as_slice()).is_ok() {
            let clamped: Vec<f64> = self
                .base
                .varying_values()
                .into_iter()
                .map(|(_, v)| v)
                .collect();
            self.varying = DVector::from_vec(clamped);
        }
    }

    fn params(&self) -> DVector<f64> {
        self.varying.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        self.residuals_at(&self.varying).ok()
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        finite_difference::jacobian(|v| self.residuals_at(v), &self.varying, None).ok()
    }
}

/// Minimize one column's objective and package the solver's outputs.
///
/// `x` is the independent variable and `y` the observed one; for inverted
/// models the caller has already swapped them. The returned parameter set
/// carries the values at the optimum; standard errors are attached from the
/// covariance estimate, or left unset when `J^T J` is singular at the
/// solution.
pub(crate) fn solve<M>(
    model: &M,
    params: Parameters,
    x: &Array1<f64>,
    y: &Array1<f64>,
    weights: Option<&Array1<f64>>,
    config: &ResidualConfig,
) -> Result<SolverOutput>
where
    M: Fn(f64, &Parameters) -> f64,
{
    let nvarys = params.varying().len();
    let ndata = x.len();

    let initial: Vec<f64> = params.varying_values().into_iter().map(|(_, v)| v).collect();
    let problem = ColumnProblem {
        model,
        x,
        y,
        weights,
        config,
        base: params,
        varying: DVector::from_vec(initial),
    };

    let (problem, report) = LevenbergMarquardt::new().minimize(problem);
    let success = report.termination.was_successful();
    let message = format!("{:?}", report.termination);

    let residuals_vec = problem.residuals_at(&problem.varying).map_err(|e| {
        TabFitError::ConvergenceFailure(format!(
            "residual evaluation at the solution failed: {}",
            e
        ))
    })?;

    let chisqr = residuals_vec.norm_squared();
    let redchi = uncertainty::reduced_chi_square(chisqr, ndata, nvarys);

    let errors: Option<Vec<f64>> =
        finite_difference::jacobian(|v| problem.residuals_at(v), &problem.varying, None)
            .ok()
            .and_then(|jac| uncertainty::covariance(&jac, redchi))
            .map(|covar| uncertainty::standard_errors(&covar));

    let mut fitted = problem.base.clone();
    let varying_names: Vec<String> = fitted
        .varying()
        .into_iter()
        .map(|p| p.name().to_string())
        .collect();

    for (i, name) in varying_names.iter().enumerate() {
        if let Some(param) = fitted.get_mut(name) {
            param.stderr = errors.as_ref().and_then(|e| e.get(i).copied());
        }
    }

    Ok(SolverOutput {
        params: fitted,
        residuals: matrix_convert::nalgebra_to_ndarray(&residuals_vec),
        success,
        message,
    })
}
