//! Residual construction for least-squares objectives
//!
//! Given a scalar model `f(x, &Parameters) -> f64`, this module builds the
//! residual vector fed to the minimizer: observed minus predicted, optionally
//! in log space, optionally weighted.
//!
//! Log-space residuals are undefined wherever an observed or predicted value
//! is non-positive. The original behavior — silently substituting the mean of
//! the finite residuals for each non-finite entry — is a numerically
//! significant policy, not an implementation detail, so it is exposed here as
//! an explicit [`NonFinitePolicy`] that callers can disable.

use crate::error::{Result, TabFitError};
use crate::parameters::Parameters;
use ndarray::Array1;

/// How to handle non-finite entries in a residual vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NonFinitePolicy {
    /// Replace each non-finite residual with the mean of the finite ones.
    ///
    /// This keeps the minimizer from diverging on ill-defined points, at the
    /// cost of some bias: the substitution silently flattens the optimization
    /// landscape at those points.
    #[default]
    ReplaceWithMean,

    /// Leave non-finite residuals in place.
    ///
    /// The driver rejects inputs that would produce them where that is
    /// checkable up front; anything that slips through is the solver's to
    /// report as a failure.
    Propagate,
}

/// Configuration for residual construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResidualConfig {
    /// Compute the residual in log space: `ln(observed) - ln(predicted)`
    pub log_residual: bool,

    /// Handling of non-finite residual entries
    pub nonfinite: NonFinitePolicy,
}

/// Compute the residual vector for one evaluation of the objective.
///
/// `x` is the independent variable, `y` the observed dependent variable
/// (already cleaned of missing rows); in inverted-model fits the caller
/// swaps the two. `weights`, when present, must be the same length as `x`
/// and is multiplied elementwise into the residual last.
pub fn residuals<M>(
    model: &M,
    params: &Parameters,
    x: &Array1<f64>,
    y: &Array1<f64>,
    weights: Option<&Array1<f64>>,
    config: &ResidualConfig,
) -> Result<Array1<f64>>
where
    M: Fn(f64, &Parameters) -> f64,
{
    if x.len() != y.len() {
        return Err(TabFitError::DimensionMismatch(format!(
            "expected {} observed values, got {}",
            x.len(),
            y.len()
        )));
    }

    let predicted = x.mapv(|xi| model(xi, params));

    let mut e: Array1<f64> = if config.log_residual {
        y.iter()
            .zip(predicted.iter())
            .map(|(&obs, &pred)| obs.ln() - pred.ln())
            .collect()
    } else {
        y - &predicted
    };

    if config.nonfinite == NonFinitePolicy::ReplaceWithMean {
        replace_nonfinite_with_mean(&mut e);
    }

    if let Some(w) = weights {
        if w.len() != e.len() {
            return Err(TabFitError::DimensionMismatch(format!(
                "expected {} weights, got {}",
                e.len(),
                w.len()
            )));
        }
        e = &e * w;
    }

    Ok(e)
}

/// Replace non-finite entries with the mean of the finite ones.
///
/// If no entry is finite the vector is left untouched; the solver will
/// surface the failure.
fn replace_nonfinite_with_mean(e: &mut Array1<f64>) {
    let finite: Vec<f64> = e.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || finite.len() == e.len() {
        return;
    }

    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    e.mapv_inplace(|v| if v.is_finite() { v } else { mean });
}
