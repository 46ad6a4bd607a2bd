//! Power-law fitting by linear regression in log space.
//!
//! A power law `y = A * x^n` is linear in log space:
//! `ln y = n * ln x + ln A`. Each column is fit independently by closed-form
//! ordinary least squares on the log-transformed data; no iterative solver
//! is involved.

use crate::error::{Result, TabFitError};
use crate::fit::{Curve, CurveSet, ParamTable};
use crate::table::{MissingPolicy, Table};
use ndarray::{Array1, Array2};

/// Options for a power-law fit.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerLawOptions {
    /// Which cell values count as missing
    pub missing: MissingPolicy,
}

/// The aggregate result of a power-law fit.
///
/// `values` is indexed by input column label with columns `n` and `A`;
/// `fits` holds the curve `A * x^n` evaluated at every non-missing x per
/// column.
#[derive(Debug, Clone)]
pub struct PowerLawFit {
    /// Fitted `n` (slope) and `A` (exponentiated intercept) per column
    pub values: ParamTable,
    /// Fitted curves over each column's cleaned x domain
    pub fits: CurveSet,
}

/// Fit a power law to each column of a table.
///
/// Missing rows are dropped per column. Any remaining non-positive x or y
/// value makes the log transform undefined and fails the call with a
/// [`TabFitError::DomainError`] naming the column — never a silently
/// produced NaN.
///
/// # Examples
///
/// ```
/// use tabfit::{fit_powerlaw, PowerLawOptions, Table};
///
/// let x: Vec<f64> = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let y: Vec<f64> = x.iter().map(|x| 2.0 * x.powf(0.5)).collect();
/// let table = Table::from_series(x, "trial", y).unwrap();
///
/// let fit = fit_powerlaw(&table, &PowerLawOptions::default()).unwrap();
/// assert!((fit.values.get("trial", "n").unwrap() - 0.5).abs() < 1e-12);
/// assert!((fit.values.get("trial", "A").unwrap() - 2.0).abs() < 1e-12);
/// ```
pub fn fit_powerlaw(data: &Table, options: &PowerLawOptions) -> Result<PowerLawFit> {
    if data.ncols() == 0 || data.nrows() == 0 {
        return Err(TabFitError::InvalidInput(
            "table must have at least one row and one column".to_string(),
        ));
    }

    let param_names = vec!["n".to_string(), "A".to_string()];
    let mut values = Array2::from_elem((data.ncols(), 2), f64::NAN);
    let mut fits = Vec::with_capacity(data.ncols());

    for col in 0..data.ncols() {
        let column = data.column_data(col, &options.missing);

        if column.is_empty() {
            return Err(TabFitError::InvalidInput(format!(
                "column '{}' has no non-missing rows",
                column.label
            )));
        }

        if column.x.iter().any(|&v| v <= 0.0) || column.y.iter().any(|&v| v <= 0.0) {
            return Err(TabFitError::DomainError(format!(
                "column '{}': log of non-positive value",
                column.label
            )));
        }

        let log_x = column.x.mapv(f64::ln);
        let log_y = column.y.mapv(f64::ln);

        let (slope, intercept) = linear_regression(&log_x, &log_y)?;
        let amplitude = intercept.exp();

        values[[col, 0]] = slope;
        values[[col, 1]] = amplitude;

        fits.push(Curve {
            label: column.label.clone(),
            index: column.x.clone(),
            values: column.x.mapv(|x| amplitude * x.powf(slope)),
        });
    }

    Ok(PowerLawFit {
        values: ParamTable::new(data.labels().to_vec(), param_names, values),
        fits: CurveSet::new(fits),
    })
}

/// Closed-form ordinary least squares: slope and intercept of y on x.
fn linear_regression(x: &Array1<f64>, y: &Array1<f64>) -> Result<(f64, f64)> {
    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(&x, &y)| x * y).sum();
    let sum_xx: f64 = x.iter().map(|&x| x * x).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < 1e-12 {
        return Err(TabFitError::ComputationError(
            "cannot fit a power law: x values are constant".to_string(),
        ));
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    Ok((slope, intercept))
}
