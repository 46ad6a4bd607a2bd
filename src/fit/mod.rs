//! Column-wise nonlinear least-squares fitting.
//!
//! The driver here fits one model form across every column of a [`Table`]:
//! per column it drops missing rows, resolves a parameter set, hands the
//! objective to the external Levenberg-Marquardt solver, and folds the
//! outputs into one aggregate [`NlsResult`].
//!
//! Input-validation problems abort the whole call before any solver work.
//! Per-column solver failures do not: each column's attempt is independent,
//! and failed columns are reported on the result's `failures` list while the
//! remaining columns proceed.

pub mod result;

pub use result::{Curve, CurveSet, FitFailure, NlsResult, ParamTable};

use crate::error::{Result, TabFitError};
use crate::parameters::Parameters;
use crate::residual::{NonFinitePolicy, ResidualConfig};
use crate::solver;
use crate::table::{ColumnData, MissingPolicy, Table};
use ndarray::{Array1, Array2};
use rayon::prelude::*;

/// Per-column parameter resolution: a single parameter set reused for every
/// column, or a factory deriving one from each column's cleaned data.
///
/// The factory form enables per-column-adapted starting points; the fixed
/// form is the constant-returning special case.
pub enum ParamSpec {
    /// The same parameter set for every column
    Fixed(Parameters),
    /// Derive a parameter set from a column's non-missing data
    FromColumn(Box<dyn Fn(&ColumnData) -> Result<Parameters> + Send + Sync>),
}

impl ParamSpec {
    /// A spec that reuses `params` for every column
    pub fn fixed(params: Parameters) -> Self {
        ParamSpec::Fixed(params)
    }

    /// A spec that derives each column's parameters from its data
    pub fn from_column<F>(factory: F) -> Self
    where
        F: Fn(&ColumnData) -> Result<Parameters> + Send + Sync + 'static,
    {
        ParamSpec::FromColumn(Box::new(factory))
    }

    fn resolve(&self, column: &ColumnData) -> Result<Parameters> {
        match self {
            ParamSpec::Fixed(params) => Ok(params.clone()),
            ParamSpec::FromColumn(factory) => factory(column),
        }
    }
}

/// Options for a column-wise fit.
#[derive(Default)]
pub struct NlsOptions {
    /// Compute residuals in log space
    pub log_residual: bool,

    /// The model is expressed as x(y); swap the residual's argument roles
    pub inverted_model: bool,

    /// Optional per-row weights, same length as the table's row count
    pub weights: Option<Vec<f64>>,

    /// Handling of non-finite residual entries
    pub nonfinite: NonFinitePolicy,

    /// Which cell values count as missing
    pub missing: MissingPolicy,
}

impl NlsOptions {
    /// Options matching the historical fitting behavior: infinite cells are
    /// treated as missing for the duration of the fit.
    pub fn new() -> Self {
        Self {
            missing: MissingPolicy {
                infinite_as_missing: true,
            },
            ..Self::default()
        }
    }
}

/// Everything validated and resolved before any solver work.
struct Prepared {
    columns: Vec<ColumnData>,
    column_params: Vec<Parameters>,
    param_names: Vec<String>,
    weights: Option<Array1<f64>>,
    config: ResidualConfig,
}

/// The raw outcome of one column's fit attempt.
struct ColumnOutcome {
    label: String,
    params: Option<Parameters>,
    residuals: Option<Curve>,
    fit: Option<Curve>,
    failure: Option<String>,
}

/// Fit a model to every column of a table.
///
/// For each column, rows whose value is missing are excluded (together with
/// their x values), the parameter spec is resolved, and the objective is
/// minimized by the external solver. Outputs are aggregated so that the
/// `values`/`stderr` row labels equal the table's column labels and their
/// column names equal the parameter names.
///
/// # Examples
///
/// ```
/// use tabfit::{nls, NlsOptions, ParamSpec, Parameters, Table};
///
/// let table = Table::from_series(
///     vec![1.0, 2.0, 3.0, 4.0, 5.0],
///     "trial",
///     vec![2.0, 4.0, 6.0, 8.0, 10.0],
/// ).unwrap();
///
/// let mut params = Parameters::new();
/// params.add_param("slope", 1.0);
///
/// let model = |x: f64, p: &Parameters| p.value_of("slope").unwrap() * x;
/// let result = nls(&table, model, &ParamSpec::fixed(params), &NlsOptions::new()).unwrap();
///
/// assert!(result.is_success());
/// let slope = result.values.get("trial", "slope").unwrap();
/// assert!((slope - 2.0).abs() < 1e-6);
/// ```
pub fn nls<M>(data: &Table, model: M, params: &ParamSpec, options: &NlsOptions) -> Result<NlsResult>
where
    M: Fn(f64, &Parameters) -> f64,
{
    let prepared = prepare(data, params, options)?;

    let outcomes: Vec<ColumnOutcome> = prepared
        .columns
        .iter()
        .zip(prepared.column_params.iter())
        .map(|(column, col_params)| {
            fit_column(
                &model,
                column,
                col_params.clone(),
                prepared.weights.as_ref(),
                &prepared.config,
                options.inverted_model,
            )
        })
        .collect();

    Ok(aggregate(data.labels(), prepared.param_names, outcomes))
}

/// Fit a model to every column of a table, columns in parallel.
///
/// Per-column fits share no mutable state, so the column loop runs on a
/// rayon parallel iterator. Semantics and output ordering are identical to
/// [`nls`].
pub fn nls_parallel<M>(
    data: &Table,
    model: M,
    params: &ParamSpec,
    options: &NlsOptions,
) -> Result<NlsResult>
where
    M: Fn(f64, &Parameters) -> f64 + Sync,
{
    let prepared = prepare(data, params, options)?;

    let outcomes: Vec<ColumnOutcome> = prepared
        .columns
        .par_iter()
        .zip(prepared.column_params.par_iter())
        .map(|(column, col_params)| {
            fit_column(
                &model,
                column,
                col_params.clone(),
                prepared.weights.as_ref(),
                &prepared.config,
                options.inverted_model,
            )
        })
        .collect();

    Ok(aggregate(data.labels(), prepared.param_names, outcomes))
}

/// Validate inputs and resolve per-column parameter sets up front.
///
/// Everything here is cheap to check and costly to discover mid-batch, so
/// any failure aborts the call before the first solver invocation.
fn prepare(data: &Table, params: &ParamSpec, options: &NlsOptions) -> Result<Prepared> {
    if data.ncols() == 0 || data.nrows() == 0 {
        return Err(TabFitError::InvalidInput(
            "table must have at least one row and one column".to_string(),
        ));
    }

    let weights = match &options.weights {
        Some(w) => {
            if w.len() != data.nrows() {
                return Err(TabFitError::InvalidInput(format!(
                    "weights must be a sequence the same length as the data: expected {}, got {}",
                    data.nrows(),
                    w.len()
                )));
            }
            Some(Array1::from_vec(w.clone()))
        }
        None => None,
    };

    let config = ResidualConfig {
        log_residual: options.log_residual,
        nonfinite: options.nonfinite,
    };

    let mut columns = Vec::with_capacity(data.ncols());
    let mut column_params = Vec::with_capacity(data.ncols());
    let mut param_names: Vec<String> = Vec::new();

    for col in 0..data.ncols() {
        let column = data.column_data(col, &options.missing);

        if column.is_empty() {
            return Err(TabFitError::InvalidInput(format!(
                "column '{}' has no non-missing rows",
                column.label
            )));
        }

        let resolved = params.resolve(&column)?;
        if resolved.is_empty() {
            return Err(TabFitError::InvalidInput(format!(
                "empty parameter set for column '{}'",
                column.label
            )));
        }
        if resolved.varying().is_empty() {
            return Err(TabFitError::InvalidInput(format!(
                "parameter set for column '{}' has no varying parameters",
                column.label
            )));
        }

        if param_names.is_empty() {
            param_names = resolved.names();
        } else if resolved.names() != param_names {
            return Err(TabFitError::InvalidInput(format!(
                "parameter factory returned inconsistent names for column '{}': \
                 expected {:?}, got {:?}",
                column.label,
                param_names,
                resolved.names()
            )));
        }

        // With the mean substitution disabled, a non-positive observed value
        // would send NaN straight to the solver; reject it up front.
        if options.log_residual && options.nonfinite == NonFinitePolicy::Propagate {
            let observed = if options.inverted_model {
                &column.x
            } else {
                &column.y
            };
            if observed.iter().any(|&v| v <= 0.0) {
                return Err(TabFitError::InvalidInput(format!(
                    "column '{}' has non-positive values under log_residual",
                    column.label
                )));
            }
        }

        columns.push(column);
        column_params.push(resolved);
    }

    Ok(Prepared {
        columns,
        column_params,
        param_names,
        weights,
        config,
    })
}

/// Run one column's fit attempt; never fails the batch.
fn fit_column<M>(
    model: &M,
    column: &ColumnData,
    params: Parameters,
    weights: Option<&Array1<f64>>,
    config: &ResidualConfig,
    inverted: bool,
) -> ColumnOutcome
where
    M: Fn(f64, &Parameters) -> f64,
{
    let label = column.label.clone();

    let nvarys = params.varying().len();
    if column.len() < nvarys {
        return ColumnOutcome {
            label: label.clone(),
            params: None,
            residuals: None,
            fit: None,
            failure: Some(format!(
                "underdetermined: {} non-missing rows for {} varying parameters",
                column.len(),
                nvarys
            )),
        };
    }

    // Weights align with the table's rows; keep only the entries for this
    // column's non-missing rows.
    let column_weights: Option<Array1<f64>> = weights.map(|w| {
        Array1::from_iter(column.rows.iter().map(|&i| w[i]))
    });

    // Inverted models are expressed as x(y): the roles of independent and
    // observed swap for the minimization.
    let (independent, observed) = if inverted {
        (&column.y, &column.x)
    } else {
        (&column.x, &column.y)
    };

    match solver::solve(
        model,
        params,
        independent,
        observed,
        column_weights.as_ref(),
        config,
    ) {
        Ok(out) => {
            let fitted_curve = independent.mapv(|v| model(v, &out.params));

            ColumnOutcome {
                label: label.clone(),
                residuals: Some(Curve {
                    label: label.clone(),
                    index: column.x.clone(),
                    values: out.residuals,
                }),
                fit: Some(Curve {
                    label: label.clone(),
                    index: independent.clone(),
                    values: fitted_curve,
                }),
                failure: if out.success {
                    None
                } else {
                    Some(out.message)
                },
                params: Some(out.params),
            }
        }
        Err(e) => ColumnOutcome {
            label,
            params: None,
            residuals: None,
            fit: None,
            failure: Some(format!("{}", e)),
        },
    }
}

/// Reshape the per-column outcomes into one aligned result.
fn aggregate(labels: &[String], param_names: Vec<String>, outcomes: Vec<ColumnOutcome>) -> NlsResult {
    let nrows = labels.len();
    let ncols = param_names.len();

    let mut values = Array2::from_elem((nrows, ncols), f64::NAN);
    let mut stderr = Array2::from_elem((nrows, ncols), f64::NAN);
    let mut residuals = Vec::new();
    let mut fits = Vec::new();
    let mut failures = Vec::new();
    let mut column_params = Vec::new();

    for (i, outcome) in outcomes.into_iter().enumerate() {
        if let Some(params) = &outcome.params {
            for (j, name) in param_names.iter().enumerate() {
                if let Some(param) = params.get(name) {
                    values[[i, j]] = param.value();
                    stderr[[i, j]] = param.stderr.unwrap_or(f64::NAN);
                }
            }
        }

        if let Some(curve) = outcome.residuals {
            residuals.push(curve);
        }
        if let Some(curve) = outcome.fit {
            fits.push(curve);
        }
        if let Some(message) = outcome.failure {
            failures.push(FitFailure {
                column: outcome.label.clone(),
                message,
            });
        }
        if let Some(params) = outcome.params {
            column_params.push((outcome.label, params));
        }
    }

    NlsResult {
        values: ParamTable::new(labels.to_vec(), param_names.clone(), values),
        stderr: ParamTable::new(labels.to_vec(), param_names, stderr),
        residuals: CurveSet::new(residuals),
        fits: CurveSet::new(fits),
        failures,
        column_params,
    }
}
