//! Aggregate result types for column-wise fits.
//!
//! One fit run covers every column of the input table; the per-column
//! scalars and series are reshaped here into aligned tables. All result
//! types are immutable value objects, fully populated before they are
//! returned.

use crate::parameters::Parameters;
use ndarray::{Array1, Array2, ArrayView1};

/// A 2D table of per-column scalars: rows are input column labels, columns
/// are parameter names.
///
/// The row order equals the input table's column order; the column order
/// equals the parameter set's insertion order.
#[derive(Debug, Clone)]
pub struct ParamTable {
    row_labels: Vec<String>,
    column_names: Vec<String>,
    data: Array2<f64>,
}

impl ParamTable {
    pub(crate) fn new(row_labels: Vec<String>, column_names: Vec<String>, data: Array2<f64>) -> Self {
        debug_assert_eq!(data.nrows(), row_labels.len());
        debug_assert_eq!(data.ncols(), column_names.len());
        Self {
            row_labels,
            column_names,
            data,
        }
    }

    /// Row labels (the input table's column labels), in order
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    /// Column names (the parameter names), in order
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Look up a cell by row label and column name
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.row_labels.iter().position(|l| l == row)?;
        let j = self.column_names.iter().position(|c| c == column)?;
        Some(self.data[[i, j]])
    }

    /// One row as a view, by label
    pub fn row(&self, label: &str) -> Option<ArrayView1<'_, f64>> {
        let i = self.row_labels.iter().position(|l| l == label)?;
        Some(self.data.row(i))
    }

    /// One column as a view, by parameter name
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let j = self.column_names.iter().position(|c| c == name)?;
        Some(self.data.column(j))
    }

    /// The underlying matrix, shaped `(rows, columns)`
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Table shape as `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.row_labels.len(), self.column_names.len())
    }
}

/// One column's series output, indexed by that column's non-missing domain.
#[derive(Debug, Clone)]
pub struct Curve {
    /// Label of the originating column
    pub label: String,
    /// Index values (the cleaned x subset, or y subset for inverted fits)
    pub index: Array1<f64>,
    /// Series values aligned with `index`
    pub values: Array1<f64>,
}

/// Per-column series grouped by column label, in input column order.
///
/// The multi-index of the original design — (column label, per-column x) —
/// maps to one [`Curve`] per label.
#[derive(Debug, Clone, Default)]
pub struct CurveSet {
    curves: Vec<Curve>,
}

impl CurveSet {
    pub(crate) fn new(curves: Vec<Curve>) -> Self {
        Self { curves }
    }

    /// Number of curves
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    /// Whether the set holds no curves
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Curve labels, in order
    pub fn labels(&self) -> Vec<&str> {
        self.curves.iter().map(|c| c.label.as_str()).collect()
    }

    /// Look up a curve by column label
    pub fn get(&self, label: &str) -> Option<&Curve> {
        self.curves.iter().find(|c| c.label == label)
    }

    /// Iterate over the curves in order
    pub fn iter(&self) -> impl Iterator<Item = &Curve> {
        self.curves.iter()
    }
}

/// A per-column diagnostic for a fit attempt that did not produce a
/// converged solution.
///
/// Failures never abort the batch; they are collected on the aggregate
/// result.
#[derive(Debug, Clone)]
pub struct FitFailure {
    /// Label of the column whose fit failed
    pub column: String,
    /// The solver's termination status or the reason the fit was skipped
    pub message: String,
}

/// The aggregate result of a column-wise nonlinear least-squares fit.
///
/// Constructed once, fully populated, and returned; there is no mutation
/// contract. Row labels of `values` and `stderr` always equal the input
/// table's column labels — including columns whose fit failed, whose cells
/// are NaN and whose labels appear in `failures`.
#[derive(Debug, Clone)]
pub struct NlsResult {
    /// Fitted parameter values: rows = input columns, columns = parameters
    pub values: ParamTable,
    /// Standard errors, aligned with `values`
    pub stderr: ParamTable,
    /// Per-column residual series at the optimum, indexed by the cleaned x
    pub residuals: CurveSet,
    /// Per-column fitted curves over the cleaned independent domain
    pub fits: CurveSet,
    /// Columns whose fit attempt failed, with diagnostics
    pub failures: Vec<FitFailure>,
    /// Fitted parameter set per column, in input column order
    pub(crate) column_params: Vec<(String, Parameters)>,
}

impl NlsResult {
    /// The fitted parameter set for one column, by label.
    ///
    /// Each column gets its own fitted parameters; this replaces the older
    /// convention of exposing only the last column's model.
    pub fn params_for(&self, label: &str) -> Option<&Parameters> {
        self.column_params
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| p)
    }

    /// Curry a model function with one column's fitted parameters.
    ///
    /// Returns `None` for unknown labels or columns whose fit failed before
    /// producing parameters.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use tabfit::{nls, NlsOptions, ParamSpec, Parameters, Table};
    /// # fn model(x: f64, p: &Parameters) -> f64 { unimplemented!() }
    /// # let table: Table = unimplemented!();
    /// # let spec: ParamSpec = unimplemented!();
    /// let result = nls(&table, model, &spec, &NlsOptions::default()).unwrap();
    /// let curve = result.model("trial_a", model).unwrap();
    /// let y_at_2 = curve(2.0);
    /// ```
    pub fn model<'a, M>(&'a self, label: &str, model: M) -> Option<impl Fn(f64) -> f64 + 'a>
    where
        M: Fn(f64, &Parameters) -> f64 + 'a,
    {
        let params = self.params_for(label)?;
        Some(move |x: f64| model(x, params))
    }

    /// Whether every column converged
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Labels of the columns whose fit failed, in input order
    pub fn failed_columns(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.column.as_str()).collect()
    }
}
