//! Tabular input data for column-wise fitting
//!
//! A [`Table`] holds a numeric row index (the exogenous "x" axis) and one or
//! more labeled columns of observations. Cells may be missing; missing
//! entries are excluded per column before fitting. Missing-value handling is
//! a local, explicit policy ([`MissingPolicy`]) rather than any process-wide
//! option.

use crate::error::{Result, TabFitError};
use ndarray::{Array1, Array2};

/// Policy controlling which cell values count as missing.
///
/// `NaN` cells are always missing. With `infinite_as_missing` set,
/// infinite cells are treated as missing as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissingPolicy {
    /// Treat infinite cell values as missing
    pub infinite_as_missing: bool,
}

impl MissingPolicy {
    /// Check whether a cell value counts as missing under this policy
    pub fn is_missing(&self, value: f64) -> bool {
        if self.infinite_as_missing {
            !value.is_finite()
        } else {
            value.is_nan()
        }
    }
}

/// A single column's non-missing data, paired with its x subset.
///
/// This is the view handed to per-column parameter factories and to the
/// solver: row k of the original table appears here only if the column's
/// value at row k is present.
#[derive(Debug, Clone)]
pub struct ColumnData {
    /// Label of the originating column
    pub label: String,
    /// The x values of the non-missing rows
    pub x: Array1<f64>,
    /// The column's non-missing values
    pub y: Array1<f64>,
    /// Positions of the kept rows in the original index
    pub rows: Vec<usize>,
}

impl ColumnData {
    /// Number of non-missing rows
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Whether the column has no non-missing rows
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// A 2D table of observations: rows indexed by a numeric x axis, columns are
/// independent trials.
///
/// # Examples
///
/// ```
/// use tabfit::Table;
///
/// let table = Table::from_columns(
///     vec![1.0, 2.0, 3.0],
///     vec![("trial_a", vec![2.0, 4.0, 6.0]), ("trial_b", vec![3.0, 6.0, 9.0])],
/// ).unwrap();
///
/// assert_eq!(table.nrows(), 3);
/// assert_eq!(table.ncols(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    x: Array1<f64>,
    labels: Vec<String>,
    data: Array2<f64>,
}

impl Table {
    /// Create a table from an x index, column labels, and a data matrix
    ///
    /// The matrix must be shaped `(x.len(), labels.len())`. Every x value
    /// must be finite; `NaN` cells in `data` denote missing observations.
    pub fn new(x: Vec<f64>, labels: Vec<String>, data: Array2<f64>) -> Result<Self> {
        if let Some(bad) = x.iter().find(|v| !v.is_finite()) {
            return Err(TabFitError::InvalidInput(format!(
                "table index must be finite and numeric, found {}",
                bad
            )));
        }

        if data.nrows() != x.len() || data.ncols() != labels.len() {
            return Err(TabFitError::DimensionMismatch(format!(
                "expected data of shape [{}, {}], got {:?}",
                x.len(),
                labels.len(),
                data.shape()
            )));
        }

        Ok(Self {
            x: Array1::from_vec(x),
            labels,
            data,
        })
    }

    /// Create a table from an x index and labeled column vectors
    ///
    /// Every column must have the same length as the index.
    pub fn from_columns(x: Vec<f64>, columns: Vec<(&str, Vec<f64>)>) -> Result<Self> {
        let nrows = x.len();
        let ncols = columns.len();

        let mut labels = Vec::with_capacity(ncols);
        let mut data = Array2::zeros((nrows, ncols));

        for (j, (label, values)) in columns.into_iter().enumerate() {
            if values.len() != nrows {
                return Err(TabFitError::DimensionMismatch(format!(
                    "column '{}' has {} rows, expected {}",
                    label,
                    values.len(),
                    nrows
                )));
            }
            labels.push(label.to_string());
            for (i, v) in values.into_iter().enumerate() {
                data[[i, j]] = v;
            }
        }

        Self::new(x, labels, data)
    }

    /// Create a single-column table from an x index and one series
    pub fn from_series(x: Vec<f64>, label: &str, values: Vec<f64>) -> Result<Self> {
        Self::from_columns(x, vec![(label, values)])
    }

    /// Number of rows (length of the x index)
    pub fn nrows(&self) -> usize {
        self.x.len()
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.labels.len()
    }

    /// The x index
    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    /// The column labels, in order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The raw cell matrix, shaped `(nrows, ncols)`
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Position of a column by label
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Extract one column's non-missing data under the given policy
    ///
    /// Rows whose cell is missing are dropped, together with the
    /// corresponding x values.
    pub fn column_data(&self, col: usize, policy: &MissingPolicy) -> ColumnData {
        let label = self.labels[col].clone();
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut rows = Vec::new();

        for i in 0..self.nrows() {
            let v = self.data[[i, col]];
            if !policy.is_missing(v) {
                x.push(self.x[i]);
                y.push(v);
                rows.push(i);
            }
        }

        ColumnData {
            label,
            x: Array1::from_vec(x),
            y: Array1::from_vec(y),
            rows,
        }
    }
}
