//! # tabfit
//!
//! `tabfit` is a convenience layer for nonlinear least-squares curve fitting
//! across many columns of tabular, time-indexed data, plus a power-law fit
//! via log-log linear regression.
//!
//! The library provides:
//! - A column-wise fit driver: one fit per data column, with missing values
//!   dropped per column and results aggregated into aligned tables
//! - A parameter system with bounds and fixed/varying flags, and per-column
//!   parameter factories for data-derived starting points
//! - Log-space and weighted residuals with an explicit non-finite policy
//! - A closed-form power-law fitter
//!
//! The Levenberg-Marquardt minimization itself is delegated to the
//! `levenberg-marquardt` crate; tabfit orchestrates it and reshapes its
//! outputs.
//!
//! ## Basic Usage
//!
//! ```
//! use tabfit::{nls, NlsOptions, ParamSpec, Parameters, Table};
//!
//! // Two trials sampled at the same x values, fit independently.
//! let table = Table::from_columns(
//!     vec![1.0, 2.0, 3.0, 4.0, 5.0],
//!     vec![
//!         ("trial_a", vec![2.0, 4.0, 6.0, 8.0, 10.0]),
//!         ("trial_b", vec![3.0, 6.0, 9.0, 12.0, 15.0]),
//!     ],
//! )
//! .unwrap();
//!
//! let mut params = Parameters::new();
//! params.add_param("slope", 1.0);
//!
//! let model = |x: f64, p: &Parameters| p.value_of("slope").unwrap() * x;
//!
//! let result = nls(&table, model, &ParamSpec::fixed(params), &NlsOptions::new()).unwrap();
//! assert!(result.is_success());
//! assert!((result.values.get("trial_b", "slope").unwrap() - 3.0).abs() < 1e-6);
//! ```

// Public modules
pub mod error;

// Parameter system
pub mod parameters;

// Tabular input data
pub mod table;

// Residual construction
pub mod residual;

// Column-wise fit driver and result aggregation
pub mod fit;

// Power-law fitting
pub mod powerlaw;

// Uncertainty estimation at the solver boundary
pub mod uncertainty;

// Plotting interface (rendering backend behind the `plot` feature)
pub mod plot;

mod solver;
mod utils;

// Re-exports for convenience
pub use error::{Result, TabFitError};

pub use fit::{nls, nls_parallel, Curve, CurveSet, FitFailure, NlsOptions, NlsResult, ParamSpec, ParamTable};
pub use parameters::{Parameter, Parameters};
pub use powerlaw::{fit_powerlaw, PowerLawFit, PowerLawOptions};
pub use residual::{NonFinitePolicy, ResidualConfig};
pub use table::{ColumnData, MissingPolicy, Table};

pub use plot::{PlotOptions, Plotter};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
