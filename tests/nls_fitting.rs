//! Integration tests for the column-wise NLS fit driver.

use approx::assert_relative_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tabfit::{
    nls, nls_parallel, NlsOptions, NonFinitePolicy, ParamSpec, Parameters, TabFitError, Table,
};

/// Power-law model: f(x) = amplitude * x^exponent
fn powerlaw(x: f64, params: &Parameters) -> f64 {
    let amplitude = params.value_of("amplitude").unwrap();
    let exponent = params.value_of("exponent").unwrap();
    amplitude * x.powf(exponent)
}

/// Linear model through the origin: f(x) = slope * x
fn line(x: f64, params: &Parameters) -> f64 {
    params.value_of("slope").unwrap() * x
}

fn powerlaw_start() -> Parameters {
    let mut params = Parameters::new();
    params.add_param("amplitude", 1.0);
    params.add_param("exponent", 1.0);
    params
}

fn two_trial_table() -> Table {
    let x : Vec<f64> = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let a: Vec<f64> = x.iter().map(|x| 2.0 * x.powf(0.5)).collect();
    let b: Vec<f64> = x.iter().map(|x| 3.0 * x).collect();
    Table::from_columns(x, vec![("trial_a", a), ("trial_b", b)]).unwrap()
}

#[test]
fn result_tables_are_aligned_with_input() {
    let table = two_trial_table();
    let result = nls(
        &table,
        powerlaw,
        &ParamSpec::fixed(powerlaw_start()),
        &NlsOptions::new(),
    )
    .unwrap();

    // Row labels equal the table's column labels, in order; column names
    // equal the parameter names, in insertion order.
    assert_eq!(result.values.row_labels(), table.labels());
    assert_eq!(result.values.column_names(), &["amplitude", "exponent"]);
    assert_eq!(result.stderr.row_labels(), table.labels());
    assert_eq!(result.stderr.column_names(), &["amplitude", "exponent"]);
}

#[test]
fn fitted_curve_covers_full_x_axis_without_missing_values() {
    let table = two_trial_table();
    let result = nls(
        &table,
        powerlaw,
        &ParamSpec::fixed(powerlaw_start()),
        &NlsOptions::new(),
    )
    .unwrap();

    for label in ["trial_a", "trial_b"] {
        let fit = result.fits.get(label).unwrap();
        assert_eq!(fit.index.to_vec(), table.x().to_vec());
        let residual = result.residuals.get(label).unwrap();
        assert_eq!(residual.index.to_vec(), table.x().to_vec());
    }
}

#[test]
fn recovers_known_parameters() {
    let table = two_trial_table();
    let result = nls(
        &table,
        powerlaw,
        &ParamSpec::fixed(powerlaw_start()),
        &NlsOptions::new(),
    )
    .unwrap();

    assert!(result.is_success());
    assert_relative_eq!(
        result.values.get("trial_a", "amplitude").unwrap(),
        2.0,
        epsilon = 1e-4
    );
    assert_relative_eq!(
        result.values.get("trial_a", "exponent").unwrap(),
        0.5,
        epsilon = 1e-4
    );
    assert_relative_eq!(
        result.values.get("trial_b", "amplitude").unwrap(),
        3.0,
        epsilon = 1e-4
    );
    assert_relative_eq!(
        result.values.get("trial_b", "exponent").unwrap(),
        1.0,
        epsilon = 1e-4
    );
}

#[test]
fn uniform_unit_weights_match_unweighted_fit() {
    let table = two_trial_table();

    let unweighted = nls(
        &table,
        powerlaw,
        &ParamSpec::fixed(powerlaw_start()),
        &NlsOptions::new(),
    )
    .unwrap();

    let mut options = NlsOptions::new();
    options.weights = Some(vec![1.0; table.nrows()]);
    let weighted = nls(&table, powerlaw, &ParamSpec::fixed(powerlaw_start()), &options).unwrap();

    for label in ["trial_a", "trial_b"] {
        for name in ["amplitude", "exponent"] {
            assert_relative_eq!(
                weighted.values.get(label, name).unwrap(),
                unweighted.values.get(label, name).unwrap(),
                epsilon = 1e-12
            );
        }
    }
}

#[test]
fn log_residual_recovers_noiseless_powerlaw() {
    let x: Vec<f64> = (1..=10).map(|i| i as f64).collect();
    let y: Vec<f64> = x.iter().map(|x| 2.0 * x.powf(0.5)).collect();
    let table = Table::from_series(x, "trial", y).unwrap();

    let mut options = NlsOptions::new();
    options.log_residual = true;
    let result = nls(&table, powerlaw, &ParamSpec::fixed(powerlaw_start()), &options).unwrap();

    assert!(result.is_success());
    assert_relative_eq!(
        result.values.get("trial", "amplitude").unwrap(),
        2.0,
        epsilon = 1e-3
    );
    assert_relative_eq!(
        result.values.get("trial", "exponent").unwrap(),
        0.5,
        epsilon = 1e-3
    );
}

#[test]
fn missing_row_excluded_only_for_its_column() {
    let x : Vec<f64> = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let mut a: Vec<f64> = x.iter().map(|x| 2.0 * x).collect();
    a[2] = f64::NAN; // row k = 2 missing in trial_a only
    let b: Vec<f64> = x.iter().map(|x| 3.0 * x).collect();
    let table = Table::from_columns(x.clone(), vec![("trial_a", a), ("trial_b", b)]).unwrap();

    let mut params = Parameters::new();
    params.add_param("slope", 1.0);
    let result = nls(&table, line, &ParamSpec::fixed(params), &NlsOptions::new()).unwrap();

    assert!(result.is_success());

    // trial_a: row 2 excluded from residuals and fits
    let fit_a = result.fits.get("trial_a").unwrap();
    assert_eq!(fit_a.index.to_vec(), vec![1.0, 2.0, 4.0, 5.0]);
    let res_a = result.residuals.get("trial_a").unwrap();
    assert_eq!(res_a.index.to_vec(), vec![1.0, 2.0, 4.0, 5.0]);

    // trial_b keeps the full axis and its fit is unaffected
    let fit_b = result.fits.get("trial_b").unwrap();
    assert_eq!(fit_b.index.to_vec(), x);
    assert_relative_eq!(
        result.values.get("trial_b", "slope").unwrap(),
        3.0,
        epsilon = 1e-6
    );
    assert_relative_eq!(
        result.values.get("trial_a", "slope").unwrap(),
        2.0,
        epsilon = 1e-6
    );
}

#[test]
fn infinite_cells_are_missing_by_default() {
    let x : Vec<f64> = vec![1.0, 2.0, 3.0, 4.0];
    let y = vec![2.0, f64::INFINITY, 6.0, 8.0];
    let table = Table::from_series(x, "trial", y).unwrap();

    let mut params = Parameters::new();
    params.add_param("slope", 1.0);

    // NlsOptions::new() treats infinities as missing for the duration of
    // the fit, the way the driver historically behaved.
    let result = nls(&table, line, &ParamSpec::fixed(params), &NlsOptions::new()).unwrap();

    assert!(result.is_success());
    assert_eq!(
        result.fits.get("trial").unwrap().index.to_vec(),
        vec![1.0, 3.0, 4.0]
    );
    assert_relative_eq!(
        result.values.get("trial", "slope").unwrap(),
        2.0,
        epsilon = 1e-6
    );
}

#[test]
fn per_column_factory_adapts_starting_points() {
    let table = two_trial_table();

    // Derive the initial guess from each column's endpoints.
    let spec = ParamSpec::from_column(|col| {
        let last = col.len() - 1;
        let mut params = Parameters::new();
        params.add_param("amplitude", col.y[0]);
        params.add_param(
            "exponent",
            (col.y[last] / col.y[0]).ln() / (col.x[last] / col.x[0]).ln(),
        );
        Ok(params)
    });

    let result = nls(&table, powerlaw, &spec, &NlsOptions::new()).unwrap();

    assert!(result.is_success());
    assert_relative_eq!(
        result.values.get("trial_a", "exponent").unwrap(),
        0.5,
        epsilon = 1e-4
    );
    assert_relative_eq!(
        result.values.get("trial_b", "exponent").unwrap(),
        1.0,
        epsilon = 1e-4
    );

    // Per-column fitted parameters are retained on the result.
    let params_a = result.params_for("trial_a").unwrap();
    assert_relative_eq!(params_a.value_of("amplitude").unwrap(), 2.0, epsilon = 1e-4);
    let curve = result.model("trial_a", powerlaw).unwrap();
    assert_relative_eq!(curve(4.0), 4.0, epsilon = 1e-3);
}

#[test]
fn inverted_model_swaps_residual_roles() {
    // Data follows y = sqrt(x); the model is naturally x(y) = a * y^2.
    let x : Vec<f64> = vec![1.0, 4.0, 9.0, 16.0];
    let y = vec![1.0, 2.0, 3.0, 4.0];
    let table = Table::from_columns(x.clone(), vec![("trial", y.clone())]).unwrap();

    let model = |y: f64, p: &Parameters| p.value_of("a").unwrap() * y * y;
    let mut params = Parameters::new();
    params.add_param("a", 0.5);

    let mut options = NlsOptions::new();
    options.inverted_model = true;
    let result = nls(&table, model, &ParamSpec::fixed(params), &options).unwrap();

    assert!(result.is_success());
    assert_relative_eq!(result.values.get("trial", "a").unwrap(), 1.0, epsilon = 1e-6);

    // The fitted curve is evaluated over the y domain and approximates x.
    let fit = result.fits.get("trial").unwrap();
    assert_eq!(fit.index.to_vec(), y);
    for (fitted, expected) in fit.values.iter().zip(x.iter()) {
        assert_relative_eq!(*fitted, *expected, epsilon = 1e-5);
    }
}

#[test]
fn underdetermined_column_fails_without_aborting_batch() {
    let x: Vec<f64> = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let good: Vec<f64> = x.iter().map(|x| 2.0 * x.powf(0.5)).collect();
    // One non-missing row for a two-parameter model
    let sparse = vec![2.0, f64::NAN, f64::NAN, f64::NAN, f64::NAN];
    let table = Table::from_columns(x, vec![("sparse", sparse), ("good", good)]).unwrap();

    let result = nls(
        &table,
        powerlaw,
        &ParamSpec::fixed(powerlaw_start()),
        &NlsOptions::new(),
    )
    .unwrap();

    // The sparse column is reported, the good column still converged.
    assert!(!result.is_success());
    assert_eq!(result.failed_columns(), vec!["sparse"]);
    assert!(result.values.get("sparse", "amplitude").unwrap().is_nan());
    assert_relative_eq!(
        result.values.get("good", "amplitude").unwrap(),
        2.0,
        epsilon = 1e-4
    );

    // Failed columns keep their rows so the alignment invariant holds.
    assert_eq!(result.values.row_labels(), &["sparse", "good"]);
}

#[test]
fn non_evaluable_column_is_reported_not_fatal() {
    // f(x) = scale * sqrt(x - shift): NaN everywhere when shift > max(x).
    let model = |x: f64, p: &Parameters| {
        p.value_of("scale").unwrap() * (x - p.value_of("shift").unwrap()).sqrt()
    };

    let x: Vec<f64> = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let good: Vec<f64> = x.iter().map(|x| 2.0 * x.sqrt()).collect();
    let bad: Vec<f64> = x.iter().map(|x| 2.0 * x.sqrt()).collect();
    let table = Table::from_columns(x, vec![("good", good), ("bad", bad)]).unwrap();

    let spec = ParamSpec::from_column(|col| {
        let mut params = Parameters::new();
        params.add_param("scale", 1.0);
        // A deliberately pathological start for the "bad" trial
        params.add_fixed_param("shift", if col.label == "bad" { 10.0 } else { 0.0 });
        Ok(params)
    });

    let result = nls(&table, model, &spec, &NlsOptions::new()).unwrap();

    assert!(!result.is_success());
    assert_eq!(result.failed_columns(), vec!["bad"]);
    assert_relative_eq!(
        result.values.get("good", "scale").unwrap(),
        2.0,
        epsilon = 1e-4
    );
}

#[test]
fn parallel_fit_matches_serial_fit() {
    let table = two_trial_table();

    let serial = nls(
        &table,
        powerlaw,
        &ParamSpec::fixed(powerlaw_start()),
        &NlsOptions::new(),
    )
    .unwrap();
    let parallel = nls_parallel(
        &table,
        powerlaw,
        &ParamSpec::fixed(powerlaw_start()),
        &NlsOptions::new(),
    )
    .unwrap();

    assert_eq!(parallel.values.row_labels(), serial.values.row_labels());
    for label in ["trial_a", "trial_b"] {
        for name in ["amplitude", "exponent"] {
            assert_relative_eq!(
                parallel.values.get(label, name).unwrap(),
                serial.values.get(label, name).unwrap(),
                epsilon = 1e-12
            );
        }
    }
}

#[test]
fn stderr_is_positive_for_noisy_data() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.05).unwrap();
    let x: Vec<f64> = (1..=30).map(|i| i as f64).collect();
    let y: Vec<f64> = x
        .iter()
        .map(|x| 2.0 * x + noise.sample(&mut rng))
        .collect();
    let table = Table::from_series(x, "trial", y).unwrap();

    let mut params = Parameters::new();
    params.add_param("slope", 1.0);
    let result = nls(&table, line, &ParamSpec::fixed(params), &NlsOptions::new()).unwrap();

    assert!(result.is_success());
    let stderr = result.stderr.get("trial", "slope").unwrap();
    assert!(stderr.is_finite() && stderr > 0.0);
    assert_relative_eq!(
        result.values.get("trial", "slope").unwrap(),
        2.0,
        epsilon = 1e-2
    );
}

#[test]
fn invalid_inputs_abort_before_fitting() {
    let table = two_trial_table();

    // Mismatched weight length
    let mut options = NlsOptions::new();
    options.weights = Some(vec![1.0, 1.0]);
    let err = nls(
        &table,
        powerlaw,
        &ParamSpec::fixed(powerlaw_start()),
        &options,
    );
    assert!(matches!(err, Err(TabFitError::InvalidInput(_))));

    // Empty parameter set
    let err = nls(
        &table,
        powerlaw,
        &ParamSpec::fixed(Parameters::new()),
        &NlsOptions::new(),
    );
    assert!(matches!(err, Err(TabFitError::InvalidInput(_))));

    // All-fixed parameter set
    let mut fixed = Parameters::new();
    fixed.add_fixed_param("amplitude", 2.0);
    fixed.add_fixed_param("exponent", 0.5);
    let err = nls(&table, powerlaw, &ParamSpec::fixed(fixed), &NlsOptions::new());
    assert!(matches!(err, Err(TabFitError::InvalidInput(_))));

    // A column with no non-missing rows
    let empty_col = Table::from_columns(
        vec![1.0, 2.0],
        vec![("a", vec![1.0, 2.0]), ("b", vec![f64::NAN, f64::NAN])],
    )
    .unwrap();
    let err = nls(
        &empty_col,
        powerlaw,
        &ParamSpec::fixed(powerlaw_start()),
        &NlsOptions::new(),
    );
    assert!(matches!(err, Err(TabFitError::InvalidInput(_))));
}

#[test]
fn log_residual_with_propagate_rejects_non_positive_observations() {
    let table = Table::from_series(vec![1.0, 2.0, 3.0], "trial", vec![1.0, -2.0, 3.0]).unwrap();

    let mut options = NlsOptions::new();
    options.log_residual = true;
    options.nonfinite = NonFinitePolicy::Propagate;

    let err = nls(
        &table,
        powerlaw,
        &ParamSpec::fixed(powerlaw_start()),
        &options,
    );
    assert!(matches!(err, Err(TabFitError::InvalidInput(_))));
}

#[test]
fn factory_with_inconsistent_names_is_rejected() {
    let table = two_trial_table();

    let spec = ParamSpec::from_column(|col| {
        let mut params = Parameters::new();
        // Different parameter names depending on the column
        if col.label == "trial_a" {
            params.add_param("amplitude", 1.0);
        } else {
            params.add_param("scale", 1.0);
        }
        Ok(params)
    });

    let err = nls(&table, powerlaw, &spec, &NlsOptions::new());
    assert!(matches!(err, Err(TabFitError::InvalidInput(_))));
}
