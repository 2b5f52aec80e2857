use lifetime_models::{
    CensoringStatus, ObservationRecord, compare_families, exponential, format_data_set, weibull,
};
use rand::prelude::*;
use rand::rngs::StdRng;

fn event(unit: u64, time: f64) -> ObservationRecord {
    ObservationRecord::new(unit, 0.0, time, CensoringStatus::Event)
}

fn exponential_sample(rate: f64, n: usize, seed: u64) -> Vec<ObservationRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u: f64 = rng.random_range(0.0..1.0);
            event(1, -(1.0 - u).ln() / rate)
        })
        .collect()
}

fn weibull_sample(eta: f64, beta: f64, n: usize, seed: u64) -> Vec<ObservationRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u: f64 = rng.random_range(0.0..1.0);
            event(1, eta * (-(1.0 - u).ln()).powf(1.0 / beta))
        })
        .collect()
}

#[test]
fn single_event_record_prepares_as_one_failure() {
    let records = vec![event(1, 10.0)];
    let prepared = format_data_set(&records, 0.0, 0.0).expect("prepare");
    assert_eq!(prepared.n_records, 1);
    assert!((prepared.matrix[(0, 3)] - 1.0).abs() < 1e-12);
    assert_eq!(prepared.n_failures, 1);
    assert_eq!(prepared.n_suspensions, 0);
}

#[test]
fn mixed_censoring_prepares_five_rows_with_one_suspension() {
    let mut records: Vec<ObservationRecord> =
        [10.0, 20.0, 30.0, 40.0].iter().map(|&t| event(1, t)).collect();
    records.push(ObservationRecord::new(
        2,
        50.0,
        50.0,
        CensoringStatus::RightCensored,
    ));
    let prepared = format_data_set(&records, 0.0, 0.0).expect("prepare");
    assert_eq!(prepared.n_records, 5);
    assert_eq!(prepared.n_suspensions, 1);
    assert_eq!(prepared.n_failures, 4);

    let mut suspended_rows = 0;
    for i in 0..prepared.n_records {
        if (prepared.matrix[(i, 3)] - 2.0).abs() < 1e-12 {
            suspended_rows += 1;
            assert!(prepared.matrix[(i, 1)].is_infinite());
        }
    }
    assert_eq!(suspended_rows, 1);
}

#[test]
fn exponential_mle_recovers_the_true_rate_within_ten_percent() {
    let records = exponential_sample(0.1, 1000, 42);
    let fit = exponential::maximum_likelihood_estimate(&records, 0.0, 0.0).expect("fit");
    let rate = fit.parameters[0];
    assert!(
        (rate - 0.1).abs() < 0.01,
        "rate = {rate}, expected within 10% of 0.1"
    );
    // AIC = -2*ll + 2 for the single-parameter family.
    let gof = fit.goodness_of_fit;
    assert!((gof.aic - (-2.0 * gof.log_likelihood + 2.0)).abs() < 1e-10);
}

#[test]
fn weibull_mle_recovers_eta_and_beta_within_fifteen_percent() {
    let records = weibull_sample(100.0, 2.0, 500, 7);
    let fit = weibull::maximum_likelihood_estimate(&records, 0.0, 0.0).expect("fit");
    let eta = fit.parameters[0];
    let beta = fit.parameters[1];
    assert!((eta - 100.0).abs() < 15.0, "eta = {eta}");
    assert!((beta - 2.0).abs() < 0.3, "beta = {beta}");
    assert_eq!(fit.n_failures, 500);
}

#[test]
fn exponential_bounds_reproduce_the_chi_square_constant() {
    let records = exponential_sample(0.02, 50, 11);
    let data = format_data_set(&records, 0.0, 0.0).expect("prepare");
    let fit = exponential::maximum_likelihood_estimate(&records, 0.0, 0.0).expect("fit");
    let theta = fit.parameters[0];

    let bounds = exponential::likelihood_bounds(theta, 0.90, &data).expect("bounds");
    let (lower, upper) = bounds.scale;
    assert!(lower < theta && theta < upper);

    // chi2(0.90, 1) / 2 = 1.35277...; both bounds must sit on the ratio
    // contour defined by that drop from the maximum.
    let target = exponential::log_likelihood(theta, &data) - 1.352_771_727;
    assert!((exponential::log_likelihood(lower, &data) - target).abs() < 1e-4);
    assert!((exponential::log_likelihood(upper, &data) - target).abs() < 1e-4);
}

#[test]
fn exponential_reliability_matches_the_survival_function_at_all_levels() {
    let records = exponential_sample(0.05, 200, 3);
    let data = format_data_set(&records, 0.0, 0.0).expect("prepare");
    let fit = exponential::maximum_likelihood_estimate(&records, 0.0, 0.0).expect("fit");
    let bounds =
        exponential::likelihood_bounds(fit.parameters[0], 0.90, &data).expect("bounds");
    let scale = fit.scale_triplet(&bounds);

    let table = exponential::reliability_function(&scale, 0.0, 50.0, 5.0);
    for (&time, values) in &table {
        let t = f64::from(u32::try_from(time).unwrap_or(0));
        for (slot, &rate) in scale.iter().enumerate() {
            assert!(
                (values[slot] - (-rate * t).exp()).abs() < 1e-12,
                "t = {t}, slot = {slot}"
            );
        }
    }
}

#[test]
fn comparison_ranks_weibull_data_over_the_exponential_fit() {
    let records = weibull_sample(100.0, 3.0, 300, 19);
    let report = compare_families(&records, 0.0, 0.0);
    let weibull_aic = report
        .candidates
        .iter()
        .find(|c| c.family.name() == "Weibull")
        .and_then(|c| c.fit.as_ref())
        .map(|fit| fit.goodness_of_fit.aic)
        .expect("weibull fit");
    let exponential_aic = report
        .candidates
        .iter()
        .find(|c| c.family.name() == "Exponential")
        .and_then(|c| c.fit.as_ref())
        .map(|fit| fit.goodness_of_fit.aic)
        .expect("exponential fit");
    assert!(
        weibull_aic < exponential_aic,
        "weibull AIC {weibull_aic} should beat exponential {exponential_aic}"
    );
}
