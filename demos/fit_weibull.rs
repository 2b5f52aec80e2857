use lifetime_models::{CensoringStatus, ObservationRecord, format_data_set, weibull};
use rand::prelude::*;
use rand::rngs::StdRng;

fn main() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut records: Vec<ObservationRecord> = (0..200)
        .map(|_| {
            let u: f64 = rng.random_range(0.0..1.0);
            let time = 100.0 * (-(1.0 - u).ln()).powf(0.5);
            ObservationRecord::new(1, 0.0, time, CensoringStatus::Event)
        })
        .collect();
    // A handful of units still running at the end of the test.
    for _ in 0..10 {
        records.push(ObservationRecord::new(
            2,
            150.0,
            150.0,
            CensoringStatus::RightCensored,
        ));
    }

    let fit = weibull::maximum_likelihood_estimate(&records, 0.0, 0.0).expect("fit");
    println!(
        "eta = {:.2}, beta = {:.3} ({} failures, {} suspensions)",
        fit.parameters[0], fit.parameters[1], fit.n_failures, fit.n_suspensions
    );
    println!(
        "log-likelihood = {:.3}, AIC = {:.3}, BIC = {:.3}",
        fit.goodness_of_fit.log_likelihood, fit.goodness_of_fit.aic, fit.goodness_of_fit.bic
    );

    let data = format_data_set(&records, 0.0, 0.0).expect("prepare");
    let pars = [fit.parameters[0], fit.parameters[1]];
    match weibull::likelihood_bounds(pars, 0.90, &data) {
        Ok(bounds) => {
            println!(
                "90% bounds: eta in [{:.2}, {:.2}]",
                bounds.scale.0, bounds.scale.1
            );
            if let Some((lower, upper)) = bounds.shape {
                println!("            beta in [{lower:.3}, {upper:.3}]");
            }

            let scale = fit.scale_triplet(&bounds);
            let shape = fit.shape_triplet(&bounds).expect("shape triplet");
            let reliability = weibull::reliability_function(&scale, &shape, 0.0, 200.0, 50.0);
            for (time, values) in &reliability {
                println!(
                    "R({time:>3}) = {:.4} [{:.4}, {:.4}]",
                    values[1], values[0], values[2]
                );
            }
        }
        Err(error) => println!("bounds unavailable: {error}"),
    }
}
