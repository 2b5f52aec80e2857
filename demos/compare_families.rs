use lifetime_models::{
    CensoringStatus, ObservationRecord, compare_families, render_comparison_tables,
};
use rand::prelude::*;
use rand::rngs::StdRng;

fn main() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut records: Vec<ObservationRecord> = (0..150)
        .map(|_| {
            let u: f64 = rng.random_range(0.0..1.0);
            let time = 500.0 * (-(1.0 - u).ln()).powf(1.0 / 1.8);
            ObservationRecord::new(1, 0.0, time, CensoringStatus::Event)
        })
        .collect();
    for _ in 0..12 {
        records.push(ObservationRecord::new(
            2,
            800.0,
            800.0,
            CensoringStatus::RightCensored,
        ));
    }

    let report = compare_families(&records, 0.0, 0.0);
    let tables = render_comparison_tables(&report);
    println!("{}", tables.goodness_of_fit);

    if let Some(family) = report.recommended_by_aic {
        println!("recommended by AIC: {}", family.name());
    }
    if let Some(family) = report.recommended_by_bic {
        println!("recommended by BIC: {}", family.name());
    }
}
