//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

/// Ten observations where the bad rate rises with the value
pub fn ten_point_sample() -> (Vec<Option<f64>>, Vec<i32>) {
    let values = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];
    let outcomes = vec![0, 0, 1, 0, 0, 1, 0, 1, 1, 1];
    (values.iter().map(|&v| Some(v)).collect(), outcomes)
}

/// Seeded synthetic feature with a logistic relation to the outcome.
///
/// `slope` sets the strength and sign of the relation; `missing_share` of the
/// rows are `None`, and missing rows are bad with probability `missing_bad_rate`.
pub fn synthetic_feature(
    n: usize,
    seed: u64,
    slope: f64,
    missing_share: f64,
    missing_bad_rate: f64,
) -> (Vec<Option<f64>>, Vec<i32>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = Vec::with_capacity(n);
    let mut outcomes = Vec::with_capacity(n);

    for _ in 0..n {
        if rng.gen_bool(missing_share) {
            values.push(None);
            outcomes.push(i32::from(rng.gen_bool(missing_bad_rate)));
        } else {
            let x: f64 = rng.gen_range(-3.0..3.0);
            let p = 1.0 / (1.0 + (-slope * x).exp());
            values.push(Some((x * 1000.0).round() / 1000.0));
            outcomes.push(i32::from(rng.gen_bool(p)));
        }
    }

    (values, outcomes)
}

/// Small credit-style dataset with a string target and a few features
pub fn create_credit_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut status = Vec::with_capacity(rows);
    let mut income = Vec::with_capacity(rows);
    let mut utilization = Vec::with_capacity(rows);
    let mut noise = Vec::with_capacity(rows);

    for _ in 0..rows {
        let util: f64 = rng.gen_range(0.0..1.0);
        let inc: f64 = rng.gen_range(10.0..100.0);
        let p = (0.1 + 0.6 * util - 0.003 * inc).clamp(0.02, 0.95);
        status.push(if rng.gen_bool(p) { "default" } else { "paid" });
        income.push(if rng.gen_bool(0.1) { None } else { Some(inc.round()) });
        utilization.push((util * 100.0).round() / 100.0);
        noise.push(rng.gen_range(0i64..50));
    }

    df! {
        "status" => status,
        "income" => income,
        "utilization" => utilization,
        "noise" => noise,
    }
    .unwrap()
}

/// Same data as [`create_credit_dataframe`] with a 0/1 target column
pub fn create_binary_credit_dataframe(rows: usize, seed: u64) -> DataFrame {
    let df = create_credit_dataframe(rows, seed);
    let target: Vec<i32> = df
        .column("status")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| i32::from(v == Some("default")))
        .collect();

    let mut df = df.drop("status").unwrap();
    df.with_column(Series::new("target".into(), target)).unwrap();
    df
}

/// Write a DataFrame as CSV and return its path
pub fn write_csv(df: &mut DataFrame, dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
    path
}

/// Whether consecutive rates move strictly in one direction
pub fn strictly_monotonic(rates: &[f64]) -> bool {
    rates.windows(2).all(|w| w[0] < w[1]) || rates.windows(2).all(|w| w[0] > w[1])
}
