//! End-to-end runs of the forecasting pipeline on generated CSV input.

use std::io::Write;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use salescast::data::LoaderConfig;
use salescast::models::{LstmConfig, SARIMASpec};
use salescast::pipeline::{Pipeline, PipelineConfig};
use salescast::ForecastError;

/// Two rows per day (split sales) with a weekly pattern and a gentle trend.
fn write_sales_csv(path: &Path, days: usize) {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "date,store,sales").unwrap();
    for i in 0..days {
        let date = start + Duration::days(i as i64);
        let weekly = [0.0, 10.0, 25.0, 15.0, 5.0, 40.0, 30.0][i % 7];
        let total = 200.0 + 0.5 * i as f64 + weekly + ((i * 13) % 7) as f64;
        writeln!(file, "{},A,{}", date.format("%Y-%m-%d"), total * 0.25).unwrap();
        writeln!(file, "{},B,{}", date.format("%Y-%m-%d"), total * 0.75).unwrap();
    }
}

fn small_config(input: &Path) -> PipelineConfig {
    PipelineConfig::default()
        .with_input(input)
        .with_sarima(SARIMASpec::new(1, 0, 0, 0, 1, 0, 7))
        .with_lstm(
            LstmConfig::default()
                .with_window(5)
                .with_hidden(vec![4, 3])
                .with_epochs(3)
                .with_batch_size(8)
                .with_learning_rate(0.01),
        )
}

#[test]
fn full_run_produces_aligned_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sales.csv");
    write_sales_csv(&input, 100);
    let out = dir.path().join("report");

    let outcome = Pipeline::new(small_config(&input).with_output_dir(&out))
        .run()
        .unwrap();

    assert_eq!(outcome.series.len(), 100);
    assert_eq!(outcome.split.train_size(), 80);
    assert_eq!(outcome.split.test_size(), 20);
    assert_eq!(outcome.sarima.horizon(), 20);
    assert!(outcome.sarima.lower().is_some());
    assert_eq!(outcome.lstm.len(), 20);
    assert_eq!(outcome.ensemble.len(), 20);
    assert_eq!(outcome.loss_history.len(), 3);
    assert!(outcome.sarima_aic.is_some());

    for i in 0..20 {
        assert_eq!(
            outcome.ensemble[i],
            0.4 * outcome.sarima.primary()[i] + 0.6 * outcome.lstm[i]
        );
    }

    let train_mean = outcome.split.train.primary_values().iter().sum::<f64>() / 80.0;
    assert!((outcome.threshold - train_mean).abs() < 1e-9);
    assert_eq!(outcome.evaluation.classification.confusion.total(), 20);
    assert_eq!(outcome.residuals().len(), 20);

    let names: Vec<String> = outcome
        .artifacts
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    for expected in [
        "forecast_comparison.svg",
        "classification_metrics.svg",
        "residual_acf.svg",
        "train_acf_pacf.svg",
        "confusion_matrix.svg",
        "forecasts.csv",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
        assert!(out.join(expected).exists());
    }

    // actual spans the whole series; forecasts cover the test dates
    let chart = std::fs::read_to_string(out.join("forecast_comparison.svg")).unwrap();
    let point_counts: Vec<usize> = chart
        .lines()
        .filter(|l| l.contains("<polyline"))
        .map(|l| {
            let points = l.split("points=\"").nth(1).unwrap().split('"').next().unwrap();
            points.split(' ').count()
        })
        .collect();
    assert_eq!(point_counts, vec![100, 20, 20, 20]);

    let csv = std::fs::read_to_string(out.join("forecasts.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("date,actual,sarima,lstm,ensemble"));
    assert_eq!(lines.count(), 20);
}

#[test]
fn daily_totals_are_summed_before_forecasting() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sales.csv");
    write_sales_csv(&input, 100);

    let outcome = Pipeline::new(small_config(&input)).run().unwrap();

    // day 0: 200 + 0 + 0 + 0, split 25/75 across two rows
    assert!((outcome.series.primary_values()[0] - 200.0).abs() < 1e-9);
    assert!(outcome.artifacts.is_empty());
}

#[test]
fn runs_are_reproducible_for_a_seed() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sales.csv");
    write_sales_csv(&input, 90);

    let first = Pipeline::new(small_config(&input)).run().unwrap();
    let second = Pipeline::new(small_config(&input)).run().unwrap();
    assert_eq!(first.lstm, second.lstm);
    assert_eq!(first.ensemble, second.ensemble);
}

#[test]
fn missing_column_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sales.csv");
    write_sales_csv(&input, 60);

    let config = small_config(&input)
        .with_loader(LoaderConfig::default().with_value_column("revenue"));
    assert!(matches!(
        Pipeline::new(config).run(),
        Err(ForecastError::MissingColumn(_))
    ));
}

#[test]
fn training_set_shorter_than_window_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sales.csv");
    write_sales_csv(&input, 60);

    let config = small_config(&input).with_lstm(LstmConfig::default().with_window(50));
    assert!(matches!(
        Pipeline::new(config).run(),
        Err(ForecastError::InsufficientData { .. })
    ));
}
