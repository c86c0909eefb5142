use std::fs::File;
use std::io::Write;

use rstest::rstest;
use sprayer_config::{Calibration, CalibrationRow, load_calibration_csv};
use tempfile::tempdir;

fn row(travel: f64, volume: f64) -> CalibrationRow {
    CalibrationRow { travel, volume }
}

#[rstest]
fn calibration_from_rows_two_points() {
    // Exact two-point fit: 5 ul per mm, no dead volume
    let c = Calibration::from_rows(vec![row(0.0, 0.0), row(10.0, 50.0)]).unwrap();
    assert!((c.volume_per_travel - 5.0).abs() < 1e-9);
    assert!(c.dead_volume.abs() < 1e-9);
}

#[rstest]
fn calibration_from_rows_three_points_ols() {
    // volume = 2*travel + 1, exact here for determinism
    let rows = vec![row(1.0, 3.0), row(2.0, 5.0), row(3.0, 7.0)];
    let c = Calibration::from_rows(rows).unwrap();
    assert!((c.volume_per_travel - 2.0).abs() < 1e-9);
    assert!((c.dead_volume - 1.0).abs() < 1e-9);
}

#[rstest]
fn calibration_rejects_duplicate_travel() {
    let rows = vec![row(1.0, 5.0), row(1.0, 6.0)];
    let err = Calibration::from_rows(rows).expect_err("should fail on duplicate travel");
    assert!(format!("{err}").to_lowercase().contains("duplicate travel"));
}

#[rstest]
fn calibration_rejects_non_monotonic_zigzag() {
    let rows = vec![row(1.0, 5.0), row(3.0, 15.0), row(2.0, 10.0)];
    let err = Calibration::from_rows(rows).expect_err("should fail on non-monotonic travel");
    assert!(
        format!("{err}")
            .to_lowercase()
            .contains("monotonic (strictly increasing or strictly decreasing)")
    );
}

#[rstest]
fn calibration_rejects_single_row() {
    let err = Calibration::from_rows(vec![row(1.0, 5.0)]).expect_err("one row is not a fit");
    assert!(format!("{err}").contains("at least two rows"));
}

#[rstest]
fn calibration_rejects_falling_volume() {
    let rows = vec![row(0.0, 50.0), row(5.0, 25.0), row(10.0, 0.0)];
    let err = Calibration::from_rows(rows).expect_err("negative slope is not a syringe");
    assert!(format!("{err}").contains("slope must be > 0"));
}

#[rstest]
fn calibration_horizontal_line_errors() {
    let rows = vec![row(1.0, 50.0), row(2.0, 50.0), row(3.0, 50.0)];
    let err = Calibration::from_rows(rows).expect_err("should fail on zero slope");
    assert!(format!("{err}").contains("slope must be > 0"));
}

#[rstest]
fn calibration_with_noise_and_outliers_recovers_params() {
    // Ground truth: volume = 5*travel + 0.4
    let mut rows = Vec::new();
    for i in 0..50 {
        let travel = f64::from(i) * 0.5;
        let noise = (f64::from(i) * 37.0).sin() * 0.1;
        rows.push(row(travel, 5.0 * travel + 0.4 + noise));
    }
    // Two strong outliers (> 2σ), travel stays monotonic
    rows[15].volume = 300.0;
    rows[35].volume = -200.0;

    let c = Calibration::from_rows(rows).unwrap();
    let rel_err = (c.volume_per_travel - 5.0).abs() / 5.0;
    assert!(rel_err <= 0.01, "slope rel err {rel_err}");
    assert!((c.dead_volume - 0.4).abs() < 0.2, "dead volume {}", c.dead_volume);
}

#[rstest]
fn csv_round_trip_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("syringe.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "travel,volume").unwrap();
    writeln!(f, "0.0, 0.0").unwrap();
    writeln!(f, "4.0, 20.0").unwrap();
    writeln!(f, "8.0, 40.0").unwrap();

    let c = load_calibration_csv(&path).unwrap();
    assert!((c.volume_per_travel - 5.0).abs() < 1e-9);
}

#[rstest]
fn csv_with_wrong_headers_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_headers.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw,grams").unwrap();
    writeln!(f, "100,0.0").unwrap();
    writeln!(f, "200,1.0").unwrap();

    let err = load_calibration_csv(&path).expect_err("should error on bad headers");
    assert!(format!("{err}").contains("headers 'travel,volume'"));
}

#[rstest]
fn csv_with_non_numeric_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_numeric.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "travel,volume").unwrap();
    writeln!(f, "abc,xyz").unwrap();

    let err = load_calibration_csv(&path).expect_err("should error on non-numeric");
    assert!(format!("{err}").contains("invalid CSV row"));
}
