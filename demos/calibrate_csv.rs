//! Calibrate a recorded sensor trace
//!
//! Reads a CSV file with an `x,y,z` header, runs the calibration pipeline and
//! prints the derived offset, gain, refit coefficients and coefficient SOD.
//! The raw and calibrated traces are projected onto the XY, YZ and XZ planes
//! next to the ideal circle of radius m and saved as `<file>_projections.png`.
//!
//! Run with: `cargo run --example calibrate_csv -- testdata/mag_samples.csv e or m`
//!
//! Arguments:
//! - method: `mm` (min/max extents) or `e` (ellipsoid)
//! - preprocessing: `o` (outliers), `r` (regularize), `or` (both) or `-` (none)
//! - sensor: `a` (accelerometer) or `m` (magnetometer)

use nalgebra::Vector3;
use plotters::prelude::*;
use serde::Deserialize;
use sphere_cal::{
    CalibrationMethod, CalibrationReport, CalibrationSettings, Preprocessing, SampleMatrix,
    SampleMatrixExt, SensorProfile, calibrate,
};
use std::error::Error;
use std::f64::consts::PI;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Reading {
    x: f64,
    y: f64,
    z: f64,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 5 {
        eprintln!("usage: {} <data.csv> <mm|e> <o|r|or|-> <a|m>", args[0]);
        std::process::exit(2);
    }

    let path = &args[1];
    let settings = CalibrationSettings {
        method: args[2].parse::<CalibrationMethod>()?,
        preprocessing: args[3].parse::<Preprocessing>()?,
        sensor: args[4].parse::<SensorProfile>()?,
        ..Default::default()
    };

    // Load sensor data from CSV
    let mut reader = csv::Reader::from_path(path)?;
    let mut points = Vec::new();
    for result in reader.deserialize() {
        let reading: Reading = result?;
        points.push(Vector3::new(reading.x, reading.y, reading.z));
    }
    println!("{}: {} readings", path, points.len());

    let report = calibrate(&SampleMatrix::from_points(&points), &settings)?;

    println!("{} outliers removed", report.outliers_removed);
    println!("Offset: {:?}", report.model.offset.as_slice());
    println!("Gain:");
    for row in report.model.gain.row_iter() {
        println!("  [{:>12.8} {:>12.8} {:>12.8}]", row[0], row[1], row[2]);
    }
    if let Some(ellipsoid) = &report.ellipsoid {
        let cross = ellipsoid.cross_axis;
        println!(
            "Cross axis: psi={:.6} theta={:.6} phi={:.6}",
            cross.psi, cross.theta, cross.phi
        );
    }
    println!("Calibrated fit coefficients: {:?}", report.post_fit.coefficients.0);
    println!("Coefficient SOD: {:.18}", report.score);

    let output = format!("{}_projections.png", path.trim_end_matches(".csv"));
    plot_projections(&report, &settings.sensor, &output)?;
    println!("✓ Projections saved to {}", output);

    Ok(())
}

/// Plot raw and calibrated readings on the three coordinate planes
fn plot_projections(
    report: &CalibrationReport,
    sensor: &SensorProfile,
    output: &str,
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(output, (1500, 520)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 3));

    let limit = sensor.axis_limit();
    let radius = sensor.multiplier();
    let planes = [("XY", 0, 1), ("YZ", 1, 2), ("XZ", 0, 2)];

    for (area, (name, a, b)) in panels.iter().zip(planes) {
        let mut chart = ChartBuilder::on(area)
            .caption(name, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(-limit..limit, -limit..limit)?;

        chart
            .configure_mesh()
            .x_desc(&name[0..1])
            .y_desc(&name[1..2])
            .draw()?;

        let project = |samples: &SampleMatrix| -> Vec<(f64, f64)> {
            samples.points().map(|p| (p[a], p[b])).collect()
        };

        chart
            .draw_series(
                project(&report.processed)
                    .into_iter()
                    .map(|p| Circle::new(p, 2, RED.filled())),
            )?
            .label(format!("Original {}", name))
            .legend(|(x, y)| Circle::new((x, y), 3, RED.filled()));

        chart
            .draw_series(
                project(&report.calibrated)
                    .into_iter()
                    .map(|p| Circle::new(p, 2, GREEN.filled())),
            )?
            .label(format!("Calibrated {}", name))
            .legend(|(x, y)| Circle::new((x, y), 3, GREEN.filled()));

        chart
            .draw_series(LineSeries::new(
                (0..=200).map(|i| {
                    let t = 2.0 * PI * i as f64 / 200.0;
                    (radius * t.cos(), radius * t.sin())
                }),
                &BLUE,
            ))?
            .label("Perfect Circle")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLUE));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}
