/*!
 * Build an in-memory scan source, walk it in survey/tandem bunches, pick peaks
 * and pack each tandem scan into a backend-independent form.
 */
use std::io;

use log::info;
use mzpeaks::PeakCollection;
use mzscan::io::{MemoryScanSource, PrecursorDescription, ScanReader, ScanRecord};
use mzscan::peaks::{PickingOptions, SimplePeakPicker};
use mzscan::spectrum::{IsolationWindow, ScanArrays};
use mzscan::Tolerance;

fn signal(center: f64) -> ScanArrays {
    let mzs: Vec<f64> = (0..21).map(|i| center - 0.1 + i as f64 * 0.01).collect();
    let intensities: Vec<f32> = (0..21)
        .map(|i| {
            let x = (i as f32 - 10.0) / 3.0;
            1000.0 * (-x * x / 2.0).exp()
        })
        .collect();
    ScanArrays::new(mzs, intensities).unwrap_or_default()
}

fn main() -> io::Result<()> {
    env_logger::init();
    let mut records = Vec::new();
    for cycle in 0..3 {
        let survey_id = format!("scan={}", cycle * 3 + 1);
        records.push(
            ScanRecord::new(survey_id.clone(), cycle * 3, 1, cycle as f64)
                .with_profile(true)
                .with_arrays(signal(500.0 + cycle as f64)),
        );
        for k in 1..3 {
            let target = 500.0 + cycle as f64;
            let precursor = PrecursorDescription::new(target, 1000.0, 2)
                .with_scan_id(survey_id.clone())
                .with_isolation_window(IsolationWindow::around(target as f32, 1.0, 1.0));
            let scan_time = cycle as f64 + 0.1 * k as f64;
            records.push(
                ScanRecord::new(format!("scan={}", cycle * 3 + 1 + k), cycle * 3 + k, 2, scan_time)
                    .with_arrays(signal(200.0 * k as f64))
                    .with_precursor(precursor),
            );
        }
    }

    let reader = ScanReader::new(MemoryScanSource::new(records));
    for bunch in reader.bunches() {
        let Some(mut survey) = bunch.precursor else {
            continue;
        };
        survey
            .pick_peaks(&SimplePeakPicker, PickingOptions::default())
            .map_err(io::Error::other)?;
        info!("{survey}");
        for mut product in bunch.products {
            let precursor_mz = match product.precursor_information().map_err(io::Error::other)? {
                Some(prec) => prec.mz,
                None => continue,
            };
            let found = survey.has_peak(precursor_mz, Tolerance::PPM(20.0));
            println!(
                "{} -> precursor peak {:?}",
                product.id().map_err(io::Error::other)?,
                found.peak()
            );
            product
                .pick_peaks(
                    &SimplePeakPicker,
                    PickingOptions::default().intensity_threshold(10.0),
                )
                .map_err(io::Error::other)?;
            let processed = product.pack().map_err(io::Error::other)?;
            println!("{processed}: {} centroids", processed.peak_set.len());
        }
    }
    Ok(())
}
