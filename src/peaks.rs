//! The contract between a [`Scan`](crate::spectrum::Scan) and whatever turns its raw signal
//! into discrete peaks.
//!
//! Peak picking itself lives outside this crate. A [`PeakPicking`] implementation receives
//! the raw arrays and a [`PickingOptions`] whose [`PeakMode`] has already been decided by the
//! scan, and returns a [`PeakIndex`]. [`SimplePeakPicker`] is a minimal implementation for
//! already-centroided data and quick looks at profile data. With the `mzsignal` feature,
//! [`MzSignalPeakPicker`] delegates to [`mzsignal`].
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use mzpeaks::prelude::*;
use mzpeaks::{CentroidPeak, PeakSet, Tolerance};
use thiserror::Error;

#[cfg(feature = "mzsignal")]
use mzsignal::{
    peak_picker::{PeakFitType, PeakPicker, PeakPickerError},
    FittedPeak,
};

use crate::spectrum::ArrayError;

pub use mzpeaks::{DeconvolutedPeak, DeconvolutedPeakSet};

/// How the signal passed to a peak picker should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PeakMode {
    #[default]
    Profile,
    Centroid,
}

impl Display for PeakMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => f.write_str("profile"),
            Self::Centroid => f.write_str("centroid"),
        }
    }
}

impl FromStr for PeakMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "profile" => Ok(Self::Profile),
            "centroid" => Ok(Self::Centroid),
            _ => Err(format!("{s} is not a peak mode")),
        }
    }
}

/// Options handed to a [`PeakPicking`] implementation.
///
/// `peak_mode` is always overwritten by [`Scan::pick_peaks`](crate::spectrum::Scan::pick_peaks)
/// to match the scan's signal. The remaining knobs are passed through untouched, and
/// implementations are free to ignore the ones they don't understand.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PickingOptions {
    pub peak_mode: PeakMode,
    pub signal_to_noise_threshold: f32,
    pub intensity_threshold: f32,
    pub params: HashMap<String, String>,
}

impl Default for PickingOptions {
    fn default() -> Self {
        Self {
            peak_mode: PeakMode::default(),
            signal_to_noise_threshold: 1.0,
            intensity_threshold: 0.0,
            params: HashMap::new(),
        }
    }
}

impl PickingOptions {
    pub fn peak_mode(mut self, peak_mode: PeakMode) -> Self {
        self.peak_mode = peak_mode;
        self
    }

    pub fn signal_to_noise_threshold(mut self, threshold: f32) -> Self {
        self.signal_to_noise_threshold = threshold;
        self
    }

    pub fn intensity_threshold(mut self, threshold: f32) -> Self {
        self.intensity_threshold = threshold;
        self
    }

    pub fn param<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum PeakPickingError {
    #[error("An error occurred while accessing raw data arrays: {0}")]
    ArrayError(
        #[from]
        #[source]
        ArrayError,
    ),
    #[error("Peak picking failed: {0}")]
    Failed(String),
    #[cfg(feature = "mzsignal")]
    #[error("An error occurred while peak picking: {0:?}")]
    PeakPickerError(
        #[from]
        #[source]
        PeakPickerError,
    ),
}

/**
The picked peaks of a scan alongside the signal they were picked from.

The raw arrays make this tied to one scan. [`PeakIndex::pack`] drops them, leaving only
the [`PeakSet`].
*/
#[derive(Debug, Clone)]
pub struct PeakIndex {
    pub mz_array: Vec<f64>,
    pub intensity_array: Vec<f32>,
    pub peaks: PeakSet,
}

impl PeakIndex {
    pub fn new(mz_array: Vec<f64>, intensity_array: Vec<f32>, peaks: PeakSet) -> Self {
        Self {
            mz_array,
            intensity_array,
            peaks,
        }
    }

    /// Find the peak nearest `mz` within `error_tolerance`
    pub fn has_peak(&self, mz: f64, error_tolerance: Tolerance) -> Option<&CentroidPeak> {
        self.peaks.has_peak(mz, error_tolerance)
    }

    /// The peaks alone, without the signal they came from
    pub fn pack(&self) -> PeakSet {
        self.peaks.clone()
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> PeakIter<'_> {
        PeakIter::new(Some(&self.peaks))
    }
}

impl<'a> IntoIterator for &'a PeakIndex {
    type Item = &'a CentroidPeak;

    type IntoIter = PeakIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over a possibly missing [`PeakSet`]. A missing set yields nothing.
#[derive(Debug, Clone)]
pub struct PeakIter<'a> {
    inner: Option<std::slice::Iter<'a, CentroidPeak>>,
}

impl<'a> PeakIter<'a> {
    pub fn new(peaks: Option<&'a PeakSet>) -> Self {
        Self {
            inner: peaks.map(|p| p.iter()),
        }
    }
}

impl<'a> Iterator for PeakIter<'a> {
    type Item = &'a CentroidPeak;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner
            .as_ref()
            .map(|it| it.size_hint())
            .unwrap_or((0, Some(0)))
    }
}

/// The outcome of querying a scan's picked peaks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeakMatch<'a> {
    /// Peaks have not been picked for this scan yet
    NotPicked,
    /// Peaks were picked, but none matched the query
    NotFound,
    Found(&'a CentroidPeak),
}

impl<'a> PeakMatch<'a> {
    pub fn peak(&self) -> Option<&'a CentroidPeak> {
        match self {
            Self::Found(peak) => Some(peak),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Anything that can turn a pair of signal arrays into a [`PeakIndex`].
///
/// Plain functions and closures with the right signature implement this trait.
pub trait PeakPicking {
    fn pick_peaks(
        &self,
        mzs: &[f64],
        intensities: &[f32],
        options: &PickingOptions,
    ) -> Result<PeakIndex, PeakPickingError>;
}

impl<F> PeakPicking for F
where
    F: Fn(&[f64], &[f32], &PickingOptions) -> Result<PeakIndex, PeakPickingError>,
{
    fn pick_peaks(
        &self,
        mzs: &[f64],
        intensities: &[f32],
        options: &PickingOptions,
    ) -> Result<PeakIndex, PeakPickingError> {
        (self)(mzs, intensities, options)
    }
}

/**
A minimal [`PeakPicking`] implementation.

In [`PeakMode::Centroid`] every point above the intensity threshold becomes a peak.
In [`PeakMode::Profile`] every local apex above the intensity threshold becomes a peak,
with no peak shape fitting.
*/
#[derive(Debug, Default, Clone, Copy)]
pub struct SimplePeakPicker;

impl PeakPicking for SimplePeakPicker {
    fn pick_peaks(
        &self,
        mzs: &[f64],
        intensities: &[f32],
        options: &PickingOptions,
    ) -> Result<PeakIndex, PeakPickingError> {
        if mzs.len() != intensities.len() {
            return Err(ArrayError::MZIntensityArraySizeMismatch(mzs.len(), intensities.len()).into());
        }
        let threshold = options.intensity_threshold;
        let peaks: Vec<CentroidPeak> = match options.peak_mode {
            PeakMode::Centroid => mzs
                .iter()
                .zip(intensities.iter())
                .filter(|(_, inten)| **inten > threshold)
                .map(|(mz, inten)| CentroidPeak::new(*mz, *inten, 0))
                .collect(),
            PeakMode::Profile => {
                let n = intensities.len();
                (0..n)
                    .filter(|i| {
                        let i = *i;
                        let current = intensities[i];
                        let prev = if i > 0 { intensities[i - 1] } else { 0.0 };
                        let next = if i + 1 < n { intensities[i + 1] } else { 0.0 };
                        current > threshold && current >= prev && current > next
                    })
                    .map(|i| CentroidPeak::new(mzs[i], intensities[i], 0))
                    .collect()
            }
        };
        Ok(PeakIndex::new(
            mzs.to_vec(),
            intensities.to_vec(),
            PeakSet::new(peaks),
        ))
    }
}

/// Peak picking through [`mzsignal`]'s quadratic peak fitting.
///
/// Note: only available with feature `mzsignal`.
#[cfg(feature = "mzsignal")]
#[derive(Debug, Default, Clone, Copy)]
pub struct MzSignalPeakPicker;

#[cfg(feature = "mzsignal")]
impl PeakPicking for MzSignalPeakPicker {
    fn pick_peaks(
        &self,
        mzs: &[f64],
        intensities: &[f32],
        options: &PickingOptions,
    ) -> Result<PeakIndex, PeakPickingError> {
        let peaks: PeakSet = match options.peak_mode {
            PeakMode::Centroid => mzs
                .iter()
                .zip(intensities.iter())
                .filter(|(_, inten)| **inten > options.intensity_threshold)
                .map(|(mz, inten)| CentroidPeak::from(FittedPeak::new(*mz, *inten, 0, 0.0, 0.0)))
                .collect(),
            PeakMode::Profile => {
                let peak_picker = PeakPicker {
                    fit_type: PeakFitType::Quadratic,
                    signal_to_noise_threshold: options.signal_to_noise_threshold,
                    ..Default::default()
                };
                let mut acc = Vec::new();
                peak_picker.discover_peaks(mzs, intensities, &mut acc)?;
                acc.into_iter()
                    .map(CentroidPeak::from)
                    .filter(|p| p.intensity > options.intensity_threshold)
                    .collect()
            }
        };
        Ok(PeakIndex::new(mzs.to_vec(), intensities.to_vec(), peaks))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn profile_signal() -> (Vec<f64>, Vec<f32>) {
        let mzs = vec![100.0, 100.01, 100.02, 100.03, 100.04, 200.0, 200.01, 200.02];
        let intensities = vec![1.0, 5.0, 20.0, 5.0, 1.0, 2.0, 40.0, 2.0];
        (mzs, intensities)
    }

    #[test]
    fn test_simple_profile() {
        let (mzs, intensities) = profile_signal();
        let options = PickingOptions::default().peak_mode(PeakMode::Profile);
        let index = SimplePeakPicker.pick_peaks(&mzs, &intensities, &options).unwrap();
        assert_eq!(index.len(), 2);
        let peak = index.has_peak(100.02, Tolerance::PPM(10.0)).unwrap();
        assert_eq!(peak.intensity, 20.0);
        assert!(index.has_peak(150.0, Tolerance::PPM(10.0)).is_none());
        assert_eq!(index.pack().len(), 2);
        assert_eq!(index.iter().size_hint(), (2, Some(2)));
        assert_eq!(index.iter().count(), 2);
        assert_eq!(PeakIter::new(None).count(), 0);
    }

    #[test]
    fn test_simple_centroid() {
        let (mzs, intensities) = profile_signal();
        let options = PickingOptions::default()
            .peak_mode(PeakMode::Centroid)
            .intensity_threshold(1.5);
        let index = SimplePeakPicker.pick_peaks(&mzs, &intensities, &options).unwrap();
        assert_eq!(index.len(), 6);
    }

    #[test]
    fn test_closure_picker() {
        let picker = |mzs: &[f64],
                      intensities: &[f32],
                      _options: &PickingOptions|
         -> Result<PeakIndex, PeakPickingError> {
            Ok(PeakIndex::new(
                mzs.to_vec(),
                intensities.to_vec(),
                PeakSet::new(Vec::new()),
            ))
        };
        let (mzs, intensities) = profile_signal();
        let index = picker
            .pick_peaks(&mzs, &intensities, &PickingOptions::default())
            .unwrap();
        assert!(index.is_empty());
        assert_eq!(index.mz_array.len(), mzs.len());
    }

    #[test]
    fn test_peak_mode_names() {
        assert_eq!(PeakMode::Profile.to_string(), "profile");
        assert_eq!("Centroid".parse::<PeakMode>().unwrap(), PeakMode::Centroid);
        assert!("fuzzy".parse::<PeakMode>().is_err());
    }

    #[test]
    fn test_mismatched_arrays() {
        let err = SimplePeakPicker
            .pick_peaks(&[1.0, 2.0], &[1.0], &PickingOptions::default())
            .unwrap_err();
        assert!(matches!(err, PeakPickingError::ArrayError(_)));
    }
}
