use std::cell::OnceCell;
use std::fmt::{self, Display};
use std::ops::Index;

use log::trace;
use mzpeaks::{CentroidPeak, DeconvolutedPeakSet, Tolerance};
use thiserror::Error;

use crate::io::traits::{
    borrow_source, DataAccessError, DataAccessProxy, ScanDataSource, SourceHandle, SourceRef,
};
use crate::peaks::{
    PeakIndex, PeakIter, PeakMatch, PeakMode, PeakPicking, PeakPickingError, PickingOptions,
};

use super::precursor::PrecursorInformation;
use super::processed::ProcessedScan;
use super::scan_properties::{ScanArrays, ScanPolarity};

/// Errors that may occur when processing a [`Scan`]
#[derive(Debug, Error)]
pub enum ScanProcessingError {
    #[error("Peaks have not been picked for this scan")]
    PeaksNotPicked,
    #[error(transparent)]
    Access(#[from] DataAccessError),
    #[error(transparent)]
    PeakPicking(#[from] PeakPickingError),
}

/**
A single scan read from a data source, backed lazily by the reader that produced it.

A [`Scan`] owns the reader's raw record and a weak reference back to the reader. Every
attribute is computed by asking the reader the first time it is requested and cached
from then on, so a value that has been read once stays readable even after the scan
is detached or its reader is dropped. Anything not yet read fails with
[`DataAccessError::Detached`] in that case.

Scans are created through a [`ScanReader`](crate::io::ScanReader) and are neither
[`Send`] nor [`Sync`]. Use [`Scan::pack`] to get a self-contained [`ProcessedScan`].
*/
pub struct Scan<R: ScanDataSource> {
    record: R::Record,
    source: SourceRef<R>,

    id: OnceCell<String>,
    title: OnceCell<String>,
    index: OnceCell<usize>,
    ms_level: OnceCell<u8>,
    scan_time: OnceCell<f64>,
    is_profile: OnceCell<bool>,
    polarity: OnceCell<ScanPolarity>,
    arrays: OnceCell<ScanArrays>,
    precursor_information: OnceCell<Option<PrecursorInformation<R>>>,

    /// The picked peaks, populated by [`Scan::pick_peaks`]
    pub peak_set: Option<PeakIndex>,
    /// The deisotoped and charge deconvoluted peaks, populated by the caller
    pub deconvoluted_peak_set: Option<DeconvolutedPeakSet>,
    /// Tandem scans whose precursor was selected from this scan
    pub product_scans: Vec<Scan<R>>,
}

impl<R: ScanDataSource> Scan<R> {
    pub fn new(record: R::Record, source: &SourceHandle<R>) -> Self {
        Self {
            record,
            source: SourceRef::new(source),
            id: OnceCell::new(),
            title: OnceCell::new(),
            index: OnceCell::new(),
            ms_level: OnceCell::new(),
            scan_time: OnceCell::new(),
            is_profile: OnceCell::new(),
            polarity: OnceCell::new(),
            arrays: OnceCell::new(),
            precursor_information: OnceCell::new(),
            peak_set: None,
            deconvoluted_peak_set: None,
            product_scans: Vec::new(),
        }
    }

    fn resolve<'a, T, F>(
        &'a self,
        cell: &'a OnceCell<T>,
        name: &str,
        f: F,
    ) -> Result<&'a T, DataAccessError>
    where
        F: FnOnce(&R, &R::Record) -> T,
    {
        if let Some(value) = cell.get() {
            return Ok(value);
        }
        trace!("Resolving {name} from the source");
        let handle = self.source.upgrade()?;
        let value = {
            let reader = borrow_source(&handle)?;
            f(&reader, &self.record)
        };
        Ok(cell.get_or_init(|| value))
    }

    /// The native ID of the scan
    pub fn id(&self) -> Result<&str, DataAccessError> {
        self.resolve(&self.id, "id", |r, rec| r.scan_id(rec))
            .map(|s| s.as_str())
    }

    pub fn title(&self) -> Result<&str, DataAccessError> {
        self.resolve(&self.title, "title", |r, rec| r.scan_title(rec))
            .map(|s| s.as_str())
    }

    /// The number of scans acquired before this one
    pub fn index(&self) -> Result<usize, DataAccessError> {
        self.resolve(&self.index, "index", |r, rec| r.scan_index(rec))
            .copied()
    }

    pub fn ms_level(&self) -> Result<u8, DataAccessError> {
        self.resolve(&self.ms_level, "ms_level", |r, rec| r.ms_level(rec))
            .copied()
    }

    pub fn scan_time(&self) -> Result<f64, DataAccessError> {
        self.resolve(&self.scan_time, "scan_time", |r, rec| r.scan_time(rec))
            .copied()
    }

    pub fn is_profile(&self) -> Result<bool, DataAccessError> {
        self.resolve(&self.is_profile, "is_profile", |r, rec| r.is_profile(rec))
            .copied()
    }

    pub fn polarity(&self) -> Result<ScanPolarity, DataAccessError> {
        self.resolve(&self.polarity, "polarity", |r, rec| r.polarity(rec))
            .copied()
    }

    /// The raw signal arrays of the scan
    pub fn arrays(&self) -> Result<&ScanArrays, DataAccessError> {
        self.resolve(&self.arrays, "arrays", |r, rec| r.scan_arrays(rec))
    }

    /// The precursor ion description.
    ///
    /// Survey scans (MS level below 2) never have one and the source is not consulted
    /// for them. Otherwise the value is resolved once and attached to this scan's reader.
    pub fn precursor_information(
        &self,
    ) -> Result<Option<&PrecursorInformation<R>>, DataAccessError> {
        if let Some(value) = self.precursor_information.get() {
            return Ok(value.as_ref());
        }
        if self.ms_level()? < 2 {
            return Ok(None);
        }
        trace!("Resolving precursor_information from the source");
        let handle = self.source.upgrade()?;
        let value = {
            let reader = borrow_source(&handle)?;
            reader.precursor_information(&self.record)
        }
        .map(|mut prec| {
            prec.attach(&handle);
            prec
        });
        Ok(self.precursor_information.get_or_init(|| value).as_ref())
    }

    /// Resolve every attribute now so later reads never reach the source
    pub fn load(&self) -> Result<&Self, DataAccessError> {
        self.id()?;
        self.title()?;
        self.index()?;
        self.ms_level()?;
        self.scan_time()?;
        self.is_profile()?;
        self.polarity()?;
        self.arrays()?;
        self.precursor_information()?;
        Ok(self)
    }

    /// The raw record this scan wraps
    pub fn raw(&self) -> &R::Record {
        &self.record
    }

    /**
    Pick peaks from the raw signal with `picker`, storing the result in [`Scan::peak_set`].

    The peak mode in `options` is always replaced with the one matching
    [`Scan::is_profile`]. All other options are passed through untouched.
    */
    pub fn pick_peaks<P: PeakPicking + ?Sized>(
        &mut self,
        picker: &P,
        options: PickingOptions,
    ) -> Result<&mut Self, ScanProcessingError> {
        let mut options = options;
        options.peak_mode = if self.is_profile()? {
            PeakMode::Profile
        } else {
            PeakMode::Centroid
        };
        let arrays = self.arrays()?;
        let peaks = picker.pick_peaks(arrays.mzs(), arrays.intensities(), &options)?;
        self.peak_set = Some(peaks);
        Ok(self)
    }

    /// Query the picked peaks for one near `mz`
    pub fn has_peak(&self, mz: f64, error_tolerance: Tolerance) -> PeakMatch<'_> {
        match self.peak_set.as_ref() {
            Some(peaks) => match peaks.has_peak(mz, error_tolerance) {
                Some(peak) => PeakMatch::Found(peak),
                None => PeakMatch::NotFound,
            },
            None => PeakMatch::NotPicked,
        }
    }

    /// An iterator over the picked peaks, empty if peaks have not been picked
    pub fn iter(&self) -> PeakIter<'_> {
        PeakIter::new(self.peak_set.as_ref().map(|p| &p.peaks))
    }

    /// Build a [`ProcessedScan`] that no longer depends on the source
    pub fn pack(&self) -> Result<ProcessedScan, ScanProcessingError> {
        let peak_set = self
            .peak_set
            .as_ref()
            .ok_or(ScanProcessingError::PeaksNotPicked)?
            .pack();
        let precursor_information = self.precursor_information()?.map(|p| p.snapshot());
        Ok(ProcessedScan::new(
            self.id()?.to_string(),
            self.title()?.to_string(),
            precursor_information,
            self.ms_level()?,
            self.scan_time()?,
            self.index()?,
            peak_set,
            self.deconvoluted_peak_set.clone(),
        ))
    }
}

impl<R: ScanDataSource> DataAccessProxy<R> for Scan<R> {
    fn source_ref(&self) -> &SourceRef<R> {
        &self.source
    }

    fn source_ref_mut(&mut self) -> &mut SourceRef<R> {
        &mut self.source
    }

    fn attach(&mut self, source: &SourceHandle<R>) {
        self.source.attach(source);
        if let Some(Some(prec)) = self.precursor_information.get_mut() {
            prec.attach(source);
        }
        for product in self.product_scans.iter_mut() {
            product.attach(source);
        }
    }

    fn detach(&mut self) {
        self.source.detach();
        if let Some(Some(prec)) = self.precursor_information.get_mut() {
            prec.detach();
        }
        for product in self.product_scans.iter_mut() {
            product.detach();
        }
    }
}

impl<R: ScanDataSource, K> Index<K> for Scan<R>
where
    R::Record: Index<K>,
{
    type Output = <R::Record as Index<K>>::Output;

    fn index(&self, index: K) -> &Self::Output {
        &self.record[index]
    }
}

impl<'a, R: ScanDataSource> IntoIterator for &'a Scan<R> {
    type Item = &'a CentroidPeak;

    type IntoIter = PeakIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<R: ScanDataSource> fmt::Debug for Scan<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scan")
            .field("id", &self.id.get())
            .field("index", &self.index.get())
            .field("ms_level", &self.ms_level.get())
            .field("scan_time", &self.scan_time.get())
            .field("precursor_information", &self.precursor_information.get())
            .field("source", &self.source)
            .field("peak_set", &self.peak_set.as_ref().map(|p| p.len()))
            .field("product_scans", &self.product_scans.len())
            .finish()
    }
}

impl<R: ScanDataSource> Display for Scan<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_unknown<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string())
        }
        write!(
            f,
            "Scan({}, index={}, time={}, ms_level={}",
            or_unknown(self.id.get()),
            or_unknown(self.index.get()),
            or_unknown(self.scan_time.get().map(|t| format!("{t:0.4}"))),
            or_unknown(self.ms_level.get()),
        )?;
        if let Some(Some(prec)) = self.precursor_information.get() {
            write!(f, ", {prec}")?;
        }
        f.write_str(")")
    }
}
