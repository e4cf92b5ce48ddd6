use std::fmt::{self, Display};
use std::slice;

use mzpeaks::{DeconvolutedPeak, DeconvolutedPeakSet, PeakCollection, PeakSet};

use super::precursor::PrecursorSnapshot;

/**
A scan whose peaks have been picked and which no longer depends on the reader it came from.

Produced by [`Scan::pack`](super::Scan::pack). Nothing in it refers to a reader, so a
[`ProcessedScan`] can outlive the reader, be serialized and be sent to another thread.
The precursor is kept as a [`PrecursorSnapshot`].
*/
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessedScan {
    pub id: String,
    pub title: String,
    pub precursor_information: Option<PrecursorSnapshot>,
    pub ms_level: u8,
    pub scan_time: f64,
    pub index: usize,
    pub peak_set: PeakSet,
    pub deconvoluted_peak_set: Option<DeconvolutedPeakSet>,
}

impl ProcessedScan {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        title: String,
        precursor_information: Option<PrecursorSnapshot>,
        ms_level: u8,
        scan_time: f64,
        index: usize,
        peak_set: PeakSet,
        deconvoluted_peak_set: Option<DeconvolutedPeakSet>,
    ) -> Self {
        Self {
            id,
            title,
            precursor_information,
            ms_level,
            scan_time,
            index,
            peak_set,
            deconvoluted_peak_set,
        }
    }

    /// The number of deconvoluted peaks, 0 if none were assigned
    pub fn len(&self) -> usize {
        self.deconvoluted_peak_set
            .as_ref()
            .map(|p| p.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the `i`th deconvoluted peak
    pub fn get(&self, i: usize) -> Option<&DeconvolutedPeak> {
        self.deconvoluted_peak_set
            .as_ref()
            .and_then(|peaks| peaks.as_slice().get(i))
    }

    /// Iterate over the deconvoluted peaks
    pub fn iter(&self) -> DeconvolutedPeakIter<'_> {
        DeconvolutedPeakIter {
            inner: self.deconvoluted_peak_set.as_ref().map(|p| p.iter()),
        }
    }
}

/// Iterates over the deconvoluted peaks of a [`ProcessedScan`], yielding nothing when
/// none were assigned
#[derive(Debug, Clone)]
pub struct DeconvolutedPeakIter<'a> {
    inner: Option<slice::Iter<'a, DeconvolutedPeak>>,
}

impl<'a> Iterator for DeconvolutedPeakIter<'a> {
    type Item = &'a DeconvolutedPeak;

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

impl<'a> IntoIterator for &'a ProcessedScan {
    type Item = &'a DeconvolutedPeak;

    type IntoIter = DeconvolutedPeakIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for ProcessedScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessedScan")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("precursor_information", &self.precursor_information)
            .field("ms_level", &self.ms_level)
            .field("scan_time", &self.scan_time)
            .field("index", &self.index)
            .field("peak_set", &self.peak_set.len())
            .field("deconvoluted_peak_set", &self.len())
            .finish()
    }
}

impl Display for ProcessedScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProcessedScan(id={}, ms_level={}, {} peaks)",
            self.id,
            self.ms_level,
            self.len()
        )
    }
}

#[cfg(test)]
mod test {
    use std::thread;

    use mzpeaks::CentroidPeak;

    use super::*;
    use crate::io::{MemoryScanSource, ScanReader, ScanRecord};
    use crate::spectrum::PrecursorInformation;

    fn make_processed() -> ProcessedScan {
        let prec = PrecursorInformation::<MemoryScanSource>::new(500.0, 10.0, 2)
            .with_precursor_scan_id("scan=1");
        ProcessedScan::new(
            "scan=2".into(),
            "Scan 2".into(),
            Some(prec.snapshot()),
            2,
            0.6,
            1,
            PeakSet::new(vec![CentroidPeak::new(200.0, 5.0, 0)]),
            Some(DeconvolutedPeakSet::new(vec![
                DeconvolutedPeak::new(998.0, 20.0, 2, 0),
                DeconvolutedPeak::new(1200.0, 10.0, 1, 1),
            ])),
        )
    }

    fn assert_send<T: Send>() {}

    #[test]
    fn test_deconvoluted_access() {
        let processed = make_processed();
        assert_eq!(processed.len(), 2);
        assert_eq!(processed.iter().count(), 2);
        assert_eq!(processed.iter().size_hint(), (2, Some(2)));
        assert!(processed.get(1).is_some());
        assert!(processed.get(2).is_none());
        assert_eq!(
            processed.to_string(),
            "ProcessedScan(id=scan=2, ms_level=2, 2 peaks)"
        );

        let mut processed = processed;
        processed.deconvoluted_peak_set = None;
        assert!(processed.is_empty());
        assert!(processed.get(0).is_none());
        assert_eq!(processed.iter().count(), 0);
    }

    #[test]
    fn test_send_to_thread() {
        assert_send::<ProcessedScan>();
        let processed = make_processed();
        let id = thread::spawn(move || processed.id.clone()).join().unwrap();
        assert_eq!(id, "scan=2");
    }

    #[test]
    fn test_restore_precursor() {
        let records = vec![
            ScanRecord::new("scan=1", 0, 1, 0.5),
            ScanRecord::new("scan=2", 1, 2, 0.6),
        ];
        let reader = ScanReader::new(MemoryScanSource::new(records));
        let processed = make_processed();
        let snapshot = processed.precursor_information.clone().unwrap();

        let mut prec = PrecursorInformation::<MemoryScanSource>::from(snapshot);
        assert!(prec.precursor().unwrap_err().is_detached());
        reader.attach(&mut prec);
        assert_eq!(prec.precursor().unwrap().id().unwrap(), "scan=1");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize() {
        let processed = make_processed();
        let text = serde_json::to_string(&processed).unwrap();
        let dup: ProcessedScan = serde_json::from_str(&text).unwrap();
        assert_eq!(dup.id, processed.id);
        assert_eq!(dup.len(), 2);
        assert_eq!(dup.precursor_information, processed.precursor_information);
    }
}
