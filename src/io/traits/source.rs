use std::io;

use thiserror::Error;

use crate::spectrum::{PrecursorInformation, Scan, ScanArrays, ScanPolarity};

use super::proxy::{DataAccessError, SourceHandle};

/**
The primitive accessors a concrete reader must supply for each of its raw records.

Every method is a pure function of the record. Nothing is cached at this layer, that
is [`Scan`]'s job. There are no default implementations: a reader that cannot answer
one of these questions cannot be used as a scan source.
*/
pub trait ScanDataSource: Sized {
    /// The opaque per-scan structure this reader produces
    type Record;

    /// The raw m/z and intensity arrays of the scan
    fn scan_arrays(&self, record: &Self::Record) -> ScanArrays;

    /// The precursor ion description, or `None` if the source has none.
    ///
    /// The returned value does not need to be attached to anything, [`Scan`]
    /// attaches it to the reader that produced it.
    fn precursor_information(&self, record: &Self::Record) -> Option<PrecursorInformation<Self>>;

    /// A human-readable display string as shown in external software
    fn scan_title(&self, record: &Self::Record) -> String;

    /// The stable, unique native ID of the scan
    fn scan_id(&self, record: &Self::Record) -> String;

    /// The number of scans acquired before this one
    fn scan_index(&self, record: &Self::Record) -> usize;

    /// The degree of fragmentation, 1 for survey scans
    fn ms_level(&self, record: &Self::Record) -> u8;

    /// The acquisition time. The unit is defined by the source.
    fn scan_time(&self, record: &Self::Record) -> f64;

    /// Whether the arrays hold a continuous profile rather than centroids
    fn is_profile(&self, record: &Self::Record) -> bool;

    /// The ion mode the scan was acquired in
    fn polarity(&self, record: &Self::Record) -> ScanPolarity;
}

/// Errors that may occur when looking up a scan through a reader
#[derive(Debug, Error)]
pub enum ScanAccessError {
    /// The reader could not be reached at all
    #[error(transparent)]
    Access(#[from] DataAccessError),
    /// An undetermined error failing to locate the requested scan
    #[error("The requested scan was not found")]
    ScanNotFound,
    /// An error resolving a scan by it's native ID
    #[error("The requested scan native ID {0} was not found")]
    ScanIdNotFound(String),
    /// An I/O error prevented reading the scan, even if it could be found.
    #[error("I/O error occurred while reading: {0:?}")]
    IOError(#[source] Option<io::Error>),
}

impl ScanAccessError {
    pub fn is_detached(&self) -> bool {
        matches!(self, Self::Access(DataAccessError::Detached))
    }
}

impl From<ScanAccessError> for io::Error {
    fn from(value: ScanAccessError) -> Self {
        let s = value.to_string();
        match value {
            ScanAccessError::ScanNotFound => io::Error::new(io::ErrorKind::NotFound, s),
            ScanAccessError::ScanIdNotFound(_) => io::Error::new(io::ErrorKind::NotFound, s),
            ScanAccessError::Access(_) => io::Error::new(io::ErrorKind::Other, s),
            ScanAccessError::IOError(e) => match e {
                Some(e) => e,
                None => io::Error::new(io::ErrorKind::Other, s),
            },
        }
    }
}

impl From<io::Error> for ScanAccessError {
    fn from(value: io::Error) -> Self {
        Self::IOError(Some(value))
    }
}

/**
A [`ScanDataSource`] that can also walk its records in acquisition order and look
them up by native ID.

Readers are shared through a [`SourceHandle`] so that the scans they produce can
reach back to them. Use [`ScanReader`](crate::io::ScanReader) to wrap a reader and
iterate over [`Scan`]s.

There is no reset contract. Starting over from the top of the file requires a fresh
reader unless the implementation documents otherwise.
*/
pub trait ScanIterator: ScanDataSource {
    /// Produce the next raw record, or `None` when the source is exhausted
    fn next_record(&mut self) -> Option<Self::Record>;

    /// Retrieve a raw record by its native ID
    fn get_record_by_id(&mut self, scan_id: &str) -> Result<Self::Record, ScanAccessError>;

    /// Wrap a raw record produced by the reader behind `source` into a [`Scan`]
    fn make_scan(source: &SourceHandle<Self>, record: Self::Record) -> Scan<Self> {
        Scan::new(record, source)
    }
}
