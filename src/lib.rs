//! `mzscan` provides a uniform, lazily-evaluated view over the scans of a mass spectrometry
//! data file, whatever reader produced them.
//!
//! A reader supplies a handful of primitive accessors through [`ScanDataSource`] and
//! [`ScanIterator`]. Wrapped in a [`ScanReader`], it yields [`Scan`]s that fetch each attribute
//! from the reader the first time it is asked for and remember it afterwards. Scans only hold
//! a weak reference to their reader, so they can be detached from it, and a
//! [`ProcessedScan`] produced by [`Scan::pack`] does not need the reader at all.
//!
//! [`MSFileLoader`] chooses a reader for a file by guessing its format from the file name or
//! its first bytes.
//!
//! ```rust
//! use mzscan::prelude::*;
//! use mzscan::io::{MemoryScanSource, ScanReader, ScanRecord};
//!
//! let source = MemoryScanSource::new(vec![
//!     ScanRecord::new("scan=1", 0, 1, 0.5),
//!     ScanRecord::new("scan=2", 1, 2, 0.6),
//! ]);
//! let reader = ScanReader::new(source);
//! for scan in reader {
//!     println!("{} at MS{}", scan.id().unwrap(), scan.ms_level().unwrap());
//! }
//! ```
pub mod io;
pub mod peaks;
pub mod prelude;
pub mod spectrum;
pub mod utils;

pub use crate::io::{
    guess_type, MSFileLoader, MassSpectrometryFormat, ScanDataSource, ScanIterator, ScanReader,
};
pub use crate::peaks::{PeakIndex, PeakPicking, PickingOptions};
pub use crate::spectrum::{
    PrecursorInformation, PrecursorSnapshot, ProcessedScan, Scan, ScanBunch,
};

pub use mzpeaks::{CentroidPeak, DeconvolutedPeak, DeconvolutedPeakSet, PeakSet, Tolerance};
