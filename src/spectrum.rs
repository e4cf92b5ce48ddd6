//! The scan facade and the values that describe a scan.
//!
//! [`Scan`] is the lazily-populated view over a reader's raw record. [`PrecursorInformation`]
//! describes the ion a tandem scan was produced from, and [`ProcessedScan`] is the
//! self-contained result of packing a scan after peak picking.

mod group;
mod precursor;
mod processed;
mod scan;
pub mod scan_properties;

pub use crate::spectrum::group::{ScanBunch, ScanBunchIterator};
pub use crate::spectrum::precursor::{PrecursorInformation, PrecursorSnapshot};
pub use crate::spectrum::processed::{DeconvolutedPeakIter, ProcessedScan};
pub use crate::spectrum::scan::{Scan, ScanProcessingError};
pub use crate::spectrum::scan_properties::*;
