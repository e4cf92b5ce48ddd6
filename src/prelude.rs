//! A set of foundational traits used throughout the library.
pub use crate::io::traits::{DataAccessProxy, ScanDataSource, ScanIterator};
pub use crate::peaks::PeakPicking;

pub use mzpeaks::prelude::*;
