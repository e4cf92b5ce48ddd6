//! Reading scans from mass spectrometry data files and abstractions over the readers.
//!
//! A concrete reader implements [`ScanDataSource`] and [`ScanIterator`], and is wrapped in a
//! [`ScanReader`] to produce [`Scan`](crate::spectrum::Scan)s. [`MSFileLoader`] picks the right
//! reader for a file by guessing its format.

mod infer_format;
mod memory;
mod offset_index;
mod reader;
pub mod traits;

pub(crate) mod compression;

pub use crate::io::infer_format::{
    guess_type, guess_type_from_file_sniffing, guess_type_from_path, guess_type_from_prefix,
    guess_type_from_thermo_header, is_thermo_raw_prefix, FormatGuessError, FormatGuesser,
    FormatGuesserChain, LoaderError, MSFileLoader, MSFileLoaderBuilder, MassSpectrometryFormat,
    ReaderConstructor, DEFAULT_SNIFF_LENGTH,
};

pub use crate::io::memory::{MemoryScanSource, PrecursorDescription, ScanRecord};
pub use crate::io::offset_index::OffsetIndex;
pub use crate::io::reader::ScanReader;
pub use crate::io::traits::{
    DataAccessError, DataAccessProxy, ScanAccessError, ScanDataSource, ScanIterator,
    SourceHandle, SourceRef,
};
