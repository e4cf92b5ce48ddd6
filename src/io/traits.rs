mod proxy;
mod source;

pub(crate) use proxy::{borrow_source, borrow_source_mut};
pub use proxy::{DataAccessError, DataAccessProxy, SourceHandle, SourceRef};
pub use source::{ScanAccessError, ScanDataSource, ScanIterator};
