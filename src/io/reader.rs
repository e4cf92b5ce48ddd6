use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::warn;

use crate::spectrum::{Scan, ScanBunchIterator};

use super::traits::{
    borrow_source_mut, DataAccessError, DataAccessProxy, ScanAccessError, ScanIterator,
    SourceHandle,
};

/**
Owns a [`ScanIterator`] and produces [`Scan`]s from it.

The reader is kept behind a [`SourceHandle`] so the scans it produces can refer back
to it without keeping it alive. Dropping the [`ScanReader`] drops the reader, after
which every scan it produced is detached.

Iterating walks the source's records in acquisition order. There is no way to rewind
unless the source itself supports it (see [`MemoryScanSource::reset`](super::MemoryScanSource::reset)).
*/
pub struct ScanReader<R: ScanIterator> {
    handle: SourceHandle<R>,
}

impl<R: ScanIterator> ScanReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            handle: Rc::new(RefCell::new(source)),
        }
    }

    /// The shared handle to the wrapped source
    pub fn handle(&self) -> &SourceHandle<R> {
        &self.handle
    }

    /// Wrap a raw record into a [`Scan`] attached to this reader
    pub fn make_scan(&self, record: R::Record) -> Scan<R> {
        R::make_scan(&self.handle, record)
    }

    /// Look up a scan by its native ID
    pub fn get_scan_by_id(&self, scan_id: &str) -> Result<Scan<R>, ScanAccessError> {
        let record = borrow_source_mut(&self.handle)?.get_record_by_id(scan_id)?;
        Ok(self.make_scan(record))
    }

    /// Attach `proxy` to this reader
    pub fn attach<P: DataAccessProxy<R> + ?Sized>(&self, proxy: &mut P) {
        proxy.attach(&self.handle);
    }

    /// Read the next scan, telling a busy source apart from an exhausted one.
    ///
    /// Fails with [`DataAccessError::SourceBusy`] if the source is borrowed elsewhere.
    pub fn try_next(&mut self) -> Result<Option<Scan<R>>, DataAccessError> {
        let record = borrow_source_mut(&self.handle)?.next_record();
        Ok(record.map(|record| self.make_scan(record)))
    }

    /// Group the remaining scans into survey scans and the tandem scans that follow them
    pub fn bunches(self) -> ScanBunchIterator<R> {
        ScanBunchIterator::new(self)
    }
}

/// Iteration ends early, with a warning, if the source is borrowed elsewhere. Use
/// [`ScanReader::try_next`] to tell that apart from the end of the source.
impl<R: ScanIterator> Iterator for ScanReader<R> {
    type Item = Scan<R>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.try_next() {
            Ok(scan) => scan,
            Err(e) => {
                warn!("No further scans can be read right now: {e}");
                None
            }
        }
    }
}

impl<R: ScanIterator> From<R> for ScanReader<R> {
    fn from(value: R) -> Self {
        Self::new(value)
    }
}

impl<R: ScanIterator> fmt::Debug for ScanReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanReader")
            .field("scans_alive", &Rc::weak_count(&self.handle))
            .finish()
    }
}
