use std::cell::{Ref, RefCell, RefMut};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::spectrum::Scan;

use super::source::{ScanAccessError, ScanIterator};

/// A shared, single-threaded handle to a reader. Scans and precursor
/// descriptions only ever hold a [`Weak`] reference to it.
pub type SourceHandle<R> = Rc<RefCell<R>>;

/// Errors raised when an entity tries to delegate to its reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DataAccessError {
    /// No reader is attached, either because [`DataAccessProxy::detach`] was called,
    /// the entity was deserialized, or the reader has been dropped.
    #[error("Cannot perform operation. Instance is detached.")]
    Detached,
    /// The reader is currently mutably borrowed elsewhere
    #[error("Cannot perform operation. The attached source is busy.")]
    SourceBusy,
}

/**
A nullable, non-owning reference to a reader.

This never keeps the reader alive. Cloning a [`SourceRef`] clones the reference,
not the reader, and the reference is never serialized: a deserialized value is
always detached until its owner re-attaches it.
*/
pub struct SourceRef<R> {
    source: Option<Weak<RefCell<R>>>,
}

impl<R> SourceRef<R> {
    pub fn new(source: &SourceHandle<R>) -> Self {
        Self {
            source: Some(Rc::downgrade(source)),
        }
    }

    pub fn detached() -> Self {
        Self { source: None }
    }

    pub fn attach(&mut self, source: &SourceHandle<R>) {
        self.source = Some(Rc::downgrade(source));
    }

    pub fn detach(&mut self) {
        self.source = None;
    }

    /// Whether there is a reader to delegate to. A reference to a reader
    /// that has since been dropped is not attached.
    pub fn is_attached(&self) -> bool {
        self.source
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    pub fn raise_if_detached(&self) -> Result<(), DataAccessError> {
        if self.is_attached() {
            Ok(())
        } else {
            Err(DataAccessError::Detached)
        }
    }

    /// Obtain a strong handle to the reader for the duration of a delegated call
    pub fn upgrade(&self) -> Result<SourceHandle<R>, DataAccessError> {
        self.source
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .ok_or(DataAccessError::Detached)
    }

    /// Whether `self` points at the same reader as `source`
    pub fn is_attached_to(&self, source: &SourceHandle<R>) -> bool {
        self.source
            .as_ref()
            .is_some_and(|weak| weak.as_ptr() == Rc::as_ptr(source))
    }

    /// Resolve a scan by its native ID through the attached reader
    pub fn get_scan_by_id(&self, scan_id: &str) -> Result<Scan<R>, ScanAccessError>
    where
        R: ScanIterator,
    {
        let handle = self.upgrade()?;
        let record = {
            let mut reader = borrow_source_mut(&handle)?;
            reader.get_record_by_id(scan_id)?
        };
        Ok(R::make_scan(&handle, record))
    }
}

pub(crate) fn borrow_source<R>(handle: &SourceHandle<R>) -> Result<Ref<'_, R>, DataAccessError> {
    handle.try_borrow().map_err(|_| DataAccessError::SourceBusy)
}

pub(crate) fn borrow_source_mut<R>(
    handle: &SourceHandle<R>,
) -> Result<RefMut<'_, R>, DataAccessError> {
    handle
        .try_borrow_mut()
        .map_err(|_| DataAccessError::SourceBusy)
}

impl<R> Default for SourceRef<R> {
    fn default() -> Self {
        Self::detached()
    }
}

impl<R> Clone for SourceRef<R> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<R> Debug for SourceRef<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRef")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/**
Gives any type that holds a [`SourceRef`] an attach/detach lifecycle and
guarded delegation to its reader.

Implementors only supply access to their [`SourceRef`]. Types that own other
proxied values (a [`Scan`] owns its precursor information and product scans)
override [`DataAccessProxy::attach`] and [`DataAccessProxy::detach`] to
propagate the change.
*/
pub trait DataAccessProxy<R> {
    fn source_ref(&self) -> &SourceRef<R>;

    fn source_ref_mut(&mut self) -> &mut SourceRef<R>;

    fn attach(&mut self, source: &SourceHandle<R>) {
        self.source_ref_mut().attach(source);
    }

    fn detach(&mut self) {
        self.source_ref_mut().detach();
    }

    fn is_attached(&self) -> bool {
        self.source_ref().is_attached()
    }

    fn raise_if_detached(&self) -> Result<(), DataAccessError> {
        self.source_ref().raise_if_detached()
    }

    fn get_scan_by_id(&self, scan_id: &str) -> Result<Scan<R>, ScanAccessError>
    where
        R: ScanIterator,
    {
        self.source_ref().get_scan_by_id(scan_id)
    }
}

impl<R> DataAccessProxy<R> for SourceRef<R> {
    fn source_ref(&self) -> &SourceRef<R> {
        self
    }

    fn source_ref_mut(&mut self) -> &mut SourceRef<R> {
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::{MemoryScanSource, ScanRecord};

    fn make_source() -> SourceHandle<MemoryScanSource> {
        let records = vec![ScanRecord::new("scan=1", 0, 1, 0.5)];
        Rc::new(RefCell::new(MemoryScanSource::new(records)))
    }

    #[test]
    fn test_attach_detach() {
        let handle = make_source();
        let mut proxy = SourceRef::new(&handle);
        assert!(proxy.is_attached());
        assert!(proxy.is_attached_to(&handle));
        assert!(proxy.get_scan_by_id("scan=1").is_ok());

        proxy.detach();
        assert!(!proxy.is_attached());
        assert_eq!(proxy.raise_if_detached(), Err(DataAccessError::Detached));
        match proxy.get_scan_by_id("scan=1") {
            Err(ScanAccessError::Access(DataAccessError::Detached)) => {}
            Err(e) => panic!("Expected a detached error, got {e}"),
            Ok(_) => panic!("Expected a detached error"),
        }

        proxy.attach(&handle);
        assert!(proxy.get_scan_by_id("scan=1").is_ok());
        assert!(matches!(
            proxy.get_scan_by_id("scan=2"),
            Err(ScanAccessError::ScanIdNotFound(_))
        ));
    }

    #[test]
    fn test_dropped_source_is_detached() {
        let handle = make_source();
        let proxy = SourceRef::new(&handle);
        let copy = proxy.clone();
        drop(handle);
        assert!(!proxy.is_attached());
        assert!(matches!(copy.upgrade(), Err(DataAccessError::Detached)));
    }

    #[test]
    fn test_busy_source() {
        let handle = make_source();
        let proxy = SourceRef::new(&handle);
        let _guard = handle.borrow_mut();
        assert!(matches!(
            proxy.get_scan_by_id("scan=1"),
            Err(ScanAccessError::Access(DataAccessError::SourceBusy))
        ));
    }
}
