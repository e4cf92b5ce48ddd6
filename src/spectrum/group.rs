use std::fmt;
use std::iter::Chain;

use log::warn;

use crate::io::traits::{ScanDataSource, ScanIterator};
use crate::io::ScanReader;

use super::scan::Scan;

/**
A pairing of an optional survey scan with the tandem scans acquired after it.
*/
pub struct ScanBunch<R: ScanDataSource> {
    /// The MS1 scan of a bunch. This is absent for tandem scans that were acquired
    /// before the first survey scan.
    pub precursor: Option<Scan<R>>,
    /// The tandem scans in acquisition order. Scans of every MSn level land here.
    pub products: Vec<Scan<R>>,
}

impl<R: ScanDataSource> ScanBunch<R> {
    pub fn new(precursor: Option<Scan<R>>, products: Vec<Scan<R>>) -> Self {
        Self {
            precursor,
            products,
        }
    }

    /// The total number of scans in the bunch
    pub fn len(&self) -> usize {
        self.products.len() + usize::from(self.precursor.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the precursor scan (if any) followed by the products
    pub fn iter(&self) -> impl Iterator<Item = &Scan<R>> + '_ {
        self.precursor.iter().chain(self.products.iter())
    }
}

impl<R: ScanDataSource> IntoIterator for ScanBunch<R> {
    type Item = Scan<R>;

    type IntoIter = Chain<std::option::IntoIter<Scan<R>>, std::vec::IntoIter<Scan<R>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.precursor.into_iter().chain(self.products)
    }
}

impl<R: ScanDataSource> fmt::Debug for ScanBunch<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanBunch")
            .field("precursor", &self.precursor)
            .field("products", &self.products)
            .finish()
    }
}

/**
Wraps a [`ScanReader`] and yields one [`ScanBunch`] per survey scan, holding every
tandem scan up to the next survey scan.

Created by [`ScanReader::bunches`]. Scans whose MS level cannot be resolved are
skipped with a warning.
*/
pub struct ScanBunchIterator<R: ScanIterator> {
    reader: ScanReader<R>,
    pending: Option<Scan<R>>,
}

impl<R: ScanIterator> ScanBunchIterator<R> {
    pub fn new(reader: ScanReader<R>) -> Self {
        Self {
            reader,
            pending: None,
        }
    }

    /// Recover the wrapped reader. A survey scan that was read ahead is lost.
    pub fn into_inner(self) -> ScanReader<R> {
        self.reader
    }

    fn next_with_level(&mut self) -> Option<(Scan<R>, u8)> {
        loop {
            let scan = self.reader.next()?;
            match scan.ms_level() {
                Ok(level) => return Some((scan, level)),
                Err(e) => {
                    warn!("Skipping scan while bunching, its MS level could not be read: {e}");
                }
            }
        }
    }
}

impl<R: ScanIterator> Iterator for ScanBunchIterator<R> {
    type Item = ScanBunch<R>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut precursor = None;
        let mut products = Vec::new();
        match self.pending.take() {
            Some(scan) => precursor = Some(scan),
            None => {
                let (scan, level) = self.next_with_level()?;
                if level < 2 {
                    precursor = Some(scan);
                } else {
                    products.push(scan);
                }
            }
        }
        while let Some((scan, level)) = self.next_with_level() {
            if level < 2 {
                self.pending = Some(scan);
                break;
            }
            products.push(scan);
        }
        Some(ScanBunch::new(precursor, products))
    }
}

impl<R: ScanIterator> fmt::Debug for ScanBunchIterator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanBunchIterator")
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::{MemoryScanSource, ScanRecord};

    #[test_log::test]
    fn test_bunching() {
        let records = vec![
            ScanRecord::new("scan=1", 0, 2, 0.1),
            ScanRecord::new("scan=2", 1, 1, 0.2),
            ScanRecord::new("scan=3", 2, 2, 0.3),
            ScanRecord::new("scan=4", 3, 2, 0.4),
            ScanRecord::new("scan=5", 4, 1, 0.5),
            ScanRecord::new("scan=6", 5, 1, 0.6),
            ScanRecord::new("scan=7", 6, 3, 0.7),
        ];
        let reader = ScanReader::new(MemoryScanSource::new(records));
        let bunches: Vec<_> = reader.bunches().collect();
        assert_eq!(bunches.len(), 4);

        assert!(bunches[0].precursor.is_none());
        assert_eq!(bunches[0].products.len(), 1);

        let ids: Vec<String> = bunches[1]
            .iter()
            .map(|s| s.id().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["scan=2", "scan=3", "scan=4"]);

        assert_eq!(bunches[2].len(), 1);
        assert!(bunches[2].products.is_empty());

        let last: Vec<_> = bunches.into_iter().last().unwrap().into_iter().collect();
        assert_eq!(last.len(), 2);
        assert_eq!(last[1].ms_level().unwrap(), 3);
    }

    #[test]
    fn test_empty_source() {
        let reader = ScanReader::new(MemoryScanSource::new(Vec::new()));
        assert_eq!(reader.bunches().count(), 0);
    }
}
