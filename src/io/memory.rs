use crate::spectrum::{
    ChargeState, IsolationWindowState, PrecursorInformation, ScanArrays, ScanPolarity,
};

use super::offset_index::OffsetIndex;
use super::traits::{ScanAccessError, ScanDataSource, ScanIterator};

/// The precursor ion as recorded alongside a [`ScanRecord`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrecursorDescription {
    pub mz: f64,
    pub intensity: f32,
    pub charge: ChargeState,
    pub isolation_window: IsolationWindowState,
    pub precursor_scan_id: Option<String>,
}

impl PrecursorDescription {
    pub fn new<C: Into<ChargeState>>(mz: f64, intensity: f32, charge: C) -> Self {
        Self {
            mz,
            intensity,
            charge: charge.into(),
            isolation_window: IsolationWindowState::NotProvided,
            precursor_scan_id: None,
        }
    }

    pub fn with_scan_id<S: Into<String>>(mut self, scan_id: S) -> Self {
        self.precursor_scan_id = Some(scan_id.into());
        self
    }

    pub fn with_isolation_window<W: Into<IsolationWindowState>>(mut self, window: W) -> Self {
        self.isolation_window = window.into();
        self
    }

    /// Build a detached [`PrecursorInformation`] from this description
    pub fn to_precursor_information<R>(&self) -> PrecursorInformation<R> {
        let prec = PrecursorInformation::new(self.mz, self.intensity, self.charge)
            .with_isolation_window(self.isolation_window);
        match self.precursor_scan_id.as_deref() {
            Some(scan_id) => prec.with_precursor_scan_id(scan_id),
            None => prec,
        }
    }
}

/// One scan held entirely in memory
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanRecord {
    pub id: String,
    pub title: String,
    pub index: usize,
    pub ms_level: u8,
    pub scan_time: f64,
    pub is_profile: bool,
    pub polarity: ScanPolarity,
    pub arrays: ScanArrays,
    pub precursor: Option<PrecursorDescription>,
}

impl ScanRecord {
    /// A centroid scan with no signal whose title is its ID
    pub fn new<S: Into<String>>(id: S, index: usize, ms_level: u8, scan_time: f64) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            index,
            ms_level,
            scan_time,
            ..Default::default()
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_arrays(mut self, arrays: ScanArrays) -> Self {
        self.arrays = arrays;
        self
    }

    pub fn with_profile(mut self, is_profile: bool) -> Self {
        self.is_profile = is_profile;
        self
    }

    pub fn with_polarity(mut self, polarity: ScanPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn with_precursor(mut self, precursor: PrecursorDescription) -> Self {
        self.precursor = Some(precursor);
        self
    }
}

/**
A scan source over a list of [`ScanRecord`]s held in memory.

Records are cloned out as they are read. Unlike file-backed readers, this source can
be rewound with [`MemoryScanSource::reset`].
*/
#[derive(Debug, Clone, Default)]
pub struct MemoryScanSource {
    records: Vec<ScanRecord>,
    position: usize,
    offsets: OffsetIndex,
}

impl MemoryScanSource {
    pub fn new(records: Vec<ScanRecord>) -> Self {
        let mut offsets = OffsetIndex::new("scan".to_string());
        records.iter().enumerate().for_each(|(i, s)| {
            offsets.insert(s.id.as_str(), i);
        });
        Self {
            records,
            position: 0,
            offsets,
        }
    }

    /// Move the cursor back to the first record
    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get_index(&self) -> &OffsetIndex {
        &self.offsets
    }
}

impl From<Vec<ScanRecord>> for MemoryScanSource {
    fn from(value: Vec<ScanRecord>) -> Self {
        Self::new(value)
    }
}

impl ScanDataSource for MemoryScanSource {
    type Record = ScanRecord;

    fn scan_arrays(&self, record: &ScanRecord) -> ScanArrays {
        record.arrays.clone()
    }

    fn precursor_information(&self, record: &ScanRecord) -> Option<PrecursorInformation<Self>> {
        record
            .precursor
            .as_ref()
            .map(|p| p.to_precursor_information())
    }

    fn scan_title(&self, record: &ScanRecord) -> String {
        record.title.clone()
    }

    fn scan_id(&self, record: &ScanRecord) -> String {
        record.id.clone()
    }

    fn scan_index(&self, record: &ScanRecord) -> usize {
        record.index
    }

    fn ms_level(&self, record: &ScanRecord) -> u8 {
        record.ms_level
    }

    fn scan_time(&self, record: &ScanRecord) -> f64 {
        record.scan_time
    }

    fn is_profile(&self, record: &ScanRecord) -> bool {
        record.is_profile
    }

    fn polarity(&self, record: &ScanRecord) -> ScanPolarity {
        record.polarity
    }
}

impl ScanIterator for MemoryScanSource {
    fn next_record(&mut self) -> Option<ScanRecord> {
        let record = self.records.get(self.position)?.clone();
        self.position += 1;
        Some(record)
    }

    fn get_record_by_id(&mut self, scan_id: &str) -> Result<ScanRecord, ScanAccessError> {
        self.offsets
            .get(scan_id)
            .and_then(|i| self.records.get(i))
            .cloned()
            .ok_or_else(|| ScanAccessError::ScanIdNotFound(scan_id.to_string()))
    }
}
