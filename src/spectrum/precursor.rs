use std::fmt::{self, Display};

use mzpeaks::{CentroidPeak, DeconvolutedPeak};

use crate::io::traits::{DataAccessProxy, ScanAccessError, ScanIterator, SourceRef};
use crate::utils::{mass_charge_ratio, neutral_mass};

use super::scan::Scan;
use super::scan_properties::{ChargeState, IsolationWindowState};

/**
Describes the ion that was selected and fragmented to produce a tandem scan.

The *reported* fields are what the acquisition software wrote down. The *extracted*
fields are filled in later, either by [`PrecursorInformation::extract`] from a
deconvoluted peak, or by [`PrecursorInformation::default`] which trusts the reported
values.

The reference to the reader is never serialized. A deserialized value is always
detached.
*/
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(bound = "")
)]
pub struct PrecursorInformation<R> {
    /// The reported m/z of the precursor ion
    pub mz: f64,
    pub intensity: f32,
    pub charge: ChargeState,
    pub isolation_window: IsolationWindowState,
    /// The native ID of the scan the precursor ion was selected from
    pub precursor_scan_id: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip))]
    source: SourceRef<R>,

    pub extracted_neutral_mass: f64,
    pub extracted_charge: i32,
    pub extracted_intensity: f32,
    /// The picked peak nearest the reported m/z in the precursor scan
    pub peak: Option<CentroidPeak>,
    pub extracted_peak: Option<DeconvolutedPeak>,

    /// Whether the extracted values were copied from the reported ones
    pub defaulted: bool,
    /// Whether no precursor peak could be found for this ion
    pub orphan: bool,
}

impl<R> PrecursorInformation<R> {
    pub fn new<C: Into<ChargeState>>(mz: f64, intensity: f32, charge: C) -> Self {
        Self {
            mz,
            intensity,
            charge: charge.into(),
            isolation_window: IsolationWindowState::NotProvided,
            precursor_scan_id: None,
            source: SourceRef::detached(),
            extracted_neutral_mass: 0.0,
            extracted_charge: 0,
            extracted_intensity: 0.0,
            peak: None,
            extracted_peak: None,
            defaulted: false,
            orphan: false,
        }
    }

    pub fn with_precursor_scan_id<S: Into<String>>(mut self, scan_id: S) -> Self {
        self.precursor_scan_id = Some(scan_id.into());
        self
    }

    pub fn with_isolation_window<W: Into<IsolationWindowState>>(mut self, window: W) -> Self {
        self.isolation_window = window.into();
        self
    }

    pub fn with_peak(mut self, peak: CentroidPeak) -> Self {
        self.peak = Some(peak);
        self
    }

    pub fn with_source(mut self, source: SourceRef<R>) -> Self {
        self.source = source;
        self
    }

    /// Fill the extracted fields from a deconvoluted peak. `override_charge`, when given,
    /// takes precedence over the peak's charge.
    pub fn extract(&mut self, peak: &DeconvolutedPeak, override_charge: Option<i32>) -> &mut Self {
        self.extracted_neutral_mass = peak.neutral_mass;
        self.extracted_charge = override_charge.unwrap_or(peak.charge);
        self.extracted_intensity = peak.intensity;
        self.extracted_peak = Some(peak.clone());
        self
    }

    /// Fill the extracted fields from the reported ones and mark them as defaulted.
    ///
    /// A charge that was not provided is copied as 0.
    pub fn default(&mut self) -> &mut Self {
        self.extracted_neutral_mass = self.neutral_mass();
        self.extracted_charge = self.charge.unwrap_or(0);
        self.extracted_intensity = self.intensity;
        self.defaulted = true;
        self
    }

    /// The neutral mass implied by the reported m/z and charge. Without a reported
    /// charge this is 0.
    pub fn neutral_mass(&self) -> f64 {
        neutral_mass(self.mz, self.charge.unwrap_or(0))
    }

    /// The m/z implied by the extracted neutral mass and charge, 0 when the extracted
    /// charge is 0
    pub fn extracted_mz(&self) -> f64 {
        mass_charge_ratio(self.extracted_neutral_mass, self.extracted_charge)
    }

    /// Look up the scan this precursor ion was selected from
    pub fn precursor(&self) -> Result<Scan<R>, ScanAccessError>
    where
        R: ScanIterator,
    {
        self.source.raise_if_detached()?;
        match self.precursor_scan_id.as_deref() {
            Some(scan_id) => self.source.get_scan_by_id(scan_id),
            None => Err(ScanAccessError::ScanNotFound),
        }
    }

    /// A copy of this value with no reader attached
    pub fn detached(&self) -> Self {
        let mut dup = self.clone();
        dup.source.detach();
        dup
    }

    /// Copy the descriptive fields into a value that does not know about any reader
    pub fn snapshot(&self) -> PrecursorSnapshot {
        PrecursorSnapshot {
            mz: self.mz,
            intensity: self.intensity,
            charge: self.charge,
            isolation_window: self.isolation_window,
            precursor_scan_id: self.precursor_scan_id.clone(),
            extracted_neutral_mass: self.extracted_neutral_mass,
            extracted_charge: self.extracted_charge,
            extracted_intensity: self.extracted_intensity,
            peak: self.peak.clone(),
            extracted_peak: self.extracted_peak.clone(),
            defaulted: self.defaulted,
            orphan: self.orphan,
        }
    }
}

/**
The fields of a [`PrecursorInformation`] frozen into a plain value.

This is what a [`ProcessedScan`](super::ProcessedScan) carries. It has no way to reach
a reader, so it can be sent across threads and stored freely. To look up the precursor
scan again, convert it back into a [`PrecursorInformation`] and attach that to a reader.
*/
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrecursorSnapshot {
    pub mz: f64,
    pub intensity: f32,
    pub charge: ChargeState,
    pub isolation_window: IsolationWindowState,
    pub precursor_scan_id: Option<String>,
    pub extracted_neutral_mass: f64,
    pub extracted_charge: i32,
    pub extracted_intensity: f32,
    pub peak: Option<CentroidPeak>,
    pub extracted_peak: Option<DeconvolutedPeak>,
    pub defaulted: bool,
    pub orphan: bool,
}

impl PrecursorSnapshot {
    pub fn neutral_mass(&self) -> f64 {
        neutral_mass(self.mz, self.charge.unwrap_or(0))
    }

    pub fn extracted_mz(&self) -> f64 {
        mass_charge_ratio(self.extracted_neutral_mass, self.extracted_charge)
    }
}

impl<R> From<&PrecursorInformation<R>> for PrecursorSnapshot {
    fn from(value: &PrecursorInformation<R>) -> Self {
        value.snapshot()
    }
}

impl<R> Clone for PrecursorInformation<R> {
    fn clone(&self) -> Self {
        Self {
            mz: self.mz,
            intensity: self.intensity,
            charge: self.charge,
            isolation_window: self.isolation_window,
            precursor_scan_id: self.precursor_scan_id.clone(),
            source: self.source.clone(),
            extracted_neutral_mass: self.extracted_neutral_mass,
            extracted_charge: self.extracted_charge,
            extracted_intensity: self.extracted_intensity,
            peak: self.peak.clone(),
            extracted_peak: self.extracted_peak.clone(),
            defaulted: self.defaulted,
            orphan: self.orphan,
        }
    }
}

impl<R> From<PrecursorSnapshot> for PrecursorInformation<R> {
    fn from(value: PrecursorSnapshot) -> Self {
        Self {
            mz: value.mz,
            intensity: value.intensity,
            charge: value.charge,
            isolation_window: value.isolation_window,
            precursor_scan_id: value.precursor_scan_id,
            source: SourceRef::detached(),
            extracted_neutral_mass: value.extracted_neutral_mass,
            extracted_charge: value.extracted_charge,
            extracted_intensity: value.extracted_intensity,
            peak: value.peak,
            extracted_peak: value.extracted_peak,
            defaulted: value.defaulted,
            orphan: value.orphan,
        }
    }
}

impl<R> fmt::Debug for PrecursorInformation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrecursorInformation")
            .field("mz", &self.mz)
            .field("intensity", &self.intensity)
            .field("charge", &self.charge)
            .field("isolation_window", &self.isolation_window)
            .field("precursor_scan_id", &self.precursor_scan_id)
            .field("source", &self.source)
            .field("extracted_neutral_mass", &self.extracted_neutral_mass)
            .field("extracted_charge", &self.extracted_charge)
            .field("extracted_intensity", &self.extracted_intensity)
            .field("peak", &self.peak)
            .field("extracted_peak", &self.extracted_peak)
            .field("defaulted", &self.defaulted)
            .field("orphan", &self.orphan)
            .finish()
    }
}

impl<R> Display for PrecursorInformation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extracted_mz = if self.extracted_neutral_mass != 0.0 {
            let z = if self.extracted_charge != 0 {
                self.extracted_charge
            } else {
                1
            };
            mass_charge_ratio(self.extracted_neutral_mass, z)
        } else {
            0.0
        };
        write!(
            f,
            "PrecursorInformation(mz={:0.4}/{:0.4}, intensity={:0.4}/{:0.4}, charge={}/{}, scan_id={:?})",
            self.mz,
            extracted_mz,
            self.intensity,
            self.extracted_intensity,
            self.charge,
            self.extracted_charge,
            self.precursor_scan_id
        )
    }
}

impl<R> DataAccessProxy<R> for PrecursorInformation<R> {
    fn source_ref(&self) -> &SourceRef<R> {
        &self.source
    }

    fn source_ref_mut(&mut self) -> &mut SourceRef<R> {
        &mut self.source
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::traits::DataAccessError;
    use crate::io::{MemoryScanSource, ScanReader, ScanRecord};
    use crate::utils::PROTON;

    type Precursor = PrecursorInformation<MemoryScanSource>;

    #[test]
    fn test_default_and_extract() {
        let mut prec = Precursor::new(500.0, 1000.0, 2);
        prec.default();
        assert!(prec.defaulted);
        assert_eq!(prec.extracted_charge, 2);
        assert_eq!(prec.extracted_intensity, 1000.0);
        assert!((prec.extracted_neutral_mass - (1000.0 - 2.0 * PROTON)).abs() < 1e-9);
        assert!((prec.extracted_mz() - 500.0).abs() < 1e-9);

        let mut prec = Precursor::new(500.0, 1000.0, 2);
        let peak = DeconvolutedPeak::new(1497.0, 250.0, 3, 0);
        prec.extract(&peak, None);
        assert!(!prec.defaulted);
        assert_eq!(prec.extracted_charge, 3);
        assert_eq!(prec.extracted_neutral_mass, 1497.0);
        assert_eq!(prec.extracted_intensity, 250.0);
        assert!(prec.extracted_peak.is_some());

        prec.extract(&peak, Some(2));
        assert_eq!(prec.extracted_charge, 2);
    }

    #[test]
    fn test_extract_keeps_flags() {
        let mut prec = Precursor::new(500.0, 1000.0, 2);
        prec.orphan = true;
        prec.default();
        let peak = DeconvolutedPeak::new(1497.0, 250.0, 3, 0);
        prec.extract(&peak, None);
        assert!(prec.defaulted);
        assert!(prec.orphan);
        assert_eq!(prec.extracted_charge, 3);
        assert_eq!(prec.extracted_neutral_mass, 1497.0);
    }

    #[test]
    fn test_snapshot() {
        let records = vec![ScanRecord::new("scan=1", 0, 1, 0.5)];
        let reader = ScanReader::new(MemoryScanSource::new(records));
        let mut prec = Precursor::new(500.0, 10.0, 2).with_precursor_scan_id("scan=1");
        reader.attach(&mut prec);
        prec.default();

        let snapshot = prec.snapshot();
        assert_eq!(snapshot.extracted_charge, 2);
        assert!(snapshot.defaulted);
        assert!((snapshot.extracted_mz() - 500.0).abs() < 1e-9);
        assert_eq!(snapshot.neutral_mass(), prec.neutral_mass());

        let mut restored = Precursor::from(snapshot.clone());
        assert!(!restored.is_attached());
        assert_eq!(PrecursorSnapshot::from(&restored), snapshot);
        reader.attach(&mut restored);
        assert_eq!(restored.precursor().unwrap().id().unwrap(), "scan=1");
    }

    #[test]
    fn test_missing_charge() {
        let mut prec = Precursor::new(500.0, 10.0, ChargeState::NotProvided);
        assert_eq!(prec.neutral_mass(), 0.0);
        prec.default();
        assert_eq!(prec.extracted_charge, 0);
        assert_eq!(prec.extracted_mz(), 0.0);
        assert!(prec.charge == "ChargeNotProvided");
    }

    #[test]
    fn test_display() {
        let mut prec = Precursor::new(500.0, 10.0, 2).with_precursor_scan_id("scan=1");
        assert_eq!(
            prec.to_string(),
            "PrecursorInformation(mz=500.0000/0.0000, intensity=10.0000/0.0000, charge=2/0, scan_id=Some(\"scan=1\"))"
        );
        prec.default();
        assert!(prec.to_string().starts_with("PrecursorInformation(mz=500.0000/500.0000"));
    }

    #[test]
    fn test_precursor_lookup() {
        let records = vec![
            ScanRecord::new("scan=1", 0, 1, 0.5),
            ScanRecord::new("scan=2", 1, 2, 0.6),
        ];
        let reader = ScanReader::new(MemoryScanSource::new(records));

        let mut prec = Precursor::new(500.0, 10.0, 2);
        assert!(matches!(
            prec.precursor(),
            Err(ScanAccessError::Access(DataAccessError::Detached))
        ));

        reader.attach(&mut prec);
        assert!(matches!(prec.precursor(), Err(ScanAccessError::ScanNotFound)));

        let mut prec = prec.with_precursor_scan_id("scan=1");
        let scan = prec.precursor().unwrap();
        assert_eq!(scan.id().unwrap(), "scan=1");

        let copy = prec.detached();
        assert!(!copy.is_attached());
        assert!(prec.is_attached());

        prec.detach();
        assert!(prec.precursor().unwrap_err().is_detached());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_detaches() {
        let records = vec![ScanRecord::new("scan=1", 0, 1, 0.5)];
        let reader = ScanReader::new(MemoryScanSource::new(records));
        let mut prec = Precursor::new(500.0, 10.0, ChargeState::NotProvided)
            .with_precursor_scan_id("scan=1");
        reader.attach(&mut prec);
        prec.default();

        let text = serde_json::to_string(&prec).unwrap();
        let dup: Precursor = serde_json::from_str(&text).unwrap();
        assert!(!dup.is_attached());
        assert_eq!(dup.charge, ChargeState::NotProvided);
        assert_eq!(dup.precursor_scan_id.as_deref(), Some("scan=1"));
        assert!(dup.defaulted);
    }
}
