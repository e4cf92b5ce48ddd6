use std::fmt::{self, Display};

use thiserror::Error;

/**
Describes the polarity of a mass spectrum. A spectrum is either `Positive` (1+), `Negative` (-1)
or `Unknown` (0). The `Unknown` state is the default.
*/
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanPolarity {
    #[default]
    Unknown = 0,
    Positive = 1,
    Negative = -1,
}

impl ScanPolarity {
    /// The sign of the charges observed in this polarity mode
    pub fn sign(&self) -> i32 {
        *self as i8 as i32
    }
}

impl From<i32> for ScanPolarity {
    fn from(value: i32) -> Self {
        match value.signum() {
            1 => Self::Positive,
            -1 => Self::Negative,
            _ => Self::Unknown,
        }
    }
}

/// The name of the charge sentinel, as it is rendered and compared
pub const CHARGE_NOT_PROVIDED: &str = "ChargeNotProvided";
/// The name of the isolation window sentinel, as it is rendered and compared
pub const ISOLATION_WINDOW_NOT_PROVIDED: &str = "IsolationWindowNotProvided";

/**
A charge state as reported by a data source.

Some formats do not record the precursor charge at all, which is not the same
thing as a charge of zero. The [`ChargeState::NotProvided`] variant is that
structural absence. It is falsy under [`ChargeState::is_provided`] and compares
equal to its own name, `"ChargeNotProvided"`.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChargeState {
    Known(i32),
    #[default]
    NotProvided,
}

impl ChargeState {
    pub fn is_provided(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    pub fn value(&self) -> Option<i32> {
        match self {
            Self::Known(z) => Some(*z),
            Self::NotProvided => None,
        }
    }

    pub fn unwrap_or(&self, default: i32) -> i32 {
        self.value().unwrap_or(default)
    }
}

impl From<i32> for ChargeState {
    fn from(value: i32) -> Self {
        Self::Known(value)
    }
}

impl From<Option<i32>> for ChargeState {
    fn from(value: Option<i32>) -> Self {
        value.map(Self::Known).unwrap_or(Self::NotProvided)
    }
}

impl Display for ChargeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(z) => write!(f, "{z}"),
            Self::NotProvided => f.write_str(CHARGE_NOT_PROVIDED),
        }
    }
}

impl PartialEq<str> for ChargeState {
    fn eq(&self, other: &str) -> bool {
        match self {
            Self::NotProvided => other == CHARGE_NOT_PROVIDED,
            Self::Known(z) => other.parse::<i32>().is_ok_and(|o| o == *z),
        }
    }
}

impl PartialEq<&str> for ChargeState {
    fn eq(&self, other: &&str) -> bool {
        <Self as PartialEq<str>>::eq(self, other)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// The interval around the precursor ion that was isolated in the precursor scan.
/// Although an isolation window may be specified either with explicit bounds or
/// offsets from the target, this data structure always uses explicit bounds.
pub struct IsolationWindow {
    pub target: f32,
    pub lower_bound: f32,
    pub upper_bound: f32,
}

impl IsolationWindow {
    pub fn new(target: f32, lower_bound: f32, upper_bound: f32) -> Self {
        Self {
            target,
            lower_bound,
            upper_bound,
        }
    }

    /// Build a window from the offsets below and above `target`
    pub fn around(target: f32, lower_offset: f32, upper_offset: f32) -> Self {
        Self::new(target, target - lower_offset, target + upper_offset)
    }

    pub fn contains(&self, mz: f64) -> bool {
        self.lower_bound as f64 <= mz && mz <= self.upper_bound as f64
    }

    pub fn width(&self) -> f32 {
        self.upper_bound - self.lower_bound
    }
}

/// An isolation window as reported by a data source, or the structural absence of one.
///
/// Like [`ChargeState`], the absent variant compares equal to its own name,
/// `"IsolationWindowNotProvided"`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IsolationWindowState {
    Known(IsolationWindow),
    #[default]
    NotProvided,
}

impl IsolationWindowState {
    pub fn is_provided(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    pub fn window(&self) -> Option<&IsolationWindow> {
        match self {
            Self::Known(w) => Some(w),
            Self::NotProvided => None,
        }
    }
}

impl From<IsolationWindow> for IsolationWindowState {
    fn from(value: IsolationWindow) -> Self {
        Self::Known(value)
    }
}

impl Display for IsolationWindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(w) => write!(
                f,
                "IsolationWindow({}, {}, {})",
                w.lower_bound, w.target, w.upper_bound
            ),
            Self::NotProvided => f.write_str(ISOLATION_WINDOW_NOT_PROVIDED),
        }
    }
}

impl PartialEq<str> for IsolationWindowState {
    fn eq(&self, other: &str) -> bool {
        matches!(self, Self::NotProvided) && other == ISOLATION_WINDOW_NOT_PROVIDED
    }
}

impl PartialEq<&str> for IsolationWindowState {
    fn eq(&self, other: &&str) -> bool {
        <Self as PartialEq<str>>::eq(self, other)
    }
}

/// Errors that may arise when assembling raw signal arrays
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArrayError {
    #[error("m/z array ({0}) does not match size of intensity array ({1})")]
    MZIntensityArraySizeMismatch(usize, usize),
}

/// The raw m/z and intensity arrays of a scan, always of equal length
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanArrays {
    mz: Vec<f64>,
    intensity: Vec<f32>,
}

impl ScanArrays {
    pub fn new(mz: Vec<f64>, intensity: Vec<f32>) -> Result<Self, ArrayError> {
        if mz.len() != intensity.len() {
            return Err(ArrayError::MZIntensityArraySizeMismatch(
                mz.len(),
                intensity.len(),
            ));
        }
        Ok(Self { mz, intensity })
    }

    pub fn mzs(&self) -> &[f64] {
        &self.mz
    }

    pub fn intensities(&self) -> &[f32] {
        &self.intensity
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.mz.iter().copied().zip(self.intensity.iter().copied())
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f32>) {
        (self.mz, self.intensity)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_charge_sentinel() {
        let z = ChargeState::NotProvided;
        assert!(!z.is_provided());
        assert_eq!(z, "ChargeNotProvided");
        assert_ne!(z, ChargeState::Known(0));
        assert_eq!(z.to_string(), CHARGE_NOT_PROVIDED);

        let z = ChargeState::Known(0);
        assert!(z.is_provided());
        assert_eq!(z, "0");
        assert_ne!(z, "ChargeNotProvided");
        assert_eq!(ChargeState::from(None), ChargeState::NotProvided);
        assert_eq!(ChargeState::from(Some(3)).value(), Some(3));
    }

    #[test]
    fn test_isolation_window_sentinel() {
        let w = IsolationWindowState::NotProvided;
        assert!(!w.is_provided());
        assert_eq!(w, "IsolationWindowNotProvided");
        assert_eq!(w.to_string(), ISOLATION_WINDOW_NOT_PROVIDED);

        let w: IsolationWindowState = IsolationWindow::around(500.0, 1.0, 1.5).into();
        assert!(w.is_provided());
        assert_ne!(w, "IsolationWindowNotProvided");
        let window = w.window().unwrap();
        assert!(window.contains(501.0));
        assert!(!window.contains(502.0));
        assert_eq!(window.width(), 2.5);
    }

    #[test]
    fn test_polarity() {
        assert_eq!(ScanPolarity::Positive.sign(), 1);
        assert_eq!(ScanPolarity::Negative.sign(), -1);
        assert_eq!(ScanPolarity::from(-4), ScanPolarity::Negative);
        assert_eq!(ScanPolarity::default(), ScanPolarity::Unknown);
    }

    #[test]
    fn test_arrays() {
        assert!(matches!(
            ScanArrays::new(vec![1.0, 2.0], vec![1.0]),
            Err(ArrayError::MZIntensityArraySizeMismatch(2, 1))
        ));
        let arrays = ScanArrays::new(vec![1.0, 2.0], vec![5.0, 6.0]).unwrap();
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays.iter().last(), Some((2.0, 6.0)));
    }
}
