use std::{
    collections::HashSet,
    fmt::Display,
    fs,
    io::{self, prelude::*},
    path::{Path, PathBuf},
    rc::Rc,
};

use log::debug;
use thiserror::Error;

use crate::io::compression::{is_gzipped_extension, read_prefix};

/// The number of leading bytes inspected when sniffing a file's contents
pub const DEFAULT_SNIFF_LENGTH: usize = 1000;

/// Mass spectrometry file formats that can be recognized. Each variant names the
/// reader that handles it.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MassSpectrometryFormat {
    MzML,
    MzXML,
    ThermoRaw,
}

impl Display for MassSpectrometryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Errors produced while guessing the format of a file
#[derive(Debug, Error)]
pub enum FormatGuessError {
    /// The guesser does not recognize the file
    #[error("Format not recognized: {0}")]
    InvalidFormat(String),
    #[error("An I/O error occurred while guessing the file format: {0}")]
    IOError(
        #[from]
        #[source]
        io::Error,
    ),
    /// The format was recognized but no reader for it is available
    #[error("No reader is available for {0}")]
    BackendUnavailable(MassSpectrometryFormat),
    /// Any other failure. These are not recovered from.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
    /// No guesser recognized the file
    #[error("Could not determine the format of {}", .0.display())]
    Undetermined(PathBuf),
}

impl FormatGuessError {
    /// Whether the next guesser in a chain should be consulted after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_) | Self::IOError(_) | Self::BackendUnavailable(_)
        )
    }
}

/// Check whether `buffer` starts with a Thermo RAW file header: the bytes `01 A1`
/// followed by "Finnigan" encoded as UTF-16LE
pub fn is_thermo_raw_prefix(buffer: &[u8]) -> bool {
    if buffer.len() < 18 || buffer[..2] != [0x01, 0xA1] {
        return false;
    }
    let view: Vec<u16> = buffer[2..18]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&view) == "Finnigan"
}

/// Recognize a Thermo RAW file by its header bytes
pub fn guess_type_from_thermo_header(
    path: &Path,
) -> Result<MassSpectrometryFormat, FormatGuessError> {
    let mut header = [0u8; 18];
    let mut handle = fs::File::open(path)?;
    handle.read_exact(&mut header)?;
    if is_thermo_raw_prefix(&header) {
        Ok(MassSpectrometryFormat::ThermoRaw)
    } else {
        Err(FormatGuessError::InvalidFormat(
            "Not a Thermo RAW file".to_string(),
        ))
    }
}

/// Recognize a file by its extension, ignoring case and a trailing `.gz`
pub fn guess_type_from_path(path: &Path) -> Result<MassSpectrometryFormat, FormatGuessError> {
    let (_, path) = is_gzipped_extension(path);
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mzml") => Ok(MassSpectrometryFormat::MzML),
        Some("mzxml") => Ok(MassSpectrometryFormat::MzXML),
        Some(ext) => Err(FormatGuessError::InvalidFormat(format!(
            "Unrecognized file extension {ext}"
        ))),
        None => Err(FormatGuessError::InvalidFormat(
            "No file extension".to_string(),
        )),
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Recognize a file by looking for a format's signature in its first `length` bytes.
/// The bytes are decompressed first if the file is gzipped.
pub fn guess_type_from_prefix(
    path: &Path,
    length: usize,
) -> Result<MassSpectrometryFormat, FormatGuessError> {
    let buffer = read_prefix(path, length)?;
    if contains(&buffer, b"mzML") {
        Ok(MassSpectrometryFormat::MzML)
    } else if contains(&buffer, b"mzXML") {
        Ok(MassSpectrometryFormat::MzXML)
    } else {
        Err(FormatGuessError::InvalidFormat(format!(
            "No known signature in the first {length} bytes"
        )))
    }
}

/// Recognize a file by looking for a format's signature in its first 1000 bytes
pub fn guess_type_from_file_sniffing(
    path: &Path,
) -> Result<MassSpectrometryFormat, FormatGuessError> {
    guess_type_from_prefix(path, DEFAULT_SNIFF_LENGTH)
}

/// A single format guessing strategy
pub type FormatGuesser = Box<dyn Fn(&Path) -> Result<MassSpectrometryFormat, FormatGuessError>>;

/**
An ordered list of format guessing strategies.

[`FormatGuesserChain::guess_type`] tries each strategy in turn. A strategy that fails
with a recoverable error (see [`FormatGuessError::is_recoverable`]) hands over to
the next one. Any other error stops the chain and is returned as-is.

If every strategy fails and at least one of them recognized a format with no reader
available, that [`FormatGuessError::BackendUnavailable`] is returned instead of
[`FormatGuessError::Undetermined`].
*/
pub struct FormatGuesserChain {
    guessers: Vec<(String, FormatGuesser)>,
}

impl Default for FormatGuesserChain {
    /// The extension guesser followed by the content sniffer
    fn default() -> Self {
        Self::empty()
            .register("path", guess_type_from_path)
            .register("sniff", guess_type_from_file_sniffing)
    }
}

impl FormatGuesserChain {
    pub fn empty() -> Self {
        Self {
            guessers: Vec::new(),
        }
    }

    /// Add a strategy to the end of the chain
    pub fn register<S, F>(mut self, name: S, guesser: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Path) -> Result<MassSpectrometryFormat, FormatGuessError> + 'static,
    {
        self.guessers.push((name.into(), Box::new(guesser)));
        self
    }

    pub(crate) fn register_boxed(mut self, name: String, guesser: FormatGuesser) -> Self {
        self.guessers.push((name, guesser));
        self
    }

    /// Append every strategy of `other` to the end of the chain
    pub fn extend(mut self, other: FormatGuesserChain) -> Self {
        self.guessers.extend(other.guessers);
        self
    }

    /// Replace the content sniffer with one that reads `length` bytes
    pub fn with_sniff_length(mut self, length: usize) -> Self {
        for (name, guesser) in self.guessers.iter_mut() {
            if name.as_str() == "sniff" {
                *guesser = Box::new(move |path: &Path| guess_type_from_prefix(path, length));
            }
        }
        self
    }

    /**
    Only accept guesses of formats in `formats`.

    Every strategy registered so far is wrapped so that a guess outside of `formats`
    becomes a [`FormatGuessError::BackendUnavailable`], which lets the next strategy run.
    Strategies registered afterwards are not restricted.
    */
    pub fn restrict_to<I: IntoIterator<Item = MassSpectrometryFormat>>(
        mut self,
        formats: I,
    ) -> Self {
        let formats: Rc<HashSet<_>> = Rc::new(formats.into_iter().collect());
        self.guessers = self
            .guessers
            .into_iter()
            .map(|(name, guesser)| {
                let formats = Rc::clone(&formats);
                let restricted: FormatGuesser = Box::new(move |path: &Path| {
                    let format = guesser(path)?;
                    if formats.contains(&format) {
                        Ok(format)
                    } else {
                        Err(FormatGuessError::BackendUnavailable(format))
                    }
                });
                (name, restricted)
            })
            .collect();
        self
    }

    pub fn len(&self) -> usize {
        self.guessers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guessers.is_empty()
    }

    /// The names of the registered strategies, in the order they are tried
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.guessers.iter().map(|(name, _)| name.as_str())
    }

    pub fn guess_type(&self, path: &Path) -> Result<MassSpectrometryFormat, FormatGuessError> {
        let mut unavailable = None;
        for (name, guesser) in self.guessers.iter() {
            match guesser(path) {
                Ok(format) => {
                    debug!("Guessed {format} for {} using {name}", path.display());
                    return Ok(format);
                }
                Err(FormatGuessError::BackendUnavailable(format)) => {
                    debug!(
                        "{name} recognized {} as {format}, but no reader is available",
                        path.display()
                    );
                    unavailable.get_or_insert(format);
                }
                Err(e) if e.is_recoverable() => {
                    debug!("{name} could not guess the format of {}: {e}", path.display());
                }
                Err(e) => return Err(e),
            }
        }
        match unavailable {
            Some(format) => Err(FormatGuessError::BackendUnavailable(format)),
            None => Err(FormatGuessError::Undetermined(path.to_path_buf())),
        }
    }
}

impl std::fmt::Debug for FormatGuesserChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Guess the format of the file at `path` with the default extension and content guessers
pub fn guess_type<P: AsRef<Path>>(path: P) -> Result<MassSpectrometryFormat, FormatGuessError> {
    FormatGuesserChain::default().guess_type(path.as_ref())
}

#[cfg(test)]
mod test {
    use flate2::{write::GzEncoder, Compression};

    use super::*;

    fn thermo_header() -> Vec<u8> {
        let mut buf = vec![0x01, 0xA1];
        for unit in "Finnigan".encode_utf16() {
            buf.extend(unit.to_le_bytes());
        }
        buf.extend([0u8; 32]);
        buf
    }

    #[test]
    fn test_guess_from_path() {
        assert_eq!(
            guess_type_from_path(Path::new("a/b/run.MZML")).unwrap(),
            MassSpectrometryFormat::MzML
        );
        assert_eq!(
            guess_type_from_path(Path::new("run.mzXML.gz")).unwrap(),
            MassSpectrometryFormat::MzXML
        );
        assert!(matches!(
            guess_type_from_path(Path::new("run.dat")),
            Err(FormatGuessError::InvalidFormat(_))
        ));
        assert!(guess_type_from_path(Path::new("run")).is_err());
    }

    #[test]
    fn test_thermo_prefix() {
        assert!(is_thermo_raw_prefix(&thermo_header()));
        assert!(!is_thermo_raw_prefix(b"<?xml version=\"1.0\"?><mzML>"));
        assert!(!is_thermo_raw_prefix(&[0x01, 0xA1]));
    }

    #[test_log::test]
    fn test_sniffing() -> io::Result<()> {
        let dir = tempfile::tempdir()?;

        let path = dir.path().join("run.mzml");
        fs::write(&path, b"no signature here")?;
        assert_eq!(guess_type(&path).unwrap(), MassSpectrometryFormat::MzML);

        let path = dir.path().join("run.dat");
        fs::write(&path, b"<?xml version=\"1.0\"?>\n<mzXML xmlns=\"http://sashimi.sourceforge.net\">")?;
        assert_eq!(guess_type(&path).unwrap(), MassSpectrometryFormat::MzXML);

        let path = dir.path().join("both.dat");
        fs::write(&path, b"<indexedmzML><mzML><!-- mzXML -->")?;
        assert_eq!(guess_type(&path).unwrap(), MassSpectrometryFormat::MzML);

        let path = dir.path().join("late.dat");
        let mut content = vec![b' '; 1200];
        content.extend(b"<mzML>");
        fs::write(&path, &content)?;
        assert!(matches!(
            guess_type(&path),
            Err(FormatGuessError::Undetermined(_))
        ));
        let chain = FormatGuesserChain::default().with_sniff_length(2000);
        assert_eq!(chain.guess_type(&path).unwrap(), MassSpectrometryFormat::MzML);

        let path = dir.path().join("packed.dat");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<mzXML>")?;
        fs::write(&path, encoder.finish()?)?;
        assert_eq!(guess_type(&path).unwrap(), MassSpectrometryFormat::MzXML);

        let path = dir.path().join("missing.dat");
        assert!(matches!(
            guess_type(&path),
            Err(FormatGuessError::Undetermined(_))
        ));
        Ok(())
    }

    #[test]
    fn test_thermo_header_guess() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("run.raw");
        fs::write(&path, thermo_header())?;
        assert_eq!(
            guess_type_from_thermo_header(&path).unwrap(),
            MassSpectrometryFormat::ThermoRaw
        );
        assert!(guess_type(&path).is_err());
        Ok(())
    }

    #[test_log::test]
    fn test_chain_error_handling() {
        let chain = FormatGuesserChain::empty()
            .register("unavailable", |_: &Path| {
                Err(FormatGuessError::BackendUnavailable(
                    MassSpectrometryFormat::ThermoRaw,
                ))
            })
            .register("fixed", |_: &Path| Ok(MassSpectrometryFormat::MzXML));
        assert_eq!(
            chain.guess_type(Path::new("anything")).unwrap(),
            MassSpectrometryFormat::MzXML
        );

        let chain = FormatGuesserChain::empty()
            .register("broken", |_: &Path| {
                Err(FormatGuessError::Other("corrupted guesser state".into()))
            })
            .register("fixed", |_: &Path| Ok(MassSpectrometryFormat::MzXML));
        assert!(matches!(
            chain.guess_type(Path::new("anything")),
            Err(FormatGuessError::Other(_))
        ));
        assert_eq!(chain.names().collect::<Vec<_>>(), ["broken", "fixed"]);

        let chain = FormatGuesserChain::empty();
        assert!(matches!(
            chain.guess_type(Path::new("anything")),
            Err(FormatGuessError::Undetermined(_))
        ));
    }

    #[test_log::test]
    fn test_restricted_chain() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let chain = FormatGuesserChain::default().restrict_to([MassSpectrometryFormat::MzML]);

        let path = dir.path().join("run.mzXML");
        fs::write(&path, b"<?xml version=\"1.0\"?><mzML>")?;
        assert_eq!(chain.guess_type(&path).unwrap(), MassSpectrometryFormat::MzML);

        let path = dir.path().join("other.mzXML");
        fs::write(&path, b"<mzXML>")?;
        assert!(matches!(
            chain.guess_type(&path),
            Err(FormatGuessError::BackendUnavailable(
                MassSpectrometryFormat::MzXML
            ))
        ));

        let path = dir.path().join("run.dat");
        fs::write(&path, b"nothing")?;
        assert!(matches!(
            chain.guess_type(&path),
            Err(FormatGuessError::Undetermined(_))
        ));
        Ok(())
    }
}
