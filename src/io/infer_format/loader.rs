use std::{
    collections::HashMap,
    fmt::Display,
    io,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use thiserror::Error;

use crate::io::{reader::ScanReader, traits::ScanIterator};

use super::inference::{
    guess_type_from_thermo_header, FormatGuessError, FormatGuesser, FormatGuesserChain,
    MassSpectrometryFormat, DEFAULT_SNIFF_LENGTH,
};

/// Opens the file at a path with caller-supplied options
pub type ReaderConstructor<R, O> = Box<dyn Fn(&Path, O) -> io::Result<R>>;

/// Errors that may occur when opening a file through [`MSFileLoader`]
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Could not determine the format of {}", .0.display())]
    Undetermined(PathBuf),
    /// A format guesser failed in a way that does not allow trying the next one
    #[error(transparent)]
    Guess(FormatGuessError),
    #[error("No reader is registered for {0}")]
    BackendUnavailable(MassSpectrometryFormat),
    #[error("Failed to open file: {0}")]
    IOError(
        #[from]
        #[source]
        io::Error,
    ),
}

impl From<FormatGuessError> for LoaderError {
    fn from(value: FormatGuessError) -> Self {
        match value {
            FormatGuessError::Undetermined(path) => Self::Undetermined(path),
            FormatGuessError::BackendUnavailable(format) => Self::BackendUnavailable(format),
            e => Self::Guess(e),
        }
    }
}

/**
Opens mass spectrometry data files of any registered format through one entry point.

The format of a file is guessed with a [`FormatGuesserChain`], then the reader
constructor registered for that format is called with the path and the options given to
[`MSFileLoader::open`]. The chain only accepts formats that have a constructor, so a
strategy that recognizes an unsupported format hands over to the next one. All constructors produce the same reader type `R`, which is
typically an enum over the concrete readers. The options `O` are handed over untouched.

Built with [`MSFileLoaderBuilder`].
*/
pub struct MSFileLoader<R, O = ()> {
    chain: FormatGuesserChain,
    constructors: HashMap<MassSpectrometryFormat, ReaderConstructor<R, O>>,
}

impl<R, O> MSFileLoader<R, O> {
    pub fn builder() -> MSFileLoaderBuilder<R, O> {
        MSFileLoaderBuilder::default()
    }

    /// The strategies consulted to guess a file's format
    pub fn chain(&self) -> &FormatGuesserChain {
        &self.chain
    }

    /// Whether a reader is registered for `format`
    pub fn supports(&self, format: MassSpectrometryFormat) -> bool {
        self.constructors.contains_key(&format)
    }

    pub fn guess_type<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<MassSpectrometryFormat, FormatGuessError> {
        self.chain.guess_type(path.as_ref())
    }

    /// Guess the format of `path` and open it with the matching reader
    pub fn open<P: AsRef<Path>>(
        &self,
        path: P,
        options: O,
    ) -> Result<ScanReader<R>, LoaderError>
    where
        R: ScanIterator,
    {
        let path = path.as_ref();
        let format = self.chain.guess_type(path)?;
        let constructor = self
            .constructors
            .get(&format)
            .ok_or(LoaderError::BackendUnavailable(format))?;
        debug!("Opening {} as {format}", path.display());
        let reader = constructor(path, options)?;
        Ok(ScanReader::new(reader))
    }
}

impl<R, O> std::fmt::Debug for MSFileLoader<R, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MSFileLoader")
            .field("chain", &self.chain)
            .field("formats", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A builder type for [`MSFileLoader`].
///
/// To create an instance, see [`MSFileLoader::builder`]
pub struct MSFileLoaderBuilder<R, O = ()> {
    constructors: HashMap<MassSpectrometryFormat, ReaderConstructor<R, O>>,
    vendor_guessers: Vec<(String, FormatGuesser)>,
    extra_guessers: Vec<(String, FormatGuesser)>,
    sniff_length: usize,
}

impl<R, O> Default for MSFileLoaderBuilder<R, O> {
    fn default() -> Self {
        Self {
            constructors: HashMap::new(),
            vendor_guessers: Vec::new(),
            extra_guessers: Vec::new(),
            sniff_length: DEFAULT_SNIFF_LENGTH,
        }
    }
}

impl<R, O> MSFileLoaderBuilder<R, O> {
    /// Register the reader constructor for `format`, replacing any previous one
    pub fn with_reader<F>(mut self, format: MassSpectrometryFormat, constructor: F) -> Self
    where
        F: Fn(&Path, O) -> io::Result<R> + 'static,
    {
        self.constructors.insert(format, Box::new(constructor));
        self
    }

    /**
    Register a reader that depends on a vendor library which may not be available.

    `initializer` is run immediately. If it succeeds, the constructor it returns is
    registered for `format` and `guesser` is placed ahead of the built-in guessers.
    If it fails, the failure is logged and neither is registered.
    */
    pub fn with_vendor_reader<G, I, F, E>(
        mut self,
        format: MassSpectrometryFormat,
        guesser: G,
        initializer: I,
    ) -> Self
    where
        G: Fn(&Path) -> Result<MassSpectrometryFormat, FormatGuessError> + 'static,
        I: FnOnce() -> Result<F, E>,
        F: Fn(&Path, O) -> io::Result<R> + 'static,
        E: Display,
    {
        match initializer() {
            Ok(constructor) => {
                self.constructors.insert(format, Box::new(constructor));
                self.vendor_guessers
                    .push((format.to_string(), Box::new(guesser)));
            }
            Err(e) => {
                warn!("The {format} reader is unavailable and will not be used: {e}");
            }
        }
        self
    }

    /// Register a Thermo RAW reader, recognized by its file header
    pub fn with_thermo_reader<I, F, E>(self, initializer: I) -> Self
    where
        I: FnOnce() -> Result<F, E>,
        F: Fn(&Path, O) -> io::Result<R> + 'static,
        E: Display,
    {
        self.with_vendor_reader(
            MassSpectrometryFormat::ThermoRaw,
            guess_type_from_thermo_header,
            initializer,
        )
    }

    /// Add a guessing strategy to be tried after the built-in ones
    pub fn with_guesser<S, G>(mut self, name: S, guesser: G) -> Self
    where
        S: Into<String>,
        G: Fn(&Path) -> Result<MassSpectrometryFormat, FormatGuessError> + 'static,
    {
        self.extra_guessers.push((name.into(), Box::new(guesser)));
        self
    }

    /// Set how many leading bytes the content sniffer inspects
    pub fn sniff_length(mut self, length: usize) -> Self {
        self.sniff_length = length;
        self
    }

    pub fn build(self) -> MSFileLoader<R, O> {
        let mut chain = FormatGuesserChain::empty();
        for (name, guesser) in self.vendor_guessers {
            chain = chain.register_boxed(name, guesser);
        }
        let defaults = FormatGuesserChain::default().with_sniff_length(self.sniff_length);
        chain = chain.extend(defaults);
        for (name, guesser) in self.extra_guessers {
            chain = chain.register_boxed(name, guesser);
        }
        let chain = chain.restrict_to(self.constructors.keys().copied());
        MSFileLoader {
            chain,
            constructors: self.constructors,
        }
    }
}
