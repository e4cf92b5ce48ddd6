mod inference;
mod loader;

pub use inference::{
    guess_type, guess_type_from_file_sniffing, guess_type_from_path, guess_type_from_prefix,
    guess_type_from_thermo_header, is_thermo_raw_prefix, FormatGuessError, FormatGuesser,
    FormatGuesserChain, MassSpectrometryFormat, DEFAULT_SNIFF_LENGTH,
};

pub use loader::{LoaderError, MSFileLoader, MSFileLoaderBuilder, ReaderConstructor};
