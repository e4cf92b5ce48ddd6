/*!
 * Demo the minimum code needed to guess the format of a file from its path
 * and leading bytes using `guess_type`, optionally with a larger sniffing window.
 */
use std::env;
use std::path::PathBuf;
use std::process::exit;

use mzscan::io::{FormatGuessError, FormatGuesserChain};

fn main() -> Result<(), FormatGuessError> {
    env_logger::init();
    let mut args = env::args().skip(1);
    let input = args.next().unwrap_or_else(|| {
        eprintln!("Please provide a file path and optionally a sniffing length");
        exit(1)
    });
    let sniff_length: usize = match args.next() {
        Some(length) => length.parse().unwrap_or_else(|e| {
            eprintln!("Invalid sniffing length {length}: {e}");
            exit(1)
        }),
        None => mzscan::io::DEFAULT_SNIFF_LENGTH,
    };

    let chain = FormatGuesserChain::default().with_sniff_length(sniff_length);
    let inferred = chain.guess_type(&PathBuf::from(input))?;
    println!("{}", inferred);
    Ok(())
}
