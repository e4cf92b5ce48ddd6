use std::env;
use std::process::ExitCode;

use mzscan::io::{guess_type, FormatGuessError};

fn main() -> ExitCode {
    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("Usage: mzscan <path>...");
        return ExitCode::FAILURE;
    }
    let mut status = ExitCode::SUCCESS;
    for path in paths {
        match guess_type(&path) {
            Ok(format) => println!("{path}\t{format}"),
            Err(FormatGuessError::Undetermined(_)) => {
                println!("{path}\tunknown");
                status = ExitCode::FAILURE;
            }
            Err(e) => {
                eprintln!("{path}\t{e}");
                status = ExitCode::FAILURE;
            }
        }
    }
    status
}
