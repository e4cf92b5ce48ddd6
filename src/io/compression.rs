use std::fs;
use std::io::{self, prelude::*};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

pub fn is_gzipped(header: &[u8]) -> bool {
    header.starts_with(b"\x1f\x8b")
}

/// Check whether `path` ends in `.gz`, returning the path with that extension removed if so
pub fn is_gzipped_extension(path: &Path) -> (bool, PathBuf) {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("gz") => (true, path.with_extension("")),
        _ => (false, path.to_path_buf()),
    }
}

/// Read up to `length` bytes from the start of the file at `path`. If the file is
/// gzip-compressed, the bytes are read from the decompressed stream instead.
pub fn read_prefix(path: &Path, length: usize) -> io::Result<Vec<u8>> {
    let mut handle = fs::File::open(path)?;
    let mut buffer = Vec::with_capacity(length);
    (&mut handle).take(length as u64).read_to_end(&mut buffer)?;
    if !is_gzipped(&buffer) {
        return Ok(buffer);
    }
    handle.seek(io::SeekFrom::Start(0))?;
    let mut decoded = Vec::with_capacity(length);
    // A truncated stream still yields whatever could be decoded
    match GzDecoder::new(handle)
        .take(length as u64)
        .read_to_end(&mut decoded)
    {
        Ok(_) => Ok(decoded),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && !decoded.is_empty() => Ok(decoded),
        Err(e) => Err(e),
    }
}
