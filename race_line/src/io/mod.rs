//! File input and output helpers for track data.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

pub mod track;

/// Reads a file to string.
pub fn read_to_string<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut buffer = String::new();
    File::open(path)?.read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Writes `contents` to a file, replacing it if it exists.
pub fn write_string<P: AsRef<Path>>(path: P, contents: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())
}

/// Returns `true` when the path has a `.json` extension.
pub fn is_json_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
}
