//! Locating and loading `include` files.
//!
//! A relative include name is tried against the directory of the including
//! file first, then as given. Names that are absolute or start with `./` or
//! `../` are only tried as given. The parser does the scanner swap; this
//! module only finds the text.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Contents of an include file and the name it is reported under.
///
/// The bytes are not decoded here; the scanner decodes them.
#[derive(Debug, Clone)]
pub struct IncludeSource {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Paths to try, in order, for `include "name"` inside `including`.
///
/// `including` is the name of the including source; `-` (stdin) has no
/// directory of its own.
pub fn candidates(including: &str, name: &str) -> Vec<PathBuf> {
    let literal = PathBuf::from(name);
    if literal.is_absolute() || name.starts_with("./") || name.starts_with("../") {
        return vec![literal];
    }

    let base = match including {
        "-" => None,
        file => Path::new(file)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty()),
    };
    match base {
        Some(dir) => vec![dir.join(name), literal],
        None => vec![literal],
    }
}

/// Read the first candidate for `name` that can be read.
///
/// The error is the one from the last candidate tried.
pub fn load(including: &str, name: &str) -> io::Result<IncludeSource> {
    let mut last = io::Error::new(io::ErrorKind::NotFound, "no candidate paths");
    for path in candidates(including, name) {
        match fs::read(&path) {
            Ok(bytes) => return Ok(IncludeSource { path, bytes }),
            Err(err) => {
                tracing::trace!(path = %path.display(), error = %err, "include candidate failed");
                last = err;
            }
        }
    }
    Err(last)
}
