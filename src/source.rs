//! Whole-file script loading.

use std::{borrow::Cow, fs::File, io::Read, path::Path};

use crate::diagnostics::{JscError, Result};

const INITIAL_CAPACITY: usize = 1024;

/// Script bytes as read from disk, always followed by a single NUL byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    bytes: Vec<u8>,
}

impl SourceBuffer {
    fn from_file_bytes(mut bytes: Vec<u8>) -> Self {
        // `#!` lines are not JavaScript; turn the directive into a line comment.
        if bytes.starts_with(b"#!") {
            bytes[0] = b'/';
            bytes[1] = b'/';
        }
        bytes.push(0);
        Self { bytes }
    }

    /// The file contents without the terminator.
    pub fn contents(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - 1]
    }

    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes
    }

    pub fn text(&self) -> Cow<'_, str> {
        decode(self.contents())
    }
}

/// Reads `path` fully into memory.
pub fn load(path: impl AsRef<Path>) -> Result<SourceBuffer> {
    let path = path.as_ref();
    let file_error = |source| JscError::File {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(file_error)?;
    let mut bytes = Vec::with_capacity(INITIAL_CAPACITY);
    file.read_to_end(&mut bytes).map_err(file_error)?;
    Ok(SourceBuffer::from_file_bytes(bytes))
}

/// UTF-8 when valid, otherwise every byte is taken as a Latin-1 code point.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().copied().map(char::from).collect()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn neutralizes_interpreter_directive() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("script.js");
        fs::write(&path, "#!/usr/bin/env jsc\nprint(1);\n").expect("write script");

        let buffer = load(&path).expect("load script");
        assert_eq!(buffer.contents(), b"///usr/bin/env jsc\nprint(1);\n");
        assert_eq!(buffer.as_bytes_with_nul().last(), Some(&0));
    }

    #[test]
    fn keeps_plain_files_byte_identical() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("script.js");
        let body = "// #! only matters at offset zero\nvar x = 1;\n".repeat(64);
        fs::write(&path, &body).expect("write script");

        let buffer = load(&path).expect("load script");
        let mut expected = body.into_bytes();
        expected.push(0);
        assert_eq!(buffer.as_bytes_with_nul(), expected.as_slice());
    }

    #[test]
    fn empty_file_is_just_the_terminator() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("empty.js");
        fs::write(&path, "").expect("write script");

        let buffer = load(&path).expect("load script");
        assert!(buffer.contents().is_empty());
        assert_eq!(buffer.as_bytes_with_nul(), b"\0");
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("missing.js");

        let err = load(&path).expect_err("missing file should fail");
        assert!(matches!(err, JscError::File { .. }));
        assert!(err.to_string().starts_with("Could not open file: "));
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        assert_eq!(decode(b"caf\xe9"), "café");
        assert_eq!(decode("café".as_bytes()), "café");
    }
}
