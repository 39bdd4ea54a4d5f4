//! Stream destination read from a one-line text file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Example ingest endpoint shown when the destination file is missing.
pub const EXAMPLE_DESTINATION: &str = "rtmp://live.example.com/app/live_0123456789_abcdefghijklmnop";

/// Where the encoded stream is sent (an ingest URL or an output path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination(String);

impl Destination {
    /// Wrap an address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Read the destination from the first line of `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DestinationError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| DestinationError::Missing {
            path: path.to_path_buf(),
            source,
        })?;

        let address = contents.lines().next().unwrap_or("").trim();
        if address.is_empty() {
            return Err(DestinationError::Empty {
                path: path.to_path_buf(),
            });
        }

        Ok(Self(address.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Destination file errors.
#[derive(Debug, thiserror::Error)]
pub enum DestinationError {
    #[error(
        "You need to put the ingest endpoint into '{}' ({}).\n\
         The file should contain a line like this one:\n{}",
        .path.display(),
        .source,
        EXAMPLE_DESTINATION
    )]
    Missing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "'{}' is empty; its first line must hold the ingest endpoint, e.g.\n{}",
        .path.display(),
        EXAMPLE_DESTINATION
    )]
    Empty { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_reads_first_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stream_url.txt");
        fs::write(&path, "  rtmp://host/app/key  \nignored second line\n").unwrap();

        let destination = Destination::from_file(&path).unwrap();
        assert_eq!(destination.as_str(), "rtmp://host/app/key");
    }

    #[test]
    fn test_missing_file_gives_guidance() {
        let dir = tempdir().unwrap();
        let err = Destination::from_file(dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, DestinationError::Missing { .. }));
        assert!(err.to_string().contains(EXAMPLE_DESTINATION));
    }

    #[test]
    fn test_empty_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stream_url.txt");
        fs::write(&path, "\n").unwrap();

        let err = Destination::from_file(&path).unwrap_err();
        assert!(matches!(err, DestinationError::Empty { .. }));
    }
}
