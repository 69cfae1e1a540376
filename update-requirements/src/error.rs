use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop processing of a single file (or, for `Config`, the run)
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl UpdateError {
    /// Classify an error from reading an input file
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            UpdateError::FileNotFound(path)
        } else {
            UpdateError::Read { path, source }
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        UpdateError::Write {
            path: path.into(),
            source,
        }
    }
}

/// A version lookup that could not produce an answer. Never fatal: the
/// affected entry is left unchanged.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("request for '{name}' failed: {source}")]
    Request {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("package index returned HTTP {status} for '{name}'")]
    Status {
        name: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid response for '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unrecognized version '{version}' for '{name}'")]
    InvalidVersion { name: String, version: String },
}
