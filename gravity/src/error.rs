#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the gravity crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.

use std::path::{Path, PathBuf};

/// Unified error type returned by the pipeline phases and the CLI.
///
/// Recoverable problems (a missing helper library, an unparseable import
/// line) never surface here; they are logged and the item is skipped. The
/// variants below abort the current phase.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors raised while touching the cache directory.
    #[error("i/o failure at {path:?}: {source}")]
    Io {
        /// Path that was being read, written or created.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors for settings files.
    #[error("failed to parse settings: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Wraps JSON errors while reading or writing metadata files.
    #[error("failed to (de)serialize metadata: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Returned when settings or metadata violate invariants.
    #[error("invalid input: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// External services (release index, downloads, git) failed.
    #[error("service error: {message}")]
    Service {
        /// Human readable message describing the service error.
        message: String
    },
    /// The shell could not be spawned at all.
    #[error("failed to spawn `{command}`: {source}")]
    Command {
        /// Command line handed to the shell.
        command: String,
        /// Underlying spawn error.
        source:  std::io::Error
    },
    /// The package builder exited non-zero; the run stops with its code.
    #[error("`{command}` exited with status {code}")]
    PackagingFailed {
        /// Command line that failed.
        command: String,
        /// Exit status reported by the tool.
        code:    i32
    },
    /// A condition that should never happen and needs manual inspection.
    #[error("fatal: {message}")]
    Fatal {
        /// Description including the offending file and collection key.
        message: String
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a service error from the provided displayable value.
    pub fn service<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Service {
            message: message.into()
        }
    }

    /// Constructs a fatal error from the provided displayable value.
    pub fn fatal<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Fatal {
            message: message.into()
        }
    }

    /// Process exit status the CLI should use for this error.
    ///
    /// Packaging failures propagate the external tool's own status so that
    /// callers scripting around the binary see the same code; everything
    /// else maps to `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PackagingFailed {
                code, ..
            } if *code != 0 => *code,
            _ => 1
        }
    }

    /// Formats the error for diagnostics without the variant name.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

impl From<masterror::AppError> for Error {
    fn from(error: masterror::AppError) -> Self {
        Self::Service {
            message: error.to_string()
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

/// Converts a failed directory walk step into [`Error::Io`], falling back to
/// `root` when the failing entry has no path of its own.
pub fn walk_error(root: &Path, error: walkdir::Error) -> Error {
    let path = error.path().unwrap_or(root).to_path_buf();
    let source = error
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    io_error(&path, source)
}
