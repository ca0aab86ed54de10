// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the dEQP runner.

use crate::list::Rotation;
use camino::Utf8PathBuf;
use config::ConfigError;
use std::borrow::Cow;
use thiserror::Error;

/// An error that occurred while parsing the runner config.
#[derive(Debug, Error)]
#[error("failed to parse deqp config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing the runner config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// A value was syntactically valid but not acceptable.
    #[error("invalid value for `{key}`: {message}")]
    InvalidValue {
        /// The config key.
        key: &'static str,

        /// A description of the problem.
        message: Cow<'static, str>,
    },
}

/// An error returned by a [`Device`](crate::device::Device) operation.
///
/// Any device error is fatal to the run that observes it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// The device is no longer reachable.
    #[error("device not available: {reason}")]
    NotAvailable {
        /// Why the device is considered unavailable.
        reason: String,
    },

    /// A transport-level command could not be carried out.
    #[error("device command `{command}` failed: {message}")]
    CommandFailed {
        /// The command that was attempted.
        command: String,

        /// The failure message.
        message: String,
    },
}

impl DeviceError {
    /// Creates a new `NotAvailable` error.
    pub fn not_available(reason: impl Into<String>) -> Self {
        Self::NotAvailable {
            reason: reason.into(),
        }
    }
}

/// Error returned while parsing a [`Rotation`] value from a string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error(
    "unrecognized value for rotation: {input}\n(known values: {})",
    Rotation::variants().join(", "),
)]
pub struct RotationParseError {
    input: String,
}

impl RotationParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Error returned while building a
/// [`BatchRunConfiguration`](crate::list::BatchRunConfiguration) from instance arguments.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RunConfigParseError {
    /// The rotation argument was invalid.
    #[error("invalid rotation in instance arguments")]
    Rotation(#[from] RotationParseError),

    /// An argument key was not recognized.
    #[error("unknown instance argument `{key}` (known arguments: glconfig, rotation, surfacetype)")]
    UnknownArgument {
        /// The unknown key.
        key: String,
    },

    /// An argument was not in `key=value` form.
    #[error("instance argument `{input}` is not in the form key=value")]
    InvalidFormat {
        /// The input provided.
        input: String,
    },
}

/// Error returned while converting a dotted dEQP case path into a
/// [`TestIdentifier`](crate::list::TestIdentifier).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("test case path `{input}` must contain a group and a case name separated by `.`")]
pub struct TestIdentifierParseError {
    input: String,
}

impl TestIdentifierParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Error returned while parsing a suite name into a [`SuiteKind`](crate::probe::SuiteKind).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error(
    "unrecognized dEQP suite name: {input}\n(known values: dEQP-GLES2, dEQP-GLES3, dEQP-GLES31, dEQP-EGL)"
)]
pub struct SuiteKindParseError {
    input: String,
}

impl SuiteKindParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An error that occurs while decoding a case list trie.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid case list at offset {offset}: {message}")]
pub struct CaseListParseError {
    offset: usize,
    message: Cow<'static, str>,
}

impl CaseListParseError {
    pub(crate) fn new(offset: usize, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }

    /// Returns the byte offset at which the error was detected.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// An error that occurs while a listener handles a test event.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteEventError {
    /// An error occurred while writing to an output stream.
    #[error("error writing to output")]
    Io(#[source] std::io::Error),

    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while producing JUnit XML.
    #[error("error writing JUnit output to {file}")]
    Junit {
        /// The output file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_junit::SerializeError,
    },
}

/// An error that aborted a [`DeqpTestRunner`](crate::runner::DeqpTestRunner) run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The device was lost or a device command failed.
    #[error("device error during dEQP run")]
    Device(#[from] DeviceError),

    /// A listener failed to handle an event.
    #[error("error reporting test results")]
    Listener(#[from] WriteEventError),
}
