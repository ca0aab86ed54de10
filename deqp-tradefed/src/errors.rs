// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING, StderrStyles};
use camino::Utf8PathBuf;
use deqp_runner::errors::{
    ConfigParseError, ConfigParseErrorKind, DeviceError, RunConfigParseError,
    SuiteKindParseError, TestIdentifierParseError, WriteEventError,
};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;

/// Documented exit codes for `deqp-tradefed` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum DeqpExitCode {}

impl DeqpExitCode {
    /// No errors occurred and every test passed.
    pub const OK: i32 = 0;

    /// The test list was empty.
    pub const NO_TESTS_RUN: i32 = 4;

    /// One or more tests failed.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// The device was lost or a device command failed during the run.
    pub const DEVICE_ERROR: i32 = 106;

    /// Writing test results produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up the run.
    pub const SETUP_ERROR: i32 = 96;
}

/// An error parsing a line of the test list.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TestListParseError {
    /// The test path couldn't be parsed.
    #[error("line {line}: invalid test path")]
    InvalidTestPath {
        /// The 1-based line number.
        line: usize,

        /// The underlying error.
        #[source]
        error: TestIdentifierParseError,
    },

    /// An instance's configuration couldn't be parsed.
    #[error("line {line}: invalid configuration `{input}`")]
    InvalidConfig {
        /// The 1-based line number.
        line: usize,

        /// The configuration as written.
        input: String,

        /// The underlying error.
        #[source]
        error: RunConfigParseError,
    },
}

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected failure of a `deqp-tradefed` invocation.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("current directory is invalid")]
    CurrentDirInvalid {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 { path: std::path::PathBuf },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("unknown suite")]
    UnknownSuite {
        #[from]
        err: SuiteKindParseError,
    },
    #[error("test list read error")]
    TestListReadError {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("test list parse error")]
    TestListParseError {
        path: Utf8PathBuf,
        #[source]
        err: TestListParseError,
    },
    #[error("device error")]
    DeviceError {
        #[from]
        err: DeviceError,
    },
    #[error("error writing test results")]
    WriteEventError {
        #[from]
        err: WriteEventError,
    },
}

impl ExpectedError {
    pub(crate) fn test_list_read_error(path: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self::TestListReadError {
            path: path.into(),
            err,
        }
    }

    pub(crate) fn test_list_parse_error(
        path: impl Into<Utf8PathBuf>,
        err: TestListParseError,
    ) -> Self {
        Self::TestListParseError {
            path: path.into(),
            err,
        }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirInvalid { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigParseError { .. }
            | Self::UnknownSuite { .. }
            | Self::TestListReadError { .. }
            | Self::TestListParseError { .. } => DeqpExitCode::SETUP_ERROR,
            Self::DeviceError { .. } => DeqpExitCode::DEVICE_ERROR,
            Self::WriteEventError { .. } => DeqpExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::CurrentDirInvalid { err } => {
                error!("could not determine the current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { path } => {
                error!(
                    "current directory `{}` is not valid UTF-8",
                    path.display().style(styles.bold)
                );
                None
            }
            Self::ConfigParseError { err } => {
                match err.kind() {
                    ConfigParseErrorKind::BuildError(build_error) => {
                        error!(
                            "failed to parse config at `{}`",
                            err.config_file().style(styles.bold)
                        );
                        Some(build_error.as_ref() as &dyn Error)
                    }
                    ConfigParseErrorKind::DeserializeError(de_error) => {
                        error!(
                            "failed to parse config at `{}`: error at `{}`",
                            err.config_file().style(styles.bold),
                            de_error.path().to_string().style(styles.bold),
                        );
                        Some(de_error.inner() as &dyn Error)
                    }
                    ConfigParseErrorKind::InvalidValue { key, message } => {
                        error!(
                            "invalid value for `{}` in config at `{}`: {message}",
                            key.style(styles.bold),
                            err.config_file().style(styles.bold),
                        );
                        None
                    }
                }
            }
            Self::UnknownSuite { err } => {
                error!("{err}");
                None
            }
            Self::TestListReadError { path, err } => {
                error!(
                    "failed to read test list at `{}`",
                    path.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::TestListParseError { path, err } => {
                error!(
                    "failed to parse test list at `{}`",
                    path.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::DeviceError { err } => {
                error!("run aborted: {err}");
                None
            }
            Self::WriteEventError { err } => {
                error!("failed to write test results");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
