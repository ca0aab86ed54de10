// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

/// A dEQP test case result code.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ResultCode {
    /// The test passed.
    Pass,

    /// The test failed.
    Fail,

    /// The feature under test isn't supported. Not a failure.
    NotSupported,

    /// The test passed, with a quality warning.
    QualityWarning,

    /// The test passed, with a compatibility warning.
    CompatibilityWarning,

    /// The test couldn't allocate a resource it needed.
    ResourceError,

    /// The test framework hit an internal error.
    InternalError,

    /// The test crashed.
    Crash,

    /// The test timed out.
    Timeout,

    /// The test was terminated by the test binary.
    Terminated,

    /// A code the runner doesn't recognize. Treated as a failure.
    Unknown(String),
}

impl ResultCode {
    /// Parses a result code as reported by the test binary.
    pub fn parse(code: &str) -> Self {
        match code {
            "Pass" => Self::Pass,
            "Fail" => Self::Fail,
            "NotSupported" => Self::NotSupported,
            "QualityWarning" => Self::QualityWarning,
            "CompatibilityWarning" => Self::CompatibilityWarning,
            "ResourceError" => Self::ResourceError,
            "InternalError" => Self::InternalError,
            "Crash" => Self::Crash,
            "Timeout" => Self::Timeout,
            "Terminated" => Self::Terminated,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// Returns true if this code makes the test fail.
    pub fn is_failure(&self) -> bool {
        match self {
            Self::Pass | Self::NotSupported | Self::QualityWarning | Self::CompatibilityWarning => {
                false
            }
            Self::Fail
            | Self::ResourceError
            | Self::InternalError
            | Self::Crash
            | Self::Timeout
            | Self::Terminated
            | Self::Unknown(_) => true,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
            Self::NotSupported => "NotSupported",
            Self::QualityWarning => "QualityWarning",
            Self::CompatibilityWarning => "CompatibilityWarning",
            Self::ResourceError => "ResourceError",
            Self::InternalError => "InternalError",
            Self::Crash => "Crash",
            Self::Timeout => "Timeout",
            Self::Terminated => "Terminated",
            Self::Unknown(code) => return write!(f, "Unknown result code: {code}"),
        };
        f.write_str(s)
    }
}

/// The outcome of running one test under one configuration.
///
/// Displays as `<code>: <details>`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestOutcome {
    code: ResultCode,
    details: String,
}

impl TestOutcome {
    /// Details used when a test began but its log ended before a result.
    pub const INCOMPLETE_LOG: &'static str = "Incomplete test log";

    /// Details used when the device was lost while a test was running.
    pub const DEVICE_LOST: &'static str = "Device lost";

    /// Creates a new outcome.
    pub fn new(code: ResultCode, details: impl Into<String>) -> Self {
        Self {
            code,
            details: details.into(),
        }
    }

    /// A test that began but never reported a result.
    pub fn incomplete() -> Self {
        Self::new(ResultCode::Crash, Self::INCOMPLETE_LOG)
    }

    /// A test that was running when the device was lost.
    pub fn device_lost() -> Self {
        Self::new(ResultCode::Crash, Self::DEVICE_LOST)
    }

    /// A test the test binary terminated.
    pub fn terminated(reason: impl Into<String>) -> Self {
        Self::new(ResultCode::Terminated, reason)
    }

    /// Returns the result code.
    pub fn code(&self) -> &ResultCode {
        &self.code
    }

    /// Returns the details.
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Returns true if this outcome makes the test fail.
    pub fn is_failure(&self) -> bool {
        self.code.is_failure()
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.details)
    }
}
