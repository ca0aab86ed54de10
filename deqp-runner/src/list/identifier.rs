// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::TestIdentifierParseError;
use std::{fmt, str::FromStr};

/// Identifies a single dEQP test case.
///
/// A dEQP case path such as `dEQP-GLES3.info.version` is split at its last `.` into a class name
/// (`dEQP-GLES3.info`) and a test name (`version`), which is how results are keyed when reported.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TestIdentifier {
    class_name: String,
    test_name: String,
}

impl TestIdentifier {
    /// Creates a new identifier from its parts.
    pub fn new(class_name: impl Into<String>, test_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            test_name: test_name.into(),
        }
    }

    /// Parses a dotted dEQP case path.
    pub fn from_path(path: &str) -> Result<Self, TestIdentifierParseError> {
        match path.rsplit_once('.') {
            Some((class_name, test_name)) if !class_name.is_empty() && !test_name.is_empty() => {
                Ok(Self::new(class_name, test_name))
            }
            _ => Err(TestIdentifierParseError::new(path)),
        }
    }

    /// Returns the class name, i.e. every path component except the last.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Returns the test name, i.e. the last path component.
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Returns the dotted dEQP case path for this test.
    pub fn path(&self) -> String {
        format!("{}.{}", self.class_name, self.test_name)
    }
}

impl FromStr for TestIdentifier {
    type Err = TestIdentifierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_path(s)
    }
}

impl fmt::Display for TestIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.class_name, self.test_name)
    }
}
