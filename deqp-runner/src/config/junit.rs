// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// JUnit reporting configuration.
///
/// Returned by [`RunnerConfig::junit`](super::RunnerConfig::junit) when a report path is set.
#[derive(Clone, Copy, Debug)]
pub struct JunitConfig<'cfg> {
    path: &'cfg Utf8Path,
    report_name: &'cfg str,
}

impl<'cfg> JunitConfig<'cfg> {
    pub(super) fn new(data: &'cfg JunitImpl) -> Option<Self> {
        data.path.as_deref().map(|path| Self {
            path,
            report_name: &data.report_name,
        })
    }

    /// Returns the path to the JUnit report, relative to the current directory if not absolute.
    pub fn path(&self) -> &'cfg Utf8Path {
        self.path
    }

    /// Returns the name of the JUnit report.
    pub fn report_name(&self) -> &'cfg str {
        self.report_name
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct JunitImpl {
    #[serde(default)]
    path: Option<Utf8PathBuf>,
    report_name: String,
}
