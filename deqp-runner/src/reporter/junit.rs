// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code to generate JUnit XML reports from test results.

use super::{TestMetrics, TestRunListener};
use crate::{config::JunitConfig, errors::WriteEventError, list::TestIdentifier};
use camino::Utf8PathBuf;
use chrono::{DateTime, FixedOffset, Local};
use debug_ignore::DebugIgnore;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::{
    fs::File,
    time::{Duration, Instant},
};

#[derive(Debug)]
struct CurrentTest {
    started: Instant,
    timestamp: DateTime<FixedOffset>,
    failure: Option<String>,
    logs: Vec<String>,
}

/// A [`TestRunListener`] that writes a JUnit XML report once the run ends.
///
/// The report has a single test suite named after the run. Each test becomes a test case whose
/// class name is the test's group path.
#[derive(Debug)]
pub struct JunitListener {
    path: Utf8PathBuf,
    report_name: String,
    start_time: DateTime<FixedOffset>,
    suite: DebugIgnore<Option<TestSuite>>,
    current: Option<CurrentTest>,
}

impl JunitListener {
    /// Creates a new listener writing to the location in `config`.
    pub fn new(config: JunitConfig<'_>) -> Self {
        Self {
            path: config.path().to_owned(),
            report_name: config.report_name().to_owned(),
            start_time: Local::now().fixed_offset(),
            suite: DebugIgnore(None),
            current: None,
        }
    }

    /// Writes the report with every test ended so far.
    ///
    /// [`TestRunListener::run_ended`] calls this. Call it directly when a run is cut short, for
    /// example by a lost device, so that the results already reported are kept.
    pub fn finish(&mut self, elapsed: Duration) -> Result<(), WriteEventError> {
        let mut report = Report::new(self.report_name.as_str());
        report.set_timestamp(self.start_time).set_time(elapsed);
        if let Some(suite) = self.suite.take() {
            report.add_test_suite(suite);
        }

        if let Some(junit_dir) = self.path.parent() {
            std::fs::create_dir_all(junit_dir).map_err(|error| WriteEventError::Fs {
                file: junit_dir.to_path_buf(),
                error,
            })?;
        }

        let f = File::create(&self.path).map_err(|error| WriteEventError::Fs {
            file: self.path.clone(),
            error,
        })?;
        report
            .serialize(f)
            .map_err(|error| WriteEventError::Junit {
                file: self.path.clone(),
                error,
            })
    }
}

impl TestRunListener for JunitListener {
    fn run_started(&mut self, suite_id: &str, _test_count: usize) -> Result<(), WriteEventError> {
        self.start_time = Local::now().fixed_offset();
        *self.suite = Some(TestSuite::new(suite_id));
        Ok(())
    }

    fn test_started(&mut self, _test: &TestIdentifier) -> Result<(), WriteEventError> {
        self.current = Some(CurrentTest {
            started: Instant::now(),
            timestamp: Local::now().fixed_offset(),
            failure: None,
            logs: Vec::new(),
        });
        Ok(())
    }

    fn test_log(
        &mut self,
        _test: &TestIdentifier,
        name: &str,
        data: &str,
    ) -> Result<(), WriteEventError> {
        if let Some(current) = &mut self.current {
            current.logs.push(format!("=== {name} ===\n{data}"));
        }
        Ok(())
    }

    fn test_failed(
        &mut self,
        _test: &TestIdentifier,
        message: &str,
    ) -> Result<(), WriteEventError> {
        if let Some(current) = &mut self.current {
            current.failure = Some(message.to_owned());
        }
        Ok(())
    }

    fn test_ended(
        &mut self,
        test: &TestIdentifier,
        _metrics: &TestMetrics,
    ) -> Result<(), WriteEventError> {
        let Some(current) = self.current.take() else {
            return Ok(());
        };

        let status = match current.failure {
            None => TestCaseStatus::success(),
            Some(message) => {
                let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                // Line 0 is the first config header, so line 1 is its outcome.
                let summary = message.lines().nth(1).unwrap_or(&message).to_owned();
                status.set_message(summary).set_description(message);
                status
            }
        };

        let mut testcase = TestCase::new(test.test_name(), status);
        testcase
            .set_classname(test.class_name())
            .set_timestamp(current.timestamp)
            .set_time(current.started.elapsed());
        if !current.logs.is_empty() {
            testcase.set_system_out(current.logs.join("\n"));
        }

        self.suite
            .get_or_insert_with(|| TestSuite::new(test.class_name()))
            .add_test_case(testcase);
        Ok(())
    }

    fn run_ended(
        &mut self,
        elapsed: Duration,
        _metrics: &TestMetrics,
    ) -> Result<(), WriteEventError> {
        self.finish(elapsed)
    }
}
