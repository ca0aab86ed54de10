// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints test results to stderr as they are reported.

use crate::output::StderrStyles;
use deqp_runner::{
    errors::WriteEventError,
    list::TestIdentifier,
    reporter::{TestMetrics, TestRunListener},
};
use itertools::Itertools;
use owo_colors::OwoColorize;
use std::{io::Write, time::Duration};

#[derive(Debug, Default)]
struct CurrentTest {
    failure: Option<String>,
}

/// A [`TestRunListener`] that writes a line per test and a final summary.
pub(crate) struct DisplayReporter<W> {
    writer: W,
    styles: StderrStyles,
    verbose: bool,
    test_count: usize,
    finished: usize,
    failed: usize,
    current: Option<CurrentTest>,
}

impl<W: Write> DisplayReporter<W> {
    pub(crate) fn new(writer: W, styles: StderrStyles, verbose: bool) -> Self {
        Self {
            writer,
            styles,
            verbose,
            test_count: 0,
            finished: 0,
            failed: 0,
            current: None,
        }
    }

    fn counter(&self) -> String {
        let width = self.test_count.to_string().len();
        format!("[{:>width$}/{}]", self.finished, self.test_count)
    }
}

impl<W: Write> TestRunListener for DisplayReporter<W> {
    fn run_started(&mut self, suite_id: &str, test_count: usize) -> Result<(), WriteEventError> {
        self.test_count = test_count;
        writeln!(
            self.writer,
            "{:>12} {} {} for {}",
            "Starting".style(self.styles.pass),
            test_count.style(self.styles.count),
            if test_count == 1 { "test" } else { "tests" },
            suite_id.style(self.styles.bold),
        )
        .map_err(WriteEventError::Io)
    }

    fn test_started(&mut self, _test: &TestIdentifier) -> Result<(), WriteEventError> {
        self.current = Some(CurrentTest::default());
        Ok(())
    }

    fn test_log(
        &mut self,
        _test: &TestIdentifier,
        name: &str,
        data: &str,
    ) -> Result<(), WriteEventError> {
        if self.verbose {
            writeln!(
                self.writer,
                "{:>12} {name} ({} bytes)",
                "LOG".style(self.styles.skip),
                data.len(),
            )
            .map_err(WriteEventError::Io)?;
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
        let current = self.current.take().unwrap_or_default();
        self.finished += 1;

        let (status, style) = match &current.failure {
            Some(_) => {
                self.failed += 1;
                ("FAIL", self.styles.fail)
            }
            None => ("PASS", self.styles.pass),
        };
        writeln!(
            self.writer,
            "{:>12} {} {}.{}",
            status.style(style),
            self.counter(),
            test.class_name(),
            test.test_name().style(self.styles.bold),
        )
        .map_err(WriteEventError::Io)?;

        if let Some(message) = &current.failure {
            let indented = message.lines().map(|line| format!("    {line}")).join("\n");
            writeln!(self.writer, "{indented}").map_err(WriteEventError::Io)?;
        }
        Ok(())
    }

    fn run_ended(
        &mut self,
        elapsed: Duration,
        _metrics: &TestMetrics,
    ) -> Result<(), WriteEventError> {
        let passed = self.finished - self.failed;
        writeln!(self.writer, "------------").map_err(WriteEventError::Io)?;
        write!(
            self.writer,
            "{:>12} [{:>8.3}s] {} {} run: {} passed",
            "Summary".style(self.styles.pass),
            elapsed.as_secs_f64(),
            self.finished.style(self.styles.count),
            if self.finished == 1 { "test" } else { "tests" },
            passed.style(self.styles.pass),
        )
        .map_err(WriteEventError::Io)?;
        if self.failed > 0 {
            write!(
                self.writer,
                ", {} failed",
                self.failed.style(self.styles.fail)
            )
            .map_err(WriteEventError::Io)?;
        }
        writeln!(self.writer).map_err(WriteEventError::Io)?;
        self.writer.flush().map_err(WriteEventError::Io)
    }
}
