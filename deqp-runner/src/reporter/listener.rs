// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{errors::WriteEventError, list::TestIdentifier};
use std::{collections::BTreeMap, time::Duration};

/// Metrics attached to a test or a run. The runner never reports any.
pub type TestMetrics = BTreeMap<String, String>;

/// Receives test results as a run progresses.
///
/// For every test, the runner calls [`test_started`](Self::test_started), then
/// [`test_log`](Self::test_log) for each collected log, then [`test_failed`](Self::test_failed) if
/// the test failed, then [`test_ended`](Self::test_ended). These calls are never interleaved
/// between tests.
pub trait TestRunListener {
    /// Called once before any test is reported.
    fn run_started(&mut self, suite_id: &str, test_count: usize) -> Result<(), WriteEventError>;

    /// Called when a test's result is about to be reported.
    fn test_started(&mut self, test: &TestIdentifier) -> Result<(), WriteEventError>;

    /// Called with the raw dEQP log a test produced under one configuration.
    fn test_log(
        &mut self,
        test: &TestIdentifier,
        name: &str,
        data: &str,
    ) -> Result<(), WriteEventError> {
        let _ = (test, name, data);
        Ok(())
    }

    /// Called if the test failed under at least one configuration.
    fn test_failed(
        &mut self,
        test: &TestIdentifier,
        message: &str,
    ) -> Result<(), WriteEventError>;

    /// Called once the test has been fully reported.
    fn test_ended(
        &mut self,
        test: &TestIdentifier,
        metrics: &TestMetrics,
    ) -> Result<(), WriteEventError>;

    /// Called once all tests have been reported.
    ///
    /// Not called if the run was aborted by a device error.
    fn run_ended(
        &mut self,
        elapsed: Duration,
        metrics: &TestMetrics,
    ) -> Result<(), WriteEventError>;
}

/// Forwards every callback to two listeners, first `A` then `B`.
#[derive(Debug)]
pub struct TeeListener<A, B> {
    first: A,
    second: B,
}

impl<A, B> TeeListener<A, B> {
    /// Creates a new tee.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: TestRunListener, B: TestRunListener> TestRunListener for TeeListener<A, B> {
    fn run_started(&mut self, suite_id: &str, test_count: usize) -> Result<(), WriteEventError> {
        self.first.run_started(suite_id, test_count)?;
        self.second.run_started(suite_id, test_count)
    }

    fn test_started(&mut self, test: &TestIdentifier) -> Result<(), WriteEventError> {
        self.first.test_started(test)?;
        self.second.test_started(test)
    }

    fn test_log(
        &mut self,
        test: &TestIdentifier,
        name: &str,
        data: &str,
    ) -> Result<(), WriteEventError> {
        self.first.test_log(test, name, data)?;
        self.second.test_log(test, name, data)
    }

    fn test_failed(
        &mut self,
        test: &TestIdentifier,
        message: &str,
    ) -> Result<(), WriteEventError> {
        self.first.test_failed(test, message)?;
        self.second.test_failed(test, message)
    }

    fn test_ended(
        &mut self,
        test: &TestIdentifier,
        metrics: &TestMetrics,
    ) -> Result<(), WriteEventError> {
        self.first.test_ended(test, metrics)?;
        self.second.test_ended(test, metrics)
    }

    fn run_ended(
        &mut self,
        elapsed: Duration,
        metrics: &TestMetrics,
    ) -> Result<(), WriteEventError> {
        self.first.run_ended(elapsed, metrics)?;
        self.second.run_ended(elapsed, metrics)
    }
}

impl<L: TestRunListener + ?Sized> TestRunListener for &mut L {
    fn run_started(&mut self, suite_id: &str, test_count: usize) -> Result<(), WriteEventError> {
        (**self).run_started(suite_id, test_count)
    }

    fn test_started(&mut self, test: &TestIdentifier) -> Result<(), WriteEventError> {
        (**self).test_started(test)
    }

    fn test_log(
        &mut self,
        test: &TestIdentifier,
        name: &str,
        data: &str,
    ) -> Result<(), WriteEventError> {
        (**self).test_log(test, name, data)
    }

    fn test_failed(
        &mut self,
        test: &TestIdentifier,
        message: &str,
    ) -> Result<(), WriteEventError> {
        (**self).test_failed(test, message)
    }

    fn test_ended(
        &mut self,
        test: &TestIdentifier,
        metrics: &TestMetrics,
    ) -> Result<(), WriteEventError> {
        (**self).test_ended(test, metrics)
    }

    fn run_ended(
        &mut self,
        elapsed: Duration,
        metrics: &TestMetrics,
    ) -> Result<(), WriteEventError> {
        (**self).run_ended(elapsed, metrics)
    }
}
