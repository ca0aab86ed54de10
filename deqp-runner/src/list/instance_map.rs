// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{BatchRunConfiguration, TestIdentifier};
use indexmap::{IndexMap, IndexSet};

/// The set of tests to run, each with the configurations it should run under.
///
/// Iteration order is insertion order: tests are batched in this order, and the union of their
/// configurations is probed and executed in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct TestInstanceMap {
    instances: IndexMap<TestIdentifier, IndexSet<BatchRunConfiguration>>,
}

impl TestInstanceMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a test with its candidate configurations.
    ///
    /// Duplicate configurations are dropped, keeping the first occurrence. A test with no
    /// configurations runs under [`BatchRunConfiguration::default`]. Adding a test a second time
    /// replaces its configurations but keeps its original position.
    pub fn insert(
        &mut self,
        test: TestIdentifier,
        configs: impl IntoIterator<Item = BatchRunConfiguration>,
    ) {
        let mut configs: IndexSet<_> = configs.into_iter().collect();
        if configs.is_empty() {
            configs.insert(BatchRunConfiguration::default());
        }
        self.instances.insert(test, configs);
    }

    /// Returns the number of tests.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns true if there are no tests.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Returns the candidate configurations for a test, if it is present.
    pub fn configs(&self, test: &TestIdentifier) -> Option<&IndexSet<BatchRunConfiguration>> {
        self.instances.get(test)
    }

    /// Iterates over tests and their configurations in insertion order.
    pub fn iter(
        &self,
    ) -> impl ExactSizeIterator<Item = (&TestIdentifier, &IndexSet<BatchRunConfiguration>)> + '_
    {
        self.instances.iter()
    }

    /// Iterates over tests in insertion order.
    pub fn tests(&self) -> impl ExactSizeIterator<Item = &TestIdentifier> + '_ {
        self.instances.keys()
    }
}

impl FromIterator<(TestIdentifier, Vec<BatchRunConfiguration>)> for TestInstanceMap {
    fn from_iter<T: IntoIterator<Item = (TestIdentifier, Vec<BatchRunConfiguration>)>>(
        iter: T,
    ) -> Self {
        let mut map = Self::new();
        for (test, configs) in iter {
            map.insert(test, configs);
        }
        map
    }
}
