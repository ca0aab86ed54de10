// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merges the outcomes of a test across configurations into a single verdict.

use super::{TestMetrics, TestRunListener};
use crate::{
    errors::WriteEventError,
    list::{BatchRunConfiguration, TestIdentifier},
    runner::{InstanceResult, TestOutcome},
};
use indexmap::{IndexMap, IndexSet};
use swrite::{SWrite, swrite};

/// The final verdict for a test.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// Every recorded outcome passed, or no outcomes were recorded.
    Pass,

    /// At least one recorded outcome failed.
    Fail,
}

/// Tracks a test's progress across its configurations.
#[derive(Clone, Debug)]
pub struct RunState {
    outcomes: IndexMap<BatchRunConfiguration, TestOutcome>,
    logs: IndexMap<BatchRunConfiguration, String>,
    pending: IndexSet<BatchRunConfiguration>,
}

impl RunState {
    /// Creates a new state with every configuration in `configs` pending.
    pub fn new<'a>(configs: impl IntoIterator<Item = &'a BatchRunConfiguration>) -> Self {
        Self {
            outcomes: IndexMap::new(),
            logs: IndexMap::new(),
            pending: configs.into_iter().cloned().collect(),
        }
    }

    /// Returns true if `config` hasn't been attempted yet.
    pub fn is_pending(&self, config: &BatchRunConfiguration) -> bool {
        self.pending.contains(config)
    }

    /// Returns the configurations that haven't been attempted yet.
    pub fn pending(&self) -> &IndexSet<BatchRunConfiguration> {
        &self.pending
    }

    /// Returns true if no configurations are pending.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Marks `config` as attempted without recording an outcome.
    pub fn skip(&mut self, config: &BatchRunConfiguration) {
        self.pending.shift_remove(config);
    }

    /// Records the result of running under `config`, marking it as attempted.
    pub fn record(&mut self, config: &BatchRunConfiguration, result: InstanceResult) {
        self.pending.shift_remove(config);
        self.outcomes.insert(config.clone(), result.outcome);
        if let Some(log) = result.log {
            self.logs.insert(config.clone(), log);
        }
    }

    /// Drops every pending configuration, returning them.
    pub fn abandon_pending(&mut self) -> IndexSet<BatchRunConfiguration> {
        std::mem::take(&mut self.pending)
    }

    /// Returns the recorded outcomes in the order they were recorded.
    pub fn outcomes(&self) -> &IndexMap<BatchRunConfiguration, TestOutcome> {
        &self.outcomes
    }

    /// Returns the verdict from the outcomes recorded so far.
    pub fn verdict(&self) -> Verdict {
        if self.outcomes.values().any(TestOutcome::is_failure) {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }

    /// Returns the failure message, or `None` if the verdict is a pass.
    ///
    /// The message has one block per failing configuration, in the order they ran:
    ///
    /// ```text
    /// === with config {glformat=rgba8888d24s8,rotation=90,surfacetype=window} ===
    /// Fail: Fail
    /// ```
    pub fn failure_message(&self) -> Option<String> {
        let mut message = String::new();
        for (config, outcome) in self.outcomes.iter().filter(|(_, o)| o.is_failure()) {
            if !message.is_empty() {
                message.push('\n');
            }
            swrite!(message, "=== with config {config} ===\n{outcome}");
        }
        (!message.is_empty()).then_some(message)
    }
}

/// Reports a finished test to `listener`.
pub fn report_test(
    listener: &mut dyn TestRunListener,
    test: &TestIdentifier,
    state: &RunState,
) -> Result<(), WriteEventError> {
    listener.test_started(test)?;
    for (config, log) in &state.logs {
        let name = format!("{}.{}@{config}", test.class_name(), test.test_name());
        listener.test_log(test, &name, log)?;
    }
    if let Some(message) = state.failure_message() {
        listener.test_failed(test, &message)?;
    }
    listener.test_ended(test, &TestMetrics::new())
}
