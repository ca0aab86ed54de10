// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{BatchError, BatchExecutor, InstanceResult, TestOutcome};
use crate::{
    config::RunnerConfig,
    device::Device,
    errors::{DeviceError, RunError, SuiteKindParseError},
    list::{BatchRunConfiguration, TestIdentifier, TestInstanceMap},
    probe::{RenderConfigProber, SuiteKind},
    reporter::{RunState, TestMetrics, TestRunListener, Verdict, report_test},
};
use indexmap::{IndexMap, IndexSet};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Statistics for a completed run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunStats {
    /// The number of tests in the run.
    pub test_count: usize,

    /// The number of tests reported as passing.
    pub passed: usize,

    /// The number of tests reported as failing.
    pub failed: usize,

    /// The number of test instances skipped because their configuration isn't supported.
    pub unsupported_instances: usize,

    /// True if the whole suite was skipped because the device lacks the required API version.
    pub api_unsupported: bool,
}

impl RunStats {
    /// Returns true if any test failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Runs a dEQP suite on a device.
#[derive(Debug)]
pub struct DeqpTestRunner<'cfg> {
    suite: SuiteKind,
    instances: TestInstanceMap,
    config: &'cfg RunnerConfig,
}

impl<'cfg> DeqpTestRunner<'cfg> {
    /// Creates a new runner for the suite `suite_name`, e.g. `dEQP-GLES3`.
    pub fn new(
        suite_name: &str,
        instances: TestInstanceMap,
        config: &'cfg RunnerConfig,
    ) -> Result<Self, SuiteKindParseError> {
        Ok(Self {
            suite: suite_name.parse()?,
            instances,
            config,
        })
    }

    /// Returns the identifier reported to listeners, `<abi> <suite>`.
    pub fn suite_id(&self) -> String {
        format!("{} {}", self.config.abi(), self.suite)
    }

    /// Runs every test, reporting results to `listener`.
    ///
    /// If the device is lost, the test that was running is reported as crashed and the error is
    /// returned without calling [`TestRunListener::run_ended`].
    pub fn run(
        &self,
        device: &mut dyn Device,
        listener: &mut dyn TestRunListener,
    ) -> Result<RunStats, RunError> {
        let start = Instant::now();
        let mut stats = RunStats {
            test_count: self.instances.len(),
            ..RunStats::default()
        };

        listener.run_started(&self.suite_id(), self.instances.len())?;

        let mut prober = RenderConfigProber::new(
            self.suite,
            self.config.abi_flag(),
            self.config.query_instrumentation(),
        );

        if prober.check_api_support(device)? {
            self.uninstall(device)?;
            self.install(device)?;

            let mut scheduler = Scheduler {
                config: self.config,
                instances: &self.instances,
                executor: BatchExecutor::new(self.config),
                prober: &mut prober,
                states: self
                    .instances
                    .iter()
                    .map(|(test, configs)| (test.clone(), RunState::new(configs)))
                    .collect(),
                stats: &mut stats,
            };
            scheduler.run(device, listener)?;

            self.uninstall(device)?;
        } else {
            info!(
                suite = %self.suite,
                "device does not support the required OpenGL ES version, skipping all tests",
            );
            stats.api_unsupported = true;
            for test in self.instances.tests() {
                listener.test_started(test)?;
                listener.test_ended(test, &TestMetrics::new())?;
                stats.passed += 1;
            }
        }

        listener.run_ended(start.elapsed(), &TestMetrics::new())?;
        Ok(stats)
    }

    fn install(&self, device: &mut dyn Device) -> Result<(), DeviceError> {
        let Some(apk) = self.config.apk_path() else {
            return Ok(());
        };
        let abi_args = ["--abi", self.config.abi()];
        if let Some(message) = device.install_package(apk, true, &abi_args)? {
            warn!(%apk, output = %message, "failed to install dEQP package");
        }
        Ok(())
    }

    fn uninstall(&self, device: &mut dyn Device) -> Result<(), DeviceError> {
        if let Some(message) = device.uninstall_package(self.config.package())? {
            debug!(
                package = self.config.package(),
                output = %message,
                "uninstall reported a failure",
            );
        }
        Ok(())
    }
}

struct Scheduler<'a> {
    config: &'a RunnerConfig,
    instances: &'a TestInstanceMap,
    executor: BatchExecutor<'a>,
    prober: &'a mut RenderConfigProber,
    states: IndexMap<TestIdentifier, RunState>,
    stats: &'a mut RunStats,
}

impl Scheduler<'_> {
    fn run(
        &mut self,
        device: &mut dyn Device,
        listener: &mut dyn TestRunListener,
    ) -> Result<(), RunError> {
        let instances = self.instances;
        let mut round = 0;
        while !self.states.is_empty() {
            round += 1;
            let batch: Vec<TestIdentifier> = self
                .states
                .keys()
                .take(self.config.batch_size())
                .cloned()
                .collect();
            debug!(
                round,
                tests = batch.len(),
                remaining = self.states.len(),
                "starting round",
            );

            // Union of candidate configurations, in first-seen order.
            let configs: IndexSet<&BatchRunConfiguration> = batch
                .iter()
                .filter_map(|test| instances.configs(test))
                .flatten()
                .collect();

            // Instances that began or were skipped this round.
            let mut consumed = 0;
            for config in configs {
                self.run_config(device, listener, config, &batch, &mut consumed)?;
            }

            if consumed > 0 {
                continue;
            }

            // Nothing began this round, so trying again won't help.
            for test in &batch {
                if let Some(state) = self.states.get_mut(test) {
                    let abandoned = state.abandon_pending();
                    warn!(
                        %test,
                        configs = abandoned.len(),
                        "device did not run test, giving up on its remaining configurations",
                    );
                    self.finalize(listener, test)?;
                }
            }
        }
        Ok(())
    }

    fn run_config(
        &mut self,
        device: &mut dyn Device,
        listener: &mut dyn TestRunListener,
        config: &BatchRunConfiguration,
        batch: &[TestIdentifier],
        consumed: &mut usize,
    ) -> Result<(), RunError> {
        // Only tests that still need this configuration: one attempt per configuration.
        let selected: IndexSet<TestIdentifier> = batch
            .iter()
            .filter(|test| {
                self.states
                    .get(*test)
                    .is_some_and(|state| state.is_pending(config))
            })
            .cloned()
            .collect();
        if selected.is_empty() {
            return Ok(());
        }

        if !self.prober.is_supported(device, config)? {
            debug!(%config, tests = selected.len(), "skipping unsupported configuration");
            for test in &selected {
                if let Some(state) = self.states.get_mut(test) {
                    state.skip(config);
                }
                self.stats.unsupported_instances += 1;
                *consumed += 1;
                self.finalize_if_complete(listener, test)?;
            }
            return Ok(());
        }

        match self.executor.run(device, config, &selected) {
            Ok(results) => {
                self.record_results(listener, config, results, consumed)?;
                Ok(())
            }
            Err(BatchError {
                error,
                partial,
                in_flight,
                in_flight_log,
            }) => {
                warn!(%config, %error, "device lost during batch");
                self.record_results(listener, config, partial, consumed)?;

                if let Some(test) = in_flight {
                    if let Some(state) = self.states.get_mut(&test) {
                        state.record(
                            config,
                            InstanceResult {
                                outcome: TestOutcome::device_lost(),
                                log: in_flight_log,
                            },
                        );
                        // A test that takes the device down is not run under its other
                        // configurations.
                        state.abandon_pending();
                    }
                    self.finalize(listener, &test)?;
                }
                Err(RunError::Device(error))
            }
        }
    }

    fn record_results(
        &mut self,
        listener: &mut dyn TestRunListener,
        config: &BatchRunConfiguration,
        results: IndexMap<TestIdentifier, InstanceResult>,
        consumed: &mut usize,
    ) -> Result<(), RunError> {
        for (test, result) in results {
            let Some(state) = self.states.get_mut(&test) else {
                continue;
            };
            state.record(config, result);
            *consumed += 1;
            self.finalize_if_complete(listener, &test)?;
        }
        Ok(())
    }

    fn finalize_if_complete(
        &mut self,
        listener: &mut dyn TestRunListener,
        test: &TestIdentifier,
    ) -> Result<(), RunError> {
        if self.states.get(test).is_some_and(RunState::is_complete) {
            self.finalize(listener, test)?;
        }
        Ok(())
    }

    fn finalize(
        &mut self,
        listener: &mut dyn TestRunListener,
        test: &TestIdentifier,
    ) -> Result<(), RunError> {
        let Some(state) = self.states.shift_remove(test) else {
            return Ok(());
        };
        report_test(listener, test, &state)?;
        match state.verdict() {
            Verdict::Pass => self.stats.passed += 1,
            Verdict::Fail => self.stats.failed += 1,
        }
        Ok(())
    }
}
