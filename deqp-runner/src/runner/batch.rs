// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ResultCode, TestOutcome};
use crate::{
    caselist,
    config::RunnerConfig,
    device::Device,
    errors::DeviceError,
    instrumentation::{InstrumentationEvent, InstrumentationReceiver},
    list::{BatchRunConfiguration, TestIdentifier},
};
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::{debug, info, warn};

/// The result of running one test under one configuration in a batch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceResult {
    /// The outcome.
    pub outcome: TestOutcome,

    /// The raw dEQP test log, if log collection is enabled and the test produced one.
    pub log: Option<String>,
}

/// Results of a batch, keyed by test in the order the tests finished.
///
/// Tests that never began are absent.
pub type BatchResults = IndexMap<TestIdentifier, InstanceResult>;

/// A transport fault that cut a batch short.
#[derive(Debug, Error)]
#[error("batch aborted by device error")]
pub struct BatchError {
    /// The underlying device error.
    #[source]
    pub error: DeviceError,

    /// Results for tests that finished before the fault.
    pub partial: BatchResults,

    /// The test that was running when the fault happened, if any.
    pub in_flight: Option<TestIdentifier>,

    /// The test log collected so far for the in-flight test.
    pub in_flight_log: Option<String>,
}

/// Runs batches of tests under a single configuration.
#[derive(Debug)]
pub struct BatchExecutor<'cfg> {
    config: &'cfg RunnerConfig,
}

impl<'cfg> BatchExecutor<'cfg> {
    /// Creates a new executor.
    pub fn new(config: &'cfg RunnerConfig) -> Self {
        Self { config }
    }

    /// Returns the `am instrument` command for a batch under `run_config`.
    pub fn instrumentation_command(&self, run_config: &BatchRunConfiguration) -> String {
        format!(
            "am instrument {} -w -e deqpLogFileName \"{}\" -e deqpCmdLine \
             \"--deqp-caselist-file={} {}\" -e deqpLogData \"{}\" {}",
            self.config.abi_flag(),
            self.config.log_file(),
            self.config.case_list_file(),
            run_config.cmd_line_flags(),
            self.config.collect_logs(),
            self.config.instrumentation(),
        )
    }

    /// Runs `tests` on the device under `run_config`.
    pub fn run(
        &self,
        device: &mut dyn Device,
        run_config: &BatchRunConfiguration,
        tests: &IndexSet<TestIdentifier>,
    ) -> Result<BatchResults, BatchError> {
        info!(%run_config, count = tests.len(), "running batch");

        if let Err(error) = self.push_case_list(device, tests) {
            return Err(BatchError {
                error,
                partial: BatchResults::new(),
                in_flight: None,
                in_flight_log: None,
            });
        }

        let command = self.instrumentation_command(run_config);
        let mut reducer = BatchReducer::new(tests, self.config.collect_logs());
        let mut receiver = InstrumentationReceiver::new(|event| reducer.handle(event));
        let res = device.execute_shell_command_streaming(&command, &mut receiver);
        drop(receiver);

        match res {
            Ok(()) => {
                let results = reducer.finish();
                debug!(%run_config, finished = results.len(), "batch complete");
                Ok(results)
            }
            Err(error) => Err(reducer.into_error(error)),
        }
    }

    fn push_case_list(
        &self,
        device: &mut dyn Device,
        tests: &IndexSet<TestIdentifier>,
    ) -> Result<(), DeviceError> {
        device.execute_shell_command(&format!("rm {}", self.config.case_list_file()))?;
        device.execute_shell_command(&format!("rm {}", self.config.log_file()))?;

        let paths: Vec<String> = tests.iter().map(TestIdentifier::path).collect();
        let mut case_list = caselist::encode(paths.iter().map(String::as_str));
        case_list.push('\n');
        device.push_string(&case_list, self.config.case_list_file())
    }
}

#[derive(Debug)]
struct OpenCase {
    // None if the device began a case that isn't part of this batch.
    test: Option<TestIdentifier>,
    result: Option<TestOutcome>,
    log: String,
}

/// Reduces instrumentation events into per-test results.
#[derive(Debug)]
struct BatchReducer<'a> {
    tests: &'a IndexSet<TestIdentifier>,
    collect_logs: bool,
    open: Option<OpenCase>,
    results: BatchResults,
}

impl<'a> BatchReducer<'a> {
    fn new(tests: &'a IndexSet<TestIdentifier>, collect_logs: bool) -> Self {
        Self {
            tests,
            collect_logs,
            open: None,
            results: BatchResults::new(),
        }
    }

    fn handle(&mut self, event: InstrumentationEvent) {
        match event {
            InstrumentationEvent::SessionInfo { name, value } => {
                debug!(%name, %value, "dEQP session info");
            }
            InstrumentationEvent::BeginSession | InstrumentationEvent::EndSession => {}
            InstrumentationEvent::BeginTestCase { path } => {
                // A case left open is finished by the next one beginning.
                self.close_open();

                let test = match TestIdentifier::from_path(&path) {
                    Ok(test) if self.tests.contains(&test) => Some(test),
                    Ok(_) => {
                        warn!(%path, "device began a test case that isn't in this batch");
                        None
                    }
                    Err(error) => {
                        warn!(%path, %error, "device began a test case with an invalid path");
                        None
                    }
                };
                self.open = Some(OpenCase {
                    test,
                    result: None,
                    log: String::new(),
                });
            }
            InstrumentationEvent::TestCaseResult { code, details } => match &mut self.open {
                Some(open) => {
                    open.result = Some(TestOutcome::new(ResultCode::parse(&code), details));
                }
                None => warn!(%code, "ignoring test case result outside a test case"),
            },
            InstrumentationEvent::TerminateTestCase { reason } => match &mut self.open {
                Some(open) => {
                    open.result = Some(TestOutcome::terminated(reason));
                    self.close_open();
                }
                None => warn!(%reason, "ignoring test case termination outside a test case"),
            },
            InstrumentationEvent::EndTestCase => {
                if self.open.is_some() {
                    self.close_open();
                } else {
                    warn!("ignoring end of test case outside a test case");
                }
            }
            InstrumentationEvent::TestLogData { log } => {
                if let Some(open) = &mut self.open {
                    if self.collect_logs {
                        open.log.push_str(&log);
                    }
                } else {
                    warn!("ignoring test log data outside a test case");
                }
            }
        }
    }

    fn close_open(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };
        let Some(test) = open.test else {
            return;
        };

        let outcome = open.result.unwrap_or_else(TestOutcome::incomplete);
        let log = (!open.log.is_empty()).then_some(open.log);
        self.results.insert(test, InstanceResult { outcome, log });
    }

    // The output ended normally.
    fn finish(mut self) -> BatchResults {
        self.close_open();
        self.results
    }

    fn into_error(self, error: DeviceError) -> BatchError {
        let (in_flight, in_flight_log) = match self.open {
            Some(OpenCase {
                test: Some(test),
                log,
                ..
            }) => (Some(test), (!log.is_empty()).then_some(log)),
            _ => (None, None),
        };
        BatchError {
            error,
            partial: self.results,
            in_flight,
            in_flight_log,
        }
    }
}
