// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    adb::AdbDevice,
    display::DisplayReporter,
    errors::{DeqpExitCode, ExpectedError},
    output::{OutputContext, OutputOpts},
    test_list,
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser};
use std::time::Instant;
use deqp_runner::{
    config::{DefaultConfigWarnings, RunnerConfig},
    errors::RunError,
    reporter::{JunitListener, TeeListener},
    runner::{DeqpTestRunner, RunStats},
};
use tracing::{debug, info, warn};

/// Runs dEQP conformance tests on an Android device.
///
/// Tests are read from a test list with one dotted test path per line. A path may be followed by
/// one or more render configurations such as `rotation=90,surfacetype=window`.
#[derive(Debug, Parser)]
#[command(
    version,
    name = "deqp-tradefed",
    styles = crate::output::clap_styles::style(),
    max_term_width = 100
)]
pub struct DeqpTradefedApp {
    /// The dEQP suite to run, e.g. dEQP-GLES3
    #[arg(value_name = "SUITE")]
    suite: String,

    /// Path to the test list
    #[arg(value_name = "TEST_LIST")]
    test_list: Utf8PathBuf,

    #[command(flatten)]
    device: DeviceOpts,

    #[command(flatten)]
    config_opts: ConfigOpts,

    #[command(flatten)]
    output: OutputOpts,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Device options")]
struct DeviceOpts {
    /// Serial number of the device to run on
    #[arg(long, short, value_name = "SERIAL", env = "ANDROID_SERIAL")]
    serial: Option<String>,

    /// Path to the adb binary
    #[arg(long, value_name = "PATH", default_value = "adb", env = "DEQP_ADB")]
    adb: Utf8PathBuf,
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file [default: .config/deqp.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn make_config(&self, cwd: &Utf8Path) -> Result<RunnerConfig, ExpectedError> {
        let config =
            RunnerConfig::from_sources(self.config_file.as_deref(), cwd, &mut DefaultConfigWarnings)?;
        Ok(config)
    }
}

impl DeqpTradefedApp {
    /// Initializes logging and returns the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(self, output: OutputContext) -> Result<i32, ExpectedError> {
        let cwd = current_dir()?;
        let config = self.config_opts.make_config(&cwd)?;

        let contents = std::fs::read_to_string(&self.test_list)
            .map_err(|err| ExpectedError::test_list_read_error(&self.test_list, err))?;
        let instances = test_list::parse(&contents)
            .map_err(|err| ExpectedError::test_list_parse_error(&self.test_list, err))?;
        if instances.is_empty() {
            warn!("no tests to run in `{}`", self.test_list);
            return Ok(DeqpExitCode::NO_TESTS_RUN);
        }

        let runner = DeqpTestRunner::new(&self.suite, instances, &config)?;

        let mut device = AdbDevice::new(self.device.adb, self.device.serial);
        debug!("waiting for device");
        device.wait_for_device()?;

        let mut display = DisplayReporter::new(
            std::io::stderr().lock(),
            output.stderr_styles(),
            output.verbose,
        );
        let start = Instant::now();
        let result = match config.junit() {
            Some(junit) => {
                let mut junit = JunitListener::new(junit);
                let mut listener = TeeListener::new(&mut display, &mut junit);
                let result = runner.run(&mut device, &mut listener);
                // A lost device skips run_ended, which is where the report is normally written.
                if let Err(RunError::Device(_)) = &result
                    && let Err(error) = junit.finish(start.elapsed())
                {
                    warn!("failed to write JUnit report after device loss: {error}");
                }
                result
            }
            None => runner.run(&mut device, &mut display),
        };

        match result {
            Ok(stats) => Ok(final_exit_code(&stats)),
            Err(RunError::Device(err)) => Err(err.into()),
            Err(RunError::Listener(err)) => Err(err.into()),
        }
    }
}

fn final_exit_code(stats: &RunStats) -> i32 {
    if stats.api_unsupported {
        info!("device does not support the suite's API version; tests reported as passing");
    }
    if stats.unsupported_instances > 0 {
        info!(
            "{} test instances were skipped because the device does not support their configuration",
            stats.unsupported_instances,
        );
    }

    if stats.has_failures() {
        DeqpExitCode::TEST_RUN_FAILED
    } else {
        DeqpExitCode::OK
    }
}

fn current_dir() -> Result<Utf8PathBuf, ExpectedError> {
    let cwd = std::env::current_dir().map_err(|err| ExpectedError::CurrentDirInvalid { err })?;
    Utf8PathBuf::try_from(cwd)
        .map_err(|err| ExpectedError::CurrentDirInvalidUtf8 { path: err.into_path_buf() })
}
