// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [`Device`] backed by the `adb` command-line tool.

use camino::{Utf8Path, Utf8PathBuf};
use deqp_runner::{
    device::{Device, ShellOutputReceiver},
    errors::DeviceError,
};
use std::{borrow::Cow, io::Read};
use tracing::{debug, trace};

/// The state `adb get-state` reports for a usable device.
const DEVICE_STATE_ONLINE: &str = "device";

/// Builds `adb` invocations for a single device.
#[derive(Clone, Debug)]
struct AdbCli<'a> {
    adb_path: &'a Utf8Path,
    args: Vec<Cow<'a, str>>,
}

impl<'a> AdbCli<'a> {
    fn new(adb_path: &'a Utf8Path, serial: Option<&'a str>) -> Self {
        let mut cli = Self {
            adb_path,
            args: Vec::new(),
        };
        if let Some(serial) = serial {
            cli.add_arg("-s").add_arg(serial);
        }
        cli
    }

    fn add_arg(&mut self, arg: impl Into<Cow<'a, str>>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    fn add_args(&mut self, args: impl IntoIterator<Item = &'a str>) -> &mut Self {
        for arg in args {
            self.add_arg(arg);
        }
        self
    }

    fn to_expression(&self) -> duct::Expression {
        duct::cmd(self.adb_path.as_str(), self.args.iter().map(|arg| &**arg))
    }

    fn display(&self) -> String {
        shell_words::join(
            std::iter::once(self.adb_path.as_str()).chain(self.args.iter().map(|arg| &**arg)),
        )
    }
}

/// A device reached through `adb`.
#[derive(Debug)]
pub(crate) struct AdbDevice {
    adb_path: Utf8PathBuf,
    serial: Option<String>,
}

impl AdbDevice {
    pub(crate) fn new(adb_path: Utf8PathBuf, serial: Option<String>) -> Self {
        Self { adb_path, serial }
    }

    fn cli(&self) -> AdbCli<'_> {
        AdbCli::new(&self.adb_path, self.serial.as_deref())
    }

    /// Waits until the device is connected.
    pub(crate) fn wait_for_device(&self) -> Result<(), DeviceError> {
        let mut cli = self.cli();
        cli.add_arg("wait-for-device");
        self.run(&cli).map(|_| ())
    }

    /// Runs an adb command to completion, returning its combined output.
    ///
    /// Failing to spawn adb, or a non-zero exit while the device is offline, means the device is
    /// no longer available. Other non-zero exits are the command's own business.
    fn run(&self, cli: &AdbCli<'_>) -> Result<String, DeviceError> {
        trace!(command = %cli.display(), "running adb");
        let output = cli
            .to_expression()
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|error| DeviceError::not_available(format!("failed to run adb: {error}")))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            debug!(command = %cli.display(), status = %output.status, "adb command failed");
            self.check_online()?;
        }
        Ok(stdout)
    }

    fn check_online(&self) -> Result<(), DeviceError> {
        let mut cli = self.cli();
        cli.add_arg("get-state");
        let output = cli
            .to_expression()
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|error| DeviceError::not_available(format!("failed to run adb: {error}")))?;

        let state = String::from_utf8_lossy(&output.stdout);
        let state = state.trim();
        if output.status.success() && state == DEVICE_STATE_ONLINE {
            Ok(())
        } else {
            Err(DeviceError::not_available(format!(
                "device state is `{state}`"
            )))
        }
    }
}

impl Device for AdbDevice {
    fn execute_shell_command(&mut self, command: &str) -> Result<String, DeviceError> {
        let mut cli = self.cli();
        cli.add_args(["shell", command]);
        self.run(&cli)
    }

    fn execute_shell_command_streaming(
        &mut self,
        command: &str,
        receiver: &mut dyn ShellOutputReceiver,
    ) -> Result<(), DeviceError> {
        let mut cli = self.cli();
        cli.add_args(["shell", command]);
        trace!(command = %cli.display(), "streaming adb");

        let handle = cli
            .to_expression()
            .stderr_to_stdout()
            .unchecked()
            .reader()
            .map_err(|error| DeviceError::not_available(format!("failed to run adb: {error}")))?;

        let mut buf = vec![0u8; 8192];
        let mut reader = &handle;
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => receiver.add_output(&buf[..n]),
                Err(error) if error.kind() == std::io::ErrorKind::Interrupted => {}
                Err(error) => {
                    return Err(DeviceError::not_available(format!(
                        "error reading adb output: {error}"
                    )));
                }
            }
        }

        // The child has been waited on once EOF is reached.
        let status = match handle.try_wait() {
            Ok(Some(output)) => output.status,
            Ok(None) => {
                return Err(DeviceError::CommandFailed {
                    command: cli.display(),
                    message: "adb did not exit after closing its output".to_owned(),
                });
            }
            Err(error) => {
                return Err(DeviceError::not_available(format!(
                    "error waiting for adb: {error}"
                )));
            }
        };
        if !status.success() {
            debug!(command = %cli.display(), %status, "adb shell exited with an error");
            self.check_online()?;
        }

        receiver.flush();
        Ok(())
    }

    fn push_string(&mut self, contents: &str, remote_path: &str) -> Result<(), DeviceError> {
        let redirect = format!("cat > {}", shell_words::quote(remote_path));
        let mut cli = self.cli();
        cli.add_args(["shell", &redirect]);
        trace!(command = %cli.display(), bytes = contents.len(), "pushing file");

        let output = cli
            .to_expression()
            .stdin_bytes(contents.as_bytes().to_vec())
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|error| DeviceError::not_available(format!("failed to run adb: {error}")))?;
        if output.status.success() {
            return Ok(());
        }

        self.check_online()?;
        Err(DeviceError::CommandFailed {
            command: cli.display(),
            message: String::from_utf8_lossy(&output.stdout).trim().to_owned(),
        })
    }

    fn get_property(&mut self, name: &str) -> Result<Option<String>, DeviceError> {
        let value = self.execute_shell_command(&format!("getprop {}", shell_words::quote(name)))?;
        let value = value.trim();
        Ok((!value.is_empty()).then(|| value.to_owned()))
    }

    fn install_package(
        &mut self,
        apk: &Utf8Path,
        reinstall: bool,
        extra_args: &[&str],
    ) -> Result<Option<String>, DeviceError> {
        let mut cli = self.cli();
        cli.add_arg("install");
        if reinstall {
            cli.add_arg("-r");
        }
        cli.add_args(extra_args.iter().copied());
        cli.add_arg(apk.as_str());
        let output = self.run(&cli)?;
        Ok(package_manager_failure(&output))
    }

    fn uninstall_package(&mut self, package: &str) -> Result<Option<String>, DeviceError> {
        let mut cli = self.cli();
        cli.add_args(["uninstall", package]);
        let output = self.run(&cli)?;
        Ok(package_manager_failure(&output))
    }
}

/// The package manager prints `Success` on its own line when it succeeds.
fn package_manager_failure(output: &str) -> Option<String> {
    if output.lines().any(|line| line.trim() == "Success") {
        None
    } else {
        Some(output.trim().to_owned())
    }
}
