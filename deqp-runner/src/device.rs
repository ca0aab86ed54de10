// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The remote device abstraction.
//!
//! The runner never talks to a transport directly. Everything it needs from a device goes through
//! [`Device`], which the command-line front end implements on top of `adb`, and which tests
//! implement with scripted responses.

use crate::errors::DeviceError;
use camino::Utf8Path;

/// A device that dEQP can be run on.
///
/// Every method fails with [`DeviceError::NotAvailable`] if the transport to the device is lost.
/// Any error returned by a device is treated as fatal to the run.
pub trait Device {
    /// Runs a shell command on the device and returns its complete output.
    fn execute_shell_command(&mut self, command: &str) -> Result<String, DeviceError>;

    /// Runs a shell command on the device, handing output to `receiver` as it arrives.
    ///
    /// Chunks may be split at arbitrary byte boundaries. Implementations call
    /// [`ShellOutputReceiver::flush`] once the command's output is exhausted. If the command fails
    /// partway through, the output received so far has been passed on but `flush` isn't called.
    fn execute_shell_command_streaming(
        &mut self,
        command: &str,
        receiver: &mut dyn ShellOutputReceiver,
    ) -> Result<(), DeviceError>;

    /// Writes `contents` to `remote_path` on the device.
    fn push_string(&mut self, contents: &str, remote_path: &str) -> Result<(), DeviceError>;

    /// Reads a system property. Returns `None` if the property is unset.
    fn get_property(&mut self, name: &str) -> Result<Option<String>, DeviceError>;

    /// Installs a package from a local APK.
    ///
    /// Returns a failure message if the device refused the install.
    fn install_package(
        &mut self,
        apk: &Utf8Path,
        reinstall: bool,
        extra_args: &[&str],
    ) -> Result<Option<String>, DeviceError>;

    /// Uninstalls a package.
    ///
    /// Returns a failure message if the device refused, for example because the package wasn't
    /// installed.
    fn uninstall_package(&mut self, package: &str) -> Result<Option<String>, DeviceError>;
}

/// Receives the output of a streaming shell command.
pub trait ShellOutputReceiver {
    /// Called with each chunk of output.
    fn add_output(&mut self, data: &[u8]);

    /// Called once after the last chunk.
    fn flush(&mut self);
}
