// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{JunitConfig, JunitImpl};
use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Trait for handling configuration warnings.
///
/// This trait allows for different warning handling strategies, such as logging warnings
/// (the default behavior) or collecting them for testing purposes.
pub trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Default implementation of [`ConfigWarnings`] that logs warnings using the tracing crate.
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push(' ');
            unknown_str.push_str(unknown.iter().next().map(String::as_str).unwrap_or_default());
        } else {
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!(
            "ignoring unknown configuration keys in config file {config_file}:{unknown_str}"
        );
    }
}

/// Configuration for a dEQP run.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    runner: RunnerImpl,
    junit: JunitImpl,
}

impl RunnerConfig {
    /// The default location of the config within the current directory.
    pub const CONFIG_PATH: &'static str = ".config/deqp.toml";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Reads the config from the embedded defaults, overlaid with `config_file`.
    ///
    /// If `config_file` is `None`, [`Self::CONFIG_PATH`] within `cwd` is read if it exists.
    pub fn from_sources(
        config_file: Option<&Utf8Path>,
        cwd: &Utf8Path,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = cwd.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(&config_file, &unknown);
        }

        config
            .validate()
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        Ok(Self {
            runner: config.runner,
            junit: config.junit,
        })
    }

    /// Returns the default config.
    #[cfg(test)]
    pub(crate) fn default_config() -> Self {
        let config = Self::make_default_config()
            .build()
            .expect("default config is always valid");

        let mut unknown = BTreeSet::new();
        let deserialized: RunnerConfigDeserialize =
            serde_ignored::deserialize(config, |path: serde_ignored::Path| {
                unknown.insert(path.to_string());
            })
            .expect("default config is always valid");

        // The default config is embedded in the binary, so it must not have unknown keys.
        assert!(
            unknown.is_empty(),
            "found unknown keys in default config: {unknown:?}"
        );

        Self {
            runner: deserialized.runner,
            junit: deserialized.junit,
        }
    }

    /// Returns the ABI the package is run for.
    pub fn abi(&self) -> &str {
        &self.runner.abi
    }

    /// Returns the ABI flag passed to `am instrument`.
    pub fn abi_flag(&self) -> String {
        format!("--abi {}", self.runner.abi)
    }

    /// Returns the package name of the on-device tester.
    pub fn package(&self) -> &str {
        &self.runner.package
    }

    /// Returns the APK to install before the run, if any.
    pub fn apk_path(&self) -> Option<&Utf8Path> {
        self.runner.apk_path.as_deref()
    }

    /// Returns the instrumentation that executes test cases.
    pub fn instrumentation(&self) -> &str {
        &self.runner.instrumentation
    }

    /// Returns the instrumentation that answers render configuration queries.
    pub fn query_instrumentation(&self) -> &str {
        &self.runner.query_instrumentation
    }

    /// Returns the path on the device the case list is written to.
    pub fn case_list_file(&self) -> &str {
        &self.runner.case_list_file
    }

    /// Returns the path on the device dEQP writes its log to.
    pub fn log_file(&self) -> &str {
        &self.runner.log_file
    }

    /// Returns the maximum number of tests per instrumentation invocation. Always non-zero.
    pub fn batch_size(&self) -> usize {
        self.runner.batch_size
    }

    /// Returns true if raw test logs should be collected.
    pub fn collect_logs(&self) -> bool {
        self.runner.collect_logs
    }

    /// Returns the JUnit configuration, if a report path is set.
    pub fn junit(&self) -> Option<JunitConfig<'_>> {
        JunitConfig::new(&self.junit)
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(RunnerConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: RunnerConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // serde_path_to_error already tracks the key, so drop it from the config error.
                let path = error.path().clone();
                let config_error = error.into_inner();
                let error = match config_error {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

#[derive(Clone, Debug, Deserialize)]
struct RunnerConfigDeserialize {
    runner: RunnerImpl,
    junit: JunitImpl,
}

impl RunnerConfigDeserialize {
    fn validate(&self) -> Result<(), ConfigParseErrorKind> {
        if self.runner.batch_size == 0 {
            return Err(ConfigParseErrorKind::InvalidValue {
                key: "runner.batch-size",
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RunnerImpl {
    abi: String,
    package: String,
    #[serde(default)]
    apk_path: Option<Utf8PathBuf>,
    instrumentation: String,
    query_instrumentation: String,
    case_list_file: String,
    log_file: String,
    batch_size: usize,
    collect_logs: bool,
}
