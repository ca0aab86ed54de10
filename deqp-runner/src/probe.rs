// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checks for whether a device can run a suite, and which render configurations it supports.

use crate::{
    device::Device,
    errors::{DeviceError, SuiteKindParseError},
    instrumentation::PlatformQueryParser,
    list::BatchRunConfiguration,
};
use std::{
    collections::{HashMap, HashSet},
    fmt,
    str::FromStr,
};
use tracing::{debug, warn};

/// The system property holding the OpenGL ES version supported by the device.
pub const GLES_VERSION_PROPERTY: &str = "ro.opengles.version";

/// A dEQP test suite.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SuiteKind {
    /// `dEQP-GLES2`.
    Gles2,

    /// `dEQP-GLES3`.
    Gles3,

    /// `dEQP-GLES31`.
    Gles31,

    /// `dEQP-EGL`.
    Egl,
}

impl SuiteKind {
    /// Returns the suite name, e.g. `dEQP-GLES3`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Gles2 => "dEQP-GLES2",
            Self::Gles3 => "dEQP-GLES3",
            Self::Gles31 => "dEQP-GLES31",
            Self::Egl => "dEQP-EGL",
        }
    }

    /// Returns the OpenGL ES version the suite requires, or `None` for suites that aren't OpenGL
    /// ES suites.
    pub fn required_gles_version(self) -> Option<GlesVersion> {
        match self {
            Self::Gles2 => Some(GlesVersion::new(2, 0)),
            Self::Gles3 => Some(GlesVersion::new(3, 0)),
            Self::Gles31 => Some(GlesVersion::new(3, 1)),
            Self::Egl => None,
        }
    }
}

impl FromStr for SuiteKind {
    type Err = SuiteKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "dEQP-GLES2" => Self::Gles2,
            "dEQP-GLES3" => Self::Gles3,
            "dEQP-GLES31" => Self::Gles31,
            "dEQP-EGL" => Self::Egl,
            other => return Err(SuiteKindParseError::new(other)),
        };
        Ok(kind)
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An OpenGL ES version.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct GlesVersion {
    major: u16,
    minor: u16,
}

impl GlesVersion {
    /// Creates a new version.
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Decodes the value of the `ro.opengles.version` property, which packs the major version
    /// into the upper 16 bits and the minor version into the lower 16 bits.
    pub fn from_property(value: &str) -> Option<Self> {
        let packed: u32 = value.trim().parse().ok()?;
        Some(Self::new((packed >> 16) as u16, (packed & 0xffff) as u16))
    }

    /// Returns the major version.
    pub fn major(self) -> u16 {
        self.major
    }

    /// Returns the minor version.
    pub fn minor(self) -> u16 {
        self.minor
    }
}

impl fmt::Display for GlesVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Clone, Debug)]
enum DeviceFeatures {
    Known(HashSet<String>),
    // The feature list couldn't be parsed.
    Unusable,
}

impl DeviceFeatures {
    fn parse(output: &str) -> Self {
        let mut features = HashSet::new();
        for token in output.split_whitespace() {
            match token.split_once(':') {
                Some(("feature", name)) if !name.is_empty() => {
                    features.insert(name.to_owned());
                }
                _ => {
                    warn!(token, "unexpected format in device feature list");
                    return Self::Unusable;
                }
            }
        }
        Self::Known(features)
    }
}

/// Decides whether render configurations can run on a device.
///
/// The device feature list and each configuration's verdict are queried at most once per prober.
#[derive(Debug)]
pub struct RenderConfigProber {
    suite: SuiteKind,
    abi_flag: String,
    query_target: String,
    features: Option<DeviceFeatures>,
    verdicts: HashMap<BatchRunConfiguration, bool>,
}

impl RenderConfigProber {
    /// Creates a new prober for `suite`.
    ///
    /// `abi_flag` is passed to `am instrument`, and `query_target` names the capability query
    /// instrumentation.
    pub fn new(
        suite: SuiteKind,
        abi_flag: impl Into<String>,
        query_target: impl Into<String>,
    ) -> Self {
        Self {
            suite,
            abi_flag: abi_flag.into(),
            query_target: query_target.into(),
            features: None,
            verdicts: HashMap::new(),
        }
    }

    /// Returns true if the device supports the OpenGL ES version the suite requires.
    ///
    /// Suites that don't use OpenGL ES are always supported. A missing or unparseable version
    /// property means the suite isn't supported.
    pub fn check_api_support(&self, device: &mut dyn Device) -> Result<bool, DeviceError> {
        let Some(required) = self.suite.required_gles_version() else {
            return Ok(true);
        };

        let property = device.get_property(GLES_VERSION_PROPERTY)?;
        let Some(available) = property.as_deref().and_then(GlesVersion::from_property) else {
            warn!(
                property = ?property,
                "could not determine OpenGL ES version of device",
            );
            return Ok(false);
        };

        debug!(%available, %required, "checked OpenGL ES version");
        Ok(available >= required)
    }

    /// Returns true if `config` can run on the device.
    ///
    /// Query failures and malformed replies make a configuration unsupported. Only transport
    /// errors are returned.
    pub fn is_supported(
        &mut self,
        device: &mut dyn Device,
        config: &BatchRunConfiguration,
    ) -> Result<bool, DeviceError> {
        if let Some(&verdict) = self.verdicts.get(config) {
            return Ok(verdict);
        }

        let verdict =
            self.supports_rotation(device, config)? && self.query_render_config(device, config)?;
        if !verdict {
            debug!(%config, "render configuration is not supported");
        }

        self.verdicts.insert(config.clone(), verdict);
        Ok(verdict)
    }

    fn supports_rotation(
        &mut self,
        device: &mut dyn Device,
        config: &BatchRunConfiguration,
    ) -> Result<bool, DeviceError> {
        let Some(feature) = config.rotation().required_feature() else {
            return Ok(true);
        };

        if self.features.is_none() {
            let output = device.execute_shell_command("pm list features")?;
            self.features = Some(DeviceFeatures::parse(&output));
        }

        match &self.features {
            Some(DeviceFeatures::Known(features)) => Ok(features.contains(feature)),
            Some(DeviceFeatures::Unusable) | None => Ok(false),
        }
    }

    fn query_render_config(
        &self,
        device: &mut dyn Device,
        config: &BatchRunConfiguration,
    ) -> Result<bool, DeviceError> {
        // Only OpenGL ES suites have a render query.
        let Some(version) = self.suite.required_gles_version() else {
            return Ok(true);
        };

        let command = format!(
            "am instrument {} -w -e deqpQueryType renderConfigSupported -e deqpCmdLine \"{} \
             --deqp-gl-major-version={} --deqp-gl-minor-version={}\" {}",
            self.abi_flag,
            config.cmd_line_flags(),
            version.major(),
            version.minor(),
            self.query_target,
        );

        let mut parser = PlatformQueryParser::new();
        device.execute_shell_command_streaming(&command, &mut parser)?;

        match (parser.exit_code(), parser.result("Supported")) {
            (Some(0), Some("Yes")) => Ok(true),
            (Some(0), Some("No")) => Ok(false),
            (Some(0), Some(other)) => {
                warn!(%config, answer = other, "capability query returned an unexpected answer");
                Ok(false)
            }
            (Some(code), _) => {
                warn!(
                    %config,
                    code,
                    results = ?parser.results(),
                    "capability query failed",
                );
                Ok(false)
            }
            (None, _) => {
                warn!(%config, "capability query did not report an exit code");
                Ok(false)
            }
        }
    }
}
