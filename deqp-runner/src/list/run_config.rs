// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{RotationParseError, RunConfigParseError};
use std::{fmt, str::FromStr};

/// The screen rotation a dEQP batch is run under.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Rotation {
    /// Leave the screen orientation alone.
    #[default]
    Unspecified,

    /// 0°.
    Portrait,

    /// 90°.
    Landscape,

    /// 180°.
    ReversePortrait,

    /// 270°.
    ReverseLandscape,
}

/// Device feature advertised by devices that can display in portrait orientation.
pub const FEATURE_PORTRAIT: &str = "android.hardware.screen.portrait";

/// Device feature advertised by devices that can display in landscape orientation.
pub const FEATURE_LANDSCAPE: &str = "android.hardware.screen.landscape";

impl Rotation {
    /// Returns the string representations accepted by [`FromStr`].
    pub fn variants() -> &'static [&'static str] {
        &["unspecified", "0", "90", "180", "270"]
    }

    /// Returns the value passed to `--deqp-screen-rotation`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Portrait => "0",
            Self::Landscape => "90",
            Self::ReversePortrait => "180",
            Self::ReverseLandscape => "270",
        }
    }

    /// Returns the device feature required to run under this rotation, if any.
    pub fn required_feature(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Portrait | Self::ReversePortrait => Some(FEATURE_PORTRAIT),
            Self::Landscape | Self::ReverseLandscape => Some(FEATURE_LANDSCAPE),
        }
    }
}

impl FromStr for Rotation {
    type Err = RotationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "unspecified" => Self::Unspecified,
            "0" => Self::Portrait,
            "90" => Self::Landscape,
            "180" => Self::ReversePortrait,
            "270" => Self::ReverseLandscape,
            other => return Err(RotationParseError::new(other)),
        };
        Ok(val)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A render configuration a batch of dEQP tests is executed under.
///
/// Configurations are compared on all three fields. The [`Display`](fmt::Display) form,
/// `{glformat=X,rotation=Y,surfacetype=Z}`, is used as the configuration's identifier in failure
/// messages.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BatchRunConfiguration {
    gl_config: String,
    rotation: Rotation,
    surface_type: String,
}

impl BatchRunConfiguration {
    /// The pixel format used when a plan doesn't specify one.
    pub const DEFAULT_GL_CONFIG: &'static str = "rgba8888d24s8";

    /// The surface type used when a plan doesn't specify one.
    pub const DEFAULT_SURFACE_TYPE: &'static str = "window";

    /// Creates a new configuration.
    pub fn new(
        gl_config: impl Into<String>,
        rotation: Rotation,
        surface_type: impl Into<String>,
    ) -> Self {
        Self {
            gl_config: gl_config.into(),
            rotation,
            surface_type: surface_type.into(),
        }
    }

    /// Builds a configuration from a plan's instance arguments.
    ///
    /// Recognized keys are `glconfig`, `rotation` and `surfacetype`. Missing keys take the
    /// corresponding value from [`BatchRunConfiguration::default`].
    pub fn from_instance_args<'a>(
        args: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, RunConfigParseError> {
        let mut config = Self::default();
        for (key, value) in args {
            match key {
                "glconfig" => config.gl_config = value.to_owned(),
                "rotation" => config.rotation = value.parse()?,
                // Older plans spell this in camel case.
                "surfacetype" | "surfaceType" => config.surface_type = value.to_owned(),
                other => {
                    return Err(RunConfigParseError::UnknownArgument {
                        key: other.to_owned(),
                    });
                }
            }
        }
        Ok(config)
    }

    /// Returns the GL pixel format name.
    pub fn gl_config(&self) -> &str {
        &self.gl_config
    }

    /// Returns the screen rotation.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Returns the surface type.
    pub fn surface_type(&self) -> &str {
        &self.surface_type
    }

    /// Returns the dEQP command-line flags selecting this configuration.
    ///
    /// Empty pixel formats and surface types are omitted.
    pub fn cmd_line_flags(&self) -> String {
        let mut flags = Vec::with_capacity(3);
        if !self.gl_config.is_empty() {
            flags.push(format!("--deqp-gl-config-name={}", self.gl_config));
        }
        flags.push(format!("--deqp-screen-rotation={}", self.rotation));
        if !self.surface_type.is_empty() {
            flags.push(format!("--deqp-surface-type={}", self.surface_type));
        }
        flags.join(" ")
    }
}

impl Default for BatchRunConfiguration {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_GL_CONFIG,
            Rotation::Unspecified,
            Self::DEFAULT_SURFACE_TYPE,
        )
    }
}

impl fmt::Display for BatchRunConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{glformat={},rotation={},surfacetype={}}}",
            self.gl_config, self.rotation, self.surface_type
        )
    }
}

/// Parses a comma-separated list of instance arguments, e.g.
/// `glconfig=rgba8888d24s8,rotation=90,surfacetype=window`.
impl FromStr for BatchRunConfiguration {
    type Err = RunConfigParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let args = s
            .split(',')
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .map(|arg| {
                arg.split_once('=')
                    .ok_or_else(|| RunConfigParseError::InvalidFormat {
                        input: arg.to_owned(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_instance_args(args)
    }
}
