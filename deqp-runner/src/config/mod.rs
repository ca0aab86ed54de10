// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runner configuration.
//!
//! Configuration is read from an embedded default, overlaid with an optional user config file.
//! The main structure in this module is [`RunnerConfig`].

mod imp;
mod junit;

pub use imp::*;
pub use junit::*;
