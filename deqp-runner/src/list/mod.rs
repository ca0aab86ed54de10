// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test identifiers, render configurations and the map between them.
//!
//! The main structure in this module is [`TestInstanceMap`].

mod identifier;
mod instance_map;
mod run_config;

pub use identifier::*;
pub use instance_map::*;
pub use run_config::*;
