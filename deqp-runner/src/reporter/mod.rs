// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reporting of test results.
//!
//! The main structure in this module is [`TestRunListener`], which receives one aggregated result
//! per test. [`JunitListener`] is an implementation that writes a JUnit XML report.

mod aggregate;
mod junit;
mod listener;

pub use aggregate::*;
pub use junit::*;
pub use listener::*;
