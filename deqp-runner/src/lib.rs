// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for driving the drawElements Quality Program (dEQP) conformance suites on
//! an Android device.
//!
//! The basic flow is:
//!
//! 1. A [`TestInstanceMap`](list::TestInstanceMap) is built, mapping each test to the render
//!    configurations it should run under.
//! 2. A [`DeqpTestRunner`](runner::DeqpTestRunner) probes which configurations the device
//!    supports, then runs one instrumentation batch per supported configuration.
//! 3. The instrumentation output is parsed into [`events`](instrumentation::InstrumentationEvent)
//!    and reduced into per-test outcomes.
//! 4. Outcomes from every configuration are merged into a single verdict per test and forwarded
//!    to a [`TestRunListener`](reporter::TestRunListener).

pub mod caselist;
pub mod config;
pub mod device;
pub mod errors;
pub mod instrumentation;
pub mod list;
pub mod probe;
pub mod reporter;
pub mod runner;
