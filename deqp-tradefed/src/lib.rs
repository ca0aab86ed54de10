// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs dEQP conformance suites on an Android device.
//!
//! This is a thin front end over [`deqp_runner`]: it reads a test list, connects to a device
//! through `adb`, and prints results as they arrive.

#![warn(missing_docs)]

mod adb;
mod dispatch;
mod display;
mod errors;
mod output;
mod test_list;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputContext;
