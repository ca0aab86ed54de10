// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The test runner.
//!
//! The main structure in this module is [`DeqpTestRunner`], which drives a [`BatchExecutor`] once
//! per supported configuration until every test has been reported.

mod batch;
mod outcome;
mod scheduler;

pub use batch::*;
pub use outcome::*;
pub use scheduler::*;
