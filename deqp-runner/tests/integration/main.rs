// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the runner, driven against a scripted device.

mod basic;
mod instances;
