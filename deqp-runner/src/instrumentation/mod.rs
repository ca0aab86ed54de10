// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing for the output of `am instrument`.
//!
//! dEQP reports progress through instrumentation status records. Output arrives in arbitrary
//! chunks, which [`LineBuffer`] splits into lines. [`InstrumentationParser`] groups those lines
//! into records and turns each record into an [`InstrumentationEvent`].
//!
//! The capability query instrumentation reports a single result instead, which is handled by
//! [`PlatformQueryParser`].

mod events;
mod parser;
mod query;

pub use events::*;
pub use parser::*;
pub use query::*;
