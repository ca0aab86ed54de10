// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parses test lists.
//!
//! Each line names a test path, optionally followed by the configurations it should run under:
//!
//! ```text
//! # comment
//! dEQP-GLES3.info.version
//! dEQP-GLES3.functional.color_clear.single_rgb rotation=0 rotation=90,surfacetype=window
//! ```
//!
//! A line without configurations stands for the default configuration. A test that appears more
//! than once runs under every configuration its lines name, including the default for bare lines.

use crate::errors::TestListParseError;
use deqp_runner::list::{BatchRunConfiguration, TestIdentifier, TestInstanceMap};
use indexmap::IndexMap;

const COMMENT: char = '#';

pub(crate) fn parse(input: &str) -> Result<TestInstanceMap, TestListParseError> {
    let mut instances: IndexMap<TestIdentifier, Vec<BatchRunConfiguration>> = IndexMap::new();

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = match line.split_once(COMMENT) {
            Some((before, _)) => before,
            None => line,
        };
        let mut words = line.split_whitespace();
        let Some(path) = words.next() else {
            continue;
        };

        let test = TestIdentifier::from_path(path).map_err(|error| {
            TestListParseError::InvalidTestPath {
                line: line_no,
                error,
            }
        })?;
        let mut configs = words
            .map(|word| {
                word.parse::<BatchRunConfiguration>().map_err(|error| {
                    TestListParseError::InvalidConfig {
                        line: line_no,
                        input: word.to_owned(),
                        error,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if configs.is_empty() {
            configs.push(BatchRunConfiguration::default());
        }

        instances.entry(test).or_default().extend(configs);
    }

    Ok(instances.into_iter().collect())
}
