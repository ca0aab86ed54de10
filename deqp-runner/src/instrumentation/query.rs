// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::LineBuffer;
use crate::device::ShellOutputReceiver;
use indexmap::IndexMap;
use tracing::warn;

const RESULT_PREFIX: &str = "INSTRUMENTATION_RESULT: ";
const CODE_PREFIX: &str = "INSTRUMENTATION_CODE: ";

/// Parses the output of the platform capability query instrumentation.
///
/// The query reports `INSTRUMENTATION_RESULT: <key>=<value>` lines followed by a single
/// `INSTRUMENTATION_CODE: <n>` exit line.
#[derive(Clone, Debug, Default)]
pub struct PlatformQueryParser {
    lines: LineBuffer,
    results: IndexMap<String, String>,
    exit_code: Option<i32>,
}

impl PlatformQueryParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instrumentation exit code, if an exit line was seen.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Returns the results reported by the query, in the order they were seen.
    pub fn results(&self) -> &IndexMap<String, String> {
        &self.results
    }

    /// Returns the value of a single result key.
    pub fn result(&self, key: &str) -> Option<&str> {
        self.results.get(key).map(String::as_str)
    }

    fn process_line(&mut self, line: &str) {
        if let Some(rest) = line.strip_prefix(RESULT_PREFIX) {
            match rest.split_once('=') {
                Some((key, value)) => {
                    self.results.insert(key.to_owned(), value.to_owned());
                }
                None => warn!(line, "unexpected instrumentation result format"),
            }
        } else if let Some(rest) = line.strip_prefix(CODE_PREFIX) {
            match rest.trim().parse() {
                Ok(code) => self.exit_code = Some(code),
                Err(_) => warn!(line, "unexpected instrumentation code format"),
            }
        }
    }
}

impl ShellOutputReceiver for PlatformQueryParser {
    fn add_output(&mut self, data: &[u8]) {
        let mut lines = std::mem::take(&mut self.lines);
        lines.push(data, |line| self.process_line(line));
        self.lines = lines;
    }

    fn flush(&mut self) {
        let mut lines = std::mem::take(&mut self.lines);
        lines.finish(|line| self.process_line(line));
        self.lines = lines;
    }
}
