// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::InstrumentationEvent;
use crate::device::ShellOutputReceiver;
use debug_ignore::DebugIgnore;
use indexmap::IndexMap;
use tracing::trace;

const STATUS_PREFIX: &str = "INSTRUMENTATION_STATUS: ";
const DEQP_STATUS_PREFIX: &str = "INSTRUMENTATION_STATUS: dEQP-";
const STATUS_CODE_PREFIX: &str = "INSTRUMENTATION_STATUS_CODE: ";

/// Splits arbitrarily chunked shell output into lines.
///
/// Lines are terminated by `\n`, with an optional preceding `\r` stripped. A trailing partial line
/// is kept across calls to [`push`](Self::push) and emitted by [`finish`](Self::finish). Lines are
/// decoded as UTF-8, replacing invalid sequences.
#[derive(Clone, Debug, Default)]
pub struct LineBuffer {
    partial: Vec<u8>,
}

impl LineBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a chunk of output, calling `on_line` for every line it completes.
    pub fn push(&mut self, mut data: &[u8], mut on_line: impl FnMut(&str)) {
        while let Some(pos) = data.iter().position(|&b| b == b'\n') {
            self.partial.extend_from_slice(&data[..pos]);
            Self::emit(&self.partial, &mut on_line);
            self.partial.clear();
            data = &data[pos + 1..];
        }
        self.partial.extend_from_slice(data);
    }

    /// Emits any buffered partial line.
    pub fn finish(&mut self, mut on_line: impl FnMut(&str)) {
        if !self.partial.is_empty() {
            Self::emit(&self.partial, &mut on_line);
            self.partial.clear();
        }
    }

    fn emit(line: &[u8], on_line: &mut impl FnMut(&str)) {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        on_line(&String::from_utf8_lossy(line));
    }
}

/// Groups instrumentation output lines into status records and converts them into events.
///
/// * `INSTRUMENTATION_STATUS: dEQP-<key>=<value>` starts a new key.
/// * Any other line while a key is open continues its value on a new line.
/// * `INSTRUMENTATION_STATUS_CODE: <n>` completes the record.
#[derive(Clone, Debug, Default)]
pub struct InstrumentationParser {
    values: IndexMap<String, String>,
    current: Option<(String, String)>,
}

impl InstrumentationParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes a single line, returning an event if the line completed a record.
    pub fn process_line(&mut self, line: &str) -> Option<InstrumentationEvent> {
        if line.starts_with(STATUS_CODE_PREFIX) {
            self.finish_record()
        } else if line.starts_with(DEQP_STATUS_PREFIX) {
            self.close_key();
            let pair = &line[STATUS_PREFIX.len()..];
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            self.current = Some((key.to_owned(), value.to_owned()));
            None
        } else {
            if let Some((_, value)) = &mut self.current {
                value.push('\n');
                value.push_str(line);
            } else {
                trace!(line, "ignoring instrumentation output outside a status record");
            }
            None
        }
    }

    /// Signals the end of output, flushing any partial record as if it had been completed.
    pub fn done(&mut self) -> Option<InstrumentationEvent> {
        if self.current.is_none() && self.values.is_empty() {
            return None;
        }
        self.finish_record()
    }

    fn close_key(&mut self) {
        if let Some((key, value)) = self.current.take() {
            self.values.insert(key, value);
        }
    }

    fn finish_record(&mut self) -> Option<InstrumentationEvent> {
        self.close_key();
        let record = std::mem::take(&mut self.values);
        InstrumentationEvent::from_record(&record)
    }
}

/// A [`ShellOutputReceiver`] that parses instrumentation output and hands each event to a
/// callback as soon as it's complete.
#[derive(Debug)]
pub struct InstrumentationReceiver<F> {
    lines: LineBuffer,
    parser: InstrumentationParser,
    on_event: DebugIgnore<F>,
}

impl<F: FnMut(InstrumentationEvent)> InstrumentationReceiver<F> {
    /// Creates a new receiver calling `on_event` for every event.
    pub fn new(on_event: F) -> Self {
        Self {
            lines: LineBuffer::new(),
            parser: InstrumentationParser::new(),
            on_event: DebugIgnore(on_event),
        }
    }
}

impl<F: FnMut(InstrumentationEvent)> ShellOutputReceiver for InstrumentationReceiver<F> {
    fn add_output(&mut self, data: &[u8]) {
        let Self {
            lines,
            parser,
            on_event,
        } = self;
        lines.push(data, |line| {
            if let Some(event) = parser.process_line(line) {
                (on_event.0)(event);
            }
        });
    }

    fn flush(&mut self) {
        let Self {
            lines,
            parser,
            on_event,
        } = self;
        lines.finish(|line| {
            if let Some(event) = parser.process_line(line) {
                (on_event.0)(event);
            }
        });
        if let Some(event) = parser.done() {
            (on_event.0)(event);
        }
    }
}
