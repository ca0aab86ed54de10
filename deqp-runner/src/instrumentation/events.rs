// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use indexmap::IndexMap;
use tracing::debug;

/// The key naming the type of a dEQP status record.
pub const EVENT_TYPE_KEY: &str = "dEQP-EventType";

/// An event emitted by the dEQP instrumentation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InstrumentationEvent {
    /// A key/value pair describing the test session.
    SessionInfo {
        /// The name of the property.
        name: String,

        /// The value of the property.
        value: String,
    },

    /// The test session started.
    BeginSession,

    /// A test case started.
    BeginTestCase {
        /// The dotted path of the test case.
        path: String,
    },

    /// The currently open test case produced a result.
    TestCaseResult {
        /// The result code, e.g. `Pass` or `Fail`.
        code: String,

        /// Free-form details accompanying the result.
        details: String,
    },

    /// The currently open test case was terminated by the test binary.
    TerminateTestCase {
        /// Why the test case was terminated.
        reason: String,
    },

    /// The currently open test case finished.
    EndTestCase,

    /// The test session finished.
    EndSession,

    /// A chunk of the test log for the currently open test case.
    TestLogData {
        /// The log data.
        log: String,
    },
}

impl InstrumentationEvent {
    /// Converts a status record into an event.
    ///
    /// Returns `None` for records without an event type and for event types that aren't known.
    /// Missing keys for known event types are treated as empty strings.
    pub fn from_record(record: &IndexMap<String, String>) -> Option<Self> {
        let get = |key: &str| record.get(key).cloned().unwrap_or_default();

        let event_type = record.get(EVENT_TYPE_KEY)?;
        let event = match event_type.as_str() {
            "SessionInfo" => Self::SessionInfo {
                name: get("dEQP-SessionInfo-Name"),
                value: get("dEQP-SessionInfo-Value"),
            },
            "BeginSession" => Self::BeginSession,
            "BeginTestCase" => Self::BeginTestCase {
                path: get("dEQP-BeginTestCase-TestCasePath"),
            },
            "TestCaseResult" => Self::TestCaseResult {
                code: get("dEQP-TestCaseResult-Code"),
                details: get("dEQP-TestCaseResult-Details"),
            },
            "TerminateTestCase" => Self::TerminateTestCase {
                reason: get("dEQP-TerminateTestCase-Reason"),
            },
            "EndTestCase" => Self::EndTestCase,
            "EndSession" => Self::EndSession,
            "TestLogData" => Self::TestLogData {
                log: get("dEQP-TestLogData-Log"),
            },
            other => {
                debug!(event_type = other, "ignoring unknown dEQP event type");
                return None;
            }
        };
        Some(event)
    }
}
