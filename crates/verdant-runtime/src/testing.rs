//! Shared fixtures for unit tests.

use std::fmt;

use crate::diagnostics::RecordingSink;
use crate::runtime::Runtime;

/// A runtime whose warnings land in the returned sink.
pub(crate) fn recording_runtime() -> (Runtime, RecordingSink) {
    let sink = RecordingSink::new();
    let runtime = Runtime::new().with_diagnostics(sink.clone());
    (runtime, sink)
}

/// User error returned from callbacks under test.
#[derive(Debug)]
pub(crate) struct Failure(pub &'static str);

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for Failure {}
