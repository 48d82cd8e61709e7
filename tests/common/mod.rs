#![allow(dead_code, unused_imports)]

pub use execbatch_test_utils::builders;
pub use execbatch_test_utils::recording_observer::{Recorded, RecordingObserver};
pub use execbatch_test_utils::scripted_backend::{Ending, Script, ScriptedBackend};
pub use execbatch_test_utils::{init_tracing, with_timeout};

use execbatch::engine::StreamSnapshot;
use execbatch::exec::RunReporter;

/// One runner callback, in the order it was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Update(StreamSnapshot),
    Complete(u64, StreamSnapshot),
    Failure(String, StreamSnapshot),
}

/// `RunReporter` that records every callback.
#[derive(Debug, Default)]
pub struct CallLog {
    pub calls: Vec<Call>,
}

impl CallLog {
    pub fn updates(&self) -> Vec<&StreamSnapshot> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Update(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

impl RunReporter for CallLog {
    fn on_update(&mut self, snapshot: StreamSnapshot) {
        self.calls.push(Call::Update(snapshot));
    }

    fn on_complete(&mut self, elapsed_ms: u64, snapshot: StreamSnapshot) {
        self.calls.push(Call::Complete(elapsed_ms, snapshot));
    }

    fn on_failure(&mut self, error: String, snapshot: StreamSnapshot) {
        self.calls.push(Call::Failure(error, snapshot));
    }
}
