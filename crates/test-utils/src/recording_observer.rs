use std::sync::{Arc, Mutex};

use execbatch::engine::{BatchObserver, BatchState};

/// Everything a [`RecordingObserver`] saw, shared with the test.
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub states: Vec<BatchState>,
    pub completed: Vec<BatchState>,
    pub errors: Vec<String>,
    pub aborted: Vec<String>,
}

/// Observer that records every callback.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Recorded {
        self.inner.lock().unwrap().clone()
    }
}

impl BatchObserver for RecordingObserver {
    fn on_state(&mut self, state: &BatchState) {
        self.inner.lock().unwrap().states.push(state.clone());
    }

    fn on_completed(&mut self, state: &BatchState) {
        self.inner.lock().unwrap().completed.push(state.clone());
    }

    fn on_error(&mut self, message: &str) {
        self.inner.lock().unwrap().errors.push(message.to_string());
    }

    fn on_aborted(&mut self, operation: &str) {
        self.inner.lock().unwrap().aborted.push(operation.to_string());
    }
}
