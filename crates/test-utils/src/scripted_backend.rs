use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Notify, mpsc};
use execbatch::engine::Command;
use execbatch::errors::{ExecBatchError, Result};
use execbatch::exec::{
    ExecutionResult, ExecutionStatus, OutputChunk, OutputSender, ShellBackend,
};

/// One step of a scripted command.
#[derive(Clone)]
pub enum Step {
    Emit(OutputChunk),
    Sleep(Duration),
    /// Block until the notify fires.
    Wait(Arc<Notify>),
}

/// How a scripted command ends.
#[derive(Clone, Debug)]
pub enum Ending {
    Success,
    Failure { errors: String, error: Option<String> },
    /// The backend itself errors out (e.g. spawn failure).
    BackendError(String),
}

#[derive(Clone)]
pub struct Script {
    pub steps: Vec<Step>,
    pub ending: Ending,
}

impl Script {
    pub fn success() -> Self {
        Self {
            steps: Vec::new(),
            ending: Ending::Success,
        }
    }

    pub fn failure(errors: &str) -> Self {
        Self {
            steps: Vec::new(),
            ending: Ending::Failure {
                errors: errors.to_string(),
                error: None,
            },
        }
    }

    pub fn ending(mut self, ending: Ending) -> Self {
        self.ending = ending;
        self
    }

    pub fn stdout(mut self, text: &str) -> Self {
        self.steps.push(Step::Emit(OutputChunk::stdout(text)));
        self
    }

    pub fn stderr(mut self, text: &str) -> Self {
        self.steps.push(Step::Emit(OutputChunk::stderr(text)));
        self
    }

    pub fn sleep_ms(mut self, ms: u64) -> Self {
        self.steps.push(Step::Sleep(Duration::from_millis(ms)));
        self
    }

    pub fn wait(mut self, notify: Arc<Notify>) -> Self {
        self.steps.push(Step::Wait(notify));
        self
    }
}

/// A fake shell backend that:
/// - records which commands were executed, in order
/// - plays back a script per command string (unknown commands succeed)
/// - keeps a weak handle to every output sender it was given, so tests can
///   check the sender was released.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    executed: Arc<Mutex<Vec<String>>>,
    senders: Arc<Mutex<Vec<mpsc::WeakSender<OutputChunk>>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, command: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(command.to_string(), script);
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// Number of output senders still alive.
    pub fn live_senders(&self) -> usize {
        self.senders
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.upgrade().is_some())
            .count()
    }
}

impl ShellBackend for ScriptedBackend {
    fn execute<'a>(
        &'a self,
        command: &'a Command,
        _index: usize,
        output: OutputSender,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionResult>> + Send + 'a>> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(command.command.clone());
            self.senders.lock().unwrap().push(output.downgrade());

            let script = self
                .scripts
                .lock()
                .unwrap()
                .get(&command.command)
                .cloned()
                .unwrap_or_else(Script::success);

            let mut result = ExecutionResult::for_command(command, ExecutionStatus::Success);

            for step in script.steps {
                match step {
                    Step::Emit(chunk) => {
                        match chunk.stream {
                            execbatch::exec::OutputStream::Stdout => result.output.push_str(&chunk.text),
                            execbatch::exec::OutputStream::Stderr => result.errors.push_str(&chunk.text),
                        }
                        let _ = output.send(chunk).await;
                    }
                    Step::Sleep(d) => tokio::time::sleep(d).await,
                    Step::Wait(notify) => notify.notified().await,
                }
            }

            match script.ending {
                Ending::Success => Ok(result),
                Ending::Failure { errors, error } => {
                    result.result = ExecutionStatus::Error;
                    result.errors.push_str(&errors);
                    result.error = error;
                    Ok(result)
                }
                Ending::BackendError(msg) => Err(ExecBatchError::Other(anyhow::anyhow!(msg))),
            }
        })
    }
}
