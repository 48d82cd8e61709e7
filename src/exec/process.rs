// src/exec/process.rs

//! Real shell backend built on `tokio::process`.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as ProcessCommand;
use tracing::{debug, info, warn};

use crate::engine::{Command, format_duration};
use crate::errors::Result;
use crate::exec::backend::{
    ExecutionResult, ExecutionStatus, OutputChunk, OutputSender, OutputStream, ShellBackend,
};
use crate::exec::output_buffer::MAX_BUFFER_BYTES;

const READ_BUF_SIZE: usize = 8 * 1024;

/// Runs each command through the platform shell (`sh -c` / `cmd /C`).
///
/// The child is spawned with `kill_on_drop(true)`, so dropping the future
/// returned by `execute` (e.g. on cancellation) also stops the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessBackend;

impl ProcessBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ShellBackend for ProcessBackend {
    fn execute<'a>(
        &'a self,
        command: &'a Command,
        index: usize,
        output: OutputSender,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionResult>> + Send + 'a>> {
        Box::pin(run_process(command, index, output))
    }
}

async fn run_process(
    command: &Command,
    index: usize,
    output: OutputSender,
) -> Result<ExecutionResult> {
    info!(
        index,
        task = %command.description,
        cmd = %command.command,
        "starting process"
    );

    let mut cmd = if cfg!(windows) {
        let mut c = ProcessCommand::new("cmd");
        c.arg("/C").arg(&command.command);
        c
    } else {
        let mut c = ProcessCommand::new("sh");
        c.arg("-c").arg(&command.command);
        c
    };

    if let Some(dir) = &command.working_directory {
        cmd.current_dir(dir);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for '{}'", command.description))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let mut result = ExecutionResult::for_command(command, ExecutionStatus::Success);

    let work = async {
        let (out, err, status) = tokio::join!(
            pump(stdout, OutputStream::Stdout, output.clone()),
            pump(stderr, OutputStream::Stderr, output.clone()),
            child.wait(),
        );
        (out, err, status)
    };

    let finished = match command.timeout {
        Some(limit) => tokio::time::timeout(limit, work).await.ok(),
        None => Some(work.await),
    };

    let Some((out, err, status)) = finished else {
        let limit = command.timeout.unwrap_or_default();
        warn!(
            index,
            task = %command.description,
            timeout_ms = limit.as_millis() as u64,
            "process timed out; killing"
        );
        if let Err(e) = child.kill().await {
            warn!(index, error = %e, "failed to kill timed-out process");
        }
        result.result = ExecutionStatus::Error;
        result.error = Some(format!("Command timed out after {}", describe_limit(limit)));
        return Ok(result);
    };

    result.output = out.context("reading process stdout")?;
    result.errors = err.context("reading process stderr")?;
    let status = status.context("waiting for process")?;

    let code = status.code().unwrap_or(-1);
    info!(
        index,
        task = %command.description,
        exit_code = code,
        success = status.success(),
        "process exited"
    );

    if !status.success() {
        result.result = ExecutionStatus::Error;
        result.error = Some(format!("Command exited with code {code}"));
    }

    Ok(result)
}

/// Forward a pipe to `output` chunk by chunk, returning the captured text
/// (capped to the last [`MAX_BUFFER_BYTES`]).
async fn pump<R: AsyncRead + Unpin>(
    reader: Option<R>,
    stream: OutputStream,
    output: OutputSender,
) -> std::io::Result<String> {
    let Some(mut reader) = reader else {
        return Ok(String::new());
    };

    let mut captured = String::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&buf[..n]);
        let text = take_utf8(&mut pending);
        if text.is_empty() {
            continue;
        }
        push_capped(&mut captured, &text);
        if output.send(OutputChunk { stream, text }).await.is_err() {
            debug!(?stream, "output receiver dropped; still draining pipe");
        }
    }

    if !pending.is_empty() {
        let text = String::from_utf8_lossy(&pending).into_owned();
        push_capped(&mut captured, &text);
        let _ = output.send(OutputChunk { stream, text }).await;
    }

    Ok(captured)
}

/// Take the longest decodable prefix of `pending`, leaving an incomplete
/// trailing UTF-8 sequence in place for the next read.
fn take_utf8(pending: &mut Vec<u8>) -> String {
    match std::str::from_utf8(pending) {
        Ok(s) => {
            let text = s.to_owned();
            pending.clear();
            text
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let rest = pending.split_off(valid);
            let text = String::from_utf8_lossy(pending).into_owned();
            *pending = rest;
            text
        }
        Err(_) => {
            let text = String::from_utf8_lossy(pending).into_owned();
            pending.clear();
            text
        }
    }
}

fn describe_limit(limit: Duration) -> String {
    if limit < Duration::from_secs(1) {
        format!("{} ms", limit.as_millis())
    } else {
        format_duration(limit.as_millis() as u64)
    }
}

fn push_capped(captured: &mut String, text: &str) {
    captured.push_str(text);
    if captured.len() > MAX_BUFFER_BYTES {
        let mut cut = captured.len() - MAX_BUFFER_BYTES;
        while !captured.is_char_boundary(cut) {
            cut += 1;
        }
        captured.drain(..cut);
    }
}
