//! Tool Invoker: one executable, one root, captured output.

use camino::Utf8PathBuf;
use fanout_types::{
    FileArgs, InvocationResult, Outcome, OutputLine, ProjectRoot, Stream, ToolSpec,
};
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::{CancelToken, InvokeError};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to keep collecting output after the process is gone. Descendants that inherited
/// the pipes can keep them open indefinitely; output they write after this is dropped.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Runs a [`ToolSpec`] in a project root.
///
/// Safe to share across worker threads; each call owns its child process.
#[derive(Clone, Debug, Default)]
pub struct Invoker {
    cancel: CancelToken,
}

enum Ending {
    Exited(ExitStatus),
    TimedOut(Duration),
    Cancelled,
}

impl Invoker {
    pub fn new(cancel: CancelToken) -> Self {
        Self { cancel }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run `spec` with the working directory set to `root`.
    ///
    /// Never fails: problems starting or waiting on the process become
    /// [`Outcome::InvocationError`]. A cancelled run yields [`Outcome::Interrupted`] with
    /// its output discarded.
    pub fn invoke(
        &self,
        root: &ProjectRoot,
        files: &[Utf8PathBuf],
        spec: &ToolSpec,
    ) -> InvocationResult {
        let start = Instant::now();
        if self.cancel.is_cancelled() {
            return InvocationResult::interrupted(Duration::ZERO, 0);
        }
        match self.run(root, files, spec, start) {
            Ok(result) => result,
            Err(err) => {
                warn!(root = %root, "invocation error: {err}");
                InvocationResult::invocation_error(err.to_string(), start.elapsed())
            }
        }
    }

    fn run(
        &self,
        root: &ProjectRoot,
        files: &[Utf8PathBuf],
        spec: &ToolSpec,
        start: Instant,
    ) -> Result<InvocationResult, InvokeError> {
        if !root.path().is_dir() {
            return Err(InvokeError::MissingRoot(root.path().to_path_buf()));
        }

        let args = command_args(root, files, spec);
        debug!(root = %root, program = %spec.program, ?args, "spawning");

        let mut child = Command::new(&spec.program)
            .args(&args)
            .current_dir(root.path())
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InvokeError::Spawn {
                program: spec.program.clone(),
                root: root.path().to_path_buf(),
                source,
            })?;

        let (tx, rx) = mpsc::channel();
        let capture = attach_readers(&mut child, &tx, &spec.program);
        drop(tx);
        if let Err(err) = capture {
            let _ = child.kill();
            let _ = child.wait();
            return Err(err);
        }

        let mut output = Vec::new();
        let ending = self.supervise(&mut child, &rx, &mut output, spec, start);
        let ending = match ending {
            Ok(ending) => ending,
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(InvokeError::Wait {
                    program: spec.program.clone(),
                    source,
                });
            }
        };
        drain(&rx, &mut output);
        let duration = start.elapsed();

        let result = match ending {
            Ending::Cancelled => {
                debug!(root = %root, "cancelled");
                InvocationResult::interrupted(duration, 1)
            }
            Ending::TimedOut(limit) => {
                output.push(OutputLine::stderr(format!(
                    "fanout: `{}` timed out after {:.1}s and was killed",
                    spec.program,
                    limit.as_secs_f64()
                )));
                InvocationResult {
                    outcome: Outcome::TimedOut,
                    exit_code: None,
                    output,
                    duration,
                    attempts: 1,
                }
            }
            Ending::Exited(status) => InvocationResult {
                outcome: if status.success() {
                    Outcome::Succeeded
                } else {
                    Outcome::Failed
                },
                exit_code: status.code(),
                output,
                duration,
                attempts: 1,
            },
        };
        Ok(result)
    }

    /// Poll the child until it exits, times out, or the run is cancelled, collecting output
    /// as it arrives.
    fn supervise(
        &self,
        child: &mut Child,
        rx: &Receiver<OutputLine>,
        output: &mut Vec<OutputLine>,
        spec: &ToolSpec,
        start: Instant,
    ) -> std::io::Result<Ending> {
        loop {
            output.extend(rx.try_iter());

            if let Some(status) = child.try_wait()? {
                return Ok(Ending::Exited(status));
            }

            if self.cancel.is_cancelled() {
                let _ = child.kill();
                child.wait()?;
                return Ok(Ending::Cancelled);
            }

            if let Some(limit) = spec.timeout
                && start.elapsed() >= limit
            {
                warn!(program = %spec.program, ?limit, "timed out; killing");
                let _ = child.kill();
                child.wait()?;
                return Ok(Ending::TimedOut(limit));
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// The spec's arguments, plus the group's files relative to `root` when the hook takes them.
fn command_args(root: &ProjectRoot, files: &[Utf8PathBuf], spec: &ToolSpec) -> Vec<String> {
    let mut args = spec.args.clone();
    if spec.file_args == FileArgs::Append {
        args.extend(files.iter().map(|f| match f.strip_prefix(root.path()) {
            Ok(rel) => rel.to_string(),
            Err(_) => f.to_string(),
        }));
    }
    args
}

fn attach_readers(
    child: &mut Child,
    tx: &Sender<OutputLine>,
    program: &str,
) -> Result<(), InvokeError> {
    let stdout = child.stdout.take().ok_or_else(|| InvokeError::Capture {
        program: program.to_string(),
        stream: "stdout",
    })?;
    let stderr = child.stderr.take().ok_or_else(|| InvokeError::Capture {
        program: program.to_string(),
        stream: "stderr",
    })?;
    spawn_reader(stdout, Stream::Stdout, tx.clone());
    spawn_reader(stderr, Stream::Stderr, tx.clone());
    Ok(())
}

/// Forward lines from `pipe` until EOF. Invalid UTF-8 is replaced, not rejected.
fn spawn_reader<R: Read + Send + 'static>(pipe: R, stream: Stream, tx: Sender<OutputLine>) {
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n' | b'\r')) {
                        buf.pop();
                    }
                    let line = OutputLine {
                        stream,
                        text: String::from_utf8_lossy(&buf).into_owned(),
                    };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn drain(rx: &Receiver<OutputLine>, output: &mut Vec<OutputLine>) {
    loop {
        match rx.recv_timeout(DRAIN_GRACE) {
            Ok(line) => output.push(line),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                debug!("output pipes still open after exit; dropping the rest");
                break;
            }
        }
    }
}
