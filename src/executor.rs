//! Subject process execution.
//!
//! [`SubjectProcess`] is the only seam through which the harness touches an
//! external executable: bytes go in on stdin, an [`ExecutionOutcome`] comes
//! out. [`LocalProcess`] is the `std::process` implementation; tests plug in
//! closures through [`FnSubject`].

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Everything observable about one finished subject run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    /// Process exit status. Signal termination is reported as the negated
    /// signal number on unix and `-1` elsewhere.
    pub exit_code: i32,
}

/// Why a subject run produced no outcome.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The executable could not be started at all. Fatal for the whole run.
    #[error("failed to spawn '{}': {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The process started but talking to it failed.
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("execution timed out after {0:?}")]
    TimedOut(Duration),
}

/// A runnable stage executable.
pub trait SubjectProcess: Send + Sync {
    /// Runs the subject once with `input` on stdin and waits for it to finish.
    fn execute(&self, input: &[u8]) -> Result<ExecutionOutcome, ExecutionError>;
}

/// A subject backed by a closure, for driving the engine without processes.
pub struct FnSubject<F>(pub F);

impl<F> SubjectProcess for FnSubject<F>
where
    F: Fn(&[u8]) -> Result<ExecutionOutcome, ExecutionError> + Send + Sync,
{
    fn execute(&self, input: &[u8]) -> Result<ExecutionOutcome, ExecutionError> {
        (self.0)(input)
    }
}

/// Runs an executable on the local machine, fresh for every call.
#[derive(Debug, Clone)]
pub struct LocalProcess {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl LocalProcess {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn spawn(&self) -> Result<Child, ExecutionError> {
        Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                program: self.program.clone(),
                source,
            })
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, ExecutionError> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait()?);
        };
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if started.elapsed() >= limit {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecutionError::TimedOut(limit));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl SubjectProcess for LocalProcess {
    fn execute(&self, input: &[u8]) -> Result<ExecutionOutcome, ExecutionError> {
        let mut child = self.spawn()?;
        debug!(program = %self.program.display(), pid = child.id(), "spawned subject");

        // Feed stdin and drain both output pipes concurrently so neither side
        // can block on a full pipe buffer.
        let writer = spawn_writer(child.stdin.take(), input.to_vec());
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        // On timeout the pipe threads are left detached: a grandchild may
        // still hold the pipes open after the subject itself was killed.
        let status = self.wait(&mut child)?;
        let stdout = join_pipe(stdout);
        let stderr = join_pipe(stderr);
        let written = join_pipe(writer);

        match written {
            Ok(()) => {}
            // The subject stopped reading before EOF, typically because it
            // rejected the input early. Its outcome is still meaningful.
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                debug!(program = %self.program.display(), "subject closed stdin early");
            }
            Err(err) => return Err(err.into()),
        }

        let outcome = ExecutionOutcome {
            stdout: String::from_utf8_lossy(&stdout?).into_owned(),
            stderr: String::from_utf8_lossy(&stderr?).into_owned(),
            exit_code: exit_code_of(status),
        };
        debug!(exit_code = outcome.exit_code, "subject finished");
        Ok(outcome)
    }
}

fn spawn_writer(stdin: Option<ChildStdin>, input: Vec<u8>) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || {
        if let Some(mut stdin) = stdin {
            stdin.write_all(&input)?;
            stdin.flush()?;
        }
        // Dropping `stdin` closes the pipe and signals end of input.
        Ok(())
    })
}

fn spawn_reader<R>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join_pipe<T>(handle: JoinHandle<io::Result<T>>) -> io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("pipe thread panicked")))
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| -signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
