/*
 * traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Defines the ProcessRunner trait and supporting types for running external tools.
 *
 * Engines call external programs (latex, dvips, gs, ...) through this trait so
 * that tests can substitute a scripted runner for the native one.
 */

use std::fmt;
use std::io;

use crate::options::RunOptions;

/// Result type for process operations
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Errors that can occur while running an external process
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// No program was given
    #[error("Cannot run a process with an empty argv")]
    EmptyArgv,

    /// The program could not be started
    #[error("Failed to start process {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// I/O error while waiting on the child
    #[error("I/O error while running process: {0}")]
    Io(#[from] io::Error),

    /// I/O error while feeding or draining one of the child's pipes
    #[error("I/O error on child {stream}: {source}")]
    Pipe {
        /// `stdin`, `stdout` or `stderr`
        stream: &'static str,
        /// Underlying OS error
        #[source]
        source: io::Error,
        /// Whatever stdout was captured before the failure
        stdout: Option<Vec<u8>>,
        /// Whatever stderr was captured before the failure
        stderr: Option<Vec<u8>>,
    },

    /// One of the pipe pump threads panicked
    #[error("Process {0} thread panicked")]
    ThreadPanicked(&'static str),

    /// The program exited unsuccessfully
    #[error(transparent)]
    Exit(#[from] ProcessExitError),
}

impl ProcessError {
    /// Create a "spawn failed" error.
    pub fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// The exit error, if this error is due to the process exit status.
    pub fn as_exit_error(&self) -> Option<&ProcessExitError> {
        match self {
            ProcessError::Exit(e) => Some(e),
            _ => None,
        }
    }
}

/// How a child process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatusKind {
    /// Normal exit with the given code
    Code(i32),
    /// Terminated by the given signal (Unix only)
    Signal(i32),
    /// The platform reported neither a code nor a signal
    Unknown,
}

impl ExitStatusKind {
    /// Whether this is a normal exit with code 0
    pub fn success(&self) -> bool {
        matches!(self, ExitStatusKind::Code(0))
    }

    /// The exit code, for a normal exit
    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatusKind::Code(code) => Some(*code),
            _ => None,
        }
    }

    /// The terminating signal, for an abnormal termination
    pub fn signal(&self) -> Option<i32> {
        match self {
            ExitStatusKind::Signal(signal) => Some(*signal),
            _ => None,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatusKind {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitStatusKind::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt as _;
            if let Some(signal) = status.signal() {
                return ExitStatusKind::Signal(signal);
            }
        }
        ExitStatusKind::Unknown
    }
}

impl fmt::Display for ExitStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatusKind::Code(code) => write!(f, "exit code {}", code),
            ExitStatusKind::Signal(signal) => write!(f, "signal {}", signal),
            ExitStatusKind::Unknown => write!(f, "unknown status"),
        }
    }
}

/// Outcome of a process run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitInfo {
    /// How the process terminated
    pub status: ExitStatusKind,
    /// Captured standard output (`None` if not captured)
    pub stdout: Option<Vec<u8>>,
    /// Captured standard error (`None` if not captured)
    pub stderr: Option<Vec<u8>>,
}

impl ExitInfo {
    /// Check if the command succeeded (exit code 0)
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// The exit code, if the process exited normally
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Get stdout as a string (lossy UTF-8 conversion, empty if not captured)
    pub fn stdout_string(&self) -> String {
        lossy(self.stdout.as_deref())
    }

    /// Get stderr as a string (lossy UTF-8 conversion, empty if not captured)
    pub fn stderr_string(&self) -> String {
        lossy(self.stderr.as_deref())
    }
}

fn lossy(data: Option<&[u8]>) -> String {
    data.map(|d| String::from_utf8_lossy(d).into_owned())
        .unwrap_or_default()
}

/// A process exited with a nonzero code or was terminated abnormally.
///
/// Whatever output was captured is kept and included in the error message,
/// so a tool failure can be diagnosed from the error alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExitError {
    /// Program that was run
    pub program: String,
    /// How it terminated
    pub status: ExitStatusKind,
    /// Captured standard output, if requested
    pub stdout: Option<Vec<u8>>,
    /// Captured standard error, if requested
    pub stderr: Option<Vec<u8>>,
}

impl ProcessExitError {
    /// Captured stderr as a string (lossy, empty if not captured)
    pub fn stderr_string(&self) -> String {
        lossy(self.stderr.as_deref())
    }

    /// Captured stdout as a string (lossy, empty if not captured)
    pub fn stdout_string(&self) -> String {
        lossy(self.stdout.as_deref())
    }
}

impl fmt::Display for ProcessExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            ExitStatusKind::Code(code) => {
                write!(f, "Process {} exited with code {}", self.program, code)?
            }
            ExitStatusKind::Signal(signal) => write!(
                f,
                "Process {} terminated with signal {}",
                self.program, signal
            )?,
            ExitStatusKind::Unknown => write!(f, "Process {} did not exit normally", self.program)?,
        }
        f.write_str(&output_suffix(self.stdout.as_deref(), self.stderr.as_deref()))
    }
}

impl std::error::Error for ProcessExitError {}

/// Format captured output for inclusion in an error message.
fn output_suffix(stdout: Option<&[u8]>, stderr: Option<&[u8]>) -> String {
    let out = stdout.filter(|d| !d.is_empty());
    let err = stderr.filter(|d| !d.is_empty());
    match (out, err) {
        (Some(out), Some(err)) => format!(
            ":\n*** output: ***\n{}\n*** error: ***\n{}",
            String::from_utf8_lossy(out),
            String::from_utf8_lossy(err)
        ),
        (Some(data), None) | (None, Some(data)) => {
            format!(":\n{}", String::from_utf8_lossy(data))
        }
        (None, None) => " [no output or output not captured]".to_string(),
    }
}

/// Trait for running one external program to completion.
///
/// Implementations must feed stdin and drain captured output concurrently
/// with waiting on the child, so that arbitrarily large payloads never
/// deadlock on bounded OS pipe buffers.
pub trait ProcessRunner: Send + Sync {
    /// Run `argv` to completion with the given options.
    ///
    /// `argv[0]` is the program name seen by the child. The program actually
    /// started is `options.executable` if set, `argv[0]` otherwise.
    ///
    /// With `options.check_exit_code` set (the default), a nonzero exit or an
    /// abnormal termination is reported as [`ProcessError::Exit`].
    fn run(&self, argv: &[String], options: &RunOptions) -> ProcessResult<ExitInfo>;
}
