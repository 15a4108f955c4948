/*
 * native.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * ProcessRunner implementation on top of std::process.
 */

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::{self, ScopedJoinHandle};

use crate::environment::EnvDelta;
use crate::options::RunOptions;
use crate::traits::{
    ExitInfo, ExitStatusKind, ProcessError, ProcessExitError, ProcessResult, ProcessRunner,
};

/// Runs processes directly on the host OS.
///
/// stdin is fed from one thread, each captured stream is drained by its own
/// thread, and the calling thread waits on the child meanwhile. All threads
/// are joined before returning, on success and on failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRunner;

impl NativeRunner {
    /// Create a new native runner.
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for NativeRunner {
    fn run(&self, argv: &[String], options: &RunOptions) -> ProcessResult<ExitInfo> {
        let Some((argv0, args)) = argv.split_first() else {
            return Err(ProcessError::EmptyArgv);
        };
        let program = options
            .executable
            .clone()
            .unwrap_or_else(|| PathBuf::from(argv0));
        let program_name = program.display().to_string();

        let mut cmd = Command::new(&program);
        cmd.args(args);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt as _;
            cmd.arg0(argv0);
        }

        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        let delta = EnvDelta::from_ops(&options.env_ops, |name| std::env::var_os(name));
        if delta.clear {
            cmd.env_clear();
        }
        for (name, value) in &delta.vars {
            match value {
                Some(value) => cmd.env(name, value),
                None => cmd.env_remove(name),
            };
        }

        cmd.stdin(if options.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(if options.capture_stdout {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        cmd.stderr(if options.capture_stderr {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });

        tracing::debug!(
            program = %program_name,
            args = args.len(),
            cwd = ?options.cwd,
            stdin_bytes = options.stdin.as_ref().map_or(0, Vec::len),
            "Spawning process"
        );

        let mut child = cmd
            .spawn()
            .map_err(|e| ProcessError::spawn(program_name.clone(), e))?;

        let pumped = pump_and_wait(&mut child, options.stdin.as_deref());

        let Pumped {
            status,
            stdout,
            stderr,
        } = pumped?;

        tracing::debug!(program = %program_name, %status, "Process finished");

        if options.check_exit_code && !status.success() {
            tracing::warn!(program = %program_name, %status, "Process failed");
            return Err(ProcessExitError {
                program: program_name,
                status,
                stdout,
                stderr,
            }
            .into());
        }

        Ok(ExitInfo {
            status,
            stdout,
            stderr,
        })
    }
}

struct Pumped {
    status: ExitStatusKind,
    stdout: Option<Vec<u8>>,
    stderr: Option<Vec<u8>>,
}

/// Feed stdin and drain stdout/stderr concurrently while waiting for `child`.
fn pump_and_wait(child: &mut Child, stdin_data: Option<&[u8]>) -> ProcessResult<Pumped> {
    let stdin_pipe = child.stdin.take();
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let (status, fed, stdout, stderr) = thread::scope(|scope| {
        let feeder = stdin_pipe.map(|pipe| {
            let data = stdin_data.unwrap_or_default();
            scope.spawn(move || feed(pipe, data))
        });
        let out_reader = stdout_pipe.map(|pipe| scope.spawn(move || drain(pipe)));
        let err_reader = stderr_pipe.map(|pipe| scope.spawn(move || drain(pipe)));

        let status = child.wait();
        if status.is_err() {
            // Unblock the pump threads before the scope joins them.
            let _ = child.kill();
        }

        (
            status,
            join(feeder, "stdin"),
            join(out_reader, "stdout"),
            join(err_reader, "stderr"),
        )
    });

    let status = match status {
        Ok(status) => status,
        Err(e) => {
            // Reap the killed child.
            let _ = child.wait();
            return Err(e.into());
        }
    };
    let (stdout, stderr) = settle_pipes(fed?, stdout?, stderr?)?;

    Ok(Pumped {
        status: status.into(),
        stdout,
        stderr,
    })
}

/// Turn the pump threads' results into the captured output, or into an error
/// that still carries what the healthy streams captured.
fn settle_pipes(
    fed: Option<io::Result<()>>,
    stdout: Option<io::Result<Vec<u8>>>,
    stderr: Option<io::Result<Vec<u8>>>,
) -> ProcessResult<(Option<Vec<u8>>, Option<Vec<u8>>)> {
    let (stdout, stdout_err) = split(stdout);
    let (stderr, stderr_err) = split(stderr);
    let failure = [
        ("stdin", fed.and_then(Result::err)),
        ("stdout", stdout_err),
        ("stderr", stderr_err),
    ]
    .into_iter()
    .find_map(|(stream, err)| err.map(|e| (stream, e)));

    let Some((stream, source)) = failure else {
        return Ok((stdout, stderr));
    };
    tracing::warn!(
        stream,
        error = %source,
        stdout_bytes = stdout.as_ref().map_or(0, Vec::len),
        stderr_bytes = stderr.as_ref().map_or(0, Vec::len),
        "Pipe I/O failed"
    );
    Err(ProcessError::Pipe {
        stream,
        source,
        stdout,
        stderr,
    })
}

fn split<T>(result: Option<io::Result<T>>) -> (Option<T>, Option<io::Error>) {
    match result {
        None => (None, None),
        Some(Ok(value)) => (Some(value), None),
        Some(Err(e)) => (None, Some(e)),
    }
}

/// Write all of `data` to the child, then close its stdin.
///
/// A child that exits or closes stdin before consuming everything is not an
/// error; its exit status tells the rest of the story.
fn feed(mut pipe: impl Write, data: &[u8]) -> io::Result<()> {
    match pipe.write_all(data).and_then(|()| pipe.flush()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Read everything from `pipe` until EOF.
fn drain(mut pipe: impl Read) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Join a pump thread. Only a panic is an error here; I/O results are
/// passed through for [`settle_pipes`].
fn join<T>(
    handle: Option<ScopedJoinHandle<'_, io::Result<T>>>,
    what: &'static str,
) -> ProcessResult<Option<io::Result<T>>> {
    match handle {
        None => Ok(None),
        Some(handle) => handle
            .join()
            .map(Some)
            .map_err(|_| ProcessError::ThreadPanicked(what)),
    }
}
