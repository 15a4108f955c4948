/*
 * texrun-process
 * Copyright (c) 2025 Posit, PBC
 *
 * Synchronous external process execution for texrun engines.
 *
 * Engines drive external tools (latex, dvips, ghostscript, ...) through the
 * ProcessRunner trait. The native runner pumps stdin, stdout and stderr on
 * separate threads while waiting for the child, so large payloads never
 * deadlock on OS pipe buffers.
 */

mod environment;
mod native;
mod options;
mod traits;

pub use environment::{
    EnvDelta, EnvOp, Environment, PATH_SEPARATOR, apply_env_ops, current_environment, parse_environment,
};
pub use native::NativeRunner;
pub use options::RunOptions;
pub use traits::{
    ExitInfo, ExitStatusKind, ProcessError, ProcessExitError, ProcessResult, ProcessRunner,
};

/// Create a default runner for the current platform.
pub fn default_runner() -> NativeRunner {
    NativeRunner::new()
}

/// Run `argv` to completion with the default runner.
///
/// See [`ProcessRunner::run`].
pub fn run<S: AsRef<str>>(argv: &[S], options: &RunOptions) -> ProcessResult<ExitInfo> {
    let argv: Vec<String> = argv.iter().map(|s| s.as_ref().to_string()).collect();
    default_runner().run(&argv, options)
}
