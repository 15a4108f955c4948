/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Options for a single process invocation.
 */

use std::path::PathBuf;

use crate::environment::{EnvOp, Environment};

/// Options for running one external process.
///
/// Defaults:
/// - the executable is `argv[0]`
/// - the working directory is inherited
/// - the environment is inherited unchanged
/// - stdin is empty (the child sees EOF immediately)
/// - stdout and stderr go to the parent's stdout and stderr
/// - a nonzero exit is an error
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Program to start instead of `argv[0]`.
    pub executable: Option<PathBuf>,

    /// Working directory of the child.
    pub cwd: Option<PathBuf>,

    /// Data written to the child's stdin, which is then closed.
    pub stdin: Option<Vec<u8>>,

    /// Capture the child's stdout instead of inheriting it.
    pub capture_stdout: bool,

    /// Capture the child's stderr instead of inheriting it.
    pub capture_stderr: bool,

    /// Environment transforms, applied in order to the inherited environment.
    pub env_ops: Vec<EnvOp>,

    /// Turn a nonzero exit or an abnormal termination into an error.
    pub check_exit_code: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            executable: None,
            cwd: None,
            stdin: None,
            capture_stdout: false,
            capture_stderr: false,
            env_ops: Vec::new(),
            check_exit_code: true,
        }
    }
}

impl RunOptions {
    /// Create options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `executable` instead of `argv[0]`.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    /// Run the child in `cwd`.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Feed `data` to the child's stdin.
    pub fn with_stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    /// Capture the child's stdout.
    pub fn with_capture_stdout(mut self, capture: bool) -> Self {
        self.capture_stdout = capture;
        self
    }

    /// Capture the child's stderr.
    pub fn with_capture_stderr(mut self, capture: bool) -> Self {
        self.capture_stderr = capture;
        self
    }

    /// Capture both stdout and stderr.
    pub fn capture_output(self) -> Self {
        self.with_capture_stdout(true).with_capture_stderr(true)
    }

    /// Whether a nonzero exit should be an error.
    pub fn with_check_exit_code(mut self, check: bool) -> Self {
        self.check_exit_code = check;
        self
    }

    /// Append an environment transform.
    pub fn with_env_op(mut self, op: EnvOp) -> Self {
        self.env_ops.push(op);
        self
    }

    /// Append several environment transforms.
    pub fn with_env_ops(mut self, ops: impl IntoIterator<Item = EnvOp>) -> Self {
        self.env_ops.extend(ops);
        self
    }

    /// Start from an empty environment instead of the inherited one.
    pub fn clear_env(self) -> Self {
        self.with_env_op(EnvOp::Clear)
    }

    /// Set environment variables for the child.
    pub fn set_env<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with_env_op(EnvOp::set(vars))
    }

    /// Set environment variables that are not already defined.
    pub fn provide_env<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with_env_op(EnvOp::provide(vars))
    }

    /// Remove environment variables.
    pub fn remove_env<I, K>(self, names: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.with_env_op(EnvOp::remove(names))
    }

    /// Prepend entries to PATH-like variables.
    pub fn prepend_path<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with_env_op(EnvOp::prepend_path(vars))
    }

    /// Append entries to PATH-like variables.
    pub fn append_path<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with_env_op(EnvOp::append_path(vars))
    }

    /// The environment the child should receive, if it differs from the
    /// inherited one.
    pub fn child_environment(&self, inherited: &Environment) -> Option<Environment> {
        if self.env_ops.is_empty() {
            None
        } else {
            Some(crate::environment::apply_env_ops(inherited, &self.env_ops))
        }
    }
}
