/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for compile runs and engines.
 */

//! Error types for compile runs and engines.

use std::fmt;

use texrun_process::ProcessError;
use thiserror::Error;

/// Result type for texrun-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling or producing formats.
#[derive(Debug, Error)]
pub enum Error {
    /// A run was used in the wrong order (programmer error).
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// The requested format cannot be produced by this run.
    #[error(transparent)]
    NoSuchFormat(#[from] NoSuchFormat),

    /// An external tool failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// A backend stored the same canonical format twice.
    #[error("Internal error: cache entry already exists for format {key}")]
    CacheInvariantViolation {
        /// Rendered canonical format
        key: String,
    },

    /// A backend rejected an input or format parameter.
    #[error("Invalid parameter {what}: {message}")]
    InvalidParameter {
        /// The offending parameter
        what: String,
        /// Why it was rejected
        message: String,
    },

    /// An executable could not be located.
    #[error("Cannot find executable {name}: {message}")]
    CannotFindExecutable {
        /// Executable name as requested
        name: String,
        /// Where we looked
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend-specific failure.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl Error {
    /// Create a "no such format" error.
    pub fn no_such_format(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NoSuchFormat(NoSuchFormat::new(format, message))
    }

    /// Create a "cache entry already exists" error.
    pub fn cache_invariant_violation(key: impl Into<String>) -> Self {
        Self::CacheInvariantViolation { key: key.into() }
    }

    /// Create an "invalid parameter" error.
    pub fn invalid_parameter(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create a "cannot find executable" error.
    pub fn cannot_find_executable(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CannotFindExecutable {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Check if this error means "format not available".
    pub fn is_no_such_format(&self) -> bool {
        matches!(self, Error::NoSuchFormat(_))
    }

    /// Check if this error is a usage error.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }
}

/// Methods of a [`CompileRun`](crate::CompileRun) called out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    /// Anything other than `compile()` was called before `compile()`.
    #[error("Usage error: you forgot to call compile()")]
    NotCompiled,

    /// `compile()` was called more than once.
    #[error("Usage error: compile() called twice")]
    CompiledTwice,
}

/// A format is unknown to the backend or not available for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoSuchFormat {
    /// The requested format, rendered
    pub format: String,
    /// Optional reason
    pub message: String,
}

impl NoSuchFormat {
    /// Create a new error; `message` may be empty.
    pub fn new(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for NoSuchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No such format: {}", self.format)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for NoSuchFormat {}
