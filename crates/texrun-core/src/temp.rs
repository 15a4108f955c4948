/*
 * temp.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Scratch directories for engine runs.
 */

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;
use crate::settings::Settings;

/// Default name prefix for scratch directories.
pub const DEFAULT_PREFIX: &str = "texrun-tmp-";

const RANDOM_CHARS: usize = 10;

/// A scratch directory that is removed with all its contents on drop.
#[derive(Debug)]
pub struct TemporaryDirectory {
    dir: TempDir,
}

impl TemporaryDirectory {
    /// Create a scratch directory in `parent`, or in the system temporary
    /// directory when `parent` is `None`.
    pub fn new_in(parent: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix).rand_bytes(RANDOM_CHARS);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        tracing::trace!(path = %dir.path().display(), "Created temporary directory");
        Ok(Self { dir })
    }

    /// Create a scratch directory where `settings` says scratch space lives.
    pub fn for_settings(settings: &Settings) -> Result<Self> {
        Self::new_in(settings.temporary_directory.as_deref(), DEFAULT_PREFIX)
    }

    /// Location of the directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Keep the directory on disk and return its path.
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}

impl AsRef<Path> for TemporaryDirectory {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}
