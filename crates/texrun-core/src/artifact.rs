/*
 * artifact.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Produced output data and the per-run artifact cache.
 */

//! Produced output data and the per-run artifact cache.
//!
//! Every format produced during a run is stored once, under the
//! [`CanonicalKey`] of its canonical [`FormatSpec`], and handed out as a
//! shared [`Artifact`] view for the lifetime of the run.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use hashlink::LinkedHashMap;

use crate::error::{Error, Result};
use crate::format::{CanonicalKey, FormatSpec};

/// Immutable produced data, cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    content: Arc<[u8]>,
}

impl Artifact {
    /// Create an artifact from bytes.
    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: Arc::from(content.into()),
        }
    }

    /// The data.
    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// The data as UTF-8 text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the artifact holds no data.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl Deref for Artifact {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.content
    }
}

impl AsRef<[u8]> for Artifact {
    fn as_ref(&self) -> &[u8] {
        &self.content
    }
}

impl From<Vec<u8>> for Artifact {
    fn from(content: Vec<u8>) -> Self {
        Self::from_bytes(content)
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("len", &self.content.len())
            .finish()
    }
}

/// Produced artifacts of one run, in production order.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    entries: LinkedHashMap<CanonicalKey, (FormatSpec, Artifact)>,
}

impl ArtifactCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the artifact stored for a canonical format.
    pub fn get(&self, canonical: &FormatSpec) -> Option<&Artifact> {
        self.entries
            .get(&canonical.canonical_key())
            .map(|(_, artifact)| artifact)
    }

    /// Whether an artifact is stored for a canonical format.
    pub fn contains(&self, canonical: &FormatSpec) -> bool {
        self.entries.contains_key(&canonical.canonical_key())
    }

    /// Store an artifact for a canonical format.
    ///
    /// Each canonical format is produced at most once per run, so storing
    /// one twice is an error and leaves the existing entry untouched.
    pub fn insert(&mut self, canonical: FormatSpec, artifact: Artifact) -> Result<()> {
        let key = canonical.canonical_key();
        if self.entries.contains_key(&key) {
            return Err(Error::cache_invariant_violation(key.to_string()));
        }
        tracing::trace!(format = %canonical, bytes = artifact.len(), "Caching artifact");
        self.entries.insert(key, (canonical, artifact));
        Ok(())
    }

    /// Canonical formats currently cached, oldest first.
    pub fn formats(&self) -> Vec<FormatSpec> {
        self.entries.values().map(|(spec, _)| spec.clone()).collect()
    }

    /// Number of cached artifacts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
