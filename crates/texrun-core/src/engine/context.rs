/*
 * engine/context.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Views of a run handed to backends during compile and produce.
 */

//! Views of a run handed to backends during compile and produce.
//!
//! Backends never see the run's lock or its public API. They get a context
//! that borrows what the run already holds under its lock, so recursive
//! requests for other formats cannot deadlock.

use crate::artifact::{Artifact, ArtifactCache};
use crate::error::Result;
use crate::format::{FormatProvider, FormatSpec};
use crate::input::Input;
use crate::settings::Settings;

use super::traits::RunImplementation;

/// Passed to [`RunImplementation::compile`].
pub struct CompileContext<'a> {
    input: &'a Input,
    settings: &'a Settings,
    cache: &'a mut ArtifactCache,
}

impl<'a> CompileContext<'a> {
    pub(crate) fn new(
        input: &'a Input,
        settings: &'a Settings,
        cache: &'a mut ArtifactCache,
    ) -> Self {
        Self {
            input,
            settings,
            cache,
        }
    }

    /// The input being compiled.
    pub fn input(&self) -> &Input {
        self.input
    }

    /// Settings of the run.
    pub fn settings(&self) -> &Settings {
        self.settings
    }

    /// Register data obtained while compiling under a canonical format.
    ///
    /// Storing the same canonical format twice is an error.
    pub fn store_to_cache(
        &mut self,
        canonical: FormatSpec,
        data: impl Into<Vec<u8>>,
    ) -> Result<Artifact> {
        store(self.cache, canonical, data.into())
    }
}

/// Passed to [`RunImplementation::produce`].
pub struct ProduceContext<'a> {
    input: &'a Input,
    settings: &'a Settings,
    backend: &'a dyn RunImplementation,
    cache: &'a mut ArtifactCache,
}

impl<'a> ProduceContext<'a> {
    /// The input being compiled.
    pub fn input(&self) -> &Input {
        self.input
    }

    /// Settings of the run.
    pub fn settings(&self) -> &Settings {
        self.settings
    }

    /// Canonical form of `spec` according to this run's backend.
    pub fn canonical_format(&self, spec: impl Into<FormatSpec>) -> Result<FormatSpec> {
        FormatProvider::new(self.backend).canonical_format(&spec.into())
    }

    /// Whether this run's backend can produce `spec`.
    pub fn has_format(&self, spec: impl Into<FormatSpec>) -> Result<bool> {
        FormatProvider::new(self.backend).has_format(&spec.into())
    }

    /// Get another format, from the cache or by producing it now.
    pub fn get_artifact(&mut self, spec: impl Into<FormatSpec>) -> Result<Artifact> {
        get_or_produce(
            self.backend,
            self.input,
            self.settings,
            self.cache,
            &spec.into(),
        )
    }

    /// Register a byproduct under its canonical format.
    ///
    /// Do not store the format currently being produced; the run stores
    /// the returned data itself.
    pub fn store_to_cache(
        &mut self,
        canonical: FormatSpec,
        data: impl Into<Vec<u8>>,
    ) -> Result<Artifact> {
        store(self.cache, canonical, data.into())
    }
}

fn store(cache: &mut ArtifactCache, canonical: FormatSpec, data: Vec<u8>) -> Result<Artifact> {
    tracing::debug!(format = %canonical, bytes = data.len(), "Storing byproduct");
    let artifact = Artifact::from_bytes(data);
    cache.insert(canonical, artifact.clone())?;
    Ok(artifact)
}

/// Canonicalize `spec`, then serve it from `cache` or produce and cache it.
pub(crate) fn get_or_produce(
    backend: &dyn RunImplementation,
    input: &Input,
    settings: &Settings,
    cache: &mut ArtifactCache,
    spec: &FormatSpec,
) -> Result<Artifact> {
    let canonical = FormatProvider::new(backend).canonical_format(spec)?;

    if let Some(artifact) = cache.get(&canonical) {
        tracing::trace!(format = %canonical, "Artifact cache hit");
        return Ok(artifact.clone());
    }

    tracing::debug!(format = %canonical, "Producing format");
    let data = {
        let mut ctx = ProduceContext {
            input,
            settings,
            backend,
            cache: &mut *cache,
        };
        backend.produce(&canonical, &mut ctx)?
    };

    let artifact = Artifact::from_bytes(data);
    cache.insert(canonical, artifact.clone())?;
    Ok(artifact)
}
