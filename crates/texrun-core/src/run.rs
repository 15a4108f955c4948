/*
 * run.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * One compilation of one input, with lazily produced output formats.
 */

//! One compilation of one input, with lazily produced output formats.
//!
//! A [`CompileRun`] moves from *not compiled* to *compiled* exactly once.
//! After that, every requested format is canonicalized and produced at most
//! once; later requests for any equivalent format are served from the run's
//! cache.
//!
//! ```ignore
//! let run = engine.run(Input::new("a^2+b^2=c^2"))?;
//! run.compile()?;
//! let png = run.get_artifact(FormatSpec::new("PNG").with_parameter("dpi", 300))?;
//! let best = run.find_format(["SVG", "PDF", "PNG"])?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::artifact::{Artifact, ArtifactCache};
use crate::engine::context::get_or_produce;
use crate::engine::{CompileContext, RunImplementation};
use crate::error::{Error, Result, UsageError};
use crate::format::{FormatDescription, FormatProvider, FormatSpec};
use crate::input::Input;
use crate::settings::Settings;

/// A compilation of one [`Input`] with fixed [`Settings`].
///
/// # Thread Safety
///
/// A run may be shared between threads. All operations on one run are
/// serialized by a single lock held for their whole duration, which is what
/// guarantees that no canonical format is produced twice.
pub struct CompileRun {
    engine_name: String,
    input: Input,
    settings: Settings,
    compiled: AtomicBool,
    state: Mutex<RunState>,
}

struct RunState {
    backend: Box<dyn RunImplementation>,
    cache: ArtifactCache,
}

impl CompileRun {
    /// Create a run around a backend. Usually done by
    /// [`Engine::run`](crate::Engine::run).
    pub fn new(
        engine_name: impl Into<String>,
        input: Input,
        settings: Settings,
        backend: Box<dyn RunImplementation>,
    ) -> Self {
        Self {
            engine_name: engine_name.into(),
            input,
            settings,
            compiled: AtomicBool::new(false),
            state: Mutex::new(RunState {
                backend,
                cache: ArtifactCache::new(),
            }),
        }
    }

    /// Name of the engine that created this run.
    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    /// The input being compiled.
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Settings captured when the run was created.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether `compile()` has completed successfully.
    pub fn compiled(&self) -> bool {
        self.compiled.load(Ordering::Acquire)
    }

    /// Run the backend's compile step.
    ///
    /// Fails with [`UsageError::CompiledTwice`] if the run is already
    /// compiled. If the backend fails, the run stays uncompiled.
    pub fn compile(&self) -> Result<()> {
        if self.compiled() {
            return Err(UsageError::CompiledTwice.into());
        }

        let mut guard = self.lock();
        // Another caller may have compiled while we waited for the lock.
        if self.compiled() {
            return Err(UsageError::CompiledTwice.into());
        }

        tracing::info!(engine = %self.engine_name, "Compiling");
        let RunState { backend, cache } = &mut *guard;
        let mut ctx = CompileContext::new(&self.input, &self.settings, cache);
        if let Err(e) = backend.compile(&mut ctx) {
            tracing::warn!(engine = %self.engine_name, error = %e, "Compilation failed");
            return Err(e);
        }

        self.compiled.store(true, Ordering::Release);
        tracing::info!(
            engine = %self.engine_name,
            byproducts = cache.len(),
            "Compilation finished"
        );
        Ok(())
    }

    /// Whether `spec` can be produced by this run.
    pub fn has_format(&self, spec: impl Into<FormatSpec>) -> Result<bool> {
        let guard = self.compiled_lock()?;
        FormatProvider::new(&*guard.backend).has_format(&spec.into())
    }

    /// Formats the backend advertises. Advisory only.
    pub fn available_formats(&self) -> Result<Vec<FormatDescription>> {
        let guard = self.compiled_lock()?;
        Ok(guard.backend.available_formats())
    }

    /// Canonical form of `spec`, or [`Error::NoSuchFormat`].
    pub fn canonical_format(&self, spec: impl Into<FormatSpec>) -> Result<FormatSpec> {
        let guard = self.compiled_lock()?;
        FormatProvider::new(&*guard.backend).canonical_format(&spec.into())
    }

    /// Canonical form of `spec`, or the empty spec if it is not available.
    pub fn canonical_format_or_empty(&self, spec: impl Into<FormatSpec>) -> Result<FormatSpec> {
        let guard = self.compiled_lock()?;
        FormatProvider::new(&*guard.backend).canonical_format_or_empty(&spec.into())
    }

    /// Canonical form of the first available candidate.
    pub fn find_format<I>(&self, candidates: I) -> Result<FormatSpec>
    where
        I: IntoIterator,
        I::Item: Into<FormatSpec>,
    {
        let guard = self.compiled_lock()?;
        FormatProvider::new(&*guard.backend).find_format(candidates)
    }

    /// Data for `spec`, produced on first request and cached afterwards.
    pub fn get_artifact(&self, spec: impl Into<FormatSpec>) -> Result<Artifact> {
        let mut guard = self.compiled_lock()?;
        let RunState { backend, cache } = &mut *guard;
        get_or_produce(
            &**backend,
            &self.input,
            &self.settings,
            cache,
            &spec.into(),
        )
    }

    /// Like [`get_artifact`](Self::get_artifact), but returns an owned copy.
    pub fn get_artifact_owned(&self, spec: impl Into<FormatSpec>) -> Result<Vec<u8>> {
        Ok(self.get_artifact(spec)?.to_vec())
    }

    /// Canonical formats in the cache, in the order they were stored.
    pub fn cached_formats(&self) -> Result<Vec<FormatSpec>> {
        let guard = self.compiled_lock()?;
        Ok(guard.cache.formats())
    }

    fn compiled_lock(&self) -> Result<MutexGuard<'_, RunState>> {
        if !self.compiled() {
            return Err(Error::Usage(UsageError::NotCompiled));
        }
        Ok(self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        // A panicking backend leaves the cache consistent: entries are only
        // inserted after production succeeds.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for CompileRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileRun")
            .field("engine", &self.engine_name)
            .field("compiled", &self.compiled())
            .finish_non_exhaustive()
    }
}
