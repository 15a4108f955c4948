/*
 * engine/traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Backend traits implemented by concrete engines.
 */

//! Backend traits implemented by concrete engines.

use crate::error::Result;
use crate::format::{FormatDescription, FormatSpec};
use crate::input::Input;
use crate::settings::Settings;

use super::context::{CompileContext, ProduceContext};

/// Backend for one compilation, created by a [`RunFactory`].
///
/// A [`CompileRun`](crate::CompileRun) drives its implementation through a
/// fixed protocol: `compile` exactly once, then any number of
/// `make_canonical` and `produce` calls. The run serializes every call, so
/// implementations need not be `Sync`.
///
/// # Implementation Notes
///
/// - `produce` is only called with canonical formats not yet in the cache.
/// - To build on another format (e.g. PNG from PDF), call
///   [`ProduceContext::get_artifact`]; it is served from the cache or
///   produced recursively.
/// - Formats obtained as a byproduct of other work should be registered with
///   `store_to_cache` so they are never produced twice.
///
/// # Example
///
/// ```ignore
/// struct EchoRun { latex: String }
///
/// impl RunImplementation for EchoRun {
///     fn compile(&mut self, ctx: &mut CompileContext<'_>) -> Result<()> {
///         self.latex = ctx.input().latex.clone();
///         Ok(())
///     }
///
///     fn make_canonical(&self, spec: &FormatSpec, _check_only: bool) -> Result<FormatSpec> {
///         Ok(if spec.name == "TEX" { FormatSpec::new("TEX") } else { FormatSpec::empty() })
///     }
///
///     fn produce(&self, _canonical: &FormatSpec, _ctx: &mut ProduceContext<'_>) -> Result<Vec<u8>> {
///         Ok(self.latex.clone().into_bytes())
///     }
/// }
/// ```
pub trait RunImplementation: Send {
    /// Do the expensive work shared by all formats.
    ///
    /// Called exactly once, before anything else. An error leaves the run
    /// uncompiled.
    fn compile(&mut self, ctx: &mut CompileContext<'_>) -> Result<()>;

    /// Formats this run can typically produce.
    ///
    /// Advisory only: a listed format may still turn out to be unavailable,
    /// and canonicalization may accept formats not listed here.
    fn available_formats(&self) -> Vec<FormatDescription> {
        Vec::new()
    }

    /// Map `spec` to its canonical equivalent.
    ///
    /// Equivalent specs must map to the same canonical spec, and a canonical
    /// spec must map to itself. For an unavailable format, return either the
    /// empty spec or [`Error::NoSuchFormat`](crate::Error::NoSuchFormat).
    ///
    /// With `check_only` the caller only wants to know whether the format is
    /// available; any non-empty spec may be returned.
    fn make_canonical(&self, spec: &FormatSpec, check_only: bool) -> Result<FormatSpec>;

    /// Produce the data for a canonical format.
    fn produce(&self, canonical: &FormatSpec, ctx: &mut ProduceContext<'_>) -> Result<Vec<u8>>;
}

/// Creates [`RunImplementation`]s for an [`Engine`](super::Engine).
pub trait RunFactory: Send + Sync {
    /// Engine name, used for registry lookup and diagnostics.
    fn name(&self) -> &str;

    /// Create the backend for one compilation.
    fn create_run_implementation(
        &self,
        input: &Input,
        settings: &Settings,
    ) -> Result<Box<dyn RunImplementation>>;

    /// Hook run when new settings are installed.
    ///
    /// The factory may normalize fields and rebuild any handle it derives
    /// from the settings (e.g. a Ghostscript interface). Default: no changes.
    fn adjust_for_new_settings(&mut self, _settings: &mut Settings) -> Result<()> {
        Ok(())
    }
}
