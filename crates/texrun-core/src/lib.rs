/*
 * texrun-core
 * Copyright (c) 2025 Posit, PBC
 *
 * Compile a LaTeX snippet once, then produce any number of output formats
 * on demand.
 *
 * A backend (RunImplementation) does the actual work. CompileRun wraps it
 * with the usage protocol, format canonicalization and a per-run artifact
 * cache, so that each canonical format is produced at most once even when
 * the run is shared between threads.
 */

pub mod artifact;
pub mod engine;
pub mod error;
pub mod format;
pub mod input;
pub mod run;
pub mod settings;
pub mod temp;

pub use artifact::{Artifact, ArtifactCache};
pub use engine::{
    CompileContext, Engine, EngineRegistry, ProduceContext, RunFactory, RunImplementation,
};
pub use error::{Error, NoSuchFormat, Result, UsageError};
pub use format::{CanonicalKey, FormatDescription, FormatParameters, FormatSpec};
pub use input::{Color, Input, Length, Margins};
pub use run::CompileRun;
pub use settings::{GsMethod, Settings};
pub use temp::TemporaryDirectory;

pub use texrun_process as process;
