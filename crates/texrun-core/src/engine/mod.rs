/*
 * engine/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Engine and backend infrastructure.
 */

//! Engine and backend infrastructure.
//!
//! - [`RunImplementation`] - backend for one compilation (compile,
//!   canonicalize, produce)
//! - [`RunFactory`] - creates backends and reacts to settings changes
//! - [`Engine`] - a factory bound to its current [`Settings`](crate::Settings)
//! - [`EngineRegistry`] - engines by name
//! - [`CompileContext`] / [`ProduceContext`] - what a backend sees of its run

pub(crate) mod context;
mod factory;
mod registry;
mod traits;

pub use context::{CompileContext, ProduceContext};
pub use factory::Engine;
pub use registry::EngineRegistry;
pub use traits::{RunFactory, RunImplementation};
