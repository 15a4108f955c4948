/*
 * engine/registry.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Registry of configured engines.
 */

//! Registry of configured engines.
//!
//! Applications usually set up one [`Engine`] per backend (e.g. one for a
//! latex+dvips+gs pipeline and one for a latex-to-image tool) and pick one by
//! name for each input.

use std::collections::HashMap;

use crate::error::Result;
use crate::input::Input;
use crate::run::CompileRun;

use super::factory::Engine;

/// Engines by name.
#[derive(Debug, Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Engine>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an engine.
    ///
    /// If an engine with the same name already exists, it is replaced.
    pub fn register(&mut self, engine: Engine) {
        tracing::debug!(engine = %engine.name(), "Registering engine");
        self.engines.insert(engine.name().to_string(), engine);
    }

    /// Get an engine by name.
    pub fn get(&self, name: &str) -> Option<&Engine> {
        self.engines.get(name)
    }

    /// Get an engine by name for changing its settings.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Engine> {
        self.engines.get_mut(name)
    }

    /// Start a run on the named engine.
    ///
    /// Returns `None` if no engine with the given name is registered.
    pub fn run(&self, name: &str, input: Input) -> Option<Result<CompileRun>> {
        self.get(name).map(|engine| engine.run(input))
    }

    /// Registered engine names, sorted.
    pub fn engine_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.engines.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Check if an engine is registered under `name`.
    pub fn has_engine(&self, name: &str) -> bool {
        self.engines.contains_key(name)
    }

    /// Number of registered engines.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Whether no engine is registered.
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
