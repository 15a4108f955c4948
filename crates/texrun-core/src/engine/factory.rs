/*
 * engine/factory.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Engine: a run factory bound to its current settings.
 */

use crate::error::Result;
use crate::input::Input;
use crate::run::CompileRun;
use crate::settings::Settings;

use super::traits::RunFactory;

/// A [`RunFactory`] together with the settings it currently uses.
///
/// Each call to [`run`](Self::run) creates an independent [`CompileRun`]
/// with a snapshot of the settings; changing settings later does not affect
/// runs that already exist.
pub struct Engine {
    factory: Box<dyn RunFactory>,
    settings: Settings,
}

impl Engine {
    /// Bind `factory` to `settings`, running the factory's settings hook.
    pub fn new(factory: Box<dyn RunFactory>, settings: Settings) -> Result<Self> {
        let mut engine = Self {
            factory,
            settings: Settings::default(),
        };
        engine.set_settings(settings)?;
        Ok(engine)
    }

    /// Name reported by the factory.
    pub fn name(&self) -> &str {
        self.factory.name()
    }

    /// Current settings, as adjusted by the factory.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Install new settings after letting the factory adjust them.
    ///
    /// On error the previous settings stay in place.
    pub fn set_settings(&mut self, mut settings: Settings) -> Result<()> {
        self.factory.adjust_for_new_settings(&mut settings)?;
        tracing::debug!(engine = %self.factory.name(), "Installed new settings");
        self.settings = settings;
        Ok(())
    }

    /// Create a fresh, uncompiled run for `input`.
    pub fn run(&self, input: Input) -> Result<CompileRun> {
        let backend = self
            .factory
            .create_run_implementation(&input, &self.settings)?;
        Ok(CompileRun::new(
            self.factory.name(),
            input,
            self.settings.clone(),
            backend,
        ))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.factory.name())
            .field("settings", &self.settings)
            .finish()
    }
}
