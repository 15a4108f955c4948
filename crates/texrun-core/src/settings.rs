/*
 * settings.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Where engines find LaTeX, Ghostscript and scratch space.
 */

//! Engine settings.
//!
//! Settings are plain data. Nothing here probes the system: locating a TeX
//! distribution or Ghostscript is the application's job, and the result is
//! handed to [`Engine::set_settings`](crate::Engine::set_settings).

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use texrun_process::EnvOp;

use crate::error::{Error, Result};

/// How an engine talks to Ghostscript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GsMethod {
    /// Ghostscript is not used; formats that need it are unavailable.
    #[default]
    None,
    /// Run the `gs` executable as a child process.
    Process,
    /// Call into a libgs linked into the application.
    LinkedLibgs,
    /// Load libgs at runtime from `gs_libgs_path`.
    LoadLibgs,
}

impl GsMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            GsMethod::None => "none",
            GsMethod::Process => "process",
            GsMethod::LinkedLibgs => "linked-libgs",
            GsMethod::LoadLibgs => "load-libgs",
        }
    }
}

impl fmt::Display for GsMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GsMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(GsMethod::None),
            "process" => Ok(GsMethod::Process),
            "linked-libgs" => Ok(GsMethod::LinkedLibgs),
            "load-libgs" => Ok(GsMethod::LoadLibgs),
            other => Err(Error::invalid_parameter(
                "gs_method",
                format!("Invalid gs interface method: {}", other),
            )),
        }
    }
}

/// Paths and environment used by engines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Parent directory for scratch directories (system temp dir if unset)
    pub temporary_directory: Option<PathBuf>,

    /// Directory holding `latex`, `pdflatex`, `dvips`, ...
    pub texbin_directory: Option<PathBuf>,

    /// How engines talk to Ghostscript
    pub gs_method: GsMethod,

    /// Path to the `gs` executable, for [`GsMethod::Process`]
    pub gs_executable_path: Option<PathBuf>,

    /// Path to the libgs shared library, for [`GsMethod::LoadLibgs`]
    pub gs_libgs_path: Option<PathBuf>,

    /// Extra variables set for every child process
    pub subprocess_add_environment: BTreeMap<String, String>,
}

impl Settings {
    /// Settings with nothing configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create scratch directories under `dir`.
    pub fn with_temporary_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temporary_directory = Some(dir.into());
        self
    }

    /// Look up TeX binaries in `dir`.
    pub fn with_texbin_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.texbin_directory = Some(dir.into());
        self
    }

    /// Run Ghostscript as the process `gs`.
    pub fn with_gs_process(mut self, gs: impl Into<PathBuf>) -> Self {
        self.gs_method = GsMethod::Process;
        self.gs_executable_path = Some(gs.into());
        self
    }

    /// Set `name` for every child process.
    pub fn with_subprocess_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.subprocess_add_environment
            .insert(name.into(), value.into());
        self
    }

    /// Full path of a TeX executable inside `texbin_directory`.
    ///
    /// On Windows the `.exe` suffix is added automatically.
    pub fn tex_executable_path(&self, name: &str) -> Result<PathBuf> {
        let Some(texbin) = self.texbin_directory.as_deref() else {
            return Err(Error::cannot_find_executable(
                name,
                "no TeX binary directory configured",
            ));
        };
        find_in_directory(name, texbin).ok_or_else(|| {
            Error::cannot_find_executable(
                name,
                format!("no such executable in {}", texbin.display()),
            )
        })
    }

    /// Environment transforms that apply `subprocess_add_environment`.
    pub fn subprocess_env_ops(&self) -> Vec<EnvOp> {
        if self.subprocess_add_environment.is_empty() {
            Vec::new()
        } else {
            vec![EnvOp::Set(self.subprocess_add_environment.clone())]
        }
    }

    /// Parse settings from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize settings to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn find_in_directory(name: &str, dir: &Path) -> Option<PathBuf> {
    which::which_in(name, Some(dir), dir).ok()
}
