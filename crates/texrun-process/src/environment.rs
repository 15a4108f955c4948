/*
 * environment.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Environment variable transforms for child processes.
 */

//! Environment variable transforms for child processes.
//!
//! The child environment is computed as a pure function of a base
//! environment and an ordered list of [`EnvOp`]s. Nothing here touches
//! the environment of the current process.
//!
//! [`EnvDelta`] reduces the ops to the variables they touch, so a runner
//! can hand the child its inherited environment untouched (including
//! entries that are not valid UTF-8) and only override what changed.
//!
//! ```ignore
//! use texrun_process::{EnvOp, apply_env_ops, current_environment};
//!
//! let env = apply_env_ops(
//!     &current_environment(),
//!     &[
//!         EnvOp::provide([("GS_LIB", "/usr/share/ghostscript")]),
//!         EnvOp::prepend_path([("PATH", "/Library/TeX/texbin")]),
//!     ],
//! );
//! ```

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// A full set of environment variables.
pub type Environment = BTreeMap<String, String>;

/// Separator between entries of PATH-like variables.
#[cfg(windows)]
pub const PATH_SEPARATOR: char = ';';

/// Separator between entries of PATH-like variables.
#[cfg(not(windows))]
pub const PATH_SEPARATOR: char = ':';

/// A single environment transform.
///
/// Operations are applied in order, so a later operation can override the
/// effect of an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvOp {
    /// Remove every variable, including the inherited ones.
    Clear,
    /// Set variables, overwriting existing values.
    Set(Environment),
    /// Set variables only where they are not already defined.
    Provide(Environment),
    /// Remove variables. Missing names are ignored.
    Remove(Vec<String>),
    /// Prepend entries to PATH-like variables.
    PrependPath(Environment),
    /// Append entries to PATH-like variables.
    AppendPath(Environment),
}

impl EnvOp {
    /// Create a [`EnvOp::Set`] from name/value pairs.
    pub fn set<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Set(collect_vars(vars))
    }

    /// Create a [`EnvOp::Provide`] from name/value pairs.
    pub fn provide<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Provide(collect_vars(vars))
    }

    /// Create a [`EnvOp::Remove`] from variable names.
    pub fn remove<I, K>(names: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::Remove(names.into_iter().map(Into::into).collect())
    }

    /// Create a [`EnvOp::PrependPath`] from name/value pairs.
    pub fn prepend_path<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::PrependPath(collect_vars(vars))
    }

    /// Create a [`EnvOp::AppendPath`] from name/value pairs.
    pub fn append_path<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::AppendPath(collect_vars(vars))
    }

    /// Record the effect of this operation in `delta`.
    fn apply_to(&self, delta: &mut EnvDelta, inherited: &impl Fn(&str) -> Option<OsString>) {
        match self {
            EnvOp::Clear => {
                delta.clear = true;
                delta.vars.clear();
            }
            EnvOp::Set(vars) => {
                for (name, value) in vars {
                    delta.vars.insert(name.clone(), Some(value.into()));
                }
            }
            EnvOp::Provide(vars) => {
                for (name, value) in vars {
                    if delta.get(name, inherited).is_none() {
                        delta.vars.insert(name.clone(), Some(value.into()));
                    }
                }
            }
            EnvOp::Remove(names) => {
                for name in names {
                    delta.vars.insert(name.clone(), None);
                }
            }
            EnvOp::PrependPath(vars) => {
                for (name, value) in vars {
                    let joined = match delta.get(name, inherited) {
                        Some(existing) => join_paths(value.as_ref(), &existing),
                        None => value.into(),
                    };
                    delta.vars.insert(name.clone(), Some(joined));
                }
            }
            EnvOp::AppendPath(vars) => {
                for (name, value) in vars {
                    let joined = match delta.get(name, inherited) {
                        Some(existing) => join_paths(&existing, value.as_ref()),
                        None => value.into(),
                    };
                    delta.vars.insert(name.clone(), Some(joined));
                }
            }
        }
    }
}

/// The net effect of a list of [`EnvOp`]s on an inherited environment.
///
/// Only variables touched by some op appear in `vars`; everything else is
/// inherited as is, unless `clear` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDelta {
    /// Drop every inherited variable before applying `vars`.
    pub clear: bool,
    /// Final value of each touched variable. `None` removes it.
    pub vars: BTreeMap<String, Option<OsString>>,
}

impl EnvDelta {
    /// Reduce `ops` against an inherited environment, which is only consulted
    /// through `inherited` for the variables the ops read.
    pub fn from_ops(ops: &[EnvOp], inherited: impl Fn(&str) -> Option<OsString>) -> Self {
        let mut delta = Self::default();
        for op in ops {
            op.apply_to(&mut delta, &inherited);
        }
        delta
    }

    /// Whether the inherited environment passes through unchanged.
    pub fn is_empty(&self) -> bool {
        !self.clear && self.vars.is_empty()
    }

    fn get(&self, name: &str, inherited: &impl Fn(&str) -> Option<OsString>) -> Option<OsString> {
        match self.vars.get(name) {
            Some(value) => value.clone(),
            None if self.clear => None,
            None => inherited(name),
        }
    }
}

fn collect_vars<I, K, V>(vars: I) -> Environment
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    vars.into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn join_paths(first: &OsStr, second: &OsStr) -> OsString {
    if first.is_empty() {
        return second.to_owned();
    }
    if second.is_empty() {
        return first.to_owned();
    }
    let mut joined = first.to_owned();
    joined.push(PATH_SEPARATOR.to_string());
    joined.push(second);
    joined
}

/// Compute a new environment by applying `ops` to `base`, in order.
pub fn apply_env_ops(base: &Environment, ops: &[EnvOp]) -> Environment {
    let delta = EnvDelta::from_ops(ops, |name| base.get(name).map(OsString::from));
    let mut env = if delta.clear {
        Environment::new()
    } else {
        base.clone()
    };
    for (name, value) in delta.vars {
        match value {
            Some(value) => {
                env.insert(name, value.to_string_lossy().into_owned());
            }
            None => {
                env.remove(&name);
            }
        }
    }
    env
}

/// Snapshot the environment of the current process.
///
/// Variables whose name or value is not valid UTF-8 are skipped. Runners
/// use [`EnvDelta`] instead, which leaves such variables inherited.
pub fn current_environment() -> Environment {
    std::env::vars_os()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Parse `NAME=value` entries into an [`Environment`].
///
/// Entries are split at the first `=`; an entry without `=` defines a
/// variable with an empty value.
pub fn parse_environment<I, S>(entries: I) -> Environment
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|entry| {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((name, value)) => (name.to_string(), value.to_string()),
                None => (entry.to_string(), String::new()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sep() -> String {
        PATH_SEPARATOR.to_string()
    }

    #[test]
    fn test_parse_environment_splits_at_first_equals() {
        let env = parse_environment(["VAR1=some value goes here", "X=135", "AAA_ZZZ_83==13394="]);
        assert_eq!(env["VAR1"], "some value goes here");
        assert_eq!(env["X"], "135");
        assert_eq!(env["AAA_ZZZ_83"], "=13394=");
    }

    #[test]
    fn test_parse_environment_without_equals() {
        let env = parse_environment(["FLAG"]);
        assert_eq!(env["FLAG"], "");
    }

    #[test]
    fn test_apply_env_ops_composes_in_order() {
        let base: Environment = [
            ("A", "value of A".to_string()),
            ("B", "value of B".to_string()),
            ("R1", "remove this".to_string()),
            ("R2", "remove this (2)".to_string()),
            ("C_PATH", format!("/path/to/A{}C/path/to/B", sep())),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let env = apply_env_ops(
            &base,
            &[
                EnvOp::provide([("A", "other value of A"), ("Z", "new value of Z")]),
                EnvOp::set([("B", "set value of B"), ("D", "set value of D")]),
                EnvOp::remove(["R1", "R2", "NON_EXISTENT"]),
                EnvOp::prepend_path([
                    ("C_PATH", format!("/first/path{}second/path", sep())),
                    ("X_PATH", format!("/some/path/X{}/another/path/X", sep())),
                    ("Y_PATH", format!("/some/path{}/another/path", sep())),
                ]),
                EnvOp::append_path([("C_PATH", "/last/path")]),
                EnvOp::set([("X_PATH", "/some/X/path")]),
            ],
        );

        assert_eq!(env["A"], "value of A");
        assert_eq!(env["B"], "set value of B");
        assert_eq!(
            env["C_PATH"],
            format!(
                "/first/path{s}second/path{s}/path/to/A{s}C/path/to/B{s}/last/path",
                s = sep()
            )
        );
        assert_eq!(env["D"], "set value of D");
        assert!(!env.contains_key("R1"));
        assert!(!env.contains_key("R2"));
        assert_eq!(env["X_PATH"], "/some/X/path");
        assert_eq!(env["Y_PATH"], format!("/some/path{}/another/path", sep()));
        assert_eq!(env["Z"], "new value of Z");
    }

    #[test]
    fn test_apply_env_ops_does_not_touch_base() {
        let base = parse_environment(["A=1"]);
        let env = apply_env_ops(&base, &[EnvOp::Clear, EnvOp::set([("B", "2")])]);
        assert_eq!(base.len(), 1);
        assert_eq!(env.len(), 1);
        assert_eq!(env["B"], "2");
    }

    #[test]
    fn test_prepend_to_empty_value_has_no_dangling_separator() {
        let base = parse_environment(["P="]);
        let env = apply_env_ops(&base, &[EnvOp::prepend_path([("P", "/bin")])]);
        assert_eq!(env["P"], "/bin");
    }

    #[test]
    fn test_delta_only_reads_touched_variables() {
        let read = std::cell::RefCell::new(Vec::new());
        let delta = EnvDelta::from_ops(
            &[
                EnvOp::set([("A", "1")]),
                EnvOp::provide([("B", "2")]),
                EnvOp::append_path([("P", "/x")]),
                EnvOp::remove(["R"]),
            ],
            |name| {
                read.borrow_mut().push(name.to_string());
                (name == "P").then(|| OsString::from("/bin"))
            },
        );
        assert_eq!(read.into_inner(), ["B", "P"]);
        assert!(!delta.clear);
        assert_eq!(delta.vars["A"], Some(OsString::from("1")));
        assert_eq!(delta.vars["B"], Some(OsString::from("2")));
        assert_eq!(
            delta.vars["P"],
            Some(OsString::from(format!("/bin{}/x", sep())))
        );
        assert_eq!(delta.vars["R"], None);
    }

    #[test]
    fn test_delta_after_clear_ignores_inherited_values() {
        let delta = EnvDelta::from_ops(
            &[
                EnvOp::set([("A", "dropped")]),
                EnvOp::Clear,
                EnvOp::provide([("HOME", "/nowhere")]),
            ],
            |_| Some(OsString::from("inherited")),
        );
        assert!(delta.clear);
        assert_eq!(delta.vars.len(), 1);
        assert_eq!(delta.vars["HOME"], Some(OsString::from("/nowhere")));
        assert!(EnvDelta::from_ops(&[], |_| None).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_path_join_keeps_non_utf8_bytes() {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};
        let delta = EnvDelta::from_ops(&[EnvOp::prepend_path([("P", "/a")])], |_| {
            Some(OsString::from_vec(b"/b\xff".to_vec()))
        });
        let joined = delta.vars["P"].clone().unwrap();
        assert_eq!(joined.as_bytes(), b"/a:/b\xff");
    }

    #[cfg(unix)]
    #[test]
    fn test_current_environment_sees_path() {
        // PATH is set in every reasonable test environment
        assert!(current_environment().contains_key("PATH"));
    }
}
