/*
 * format.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Output format specifications and canonicalization.
 */

//! Output format specifications and canonicalization.
//!
//! A [`FormatSpec`] names an output representation (`"PDF"`, `"PNG"`, ...)
//! plus backend-defined parameters that select a flavor of it. Several specs
//! may denote the same output, e.g. `PNG` and `PNG {"dpi": 300}` when 300 is
//! the default. Backends map every spec to a single *canonical* spec, and the
//! run caches produced data by the [`CanonicalKey`] of that canonical spec.
//!
//! Format names are upper case by convention. JPEG is always spelled
//! `"JPEG"`; asking for `"JPG"` is an error no matter what the backend says.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::RunImplementation;
use crate::error::{Error, Result};

/// Parameters attached to a format.
pub type FormatParameters = BTreeMap<String, Value>;

/// A format name and its parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    /// Upper-case format name such as `"PDF"`
    #[serde(rename = "format")]
    pub name: String,

    /// Backend-defined parameters
    #[serde(default)]
    pub parameters: FormatParameters,
}

impl FormatSpec {
    /// Create a format spec without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: FormatParameters::new(),
        }
    }

    /// The empty spec, meaning "no format".
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set a single parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Replace all parameters.
    pub fn with_parameters(mut self, parameters: FormatParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Whether this is the empty spec.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Render as `NAME` or `NAME:{json parameters}`.
    pub fn as_string(&self) -> String {
        if self.parameters.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.name, parameters_json(&self.parameters))
        }
    }

    /// Cache key of this spec, assuming it is canonical.
    pub fn canonical_key(&self) -> CanonicalKey {
        CanonicalKey::from(self)
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<&str> for FormatSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FormatSpec {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&FormatSpec> for FormatSpec {
    fn from(spec: &FormatSpec) -> Self {
        spec.clone()
    }
}

fn parameters_json(parameters: &FormatParameters) -> String {
    let object: serde_json::Map<String, Value> = parameters
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(object).to_string()
}

/// A format together with a human-readable title and description.
///
/// Returned by `available_formats()`. This is for discovery only: whether a
/// format can actually be produced is decided by canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescription {
    /// The format; parameter values may describe the accepted parameters
    pub format_spec: FormatSpec,
    /// Short title, e.g. for a selection menu
    pub title: String,
    /// Longer description
    pub description: String,
}

impl FormatDescription {
    /// Create a format description.
    pub fn new(
        format_spec: impl Into<FormatSpec>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            format_spec: format_spec.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Cache key of a canonical format.
///
/// The format name alone when there are no parameters, otherwise the name, a
/// NUL byte and the parameters as JSON with sorted keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// The raw key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&FormatSpec> for CanonicalKey {
    fn from(spec: &FormatSpec) -> Self {
        if spec.parameters.is_empty() {
            CanonicalKey(spec.name.clone())
        } else {
            CanonicalKey(format!("{}\0{}", spec.name, parameters_json(&spec.parameters)))
        }
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.replace('\0', ":"))
    }
}

const JPG_MESSAGE: &str = "You misspelled format name ‘JPEG’ as ‘JPG’ (use the former exclusively please)";

/// Applies the canonicalization rules shared by every backend.
pub(crate) struct FormatProvider<'a> {
    backend: &'a dyn RunImplementation,
}

impl<'a> FormatProvider<'a> {
    pub(crate) fn new(backend: &'a dyn RunImplementation) -> Self {
        Self { backend }
    }

    /// Canonicalize `spec`, failing with [`Error::NoSuchFormat`] if it is
    /// unavailable. With `check_only`, the returned value is meaningless.
    fn canonicalize(&self, spec: &FormatSpec, check_only: bool) -> Result<FormatSpec> {
        if spec.name == "JPG" {
            return Err(Error::no_such_format("JPG", JPG_MESSAGE));
        }

        let canonical = self.backend.make_canonical(spec, check_only)?;
        if canonical.is_empty() {
            return Err(Error::no_such_format(
                spec.name.clone(),
                "format is unknown or is not available",
            ));
        }

        tracing::trace!(
            requested = %spec,
            canonical = %canonical,
            check_only,
            "Canonicalized format"
        );
        Ok(canonical)
    }

    pub(crate) fn canonical_format(&self, spec: &FormatSpec) -> Result<FormatSpec> {
        self.canonicalize(spec, false)
    }

    pub(crate) fn canonical_format_or_empty(&self, spec: &FormatSpec) -> Result<FormatSpec> {
        match self.canonicalize(spec, false) {
            Err(Error::NoSuchFormat(_)) => Ok(FormatSpec::empty()),
            other => other,
        }
    }

    pub(crate) fn has_format(&self, spec: &FormatSpec) -> Result<bool> {
        match self.canonicalize(spec, true) {
            Ok(_) => Ok(true),
            Err(Error::NoSuchFormat(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub(crate) fn find_format<I>(&self, candidates: I) -> Result<FormatSpec>
    where
        I: IntoIterator,
        I::Item: Into<FormatSpec>,
    {
        for candidate in candidates {
            let canonical = self.canonical_format_or_empty(&candidate.into())?;
            if !canonical.is_empty() {
                return Ok(canonical);
            }
        }
        Err(Error::no_such_format(
            "<no suitable format found in given list>",
            "",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ProduceContext;
    use serde_json::json;

    /// Knows "PNG" (canonical form carries dpi) and "PDF"; "EPS" is
    /// rejected with a reason; "BOOM" fails with a non-format error.
    struct Canonicalizer;

    impl RunImplementation for Canonicalizer {
        fn compile(&mut self, _ctx: &mut crate::engine::CompileContext<'_>) -> Result<()> {
            Ok(())
        }

        fn make_canonical(&self, spec: &FormatSpec, _check_only: bool) -> Result<FormatSpec> {
            match spec.name.as_str() {
                "PNG" => {
                    let dpi = spec.parameters.get("dpi").cloned().unwrap_or(json!(300));
                    Ok(FormatSpec::new("PNG").with_parameter("dpi", dpi))
                }
                "PDF" => Ok(FormatSpec::new("PDF")),
                "EPS" => Err(Error::no_such_format("EPS", "no dvips")),
                "BOOM" => Err(anyhow::anyhow!("backend exploded").into()),
                _ => Ok(FormatSpec::empty()),
            }
        }

        fn produce(&self, _canonical: &FormatSpec, _ctx: &mut ProduceContext<'_>) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_as_string() {
        assert_eq!(FormatSpec::new("PDF").as_string(), "PDF");
        let spec = FormatSpec::new("PNG")
            .with_parameter("dpi", 300)
            .with_parameter("antialias", true);
        assert_eq!(spec.as_string(), r#"PNG:{"antialias":true,"dpi":300}"#);
    }

    #[test]
    fn test_canonical_key() {
        assert_eq!(FormatSpec::new("PDF").canonical_key().as_str(), "PDF");
        let key = FormatSpec::new("PNG").with_parameter("dpi", 300).canonical_key();
        assert_eq!(key.as_str(), "PNG\0{\"dpi\":300}");
        assert_ne!(key, FormatSpec::new("PNG").canonical_key());
    }

    #[test]
    fn test_serde_shape() {
        let spec = FormatSpec::new("PNG").with_parameter("dpi", 150);
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value, json!({"format": "PNG", "parameters": {"dpi": 150}}));
        let back: FormatSpec = serde_json::from_value(json!({"format": "PDF"})).unwrap();
        assert_eq!(back, FormatSpec::new("PDF"));
    }

    #[test]
    fn test_jpg_is_rejected_before_backend() {
        let provider = FormatProvider::new(&Canonicalizer);
        let err = provider.canonical_format(&"JPG".into()).unwrap_err();
        assert!(err.to_string().contains("‘JPEG’"));
        assert!(!provider.has_format(&"JPG".into()).unwrap());
    }

    #[test]
    fn test_empty_canonical_means_unavailable() {
        let provider = FormatProvider::new(&Canonicalizer);
        let err = provider.canonical_format(&"SVG".into()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No such format: SVG: format is unknown or is not available"
        );
        assert!(
            provider
                .canonical_format_or_empty(&"SVG".into())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_canonicalization_is_idempotent() {
        let provider = FormatProvider::new(&Canonicalizer);
        let once = provider.canonical_format(&"PNG".into()).unwrap();
        let twice = provider.canonical_format(&once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.canonical_key(), twice.canonical_key());
    }

    #[test]
    fn test_non_format_errors_propagate() {
        let provider = FormatProvider::new(&Canonicalizer);
        assert!(provider.has_format(&"BOOM".into()).is_err());
        assert!(provider.canonical_format_or_empty(&"BOOM".into()).is_err());
        assert!(!provider.has_format(&"EPS".into()).unwrap());
    }

    #[test]
    fn test_find_format_is_order_sensitive() {
        let provider = FormatProvider::new(&Canonicalizer);
        assert_eq!(
            provider.find_format(["SVG", "PDF", "PNG"]).unwrap(),
            FormatSpec::new("PDF")
        );
        assert_eq!(
            provider.find_format(["PNG", "PDF"]).unwrap().name,
            "PNG"
        );
        let err = provider.find_format(["SVG", "JPG", "EPS"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No such format: <no suitable format found in given list>"
        );
    }
}
