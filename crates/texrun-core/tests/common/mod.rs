/*
 * tests/common/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * A scripted backend shared by the integration tests.
 */

//! A scripted backend shared by the integration tests.
//!
//! Formats:
//! - `TXT`: the compiled text; takes no parameters
//! - `TEX`, `HTML`: the compiled text styled by the `italic` / `bold`
//!   parameters. Both come out of the same "tool invocation", so producing
//!   one stores the other as a byproduct.
//! - `XML-emb-TEX`: `TEX` with the same parameters wrapped in an XML
//!   document, obtained through a recursive request.
//!
//! Every backend call is appended to a shared log so tests can check exactly
//! which calls a run made.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use texrun_core::{
    CompileContext, Engine, Error, FormatDescription, FormatParameters, FormatSpec, Input,
    ProduceContext, Result, RunFactory, RunImplementation, Settings,
};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn take_calls(log: &CallLog) -> Vec<String> {
    std::mem::take(&mut *log.lock().unwrap())
}

pub struct DummyRun {
    calls: CallLog,
    data: String,
    /// Store this byproduct twice during compile, to provoke a cache error.
    duplicate_store: bool,
}

impl DummyRun {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            data: String::new(),
            duplicate_store: false,
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn styling(parameters: &FormatParameters) -> (bool, bool) {
    let flag = |key: &str| parameters.get(key).and_then(|v| v.as_bool()) == Some(true);
    (flag("italic"), flag("bold"))
}

fn styled_parameters(italic: bool, bold: bool) -> FormatParameters {
    let mut p = FormatParameters::new();
    if italic {
        p.insert("italic".into(), true.into());
    }
    if bold {
        p.insert("bold".into(), true.into());
    }
    p
}

impl RunImplementation for DummyRun {
    fn compile(&mut self, ctx: &mut CompileContext<'_>) -> Result<()> {
        self.record("compile()".into());
        self.data = format!("<compiled data! input was `{}'>", ctx.input().latex);
        if self.duplicate_store {
            ctx.store_to_cache(FormatSpec::new("TXT"), self.data.clone())?;
            ctx.store_to_cache(FormatSpec::new("TXT"), self.data.clone())?;
        }
        Ok(())
    }

    fn available_formats(&self) -> Vec<FormatDescription> {
        self.record("available_formats()".into());
        ["TXT", "TEX", "HTML", "XML-emb-TEX"]
            .into_iter()
            .map(|name| {
                FormatDescription::new(
                    name,
                    format!("{} format", name),
                    format!("{} format description", name),
                )
            })
            .collect()
    }

    fn make_canonical(&self, spec: &FormatSpec, check_only: bool) -> Result<FormatSpec> {
        self.record(format!("make_canonical({}, {})", spec, check_only));
        match spec.name.as_str() {
            "TXT" if spec.parameters.is_empty() => Ok(spec.clone()),
            "TXT" => Ok(FormatSpec::empty()),
            "TEX" | "HTML" | "XML-emb-TEX" => {
                for (key, value) in &spec.parameters {
                    match key.as_str() {
                        "italic" | "bold" => {
                            if value.as_bool().is_none() {
                                return Err(Error::invalid_parameter(
                                    key.clone(),
                                    "expected a boolean",
                                ));
                            }
                        }
                        _ => {
                            return Err(Error::no_such_format(
                                spec.name.clone(),
                                format!("Invalid format parameter key: {}", key),
                            ));
                        }
                    }
                }
                let (italic, bold) = styling(&spec.parameters);
                Ok(FormatSpec::new(spec.name.clone())
                    .with_parameters(styled_parameters(italic, bold)))
            }
            _ => Ok(FormatSpec::empty()),
        }
    }

    fn produce(&self, canonical: &FormatSpec, ctx: &mut ProduceContext<'_>) -> Result<Vec<u8>> {
        self.record(format!("produce({})", canonical));

        match canonical.name.as_str() {
            "TXT" => Ok(self.data.clone().into_bytes()),
            "XML-emb-TEX" => {
                let tex = ctx.get_artifact(
                    FormatSpec::new("TEX").with_parameters(canonical.parameters.clone()),
                )?;
                let mut xml = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<dummy-data><![CDATA[".to_vec();
                xml.extend_from_slice(tex.as_bytes());
                xml.extend_from_slice(b"]]></dummy-data>\n");
                Ok(xml)
            }
            _ => {
                let (italic, bold) = styling(&canonical.parameters);
                let (mut tex_open, mut tex_close) = (String::new(), String::new());
                let (mut html_open, mut html_close) = (String::new(), String::new());
                if italic {
                    tex_open.push_str("\\textit{");
                    tex_close.push('}');
                    html_open.push_str("<i>");
                    html_close.insert_str(0, "</i>");
                }
                if bold {
                    tex_open.push_str("\\textbf{");
                    tex_close.push('}');
                    html_open.push_str("<b>");
                    html_close.insert_str(0, "</b>");
                }
                let escaped = self.data.replace('<', "&lt;").replace('>', "&gt;");
                let tex = format!("{}{}{}", tex_open, self.data, tex_close);
                let html = format!("{}{}{}", html_open, escaped, html_close);

                let parameters = styled_parameters(italic, bold);
                if canonical.name == "HTML" {
                    ctx.store_to_cache(FormatSpec::new("TEX").with_parameters(parameters), tex)?;
                    Ok(html.into_bytes())
                } else {
                    ctx.store_to_cache(FormatSpec::new("HTML").with_parameters(parameters), html)?;
                    Ok(tex.into_bytes())
                }
            }
        }
    }
}

pub struct DummyFactory {
    pub calls: CallLog,
    pub duplicate_store: bool,
}

impl DummyFactory {
    pub fn new() -> Self {
        Self {
            calls: CallLog::default(),
            duplicate_store: false,
        }
    }
}

impl RunFactory for DummyFactory {
    fn name(&self) -> &str {
        "dummy-engine"
    }

    fn create_run_implementation(
        &self,
        _input: &Input,
        _settings: &Settings,
    ) -> Result<Box<dyn RunImplementation>> {
        self.calls
            .lock()
            .unwrap()
            .push("create_run_implementation(...)".into());
        let mut run = DummyRun::new(Arc::clone(&self.calls));
        run.duplicate_store = self.duplicate_store;
        Ok(Box::new(run))
    }
}

/// An engine around [`DummyFactory`] plus the log its runs write to.
pub fn dummy_engine() -> (Engine, CallLog) {
    let factory = DummyFactory::new();
    let calls = Arc::clone(&factory.calls);
    let settings = Settings::new()
        .with_temporary_directory(std::env::temp_dir())
        .with_texbin_directory("/Library/TeX/texbin");
    let engine = Engine::new(Box::new(factory), settings).expect("dummy engine");
    (engine, calls)
}
