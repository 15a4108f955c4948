/*
 * tests/process_backend.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * A backend that shells out, the way real LaTeX pipelines do.
 */

#![cfg(unix)]

use texrun_core::process::{ProcessRunner, RunOptions, default_runner};
use texrun_core::{
    CompileContext, Engine, Error, FormatSpec, Input, ProduceContext, Result, RunFactory,
    RunImplementation, Settings, TemporaryDirectory,
};

/// "Compiles" by writing the input to `eq.tex` in a scratch directory with
/// `sh`, then serves:
/// - `TEX`: the file contents, read back with `cat`
/// - `UPPER`: `TEX` piped through `tr`
/// - `ENV`: the value of `TEXRUN_MARK` as seen by a child process
/// - `FAIL`: a tool that exits nonzero
struct ShellRun {
    workdir: Option<TemporaryDirectory>,
}

impl ShellRun {
    fn options(&self, settings: &Settings) -> RunOptions {
        let mut options = RunOptions::new()
            .capture_output()
            .with_env_ops(settings.subprocess_env_ops());
        if let Some(dir) = &self.workdir {
            options = options.with_cwd(dir.path());
        }
        options
    }

    fn sh(&self, settings: &Settings, script: &str, stdin: Option<&[u8]>) -> Result<Vec<u8>> {
        let mut options = self.options(settings);
        if let Some(stdin) = stdin {
            options = options.with_stdin(stdin);
        }
        let argv = ["sh".to_string(), "-c".to_string(), script.to_string()];
        let info = default_runner().run(&argv, &options)?;
        Ok(info.stdout.unwrap_or_default())
    }
}

impl RunImplementation for ShellRun {
    fn compile(&mut self, ctx: &mut CompileContext<'_>) -> Result<()> {
        let workdir = TemporaryDirectory::for_settings(ctx.settings())?;
        self.workdir = Some(workdir);
        self.sh(ctx.settings(), "cat > eq.tex", Some(ctx.input().math_latex().as_bytes()))?;
        Ok(())
    }

    fn make_canonical(&self, spec: &FormatSpec, _check_only: bool) -> Result<FormatSpec> {
        Ok(match spec.name.as_str() {
            "TEX" | "UPPER" | "ENV" | "FAIL" if spec.parameters.is_empty() => spec.clone(),
            _ => FormatSpec::empty(),
        })
    }

    fn produce(&self, canonical: &FormatSpec, ctx: &mut ProduceContext<'_>) -> Result<Vec<u8>> {
        match canonical.name.as_str() {
            "TEX" => self.sh(ctx.settings(), "cat eq.tex", None),
            "UPPER" => {
                let tex = ctx.get_artifact("TEX")?;
                self.sh(ctx.settings(), "tr a-z A-Z", Some(tex.as_bytes()))
            }
            "ENV" => self.sh(ctx.settings(), "printf %s \"$TEXRUN_MARK\"", None),
            _ => self.sh(
                ctx.settings(),
                "echo 'dvips: eq.dvi not found' >&2; exit 3",
                None,
            ),
        }
    }
}

struct ShellFactory;

impl RunFactory for ShellFactory {
    fn name(&self) -> &str {
        "shell"
    }

    fn create_run_implementation(
        &self,
        _input: &Input,
        _settings: &Settings,
    ) -> Result<Box<dyn RunImplementation>> {
        Ok(Box::new(ShellRun { workdir: None }))
    }
}

fn engine(scratch: &std::path::Path) -> Engine {
    let settings = Settings::new()
        .with_temporary_directory(scratch)
        .with_subprocess_env("TEXRUN_MARK", "from-settings");
    Engine::new(Box::new(ShellFactory), settings).unwrap()
}

#[test]
fn test_formats_produced_by_child_processes() {
    let scratch = tempfile::tempdir().unwrap();
    let run = engine(scratch.path())
        .run(Input::new("a+b").with_math_mode("$", "$"))
        .unwrap();
    run.compile().unwrap();

    assert_eq!(run.get_artifact("TEX").unwrap().as_str(), Some("$a+b$"));
    assert_eq!(run.get_artifact("UPPER").unwrap().as_str(), Some("$A+B$"));
    assert_eq!(
        run.get_artifact("ENV").unwrap().as_str(),
        Some("from-settings")
    );
}

#[test]
fn test_tool_failure_carries_stderr() {
    let scratch = tempfile::tempdir().unwrap();
    let run = engine(scratch.path()).run(Input::new("x")).unwrap();
    run.compile().unwrap();

    let err = run.get_artifact("FAIL").unwrap_err();
    let Error::Process(process_err) = &err else {
        panic!("expected a process error, got {err:?}");
    };
    let exit = process_err.as_exit_error().unwrap();
    assert_eq!(exit.status.code(), Some(3));
    assert!(err.to_string().contains("dvips: eq.dvi not found"));

    // a failed production caches nothing
    assert!(!run.cached_formats().unwrap().contains(&FormatSpec::new("FAIL")));
}

#[test]
fn test_scratch_directory_removed_with_run() {
    let scratch = tempfile::tempdir().unwrap();
    let run = engine(scratch.path()).run(Input::new("x")).unwrap();
    run.compile().unwrap();
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 1);

    drop(run);
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
