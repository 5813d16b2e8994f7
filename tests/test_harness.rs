// tests/test_harness.rs
//! Test harness for running Zinc scripts end to end.
//!
//! Scripts live in `test_scripts/` and are run through a [`Runtime`] whose
//! output and error sinks are captured, so tests can assert on exactly what a
//! program printed and what diagnostics it produced.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use zinc::{CompilerErrors, OutputBuffer, Runtime, RuntimeConfig, RuntimeError, ZincError};

/// Loads and runs scripts from the `test_scripts` directory.
pub struct TestHarness {
    test_scripts_dir: PathBuf,
    config: RuntimeConfig,
}

/// Everything observable about one run.
pub struct ScriptRun {
    pub source: String,
    pub result: Result<(), ZincError>,
    /// What the program printed.
    pub output: String,
    /// Rendered diagnostics and runtime failures.
    pub errors: String,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let test_scripts_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_scripts");
        Self {
            test_scripts_dir,
            config,
        }
    }

    /// Read a script's source.
    pub fn load(&self, filename: &str) -> String {
        let path = self.test_scripts_dir.join(filename);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
    }

    /// Load and run a script.
    pub fn run(&self, filename: &str) -> ScriptRun {
        self.run_source(&self.load(filename))
    }

    /// Run source text with this harness's configuration.
    pub fn run_source(&self, source: &str) -> ScriptRun {
        let output = OutputBuffer::new();
        let errors = OutputBuffer::new();
        let mut runtime = Runtime::new(self.config.clone())
            .with_output(output.sink())
            .with_error_output(errors.sink());

        let result = runtime.run(source);
        ScriptRun {
            source: source.to_string(),
            result,
            output: output.contents(),
            errors: errors.contents(),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRun {
    /// Assert the script compiled and ran to completion.
    pub fn assert_success(&self) -> &Self {
        if let Err(error) = &self.result {
            eprintln!("Source:\n{}", self.source);
            eprintln!("\nErrors:\n{}", self.errors);
            panic!("Expected a successful run, but got: {error}");
        }
        self
    }

    /// Assert the script ran and printed exactly `expected`.
    pub fn assert_output(&self, expected: &str) -> &Self {
        self.assert_success();
        assert_eq!(self.output, expected, "unexpected output");
        self
    }

    /// The diagnostics from a failed compile.
    pub fn compile_errors(&self) -> &CompilerErrors {
        match &self.result {
            Err(ZincError::Compile(errors)) => errors,
            other => panic!("Expected compile errors, got {other:?}"),
        }
    }

    /// The failure from an aborted run.
    pub fn runtime_error(&self) -> &RuntimeError {
        match &self.result {
            Err(ZincError::Runtime(error)) => error,
            other => panic!("Expected a runtime error, got {other:?}"),
        }
    }

    /// Messages of every reported diagnostic, in report order.
    pub fn error_messages(&self) -> Vec<&str> {
        self.compile_errors().iter().map(|e| e.message()).collect()
    }

    /// Assert compilation failed with exactly these messages.
    pub fn assert_compile_errors(&self, expected: &[&str]) -> &Self {
        assert_eq!(self.error_messages(), expected);
        assert!(self.output.is_empty(), "nothing may run after a failed compile");
        self
    }
}
