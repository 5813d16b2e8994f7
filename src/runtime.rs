//! Host-facing runtime: compile source, run it, report failures.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use bumpalo::Bump;
use zinc_compiler::Chunk;
use zinc_core::{CompilerErrors, RuntimeError, ZincError};
use zinc_parser::{Lexer, Parser, ParserKind};

use crate::diagnostic;
use crate::vm::{DEFAULT_CALL_STACK_SIZE, DEFAULT_STACK_SIZE, VirtualMachine};

/// Settings for a [`Runtime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum number of values on the operand stack.
    pub stack_size: usize,
    /// Maximum call depth, counting the top level.
    pub call_stack_size: usize,
    /// Expression front end used when parsing.
    pub parser: ParserKind,
    /// Log the token stream and the disassembled chunk at `debug` level.
    pub debug: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            call_stack_size: DEFAULT_CALL_STACK_SIZE,
            parser: ParserKind::Pratt,
            debug: false,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub fn with_call_stack_size(mut self, call_stack_size: usize) -> Self {
        self.call_stack_size = call_stack_size;
        self
    }

    pub fn with_parser(mut self, parser: ParserKind) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Compiles and runs Zinc programs.
///
/// Program output (`PRINT`) goes to the output sink; rendered compile errors
/// and runtime failures go to the error sink. Both default to the process's
/// stdout and stderr.
///
/// # Example
///
/// ```
/// use zinc::{OutputBuffer, Runtime, RuntimeConfig};
///
/// let output = OutputBuffer::new();
/// let mut runtime = Runtime::new(RuntimeConfig::default()).with_output(output.sink());
/// runtime.run("func main() { 1 + 2; }").unwrap();
/// assert_eq!(output.contents(), "3\n");
/// ```
pub struct Runtime {
    config: RuntimeConfig,
    vm: VirtualMachine,
    output: Box<dyn Write>,
    error_output: Box<dyn Write>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        let vm = VirtualMachine::new(config.stack_size, config.call_stack_size);
        Self {
            config,
            vm,
            output: Box::new(io::stdout()),
            error_output: Box::new(io::stderr()),
        }
    }

    /// Send program output somewhere else.
    pub fn with_output(mut self, output: Box<dyn Write>) -> Self {
        self.output = output;
        self
    }

    /// Send diagnostics and runtime failures somewhere else.
    pub fn with_error_output(mut self, error_output: Box<dyn Write>) -> Self {
        self.error_output = error_output;
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Parse and compile `source`.
    ///
    /// On failure every error is rendered to the error sink before the
    /// errors are returned.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&mut self, source: &str) -> Result<Chunk, CompilerErrors> {
        let arena = Bump::new();
        if self.config.debug {
            self.log_tokens(source, &arena);
        }

        log::debug!("compiling {} bytes with {:?} parser", source.len(), self.config.parser);
        let result = Parser::parse(source, &arena, self.config.parser)
            .and_then(|program| zinc_compiler::compile(&program));

        match result {
            Ok(chunk) => {
                if self.config.debug {
                    log::debug!("disassembly:\n{}", chunk.disassemble());
                }
                Ok(chunk)
            }
            Err(errors) => {
                log::debug!("compilation failed with {} errors", errors.len());
                let rendered = diagnostic::render_all(&errors, source);
                // A broken error sink must not hide the errors from the caller
                let _ = writeln!(self.error_output, "{rendered}");
                Err(errors)
            }
        }
    }

    /// Run a compiled chunk.
    ///
    /// A failure is written to the error sink as `Panicked: <error>`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn execute(&mut self, chunk: &Chunk) -> Result<(), RuntimeError> {
        log::debug!("executing chunk of {} bytes", chunk.len());
        let result = self.vm.interpret(chunk, &mut self.output);
        let _ = self.output.flush();
        if let Err(error) = &result {
            let _ = writeln!(self.error_output, "Panicked: {error}");
        }
        result
    }

    /// Compile and run `source`.
    pub fn run(&mut self, source: &str) -> Result<(), ZincError> {
        let chunk = self.compile(source)?;
        self.execute(&chunk)?;
        Ok(())
    }

    fn log_tokens(&self, source: &str, arena: &Bump) {
        for token in Lexer::new(source, arena) {
            log::debug!("{:?} {:?} {:?}", token.span, token.kind, token.lexeme);
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

/// A cloneable in-memory sink, for capturing a runtime's output.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A boxed writer appending to this buffer.
    pub fn sink(&self) -> Box<dyn Write> {
        Box::new(self.clone())
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.bytes.borrow_mut().clear();
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use zinc_core::OverflowedStack;

    use super::*;

    fn runtime(config: RuntimeConfig) -> (Runtime, OutputBuffer, OutputBuffer) {
        let output = OutputBuffer::new();
        let errors = OutputBuffer::new();
        let runtime = Runtime::new(config)
            .with_output(output.sink())
            .with_error_output(errors.sink());
        (runtime, output, errors)
    }

    #[test]
    fn config_builders() {
        let config = RuntimeConfig::new()
            .with_stack_size(10)
            .with_call_stack_size(5)
            .with_parser(ParserKind::Reorder)
            .with_debug(true);
        assert_eq!(config.stack_size, 10);
        assert_eq!(config.call_stack_size, 5);
        assert_eq!(config.parser, ParserKind::Reorder);
        assert!(config.debug);
        assert_eq!(RuntimeConfig::default().stack_size, 4096);
        assert_eq!(RuntimeConfig::default().call_stack_size, 256);
    }

    #[test]
    fn run_writes_program_output() {
        let (mut runtime, output, errors) = runtime(RuntimeConfig::default());
        runtime.run(r#"func main() { "hello"; }"#).unwrap();
        assert_eq!(output.contents(), "hello\n");
        assert_eq!(errors.contents(), "");
    }

    #[test]
    fn compile_errors_are_rendered() {
        let (mut runtime, output, errors) = runtime(RuntimeConfig::default());
        let result = runtime.run("func main() {\n  1 + true;\n}");
        assert!(matches!(result, Err(ZincError::Compile(ref e)) if e.len() == 1));
        assert_eq!(output.contents(), "");
        assert!(
            errors
                .contents()
                .starts_with("error: Cannot perform binary '+' on 'num' and 'bool'.\n")
        );
    }

    #[test]
    fn runtime_failures_are_reported_as_panics() {
        let config = RuntimeConfig::default().with_call_stack_size(8);
        let (mut runtime, _, errors) = runtime(config);
        let result = runtime.run(
            "func forever(): num { return forever(); }
             func main() { forever(); }",
        );
        assert_eq!(
            result,
            Err(ZincError::Runtime(RuntimeError::StackOverflow {
                stack: OverflowedStack::Frames,
                limit: 8
            }))
        );
        assert_eq!(
            errors.contents(),
            "Panicked: stack overflow: call stack exceeded its limit of 8\n"
        );
    }

    #[test]
    fn every_parser_runs_the_same_program() {
        for kind in ParserKind::ALL {
            let (mut runtime, output, _) = runtime(RuntimeConfig::default().with_parser(kind));
            runtime.run("func main() { 2 * 3 + 1; }").unwrap();
            assert_eq!(output.contents(), "7\n", "{kind:?}");
        }
    }

    #[test]
    fn a_chunk_can_be_executed_repeatedly() {
        let (mut runtime, output, _) = runtime(RuntimeConfig::default());
        let chunk = runtime.compile("func main() { 42; }").unwrap();
        runtime.execute(&chunk).unwrap();
        runtime.execute(&chunk).unwrap();
        assert_eq!(output.contents(), "42\n42\n");
    }
}
