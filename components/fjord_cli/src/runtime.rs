//! Runtime orchestration for script execution
//!
//! The Runtime struct owns one incremental compiler session and the
//! global values it produces. Consecutive executions append to the same
//! main stream and carry the globals forward, so REPL lines and repeated
//! `execute_string` calls see each other's definitions.

use std::sync::Arc;
use std::time::Instant;

use bytecode_system::Code;
use compiler::{Compiler, CompilerOptions};
use interpreter::{Vm, VmOptions};
use object_system::{RunContext, Value};

use crate::cli::OutputFormat;
use crate::error::CliResult;

/// One compiler session plus the state its runs accumulate.
pub struct Runtime {
    session: Compiler,
    snapshot: Option<Arc<Code>>,
    globals: Vec<Value>,
    builtins: Vec<Value>,
    output: OutputFormat,
    timing: bool,
}

impl Runtime {
    /// Create a runtime. `with_builtins` selects the standard builtin
    /// table; `false` starts with an empty one, so only literals and the
    /// operators work.
    ///
    /// # Example
    /// ```
    /// use fjord_cli::Runtime;
    ///
    /// let runtime = Runtime::new(true);
    /// ```
    pub fn new(with_builtins: bool) -> Self {
        let (names, values) = if with_builtins {
            (builtins::builtin_names(), builtins::default_builtins())
        } else {
            (Vec::new(), Vec::new())
        };
        Self {
            session: Compiler::new(CompilerOptions { builtins: names }),
            snapshot: None,
            globals: Vec::new(),
            builtins: values,
            output: OutputFormat::Text,
            timing: false,
        }
    }

    /// Select the result rendering for [`Runtime::render`].
    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    /// Report parse, compile, and run wall times on stderr after each
    /// execution.
    pub fn with_timing(mut self, enabled: bool) -> Self {
        self.timing = enabled;
        self
    }

    /// Execute a script file.
    ///
    /// # Errors
    /// Returns `CliError` if the file cannot be read or execution fails.
    pub fn execute_file(&mut self, path: &str) -> CliResult<Value> {
        let source = std::fs::read_to_string(path)?;
        self.execute_string(&source)
    }

    /// Execute a source string against the session.
    ///
    /// The program is appended to the session's main stream and only the
    /// appended tail runs, against the globals left behind by earlier
    /// calls. A parse or compile error leaves the session as it was.
    ///
    /// # Example
    /// ```
    /// use fjord_cli::Runtime;
    /// use object_system::Value;
    ///
    /// let mut runtime = Runtime::new(true);
    /// runtime.execute_string("x := 40").unwrap();
    /// assert_eq!(runtime.execute_string("x + 2").unwrap(), Value::Int(42));
    /// ```
    pub fn execute_string(&mut self, source: &str) -> CliResult<Value> {
        let parse_started = Instant::now();
        let program = parser::parse(source)?;

        let compile_started = Instant::now();
        let offset = self.session.main_instructions();
        let code = self.session.compile(&program)?;
        self.snapshot = Some(code.clone());

        let run_started = Instant::now();
        let mut vm = Vm::with_options(
            code,
            VmOptions {
                builtins: self.builtins.clone(),
                instruction_offset: offset,
                globals: std::mem::take(&mut self.globals),
                budget: None,
            },
        );
        let result = vm.run(&RunContext::new());
        // Keep the globals even when the run failed, so the next line of
        // a REPL still sees everything assigned before the error.
        self.globals = vm.into_globals();

        if self.timing {
            let finished = Instant::now();
            eprintln!(
                "parse {:?}  compile {:?}  run {:?}",
                compile_started.duration_since(parse_started),
                run_started.duration_since(compile_started),
                finished.duration_since(run_started),
            );
        }

        Ok(result?)
    }

    /// Render a result value according to the configured output format.
    pub fn render(&self, value: &Value) -> String {
        match self.output {
            OutputFormat::Json => serde_json::to_string_pretty(&value.to_native())
                .unwrap_or_else(|_| value.inspect()),
            OutputFormat::Text => value.inspect(),
        }
    }

    /// Current global bindings, in declaration order.
    pub fn global_bindings(&self) -> Vec<(String, Value)> {
        let Some(code) = &self.snapshot else {
            return Vec::new();
        };
        code.globals
            .iter()
            .zip(&self.globals)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Whether the runtime was created with the standard builtin table.
    pub fn has_builtins(&self) -> bool {
        !self.builtins.is_empty()
    }

    /// Start the REPL on this runtime.
    ///
    /// # Errors
    /// Returns `CliError` if the line editor encounters a fatal error.
    pub fn repl(&mut self) -> CliResult<()> {
        crate::repl::run_repl(self)
    }
}
