//! Incremental session integration tests
//!
//! A REPL keeps one compiler session alive across inputs. Each pass
//! appends to the same main stream, and the VM runs only the new tail
//! against the globals carried over from the previous pass.

use std::sync::Arc;

use builtins::default_builtins;
use bytecode_system::Code;
use compiler::{Compiler, CompilerOptions};
use fjord_cli::Runtime;
use interpreter::{Vm, VmOptions};
use object_system::{ExecError, RunContext, Value};

/// A minimal REPL driver over one compiler session.
struct Session {
    compiler: Compiler,
    globals: Vec<Value>,
}

impl Session {
    fn new() -> Self {
        Self { compiler: Compiler::new(CompilerOptions::default()), globals: Vec::new() }
    }

    /// One REPL step: parse, append to the session, run the new tail.
    fn eval(&mut self, source: &str) -> Result<Value, ExecError> {
        let program = parser::parse(source).expect("parse failed");
        let offset = self.compiler.main_instructions();
        let code = self.compiler.compile(&program).expect("compile failed");
        self.run_at(code, offset)
    }

    fn run_at(&mut self, code: Arc<Code>, offset: usize) -> Result<Value, ExecError> {
        let mut vm = Vm::with_options(
            code,
            VmOptions {
                builtins: default_builtins(),
                instruction_offset: offset,
                globals: std::mem::take(&mut self.globals),
                budget: None,
            },
        );
        let result = vm.run(&RunContext::new());
        self.globals = vm.into_globals();
        result
    }
}

/// Test: Globals persist from one pass to the next
#[test]
fn test_session_globals_persist() {
    let mut session = Session::new();
    session.eval("x := 1").expect("first pass failed");
    let result = session.eval("x + 1").expect("second pass failed");
    assert_eq!(result, Value::Int(2));
}

/// Test: Functions defined in an earlier pass stay callable
#[test]
fn test_session_function_survives_passes() {
    let mut session = Session::new();
    session.eval("func scale(x) { return x * 10 }").expect("definition failed");
    assert_eq!(session.eval("scale(4)").expect("call failed"), Value::Int(40));
    assert_eq!(session.eval("scale(scale(1))").expect("call failed"), Value::Int(100));
}

/// Test: State builds up across many passes
#[test]
fn test_session_accumulates_state() {
    let mut session = Session::new();
    session.eval("total := 0").expect("pass failed");
    for n in 1..=5 {
        session.eval(&format!("total = total + {n}")).expect("pass failed");
    }
    assert_eq!(session.eval("total").expect("pass failed"), Value::Int(15));
}

/// Test: The main stream only grows, and earlier offsets stay valid
#[test]
fn test_session_offsets_never_shrink() {
    let mut session = Session::new();
    let mut last = session.compiler.main_instructions();
    for source in ["a := 1", "b := a * 2", "a + b"] {
        session.eval(source).expect("pass failed");
        let len = session.compiler.main_instructions();
        assert!(len > last, "main stream should grow on every pass");
        last = len;
    }
}

/// Test: An old snapshot still runs after the session has grown
#[test]
fn test_session_snapshot_stays_runnable() {
    let mut session = Session::new();
    let offset = session.compiler.main_instructions();
    let program = parser::parse("10 + 20").expect("parse failed");
    let snapshot: Arc<Code> = session.compiler.compile(&program).expect("compile failed");
    assert_eq!(session.run_at(snapshot.clone(), offset).expect("run failed"), Value::Int(30));

    session.eval("x := 99").expect("pass failed");
    session.eval("x * 2").expect("pass failed");

    // The first snapshot is immutable; rerunning it gives the old answer.
    let mut vm = Vm::with_options(
        snapshot,
        VmOptions { builtins: default_builtins(), ..VmOptions::default() },
    );
    assert_eq!(vm.run(&RunContext::new()).expect("rerun failed"), Value::Int(30));
}

/// Test: A failed pass leaves the session usable
#[test]
fn test_session_failed_pass_keeps_state() {
    let mut session = Session::new();
    session.eval("x := 7").expect("pass failed");

    let before = session.compiler.main_instructions();
    let program = parser::parse("x + missing").expect("parse failed");
    let err = session.compiler.compile(&program).expect_err("compile should fail");
    assert!(err.message().contains("undefined variable"));
    assert_eq!(
        session.compiler.main_instructions(),
        before,
        "a failed pass must not grow the stream"
    );

    assert_eq!(session.eval("x + 1").expect("pass failed"), Value::Int(8));
}

/// Test: The CLI runtime drives the same per-line flow
#[test]
fn test_runtime_repl_sequence() {
    let mut runtime = Runtime::new(true);
    runtime.execute_string("x := 1").expect("line failed");
    let result = runtime.execute_string("x + 1").expect("line failed");
    assert_eq!(result, Value::Int(2));
}

/// Test: The CLI runtime recovers after a bad line
#[test]
fn test_runtime_recovers_after_error() {
    let mut runtime = Runtime::new(true);
    runtime.execute_string("greeting := \"hi\"").expect("line failed");
    runtime.execute_string("greeting +").expect_err("parse should fail");
    runtime.execute_string("len(greeting, 2)").expect_err("arity should fail");
    assert_eq!(
        runtime.execute_string("greeting + \"!\"").expect("line failed"),
        Value::string("hi!")
    );
}

/// Test: Global bindings reflect the latest values
#[test]
fn test_runtime_global_bindings() {
    let mut runtime = Runtime::new(true);
    runtime.execute_string("depth := 100").expect("line failed");
    runtime.execute_string("depth = depth * 8").expect("line failed");
    let bindings = runtime.global_bindings();
    assert_eq!(bindings, vec![("depth".to_string(), Value::Int(800))]);
}
