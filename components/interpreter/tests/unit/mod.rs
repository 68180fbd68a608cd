//! Unit tests for the virtual machine: whole programs, incremental
//! sessions, host re-entry, and run limits.

use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytecode_system::Code;
use compiler::{Compiler, CompilerOptions};
use interpreter::{Vm, VmOptions};
use object_system::{Builtin, CancelToken, ExecError, Partial, RunContext, RuntimeError, Value};

fn compile(source: &str) -> Arc<Code> {
    let program = parser::parse(source).unwrap();
    Compiler::new(CompilerOptions { builtins: vec![] }).compile(&program).unwrap()
}

fn run(source: &str) -> Result<Value, ExecError> {
    Vm::new(compile(source)).run(&RunContext::new())
}

fn run_with(source: &str, names: &[&str], values: Vec<Value>) -> Result<Value, ExecError> {
    let program = parser::parse(source).unwrap();
    let options =
        CompilerOptions { builtins: names.iter().map(|name| name.to_string()).collect() };
    let code = Compiler::new(options).compile(&program).unwrap();
    Vm::with_options(code, VmOptions { builtins: values, ..VmOptions::default() })
        .run(&RunContext::new())
}

// ============================================================================
// Whole programs
// ============================================================================

#[test]
fn test_iterative_fibonacci() {
    let source = "\
func fib(n) {
    a := 0
    b := 1
    for i := 0; i < n; i++ {
        next := a + b
        a = b
        b = next
    }
    return a
}
fib(20)";
    assert_eq!(run(source).unwrap(), Value::Int(6765));
}

#[test]
fn test_higher_order_functions() {
    let source = "\
func compose(f, g) {
    return func(x) { return f(g(x)) }
}
double := func(x) { x * 2 }
add_one := func(x) { x + 1 }
compose(double, add_one)(20)";
    assert_eq!(run(source).unwrap(), Value::Int(42));
}

#[test]
fn test_collection_pipeline() {
    let source = "\
words := \"the fjord runs deep\".split(\" \")
lengths := []
total := 0
for _, w := range words {
    lengths = lengths + [len_of(w)]
    total = total + len_of(w)
}
{lengths: lengths, total: total}";
    let len_of = Value::builtin(Builtin::new("len_of", |_env, args| match args[0].len() {
        Ok(length) => Value::Int(length as i64),
        Err(err) => Value::error(err),
    }));
    let result = run_with(source, &["len_of"], vec![len_of]).unwrap();
    let lengths = result.get_item(&Value::string("lengths")).unwrap();
    assert_eq!(
        lengths,
        Value::list(vec![Value::Int(3), Value::Int(5), Value::Int(4), Value::Int(4)])
    );
    assert_eq!(result.get_item(&Value::string("total")).unwrap(), Value::Int(16));
}

#[test]
fn test_nested_loops_with_exit_flag() {
    let source = "\
found := nil
for i := range [1, 2, 3] {
    for j := range [10, 20, 30] {
        if i * j == 60 {
            found = [i, j]
            break
        }
    }
    if found != nil {
        break
    }
}
found";
    assert_eq!(run(source).unwrap(), Value::list(vec![Value::Int(2), Value::Int(30)]));
}

#[test]
fn test_deep_recursion_within_frame_limit() {
    let source = "\
func down(n) {
    if n == 0 {
        return 0
    }
    return down(n - 1)
}
down(500)";
    assert_eq!(run(source).unwrap(), Value::Int(0));
}

// ============================================================================
// Incremental sessions
// ============================================================================

#[test]
fn test_repl_session_carries_globals() {
    let mut session = Compiler::new(CompilerOptions { builtins: vec![] });
    let ctx = RunContext::new();

    let pass = parser::parse("x := 1").unwrap();
    let code = session.compile(&pass).unwrap();
    let mut vm = Vm::new(code);
    assert_eq!(vm.run(&ctx).unwrap(), Value::Nil);
    let mut globals = vm.into_globals();
    let mut offset = session.main_instructions();

    let pass = parser::parse("x + 1").unwrap();
    let code = session.compile(&pass).unwrap();
    let mut vm = Vm::with_options(
        code,
        VmOptions { instruction_offset: offset, globals, ..VmOptions::default() },
    );
    assert_eq!(vm.run(&ctx).unwrap(), Value::Int(2));
    globals = vm.into_globals();
    offset = session.main_instructions();

    let pass = parser::parse("x = x + 10\nx * 2").unwrap();
    let code = session.compile(&pass).unwrap();
    let mut vm = Vm::with_options(
        code,
        VmOptions { instruction_offset: offset, globals, ..VmOptions::default() },
    );
    assert_eq!(vm.run(&ctx).unwrap(), Value::Int(22));
    assert_eq!(vm.globals(), &[Value::Int(11)]);
}

#[test]
fn test_closure_sees_global_redefinition_across_passes() {
    let mut session = Compiler::new(CompilerOptions { builtins: vec![] });
    let ctx = RunContext::new();

    let pass = parser::parse("g := func() { 1 }\nf := func() { g() }\nf()").unwrap();
    let code = session.compile(&pass).unwrap();
    let mut vm = Vm::new(code);
    assert_eq!(vm.run(&ctx).unwrap(), Value::Int(1));
    let globals = vm.into_globals();
    let offset = session.main_instructions();

    let pass = parser::parse("g = func() { 2 }\nf()").unwrap();
    let code = session.compile(&pass).unwrap();
    let mut vm = Vm::with_options(
        code,
        VmOptions { instruction_offset: offset, globals, ..VmOptions::default() },
    );
    assert_eq!(vm.run(&ctx).unwrap(), Value::Int(2));
}

#[test]
fn test_snapshot_stays_runnable_after_session_grows() {
    let mut session = Compiler::new(CompilerOptions { builtins: vec![] });
    let first = session.compile(&parser::parse("1 + 1").unwrap()).unwrap();
    session.compile(&parser::parse("2 + 2").unwrap()).unwrap();

    // The earlier snapshot is unaffected by later passes.
    assert_eq!(Vm::new(first).run(&RunContext::new()).unwrap(), Value::Int(2));
}

// ============================================================================
// Code sharing across threads
// ============================================================================

#[test]
fn test_code_snapshot_shared_across_threads() {
    let source = "\
total := 0
for i := range [1, 2, 3, 4] {
    total = total + i
}
total";
    let code = compile(source);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let code = code.clone();
        // Values are single-threaded; each worker runs its own machine and
        // hands back a plain integer.
        handles.push(thread::spawn(move || match Vm::new(code).run(&RunContext::new()) {
            Ok(Value::Int(n)) => n,
            other => panic!("unexpected result: {other:?}"),
        }));
    }
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 10);
    }
}

#[test]
fn test_cancel_from_another_thread() {
    let token = CancelToken::new();
    let remote = token.clone();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        remote.cancel();
    });

    let ctx = RunContext::new().with_cancel(token);
    let result = Vm::new(compile("n := 0\nfor { n = n + 1 }")).run(&ctx);
    assert_eq!(result, Err(ExecError::Cancelled));
    stopper.join().unwrap();
}

// ============================================================================
// Host re-entry and interception
// ============================================================================

#[test]
fn test_intercepting_builtin_catches_raised_errors_only() {
    let try_builtin = Value::builtin(Builtin::new("try", |env, args| {
        let fallback = args.get(1).cloned().unwrap_or(Value::Nil);
        match env.call(&args[0], vec![]) {
            Some(Ok(value)) => value,
            Some(Err(ExecError::Raised(_))) => fallback,
            Some(Err(host_failure)) => env.fail(host_failure),
            None => Value::error(RuntimeError::host("no dispatcher")),
        }
    }));

    let result = run_with("try(func() { 1 / 0 }, -1)", &["try"], vec![try_builtin.clone()]);
    assert_eq!(result.unwrap(), Value::Int(-1));

    let result = run_with("try(func() { 7 }, -1)", &["try"], vec![try_builtin.clone()]);
    assert_eq!(result.unwrap(), Value::Int(7));

    // Cancellation is not interceptable: the recorded failure wins over
    // the fallback.
    let token = CancelToken::new();
    let inner = token.clone();
    let stop = Value::builtin(Builtin::new("stop", move |_env, _args| {
        inner.cancel();
        Value::Nil
    }));
    let program = parser::parse("try(func() { stop()\nfor { } }, -1)").unwrap();
    let options = CompilerOptions { builtins: vec!["try".to_string(), "stop".to_string()] };
    let code = Compiler::new(options).compile(&program).unwrap();
    let ctx = RunContext::new().with_cancel(token);
    let result = Vm::with_options(
        code,
        VmOptions { builtins: vec![try_builtin, stop], ..VmOptions::default() },
    )
    .run(&ctx);
    assert_eq!(result, Err(ExecError::Cancelled));
}

#[test]
fn test_builtin_maps_over_script_callback() {
    let map_builtin = Value::builtin(Builtin::new("map_list", |env, args| {
        let items = match &args[0] {
            Value::List(items) => items.borrow().clone(),
            other => {
                return Value::error(RuntimeError::type_error(format!(
                    "map_list() expects a list, got {}",
                    other.type_name()
                )))
            }
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match env.call(&args[1], vec![item]) {
                Some(Ok(value)) => out.push(value),
                Some(Err(err)) => return env.fail(err),
                None => return Value::error(RuntimeError::host("no dispatcher")),
            }
        }
        Value::list(out)
    }));

    let result =
        run_with("map_list([1, 2, 3], func(x) { x * x })", &["map_list"], vec![map_builtin]);
    assert_eq!(result.unwrap(), Value::list(vec![Value::Int(1), Value::Int(4), Value::Int(9)]));
}

#[test]
fn test_partial_chains_flatten() {
    let bind = Value::builtin(Builtin::new("bind", |_env, args| {
        Value::Partial(Rc::new(Partial::new(args[0].clone(), args[1..].to_vec())))
    }));
    let source = "\
join := func(a, b, c) { a + b + c }
first := bind(join, \"f\")
second := bind(first, \"j\")
second(\"ord\")";
    let result = run_with(source, &["bind"], vec![bind]);
    assert_eq!(result.unwrap(), Value::string("fjord"));
}

// ============================================================================
// Run limits
// ============================================================================

#[test]
fn test_budget_is_generous_enough_for_small_programs() {
    let code = compile("x := 0\nfor i := 0; i < 10; i++ { x = x + i }\nx");
    let options = VmOptions { budget: Some(2_000), ..VmOptions::default() };
    let result = Vm::with_options(code, options).run(&RunContext::new());
    assert_eq!(result.unwrap(), Value::Int(45));
}

#[test]
fn test_budget_counts_allocation_cost() {
    // Doubling a string each round blows through the budget long before
    // the loop's own instruction count would.
    let source = "\
s := \"x\"
for i := 0; i < 60; i++ {
    s = s + s
}
s";
    let code = compile(source);
    let options = VmOptions { budget: Some(100_000), ..VmOptions::default() };
    let result = Vm::with_options(code, options).run(&RunContext::new());
    assert_eq!(result, Err(ExecError::BudgetExceeded(100_000)));
}

#[test]
fn test_deadline_stops_runaway_scripts() {
    let ctx = RunContext::new().with_timeout(Duration::from_millis(10));
    let result = Vm::new(compile("for { }")).run(&ctx);
    assert_eq!(result, Err(ExecError::DeadlineExceeded));
}

#[test]
fn test_stack_overflow_reported_not_crashed() {
    let result = run("func spin() { return spin() }\nspin()");
    assert_eq!(result, Err(ExecError::StackOverflow));
}
