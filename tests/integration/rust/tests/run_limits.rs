//! Run limit integration tests
//!
//! Cancellation, deadlines, and evaluation budgets stop runaway scripts
//! at the VM's checkpoints, while compiled snapshots stay shared across
//! worker threads.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use builtins::default_builtins;
use bytecode_system::Code;
use compiler::{Compiler, CompilerOptions};
use interpreter::{Vm, VmOptions};
use object_system::{CancelToken, ExecError, RunContext, Value};

fn compile(source: &str) -> Arc<Code> {
    let program = parser::parse(source).expect("parse failed");
    Compiler::new(CompilerOptions::default()).compile(&program).expect("compile failed")
}

fn vm(code: Arc<Code>) -> Vm {
    Vm::with_options(code, VmOptions { builtins: default_builtins(), ..VmOptions::default() })
}

/// Test: A cancel token flipped from another thread stops the loop
#[test]
fn test_cancellation_from_another_thread() {
    let token = CancelToken::new();
    let remote = token.clone();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        remote.cancel();
    });

    let ctx = RunContext::new().with_cancel(token);
    let started = Instant::now();
    let result = vm(compile("spins := 0\nfor { spins = spins + 1 }")).run(&ctx);
    assert_eq!(result, Err(ExecError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5), "cancellation took too long");
    stopper.join().unwrap();
}

/// Test: A deadline interrupts a loop that never yields
#[test]
fn test_deadline_aborts_mid_loop() {
    let ctx = RunContext::new().with_timeout(Duration::from_millis(10));
    let result = vm(compile("count := 0\nfor { count = count + 1 }")).run(&ctx);
    assert_eq!(result, Err(ExecError::DeadlineExceeded));
}

/// Test: A finished script beats its deadline
#[test]
fn test_deadline_allows_fast_scripts() {
    let ctx = RunContext::new().with_timeout(Duration::from_secs(60));
    let result = vm(compile("len(\"fjord\") * 2")).run(&ctx);
    assert_eq!(result, Ok(Value::Int(10)));
}

/// Test: The budget counts work, not wall time
#[test]
fn test_budget_aborts_allocation_heavy_scripts() {
    let source = "\
s := \"fjord\"
for {
    s = s + s
}";
    let ctx = RunContext::new().with_budget(50_000);
    let result = vm(compile(source)).run(&ctx);
    assert_eq!(result, Err(ExecError::BudgetExceeded(50_000)));
}

/// Test: A modest budget is plenty for a small program
#[test]
fn test_budget_spares_small_programs() {
    let ctx = RunContext::new().with_budget(100_000);
    let source = "\
total := 0
for i := 0; i < 100; i++ {
    total = total + i
}
total";
    assert_eq!(vm(compile(source)).run(&ctx), Ok(Value::Int(4950)));
}

/// Test: Unbounded recursion reports stack overflow instead of crashing
#[test]
fn test_stack_overflow_is_reported() {
    let source = "\
func dive(n) { return dive(n + 1) }
dive(0)";
    let result = vm(compile(source)).run(&RunContext::new());
    assert_eq!(result, Err(ExecError::StackOverflow));
}

/// Test: One snapshot, many worker threads, each with its own VM
#[test]
fn test_snapshot_shared_across_threads() {
    let source = "\
func fib(n) {
    if n < 2 { return n }
    return fib(n - 1) + fib(n - 2)
}
fib(15)";
    let code = compile(source);

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let code = Arc::clone(&code);
            thread::spawn(move || {
                // Values are single-threaded; each worker builds its own
                // VM and hands back a plain integer.
                match vm(code).run(&RunContext::new()) {
                    Ok(Value::Int(n)) => n,
                    other => panic!("unexpected result: {other:?}"),
                }
            })
        })
        .collect();

    for worker in workers {
        assert_eq!(worker.join().unwrap(), 610);
    }
}
