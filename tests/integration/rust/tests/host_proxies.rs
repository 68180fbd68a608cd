//! Host proxy integration tests
//!
//! A host type registers one dispatch table, then scripts manipulate
//! wrapped instances through plain attribute access and method calls.
//! The registry is process-wide; each thread wraps its own instances.

use std::sync::Arc;
use std::thread;

use bytecode_system::Code;
use compiler::{Compiler, CompilerOptions};
use interpreter::{Vm, VmOptions};
use object_system::{
    new_proxy, register_proxy_type, resolve_attr, CancelToken, ExecError, FromValue,
    ProxyTypeBuilder, RunContext, RuntimeError, Value,
};

/// A host-side instrument exposed to scripts.
struct Gauge {
    label: String,
    level: i64,
}

fn register_gauge() {
    register_proxy_type(
        ProxyTypeBuilder::<Gauge>::new("Gauge")
            .field("label", |g: &Gauge| Value::string(g.label.clone()))
            .field_mut(
                "level",
                |g: &Gauge| Value::Int(g.level),
                |g: &mut Gauge, v: Value| {
                    g.level = i64::from_value(&v)?;
                    Ok(())
                },
            )
            .method("raise", |g: &mut Gauge, args: &[Value]| {
                let by = match args.first() {
                    Some(v) => i64::from_value(v)?,
                    None => 1,
                };
                g.level += by;
                Ok(Value::Int(g.level))
            })
            .method("calibrate", |g: &mut Gauge, args: &[Value]| {
                let target = match args.first() {
                    Some(v) => i64::from_value(v)?,
                    None => 0,
                };
                if target < 0 {
                    return Err(RuntimeError::host("gauge cannot calibrate below zero"));
                }
                g.level = target;
                Ok(Value::Nil)
            })
            .is_zero(|g: &Gauge| g.level == 0)
            .build(),
    );
}

fn gauge(level: i64) -> Value {
    register_gauge();
    new_proxy(Gauge { label: "pressure".to_string(), level }).expect("registration missing")
}

/// Compile `source` with one extra builtin slot named `gauge`.
fn compile_with_gauge(source: &str) -> Arc<Code> {
    let program = parser::parse(source).expect("parse failed");
    let mut names = builtins::builtin_names();
    names.push("gauge".to_string());
    Compiler::new(CompilerOptions { builtins: names }).compile(&program).expect("compile failed")
}

/// Run `source` against the given proxy instance.
fn run_with_gauge(source: &str, proxy: Value) -> Result<Value, ExecError> {
    let code = compile_with_gauge(source);
    let mut values = builtins::default_builtins();
    values.push(proxy);
    let mut vm = Vm::with_options(code, VmOptions { builtins: values, ..VmOptions::default() });
    vm.run(&RunContext::new())
}

/// Test: Scripts read registered fields
#[test]
fn test_proxy_field_read() {
    let result = run_with_gauge("gauge.label", gauge(3)).expect("run failed");
    assert_eq!(result, Value::string("pressure"));
}

/// Test: Scripts write through the field setter, and the host sees it
#[test]
fn test_proxy_field_write_visible_to_host() {
    let proxy = gauge(0);
    let result = run_with_gauge("gauge.level = 42\ngauge.level", proxy.clone())
        .expect("run failed");
    assert_eq!(result, Value::Int(42));

    // The script mutated the same cell the host still holds.
    let ctx = RunContext::new();
    assert_eq!(resolve_attr(&proxy, &ctx, "level").expect("host read failed"), Value::Int(42));
}

/// Test: A setter rejects values it cannot marshal
#[test]
fn test_proxy_setter_type_error() {
    let err = run_with_gauge("gauge.level = \"high\"", gauge(0)).expect_err("set should fail");
    match err {
        ExecError::Raised(e) => assert!(e.message().contains("expected an int"), "got: {e}"),
        other => panic!("expected a raised error, got {other:?}"),
    }
}

/// Test: Methods run against the live instance
#[test]
fn test_proxy_method_calls() {
    let source = "\
gauge.raise(5)
gauge.raise()
gauge.level";
    let result = run_with_gauge(source, gauge(10)).expect("run failed");
    assert_eq!(result, Value::Int(16));
}

/// Test: A failing method surfaces as a raised host error
#[test]
fn test_proxy_method_host_error() {
    let err = run_with_gauge("gauge.calibrate(-1)", gauge(5)).expect_err("call should fail");
    match err {
        ExecError::Raised(e) => {
            assert_eq!(e.message(), "host error: gauge cannot calibrate below zero");
        }
        other => panic!("expected a raised error, got {other:?}"),
    }
}

/// Test: try() intercepts host errors like any raised error
#[test]
fn test_proxy_host_error_is_catchable() {
    let source = "try(func() { gauge.calibrate(-1) }, func(e) { e.kind })";
    let result = run_with_gauge(source, gauge(5)).expect("run failed");
    assert_eq!(result, Value::string("host error"));
}

/// Test: Unknown attributes fail with the type's name
#[test]
fn test_proxy_unknown_attribute() {
    let err = run_with_gauge("gauge.altitude", gauge(1)).expect_err("access should fail");
    match err {
        ExecError::Raised(e) => assert!(e.message().contains("Gauge"), "got: {e}"),
        other => panic!("expected a raised error, got {other:?}"),
    }
}

/// Test: The truthiness hook drives conditionals
#[test]
fn test_proxy_truthiness_hook() {
    assert_eq!(
        run_with_gauge("if gauge { 1 } else { 2 }", gauge(0)).expect("run failed"),
        Value::Int(2)
    );
    assert_eq!(
        run_with_gauge("if gauge { 1 } else { 2 }", gauge(9)).expect("run failed"),
        Value::Int(1)
    );
}

/// Test: Wrapping an unregistered type fails cleanly
#[test]
fn test_unregistered_type_fails() {
    struct Unregistered;
    let err = new_proxy(Unregistered).expect_err("must not wrap unregistered types");
    assert!(err.to_string().ends_with("cannot be reflected"));
}

/// Test: One registry serves every thread; instances stay thread-local
#[test]
fn test_registry_shared_across_threads() {
    register_gauge();

    let workers: Vec<_> = (0..3)
        .map(|offset| {
            thread::spawn(move || {
                let proxy = gauge(offset);
                match run_with_gauge("gauge.raise(100)", proxy) {
                    Ok(Value::Int(n)) => n,
                    other => panic!("unexpected result: {other:?}"),
                }
            })
        })
        .collect();

    let mut levels: Vec<i64> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    levels.sort_unstable();
    assert_eq!(levels, vec![100, 101, 102]);
}

/// Test: Cancellation still applies while proxy methods are on the stack
#[test]
fn test_proxy_loop_respects_cancellation() {
    let token = CancelToken::new();
    token.cancel();
    let ctx = RunContext::new().with_cancel(token);

    let code = compile_with_gauge("for { gauge.raise() }");
    let mut values = builtins::default_builtins();
    values.push(gauge(0));
    let mut vm = Vm::with_options(code, VmOptions { builtins: values, ..VmOptions::default() });
    assert_eq!(vm.run(&ctx), Err(ExecError::Cancelled));
}
